//! The [`Site`] orchestrator: one value owning the configuration, the
//! store handle, and the rendered header/footer, constructed once per
//! invocation and driving both the full rebuild and the incremental
//! operations (create, edit, hide, unhide, remove). Every mutation ends in
//! a full rebuild; a rebuild that fails after the store committed leaves
//! the site stale, never the data inconsistent, and is safe to re-run.

use crate::config::Config;
use crate::error::{Error, Result};
use crate::input;
use crate::store::{Post, Store};
use crate::templates;
use crate::write::Writer;
use chrono::Utc;
use std::fs;
use std::path::Path;
use tracing::info;

pub struct Site {
    pub config: Config,
    pub store: Store,
    header: String,
    footer: String,
}

impl Site {
    /// Opens the store and renders the header/footer templates for this
    /// configuration.
    pub async fn new(config: Config) -> Result<Site> {
        let store = Store::open(&config.db_file).await?;
        Site::with_store(config, store)
    }

    /// Builds a [`Site`] around an already-open store.
    pub fn with_store(config: Config, store: Store) -> Result<Site> {
        let (header, footer) = templates::header_and_footer(&config)?;
        Ok(Site {
            config,
            store,
            header,
            footer,
        })
    }

    fn writer(&self) -> Writer {
        Writer {
            store: &self.store,
            config: &self.config,
            header: &self.header,
            footer: &self.footer,
        }
    }

    /// Regenerates the whole output tree from current store state: post
    /// pages, then the index, the archive, the tag pages, and the tag
    /// index. Idempotent for unchanged store state.
    pub async fn rebuild(&self) -> Result<()> {
        let writer = self.writer();
        writer.write_posts().await?;
        writer.write_index().await?;
        writer.write_archive().await?;
        writer.write_tag_pages().await?;
        writer.write_tag_index().await?;
        info!("site rebuilt");
        Ok(())
    }

    /// Parses post source text, stores the new post with the current UTC
    /// time as its publish date, and rebuilds. Returns the new post's id.
    pub async fn create_post(&self, source: &str, hidden: bool) -> Result<i64> {
        if source == input::template(&self.config.tags_label) {
            return Err(Error::Validation("no edits made to the template".into()));
        }
        let parsed = input::parse(source, &self.config.tags_label)?;
        let publish_date = Utc::now().naive_utc();
        let id = self
            .store
            .create_post(&parsed.title, &parsed.body, &publish_date, hidden, &parsed.tags)
            .await?;
        info!(id, title = %parsed.title, "created post");
        self.rebuild().await?;
        Ok(id)
    }

    /// Replaces a post's title, body, and tags from new source text, then
    /// rebuilds. The publish date and filename stay as they were.
    pub async fn edit_post(&self, id: i64, source: &str) -> Result<()> {
        let parsed = input::parse(source, &self.config.tags_label)?;
        self.store
            .update_post(id, &parsed.title, &parsed.body, &parsed.tags)
            .await?;
        info!(id, "updated post");
        self.rebuild().await
    }

    /// Flips a post's hidden flag, then rebuilds.
    pub async fn set_hidden(&self, id: i64, hidden: bool) -> Result<()> {
        self.store.set_hidden(id, hidden).await?;
        info!(id, hidden, "changed visibility");
        self.rebuild().await
    }

    /// Deletes a post from the store, removes its rendered file, prunes
    /// now-empty month and year directories, and rebuilds. The file may
    /// legitimately not exist if the site was never built.
    pub async fn remove_post(&self, id: i64) -> Result<Post> {
        let post = self.store.delete_post(id).await?;
        let file = self.config.blog_dir.join(post.uri());
        match fs::remove_file(&file) {
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            other => other?,
        }
        prune_empty_dirs(&file);
        info!(id, file = %file.display(), "removed post");
        self.rebuild().await?;
        Ok(post)
    }

    /// Reassembles a post's editable source text, the same shape `post`
    /// consumes.
    pub async fn post_source(&self, id: i64) -> Result<String> {
        let post = self
            .store
            .post(id)
            .await?
            .ok_or(Error::NotFound(id))?;
        let tags = self.store.tags_for_post(id).await?;
        Ok(input::compose(
            &post.title,
            &post.content,
            &tags,
            &self.config.tags_label,
        ))
    }
}

/// Removes the month directory of a deleted post file and then the year
/// directory above it, stopping silently at the first one still in use.
fn prune_empty_dirs(file: &Path) {
    if let Some(month_dir) = file.parent() {
        if fs::remove_dir(month_dir).is_ok() {
            if let Some(year_dir) = month_dir.parent() {
                let _ = fs::remove_dir(year_dir);
            }
        }
    }
}
