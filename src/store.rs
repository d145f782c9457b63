//! The relational store: posts, tags, and the links between them, kept in
//! SQLite behind a [`Store`] handle. Every multi-step mutation (create,
//! update, delete, tag replacement) runs in one explicit transaction so a
//! crash leaves either the old record set or the new one, never a partial
//! tag fan-out.

use crate::date;
use crate::error::{Error, Result};
use crate::uri;
use chrono::NaiveDateTime;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow};
use sqlx::{Row, SqlitePool, Transaction};
use std::path::Path;

/// A post row.
#[derive(Clone, Debug)]
pub struct Post {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub publish_date: NaiveDateTime,
    pub hidden: bool,
    pub filename: String,
}

impl Post {
    /// The post's site-relative URI, `year/month/filename`.
    pub fn uri(&self) -> String {
        uri::uri(&self.filename, &self.publish_date)
    }
}

impl sqlx::FromRow<'_, SqliteRow> for Post {
    fn from_row(row: &SqliteRow) -> std::result::Result<Self, sqlx::Error> {
        let publish_date: String = row.try_get("publish_date")?;
        let content: Option<String> = row.try_get("content")?;
        Ok(Post {
            id: row.try_get("post_id")?,
            title: row.try_get("title")?,
            content: content.unwrap_or_default(),
            publish_date: date::parse(&publish_date).map_err(|e| sqlx::Error::ColumnDecode {
                index: "publish_date".into(),
                source: Box::new(e),
            })?,
            hidden: row.try_get("hidden")?,
            filename: row.try_get("filename")?,
        })
    }
}

/// One row of the tag/post join feeding the tag pages: rows arrive sorted
/// by tag text, then publish date descending.
#[derive(Debug)]
pub struct TagPost {
    pub tag: String,
    pub post: Post,
}

impl sqlx::FromRow<'_, SqliteRow> for TagPost {
    fn from_row(row: &SqliteRow) -> std::result::Result<Self, sqlx::Error> {
        Ok(TagPost {
            tag: row.try_get("tag")?,
            post: Post::from_row(row)?,
        })
    }
}

/// A sortable column for the post listing.
#[derive(Clone, Copy, Debug)]
pub enum SortField {
    Id,
    Title,
    Date,
}

impl SortField {
    /// Parses the CLI's `--order-by` value; the caller has already
    /// restricted the choices.
    pub fn from_flag(flag: Option<&str>) -> SortField {
        match flag {
            Some("id") => SortField::Id,
            Some("title") => SortField::Title,
            _ => SortField::Date,
        }
    }

    fn column(self) -> &'static str {
        match self {
            SortField::Id => "post_id",
            SortField::Title => "title",
            SortField::Date => "publish_date",
        }
    }
}

const SCHEMA: &[&str] = &[
    "CREATE TABLE tags_ref (
        tag_ref_id INTEGER NOT NULL PRIMARY KEY AUTOINCREMENT UNIQUE,
        tag_id     INTEGER NOT NULL,
        post_id    INTEGER NOT NULL,
        FOREIGN KEY(tag_id)  REFERENCES tags(tag_id)  ON DELETE CASCADE,
        FOREIGN KEY(post_id) REFERENCES posts(post_id) ON DELETE CASCADE,
        CONSTRAINT tag_post_unique UNIQUE (tag_id, post_id)
    )",
    "CREATE TABLE tags (
        tag_id INTEGER NOT NULL PRIMARY KEY AUTOINCREMENT UNIQUE,
        text   TEXT NOT NULL UNIQUE
    )",
    "CREATE TABLE posts (
        post_id      INTEGER NOT NULL PRIMARY KEY AUTOINCREMENT UNIQUE,
        title        TEXT NOT NULL,
        content      TEXT,
        publish_date TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
        hidden       INTEGER NOT NULL DEFAULT 1,
        filename     TEXT NOT NULL
    )",
    "CREATE INDEX post_pub_date ON posts (publish_date DESC)",
    "CREATE UNIQUE INDEX tag_ref_i ON tags_ref (tag_id, post_id)",
];

/// Handle to the SQLite store. One connection: a blog has one operator,
/// and a single writer sidesteps SQLite's locking entirely.
pub struct Store {
    pool: SqlitePool,
}

impl Store {
    /// Opens an existing database file. Fails when the file is missing;
    /// `init` creates it.
    pub async fn open(path: &Path) -> Result<Store> {
        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(false)
            .foreign_keys(true);
        Ok(Store {
            pool: Store::pool(options).await?,
        })
    }

    /// Creates a new database file with the schema applied. Fails when the
    /// file already exists.
    pub async fn create(path: &Path) -> Result<Store> {
        if path.exists() {
            return Err(Error::Config(format!(
                "database file `{}` exists",
                path.display()
            )));
        }
        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
            .foreign_keys(true);
        let store = Store {
            pool: Store::pool(options).await?,
        };
        store.apply_schema().await?;
        Ok(store)
    }

    /// An in-memory store with the schema applied, for tests.
    pub async fn memory() -> Result<Store> {
        let options = SqliteConnectOptions::new()
            .in_memory(true)
            .foreign_keys(true);
        let store = Store {
            pool: Store::pool(options).await?,
        };
        store.apply_schema().await?;
        Ok(store)
    }

    async fn pool(options: SqliteConnectOptions) -> Result<SqlitePool> {
        Ok(SqlitePoolOptions::new()
            .min_connections(1)
            .max_connections(1)
            .connect_with(options)
            .await?)
    }

    async fn apply_schema(&self) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        for statement in SCHEMA {
            sqlx::query(statement).execute(&mut *tx).await?;
        }
        tx.commit().await?;
        Ok(())
    }

    /// Inserts a post and its tag links in one transaction and returns the
    /// new post id. The filename derives from the title; a collision with
    /// another post published the same month picks the next free `-2`,
    /// `-3`, ... suffix.
    pub async fn create_post(
        &self,
        title: &str,
        content: &str,
        publish_date: &NaiveDateTime,
        hidden: bool,
        tags: &[String],
    ) -> Result<i64> {
        let derived = uri::filename(title)?;
        let mut tx = self.pool.begin().await?;
        let filename = free_filename(&mut tx, &derived, publish_date).await?;
        let result = sqlx::query(
            "INSERT INTO posts (title, content, publish_date, filename, hidden) \
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(title)
        .bind(content)
        .bind(date::store_format(publish_date))
        .bind(&filename)
        .bind(hidden)
        .execute(&mut *tx)
        .await?;
        let post_id = result.last_insert_rowid();
        replace_tags_in(&mut tx, post_id, tags).await?;
        tx.commit().await?;
        Ok(post_id)
    }

    /// Replaces a post's title, content, and tag set. The publish date and
    /// filename never change after creation.
    pub async fn update_post(
        &self,
        id: i64,
        title: &str,
        content: &str,
        tags: &[String],
    ) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        let result = sqlx::query("UPDATE posts SET title = ?, content = ? WHERE post_id = ?")
            .bind(title)
            .bind(content)
            .bind(id)
            .execute(&mut *tx)
            .await?;
        if result.rows_affected() == 0 {
            return Err(Error::NotFound(id));
        }
        replace_tags_in(&mut tx, id, tags).await?;
        tx.commit().await?;
        Ok(())
    }

    /// Flips only the hidden flag.
    pub async fn set_hidden(&self, id: i64, hidden: bool) -> Result<()> {
        let result = sqlx::query("UPDATE posts SET hidden = ? WHERE post_id = ?")
            .bind(hidden)
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(Error::NotFound(id));
        }
        Ok(())
    }

    /// Deletes a post, cascading its tag links, and returns the deleted
    /// row so the caller can remove the rendered file. A missing id leaves
    /// the store untouched.
    pub async fn delete_post(&self, id: i64) -> Result<Post> {
        let mut tx = self.pool.begin().await?;
        let post = sqlx::query_as::<_, Post>("SELECT * FROM posts WHERE post_id = ?")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or(Error::NotFound(id))?;
        sqlx::query("DELETE FROM posts WHERE post_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(post)
    }

    /// Replaces the full tag set of an existing post.
    pub async fn replace_tags(&self, post_id: i64, tags: &[String]) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        let exists = sqlx::query_scalar::<_, i64>("SELECT 1 FROM posts WHERE post_id = ?")
            .bind(post_id)
            .fetch_optional(&mut *tx)
            .await?;
        if exists.is_none() {
            return Err(Error::NotFound(post_id));
        }
        replace_tags_in(&mut tx, post_id, tags).await?;
        tx.commit().await?;
        Ok(())
    }

    /// Deletes tags that no longer link to any post. Explicit maintenance;
    /// nothing calls this automatically. Returns the number pruned.
    pub async fn prune_orphan_tags(&self) -> Result<u64> {
        let result = sqlx::query(
            "DELETE FROM tags WHERE NOT EXISTS \
             (SELECT 1 FROM tags_ref WHERE tags_ref.tag_id = tags.tag_id)",
        )
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }

    pub async fn post(&self, id: i64) -> Result<Option<Post>> {
        Ok(
            sqlx::query_as::<_, Post>("SELECT * FROM posts WHERE post_id = ?")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?,
        )
    }

    /// The newest non-hidden posts for the index page. Equal publish dates
    /// tie-break on id so reruns are deterministic.
    pub async fn recent_posts(&self, limit: i64) -> Result<Vec<Post>> {
        Ok(sqlx::query_as::<_, Post>(
            "SELECT * FROM posts WHERE hidden = 0 \
             ORDER BY publish_date DESC, post_id ASC LIMIT ?",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?)
    }

    /// Every post, newest first, optionally with hidden posts filtered
    /// out.
    pub async fn all_posts(&self, include_hidden: bool) -> Result<Vec<Post>> {
        let query = if include_hidden {
            "SELECT * FROM posts ORDER BY publish_date DESC, post_id ASC"
        } else {
            "SELECT * FROM posts WHERE hidden = 0 \
             ORDER BY publish_date DESC, post_id ASC"
        };
        Ok(sqlx::query_as::<_, Post>(query).fetch_all(&self.pool).await?)
    }

    /// Every post ordered for the `ls` listing. The column is chosen from
    /// a fixed whitelist, never interpolated from user text.
    pub async fn list_posts(&self, field: SortField, ascending: bool) -> Result<Vec<Post>> {
        let direction = if ascending { "ASC" } else { "DESC" };
        let query = format!(
            "SELECT * FROM posts ORDER BY {col} {dir}, post_id {dir}",
            col = field.column(),
            dir = direction
        );
        Ok(sqlx::query_as::<_, Post>(&query).fetch_all(&self.pool).await?)
    }

    /// A post's tag texts, alphabetical so rendered tag lines are stable.
    pub async fn tags_for_post(&self, post_id: i64) -> Result<Vec<String>> {
        Ok(sqlx::query_scalar::<_, String>(
            "SELECT tags.text FROM tags, tags_ref \
             WHERE tags.tag_id = tags_ref.tag_id AND tags_ref.post_id = ? \
             ORDER BY tags.text ASC",
        )
        .bind(post_id)
        .fetch_all(&self.pool)
        .await?)
    }

    /// The tag/post join for the tag pages, sorted by tag text and then by
    /// publish date descending within a tag.
    pub async fn tag_posts(&self, include_hidden: bool) -> Result<Vec<TagPost>> {
        let hidden_clause = if include_hidden { "" } else { "AND posts.hidden = 0 " };
        let query = format!(
            "SELECT tags.text AS tag, posts.* \
             FROM posts, tags, tags_ref \
             WHERE tags_ref.post_id = posts.post_id \
             AND tags_ref.tag_id = tags.tag_id {hidden}\
             ORDER BY tags.text ASC, posts.publish_date DESC, posts.post_id ASC",
            hidden = hidden_clause
        );
        Ok(sqlx::query_as::<_, TagPost>(&query)
            .fetch_all(&self.pool)
            .await?)
    }

    /// Tag texts with the number of posts carrying each, alphabetical.
    pub async fn tag_counts(&self, include_hidden: bool) -> Result<Vec<(String, i64)>> {
        let hidden_clause = if include_hidden {
            ""
        } else {
            "AND EXISTS (SELECT 1 FROM posts WHERE posts.post_id = tags_ref.post_id \
             AND posts.hidden = 0) "
        };
        let query = format!(
            "SELECT tags.text, COUNT(tags_ref.tag_id) AS count \
             FROM tags, tags_ref \
             WHERE tags.tag_id = tags_ref.tag_id {hidden}\
             GROUP BY tags.tag_id ORDER BY tags.text ASC",
            hidden = hidden_clause
        );
        Ok(sqlx::query_as::<_, (String, i64)>(&query)
            .fetch_all(&self.pool)
            .await?)
    }
}

/// Finds a filename not yet taken in the post's publish month, starting
/// from the derived name and appending `-2`, `-3`, ... before the
/// extension.
async fn free_filename(
    tx: &mut Transaction<'_, sqlx::Sqlite>,
    derived: &str,
    publish_date: &NaiveDateTime,
) -> Result<String> {
    let month = publish_date.format("%Y-%m").to_string();
    let stem = derived.trim_end_matches(".html");
    let mut candidate = derived.to_owned();
    let mut suffix = 1u32;
    loop {
        let taken = sqlx::query_scalar::<_, i64>(
            "SELECT 1 FROM posts WHERE filename = ? AND substr(publish_date, 1, 7) = ?",
        )
        .bind(&candidate)
        .bind(&month)
        .fetch_optional(&mut **tx)
        .await?;
        if taken.is_none() {
            return Ok(candidate);
        }
        suffix += 1;
        if suffix > 10_000 {
            return Err(Error::Constraint(format!(
                "cannot find a free filename for `{}` in {}",
                derived, month
            )));
        }
        candidate = format!("{}-{}.html", stem, suffix);
    }
}

/// Deletes all tag links for a post and relinks the given tag texts,
/// reusing existing tags by exact text match and creating the rest.
/// Duplicate texts in the input fold to one link; `INSERT OR IGNORE`
/// backstops the unique (tag, post) constraint.
async fn replace_tags_in(
    tx: &mut Transaction<'_, sqlx::Sqlite>,
    post_id: i64,
    tags: &[String],
) -> Result<()> {
    sqlx::query("DELETE FROM tags_ref WHERE post_id = ?")
        .bind(post_id)
        .execute(&mut **tx)
        .await?;
    let mut seen: Vec<&str> = Vec::with_capacity(tags.len());
    for tag in tags {
        let tag = tag.as_str();
        if tag.is_empty() || seen.contains(&tag) {
            continue;
        }
        seen.push(tag);
        let tag_id = match sqlx::query_scalar::<_, i64>("SELECT tag_id FROM tags WHERE text = ?")
            .bind(tag)
            .fetch_optional(&mut **tx)
            .await?
        {
            Some(id) => id,
            None => sqlx::query("INSERT INTO tags (text) VALUES (?)")
                .bind(tag)
                .execute(&mut **tx)
                .await?
                .last_insert_rowid(),
        };
        sqlx::query("INSERT OR IGNORE INTO tags_ref (tag_id, post_id) VALUES (?, ?)")
            .bind(tag_id)
            .bind(post_id)
            .execute(&mut **tx)
            .await?;
    }
    Ok(())
}
