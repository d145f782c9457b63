//! Responsible for templating and writing the output HTML tree from store
//! rows: one page per post under `year/month/`, the recent-posts index,
//! the chronological archive, one page per tag, and the tag index. Pages
//! are assembled as whole strings and written in one shot, so an
//! interrupted rebuild never leaves a file that a re-run will not replace.

use crate::config::Config;
use crate::date;
use crate::error::Result;
use crate::markdown;
use crate::store::{Post, Store, TagPost};
use crate::summary;
use std::collections::BTreeMap;
use std::fs;
use tracing::info;

/// How posts link to tag pages from each location in the tree: the index
/// and archive live at the output root, tag pages one level down, post
/// pages two levels down.
const ROOT_PREFIX: &str = "";
const TAG_PAGE_PREFIX: &str = "../";
const POST_PAGE_PREFIX: &str = "../../";

/// The format of the archive's month headings.
const MONTH_HEADING_FORMAT: &str = "%B %Y";

/// Renders and writes all page kinds for the current store state.
pub struct Writer<'a> {
    pub store: &'a Store,
    pub config: &'a Config,
    pub header: &'a str,
    pub footer: &'a str,
}

impl Writer<'_> {
    fn include_hidden(&self) -> bool {
        self.config.include_hidden_outside_index()
    }

    /// Writes each post's own page, creating `year/month/` directories as
    /// needed.
    pub async fn write_posts(&self) -> Result<()> {
        let posts = self.store.all_posts(self.include_hidden()).await?;
        info!(count = posts.len(), "writing post pages");
        for post in &posts {
            let tags = self.store.tags_for_post(post.id).await?;
            let page = post_page(
                post,
                &tags,
                self.header,
                self.footer,
                &self.config.date_format,
                &self.config.tags_label,
            );
            self.write_file(&post.uri(), &page)?;
        }
        Ok(())
    }

    /// Writes the main index: the newest non-hidden posts, summarized.
    pub async fn write_index(&self) -> Result<()> {
        let posts = self.store.recent_posts(self.config.index_len).await?;
        info!(file = %self.config.index_file, "writing index");
        let mut page = String::from(self.header);
        for post in &posts {
            let tags = self.store.tags_for_post(post.id).await?;
            page.push_str(&self.post_block(post, &tags, ROOT_PREFIX));
        }
        page.push_str(self.footer);
        self.write_file(&self.config.index_file, &page)
    }

    /// Writes the archive: every post under month headings, newest first.
    pub async fn write_archive(&self) -> Result<()> {
        let posts = self.store.all_posts(self.include_hidden()).await?;
        info!(file = %self.config.archive_file, "writing archive");
        let page = archive_page(
            &posts,
            self.header,
            self.footer,
            &self.config.date_format,
        );
        self.write_file(&self.config.archive_file, &page)
    }

    /// Writes one page per tag. The sorted tag/post rows are grouped into
    /// an in-memory map first and each complete page is written once.
    pub async fn write_tag_pages(&self) -> Result<()> {
        let rows = self.store.tag_posts(self.include_hidden()).await?;
        let mut pages: BTreeMap<String, String> = BTreeMap::new();
        for TagPost { tag, post } in &rows {
            let tags = self.store.tags_for_post(post.id).await?;
            pages
                .entry(tag.clone())
                .or_insert_with(|| String::from(self.header))
                .push_str(&self.post_block(post, &tags, TAG_PAGE_PREFIX));
        }
        info!(count = pages.len(), "writing tag pages");
        for (tag, mut page) in pages {
            page.push_str(self.footer);
            self.write_file(&format!("tag/{}.html", tag), &page)?;
        }
        Ok(())
    }

    /// Writes the alphabetical list of all tags with their post counts.
    pub async fn write_tag_index(&self) -> Result<()> {
        let counts = self.store.tag_counts(self.include_hidden()).await?;
        info!(file = %self.config.tags_file, "writing tag index");
        let page = tag_index_page(
            &counts,
            self.header,
            self.footer,
            &self.config.posts_label,
        );
        self.write_file(&self.config.tags_file, &page)
    }

    /// The per-post block shared by the index and the tag pages: linked
    /// heading, date, summary, an optional read-more link, and the tags
    /// line.
    fn post_block(&self, post: &Post, tags: &[String], prefix: &str) -> String {
        post_block(
            post,
            tags,
            prefix,
            &self.config.date_format,
            &self.config.tags_label,
            &self.config.read_more,
        )
    }

    fn write_file(&self, relative: &str, contents: &str) -> Result<()> {
        let path = self.config.blog_dir.join(relative);
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)?;
        }
        fs::write(path, contents)?;
        Ok(())
    }
}

/// Renders the tags line: the label followed by comma-separated links to
/// each tag's page, prefixed to hop up to the output root.
pub fn tags_line(label: &str, prefix: &str, tags: &[String]) -> String {
    let links: Vec<String> = tags
        .iter()
        .map(|tag| format!("<a href=\"{prefix}tag/{tag}.html\">{tag}</a>", prefix = prefix, tag = tag))
        .collect();
    format!("<p>{} {}</p>\n", label, links.join(", "))
}

/// Renders a post's own page.
pub fn post_page(
    post: &Post,
    tags: &[String],
    header: &str,
    footer: &str,
    date_format: &str,
    tags_label: &str,
) -> String {
    format!(
        "{header}<h1>{title}</h1>\n<p>{date}</p>\n{content}{tags}{footer}",
        header = header,
        title = post.title,
        date = date::format(&post.publish_date, date_format),
        content = markdown::render(&post.content),
        tags = tags_line(tags_label, POST_PAGE_PREFIX, tags),
        footer = footer
    )
}

/// Renders the shared per-post block for listing pages.
pub fn post_block(
    post: &Post,
    tags: &[String],
    prefix: &str,
    date_format: &str,
    tags_label: &str,
    read_more: &str,
) -> String {
    let uri = format!("{}{}", prefix, post.uri());
    let (has_break, summary) = summary::summary(&post.content);
    let mut block = format!(
        "<h3><a href=\"{uri}\">{title}</a></h3>\n<p>{date}</p>\n{summary}",
        uri = uri,
        title = post.title,
        date = date::format(&post.publish_date, date_format),
        summary = summary
    );
    if has_break {
        block.push_str(&format!(
            "<p><a href=\"{}\">{}</a></p>\n",
            uri, read_more
        ));
    }
    block.push_str(&tags_line(tags_label, prefix, tags));
    block
}

/// Renders the archive: posts newest first, a fresh heading and list each
/// time the (year, month) of consecutive posts changes.
pub fn archive_page(posts: &[Post], header: &str, footer: &str, date_format: &str) -> String {
    use chrono::Datelike;

    let mut page = String::from(header);
    let mut previous_month: Option<(i32, u32)> = None;
    for post in posts {
        let month = (post.publish_date.year(), post.publish_date.month());
        if previous_month != Some(month) {
            if previous_month.is_some() {
                page.push_str("</ul>\n");
            }
            page.push_str(&format!(
                "<h2>{}</h2>\n<ul>",
                date::format(&post.publish_date, MONTH_HEADING_FORMAT)
            ));
            previous_month = Some(month);
        }
        page.push_str(&format!(
            "<li><a href=\"{uri}\">{title}</a> &mdash; {date}</li>",
            uri = post.uri(),
            title = post.title,
            date = date::format(&post.publish_date, date_format)
        ));
    }
    if previous_month.is_some() {
        page.push_str("</ul>");
    }
    page.push_str(footer);
    page
}

/// Renders the tag index page.
pub fn tag_index_page(
    counts: &[(String, i64)],
    header: &str,
    footer: &str,
    posts_label: &str,
) -> String {
    let mut page = String::from(header);
    page.push_str("<ul>");
    for (tag, count) in counts {
        page.push_str(&format!(
            "<li><a href=\"tag/{tag}.html\">{tag}</a> &mdash; {count} {label}",
            tag = tag,
            count = count,
            label = posts_label
        ));
    }
    page.push_str("</ul>");
    page.push_str(footer);
    page
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::date;

    fn post(title: &str, content: &str, when: &str) -> Post {
        Post {
            id: 1,
            title: title.to_string(),
            content: content.to_string(),
            publish_date: date::parse(when).unwrap(),
            hidden: false,
            filename: crate::uri::filename(title).unwrap(),
        }
    }

    fn strings(texts: &[&str]) -> Vec<String> {
        texts.iter().map(|t| t.to_string()).collect()
    }

    #[test]
    fn test_tags_line_prefixes() {
        assert_eq!(
            "<p>Tags: <a href=\"../tag/a.html\">a</a>, <a href=\"../tag/b.html\">b</a></p>\n",
            tags_line("Tags:", "../", &strings(&["a", "b"]))
        );
        assert_eq!(
            "<p>Tags: </p>\n",
            tags_line("Tags:", "", &[])
        );
    }

    #[test]
    fn test_post_page_shape() {
        let page = post_page(
            &post("Hello World", "Body.\n", "2024-03-15 10:00:00"),
            &strings(&["intro"]),
            "<body>\n",
            "</body>",
            "%B %d, %Y",
            "Tags:",
        );
        assert!(page.starts_with("<body>\n<h1>Hello World</h1>\n<p>March 15, 2024</p>\n"));
        assert!(page.contains("<p>Body.</p>\n"));
        assert!(page.contains("<a href=\"../../tag/intro.html\">intro</a>"));
        assert!(page.ends_with("</body>"));
    }

    #[test]
    fn test_post_block_read_more_only_after_break() {
        let with_break = post_block(
            &post("Hello World", "Summary.\n***\nRest.\n", "2024-03-15 10:00:00"),
            &[],
            "",
            "%B %d, %Y",
            "Tags:",
            "Read more...",
        );
        assert!(with_break.contains("<h3><a href=\"2024/03/hello_world.html\">Hello World</a></h3>"));
        assert!(with_break.contains("<p><a href=\"2024/03/hello_world.html\">Read more...</a></p>\n"));
        assert!(with_break.contains("<p>Summary.</p>"));
        assert!(!with_break.contains("Rest."));

        let without_break = post_block(
            &post("Hello World", "All of it.\n", "2024-03-15 10:00:00"),
            &[],
            "",
            "%B %d, %Y",
            "Tags:",
            "Read more...",
        );
        assert!(!without_break.contains("Read more..."));
        assert!(without_break.contains("All of it."));
    }

    #[test]
    fn test_archive_page_groups_by_month() {
        let posts = vec![
            post("April Second", "x\n", "2024-04-20 08:00:00"),
            post("April First", "x\n", "2024-04-02 08:00:00"),
            post("March Only", "x\n", "2024-03-15 08:00:00"),
        ];
        let page = archive_page(&posts, "H", "F", "%B %d, %Y");
        let april = page.find("<h2>April 2024</h2>").unwrap();
        let march = page.find("<h2>March 2024</h2>").unwrap();
        assert!(april < march);
        assert_eq!(2, page.matches("<h2>").count());
        assert_eq!(2, page.matches("<ul>").count());
        assert_eq!(2, page.matches("</ul>").count());
        assert!(page.contains(
            "<li><a href=\"2024/03/march_only.html\">March Only</a> &mdash; March 15, 2024</li>"
        ));
        assert!(page.starts_with('H'));
        assert!(page.ends_with('F'));
    }

    #[test]
    fn test_archive_page_empty_store() {
        assert_eq!("HF", archive_page(&[], "H", "F", "%B %d, %Y"));
    }

    #[test]
    fn test_tag_index_page_counts() {
        let counts = vec![("a".to_string(), 2), ("b".to_string(), 1)];
        let page = tag_index_page(&counts, "H", "F", "posts");
        assert_eq!(
            "H<ul><li><a href=\"tag/a.html\">a</a> &mdash; 2 posts\
             <li><a href=\"tag/b.html\">b</a> &mdash; 1 posts</ul>F",
            page
        );
    }
}
