//! Markdown rendering. A thin, pure wrapper around [`pulldown_cmark`] so
//! the rest of the crate never touches parser options directly.

use pulldown_cmark::{html, Options, Parser};

/// Converts markdown source to an HTML string.
pub fn render(markdown: &str) -> String {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_FOOTNOTES);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_TASKLISTS);

    let mut out = String::with_capacity(markdown.len() * 2);
    html::push_html(&mut out, Parser::new_ext(markdown, options));
    out
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_render_paragraph() {
        assert_eq!("<p>hello <em>world</em></p>\n", render("hello *world*"));
    }

    #[test]
    fn test_render_empty() {
        assert_eq!("", render(""));
    }
}
