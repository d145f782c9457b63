//! Splits post content into a summary and "the rest" at a break marker: a
//! line starting with three or more of `*`, `-` or `_`, each separated by at
//! most one space. Everything above the first break line is the summary;
//! without a break the whole post is.

use crate::markdown;
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    /// Matches a summary break at the start of a line, e.g. `***`, `- - -`
    /// or `*-_`.
    static ref BREAK_RE: Regex = Regex::new(r"^[*_-]( *[*_-]){2,}").unwrap();
}

/// Scans `content` line by line for a break marker and renders the lines
/// above it to HTML. Returns `(true, html)` when a break was found and
/// `(false, html-of-everything)` when not. Line terminators of the kept
/// lines are preserved going into the renderer.
pub fn summary(content: &str) -> (bool, String) {
    let mut kept = String::new();
    let mut has_break = false;
    for line in content.split_inclusive('\n') {
        if BREAK_RE.is_match(line) {
            has_break = true;
            break;
        }
        kept.push_str(line);
    }
    (has_break, markdown::render(&kept))
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_no_break_renders_everything() {
        let (has_break, html) = summary("A\nB\n");
        assert!(!has_break);
        assert_eq!(markdown::render("A\nB\n"), html);
    }

    #[test]
    fn test_break_mid_document() {
        let (has_break, html) = summary("A\nB\n*-*\nC\n");
        assert!(has_break);
        assert_eq!(markdown::render("A\nB\n"), html);
    }

    #[test]
    fn test_break_on_first_line() {
        let (has_break, html) = summary("***\nC\n");
        assert!(has_break);
        assert_eq!("", html);
    }

    #[test]
    fn test_break_variants() {
        for marker in &["***", "---", "___", "* * *", "- - -", "*-_", "****"] {
            let (has_break, _) = summary(&format!("above\n{}\nbelow\n", marker));
            assert!(has_break, "expected `{}` to break", marker);
        }
    }

    #[test]
    fn test_two_bullets_do_not_break() {
        let (has_break, _) = summary("above\n**\nbelow\n");
        assert!(!has_break);
    }

    #[test]
    fn test_break_must_start_the_line() {
        let (has_break, _) = summary("above\n text ***\nbelow\n");
        assert!(!has_break);
    }
}
