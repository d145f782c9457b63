//! Parses free-form post source into a title, body, and tag list, and
//! reassembles it for editing. The format is deliberately plain: the first
//! line is the title, a line starting with the configured tags label (plus
//! a space) carries a comma-separated tag list, and everything else is the
//! body with line breaks preserved.

use crate::error::{Error, Result};

/// The parsed pieces of a post source text.
#[derive(Debug, PartialEq)]
pub struct PostInput {
    pub title: String,
    pub body: String,
    pub tags: Vec<String>,
}

/// The skeleton presented to an author writing a new post. Input identical
/// to this is rejected as unedited.
pub fn template(tags_label: &str) -> String {
    format!(
        "This line is your title\n\n\
         The body of your post goes here.\n\n\
         {} comma-separated, list, of, tags\n",
        tags_label
    )
}

/// Splits post source text into [`PostInput`].
///
/// The tags line may appear anywhere after the title; when it appears more
/// than once the last one wins. A missing tags line means no tags; a tags
/// line with nothing usable after the label is an error, as is an empty
/// title.
pub fn parse(text: &str, tags_label: &str) -> Result<PostInput> {
    let prefix = format!("{} ", tags_label);
    let mut title = String::new();
    let mut body = String::new();
    let mut tags: Option<Vec<String>> = None;

    for (i, line) in text.lines().enumerate() {
        if i == 0 {
            title = line.trim().to_string();
        } else if let Some(rest) = line.strip_prefix(&prefix) {
            tags = Some(
                rest.trim()
                    .split(", ")
                    .map(|t| t.trim().to_string())
                    .filter(|t| !t.is_empty())
                    .collect(),
            );
        } else {
            body.push_str(line);
            body.push('\n');
        }
    }

    if title.is_empty() {
        return Err(Error::Validation("the first line (the title) is empty".into()));
    }
    let tags = match tags {
        Some(tags) if tags.is_empty() => {
            return Err(Error::Validation(format!(
                "the `{}` line contains no tags",
                tags_label
            )))
        }
        Some(tags) => tags,
        None => Vec::new(),
    };

    Ok(PostInput { title, body, tags })
}

/// Reassembles post source from its stored pieces, the inverse of
/// [`parse`] for round-tripping a post into an editor buffer.
pub fn compose(title: &str, body: &str, tags: &[String], tags_label: &str) -> String {
    let mut out = format!("{}\n{}", title, body);
    if !tags.is_empty() {
        if !out.ends_with('\n') {
            out.push('\n');
        }
        out.push_str(&format!("{} {}\n", tags_label, tags.join(", ")));
    }
    out
}

#[cfg(test)]
mod test {
    use super::*;

    const LABEL: &str = "Tags:";

    #[test]
    fn test_parse_basic() -> Result<()> {
        let input = parse("My Title\n\nBody line.\n\nTags: a, b\n", LABEL)?;
        assert_eq!("My Title", input.title);
        assert_eq!("\nBody line.\n\n", input.body);
        assert_eq!(vec!["a", "b"], input.tags);
        Ok(())
    }

    #[test]
    fn test_parse_no_tags_line() -> Result<()> {
        let input = parse("My Title\nBody.\n", LABEL)?;
        assert!(input.tags.is_empty());
        assert_eq!("Body.\n", input.body);
        Ok(())
    }

    #[test]
    fn test_parse_empty_title_rejected() {
        assert!(parse("   \nBody.\n", LABEL).is_err());
        assert!(parse("", LABEL).is_err());
    }

    #[test]
    fn test_parse_empty_tags_line_rejected() {
        assert!(parse("Title\nTags: \n", LABEL).is_err());
        assert!(parse("Title\nTags: , \n", LABEL).is_err());
    }

    #[test]
    fn test_parse_tags_keep_duplicates_for_store_to_fold() -> Result<()> {
        // De-duplication is the store's job, the parser reports what was
        // written.
        let input = parse("Title\nTags: a, b, a\n", LABEL)?;
        assert_eq!(vec!["a", "b", "a"], input.tags);
        Ok(())
    }

    #[test]
    fn test_parse_label_without_space_is_body() -> Result<()> {
        let input = parse("Title\nTags:nope\n", LABEL)?;
        assert!(input.tags.is_empty());
        assert_eq!("Tags:nope\n", input.body);
        Ok(())
    }

    #[test]
    fn test_compose_round_trips() -> Result<()> {
        let source = "Title\n\nBody.\n";
        let input = parse(source, LABEL)?;
        let tags: Vec<String> = vec!["a".into(), "b".into()];
        let recomposed = compose(&input.title, &input.body, &tags, LABEL);
        let reparsed = parse(&recomposed, LABEL)?;
        assert_eq!(input.title, reparsed.title);
        assert_eq!(input.body, reparsed.body);
        assert_eq!(tags, reparsed.tags);
        Ok(())
    }

    #[test]
    fn test_template_parses_as_its_own_example() -> Result<()> {
        let input = parse(&template(LABEL), LABEL)?;
        assert_eq!("This line is your title", input.title);
        assert_eq!(vec!["comma-separated", "list", "of", "tags"], input.tags);
        Ok(())
    }
}
