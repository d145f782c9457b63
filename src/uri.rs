//! Derives on-disk names and site-relative URIs for posts. A post's
//! filename is fixed once at creation from its title; its URI nests the
//! filename under `year/month/` directories taken from the publish date.

use crate::error::{Error, Result};
use chrono::{Datelike, NaiveDateTime};

/// Accented letters that fold to a close ASCII equivalent instead of being
/// stripped from filenames.
const TRANSLITERATE_FROM: [char; 10] = ['ä', 'ö', 'å', 'ø', 'æ', 'đ', 'ð', 'č', 'ž', 'š'];
const TRANSLITERATE_TO: [char; 10] = ['a', 'o', 'a', 'o', 'a', 'd', 'd', 'c', 'z', 's'];

/// Returns the site-relative URI for a post: `"{year}/{month}/{filename}"`
/// with a four-digit year and a zero-padded two-digit month.
pub fn uri(filename: &str, publish_date: &NaiveDateTime) -> String {
    format!(
        "{:04}/{:02}/{}",
        publish_date.year(),
        publish_date.month(),
        filename
    )
}

/// Derives a filename from a post title: lowercase, spaces become
/// underscores, the letters in [`TRANSLITERATE_FROM`] fold to ASCII, every
/// other non-word character is stripped, leading and trailing underscores
/// are trimmed, and `.html` is appended.
///
/// A title with no word characters at all derives to nothing and is
/// rejected rather than producing an empty filename.
pub fn filename(title: &str) -> Result<String> {
    let mut stem = String::with_capacity(title.len());
    for c in title.to_lowercase().chars() {
        let c = match TRANSLITERATE_FROM.iter().position(|&f| f == c) {
            Some(i) => TRANSLITERATE_TO[i],
            None => c,
        };
        if c == ' ' {
            stem.push('_');
        } else if c.is_ascii_alphanumeric() || c == '_' {
            stem.push(c);
        }
    }
    let stem = stem.trim_matches('_');
    if stem.is_empty() {
        return Err(Error::Validation(format!(
            "title `{}` contains no usable characters for a filename",
            title
        )));
    }
    Ok(format!("{}.html", stem))
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::date;

    #[test]
    fn test_uri_pads_month() {
        let pd = date::parse("2024-03-15 10:00:00").unwrap();
        assert_eq!("2024/03/hello_world.html", uri("hello_world.html", &pd));
    }

    #[test]
    fn test_filename_basic() -> Result<()> {
        assert_eq!("hello_world.html", filename("Hello World")?);
        Ok(())
    }

    #[test]
    fn test_filename_strips_punctuation() -> Result<()> {
        assert_eq!("whats_new_in_10.html", filename("What's new in 1.0?")?);
        Ok(())
    }

    #[test]
    fn test_filename_transliterates() -> Result<()> {
        assert_eq!("smorgasbord.html", filename("Smörgåsbord")?);
        assert_eq!("dzadzo.html", filename("Džadžo")?);
        Ok(())
    }

    #[test]
    fn test_filename_trims_underscores() -> Result<()> {
        // The surrounding dashes strip away and must not leave underscores.
        assert_eq!("draft.html", filename(" - draft - ")?);
        Ok(())
    }

    #[test]
    fn test_filename_deterministic() -> Result<()> {
        assert_eq!(filename("Itsy Bitsy Spider")?, filename("Itsy Bitsy Spider")?);
        Ok(())
    }

    #[test]
    fn test_filename_rejects_punctuation_only_title() {
        assert!(filename("!!! ???").is_err());
        assert!(filename("").is_err());
        assert!(filename("___").is_err());
    }
}
