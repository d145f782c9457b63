//! Timestamp handling. Publish dates are stored in the database as
//! `"%Y-%m-%d %H:%M:%S"` TEXT in UTC and carried in memory as
//! [`NaiveDateTime`]; presentation formatting goes through [`format`] with a
//! configurable pattern.

use chrono::NaiveDateTime;

/// The TEXT representation of a publish date in the posts table.
pub const STORE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Parses a stored publish date.
pub fn parse(s: &str) -> Result<NaiveDateTime, chrono::ParseError> {
    NaiveDateTime::parse_from_str(s, STORE_FORMAT)
}

/// Renders a publish date in the stored TEXT format.
pub fn store_format(pd: &NaiveDateTime) -> String {
    pd.format(STORE_FORMAT).to_string()
}

/// Renders a publish date with a strftime-style pattern, e.g.
/// `"%B %d, %Y"` for `March 15, 2024`.
pub fn format(pd: &NaiveDateTime, pattern: &str) -> String {
    pd.format(pattern).to_string()
}

#[cfg(test)]
mod test {
    use super::*;

    fn fixture() -> NaiveDateTime {
        parse("2024-03-15 10:00:00").unwrap()
    }

    #[test]
    fn test_round_trip() {
        assert_eq!("2024-03-15 10:00:00", store_format(&fixture()));
    }

    #[test]
    fn test_display_format() {
        assert_eq!("March 15, 2024", format(&fixture(), "%B %d, %Y"));
    }

    #[test]
    fn test_month_heading_format() {
        assert_eq!("March 2024", format(&fixture(), "%B %Y"));
    }

    #[test]
    fn test_rejects_bare_date() {
        assert!(parse("2024-03-15").is_err());
    }
}
