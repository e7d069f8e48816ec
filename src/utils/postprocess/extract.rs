//! Pulling small typed values out of free-form replies.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref YEAR_MATCH_RE: Regex = Regex::new(r"\b\d{4}\b").unwrap();
}

/// The first isolated 4-digit sequence in `text`, or `None` if there is none.
///
/// "Isolated" means on word boundaries: `12345` contains no year, `1954.` does.
pub fn extract_year(text: &str) -> Option<&str> {
    YEAR_MATCH_RE.find(text).map(|found| found.as_str())
}

#[cfg(test)]
mod test_extract {
    use super::extract_year;

    #[test]
    fn test_extract_year() {
        assert_eq!(Some("1954"), extract_year("The answer is 1954."));
        assert_eq!(None, extract_year("no digits here"));
    }

    #[test]
    fn test_extract_year_needs_isolation() {
        assert_eq!(None, extract_year("12345"));
        assert_eq!(None, extract_year("id 123, code 56789"));
        assert_eq!(None, extract_year("x 2001y"));
    }

    #[test]
    fn test_extract_year_takes_first() {
        assert_eq!(Some("1939"), extract_year("between 1939 and 1945"));
    }
}
