//! Qid token extraction from free-form query text.

use std::sync::OnceLock;

use regex::Regex;

/// Prefix that marks a cached query reference inside a query string
pub const QID_PREFIX: &str = "qid:";

/// Returns the value of the first `qid:<value>` token in `text`.
///
/// ```
/// use qid_cache::cache::extract_key_from_query;
///
/// assert_eq!(extract_key_from_query("qid:1712345").as_deref(), Some("1712345"));
/// assert_eq!(extract_key_from_query("taxon_name:Acacia"), None);
/// ```
pub fn extract_key_from_query(text: &str) -> Option<String> {
    if !text.contains(QID_PREFIX) {
        return None;
    }

    static RE: OnceLock<Regex> = OnceLock::new();
    let regex = RE.get_or_init(|| {
        Regex::new(r"qid:([A-Za-z0-9_-]+)").expect("qid token pattern is valid")
    });

    regex
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bare_token() {
        assert_eq!(extract_key_from_query("qid:42"), Some("42".to_string()));
    }

    #[test]
    fn test_token_inside_query() {
        let text = "(qid:1712345678901 AND year:2020) OR state:NSW";
        assert_eq!(extract_key_from_query(text), Some("1712345678901".to_string()));
    }

    #[test]
    fn test_first_token_wins() {
        assert_eq!(extract_key_from_query("qid:1 OR qid:2"), Some("1".to_string()));
    }

    #[test]
    fn test_minted_local_key() {
        assert_eq!(
            extract_key_from_query("qid:mem-1712345678901-3"),
            Some("mem-1712345678901-3".to_string())
        );
    }

    #[test]
    fn test_absent_or_empty_token() {
        assert_eq!(extract_key_from_query("taxon_name:Acacia"), None);
        assert_eq!(extract_key_from_query("qid: 42"), None);
        assert_eq!(extract_key_from_query(""), None);
    }
}
