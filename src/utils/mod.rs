//! Utility functions and helpers.

use url::Url;

/// Resolve a potentially relative URL against a base URL.
pub fn resolve_url(base: &Url, href: &str) -> String {
    base.join(href)
        .map(|u| u.to_string())
        .unwrap_or_else(|_| href.to_string())
}

/// Resolve a URL string against a base URL string.
pub fn resolve(base_url: &str, href: &str) -> Option<String> {
    Url::parse(base_url)
        .ok()
        .map(|base| resolve_url(&base, href))
}

/// Extract the vote reference from a detail link (the part after `/vote/`).
///
/// The reference is the full official number; sub-items keep their dotted
/// suffix (`/vote/681.1` yields `681.1`).
pub fn extract_vote_ref(href: &str) -> Option<String> {
    let (_, reference) = href.split_once("/vote/")?;
    let reference = reference
        .split(['?', '#'])
        .next()
        .unwrap_or("")
        .trim_end_matches('/');
    if reference.is_empty() {
        None
    } else {
        Some(reference.to_string())
    }
}

/// Collapse all whitespace runs in text to single spaces.
pub fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_url() {
        let base = Url::parse("https://swissvotes.ch/votes").unwrap();
        assert_eq!(
            resolve_url(&base, "/vote/681"),
            "https://swissvotes.ch/vote/681"
        );
        assert_eq!(
            resolve_url(&base, "https://other.ch/x"),
            "https://other.ch/x"
        );
    }

    #[test]
    fn test_extract_vote_ref() {
        assert_eq!(extract_vote_ref("/vote/681"), Some("681".to_string()));
        assert_eq!(
            extract_vote_ref("https://swissvotes.ch/vote/681.1"),
            Some("681.1".to_string())
        );
        assert_eq!(
            extract_vote_ref("/vote/681?lang=de"),
            Some("681".to_string())
        );
        assert_eq!(extract_vote_ref("/votes?page=0"), None);
        assert_eq!(extract_vote_ref("/vote/"), None);
    }

    #[test]
    fn test_normalize_whitespace() {
        assert_eq!(normalize_whitespace("  a\n b\t c "), "a b c");
        assert_eq!(normalize_whitespace(""), "");
    }
}
