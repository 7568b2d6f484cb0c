//! Error types for image analysis and search.

use std::time::Duration;

/// Errors that can occur while sourcing, analyzing or searching images.
#[derive(Debug, thiserror::Error)]
pub enum ScribeError {
    /// The URL does not parse or has no host.
    #[error("malformed URL: {0}")]
    MalformedUrl(String),

    /// The URL's host is on the blocked domain list.
    #[error("blocked domain: {0}")]
    BlockedDomain(String),

    /// Transport failure while fetching an image.
    #[error("network error: {0}")]
    Network(String),

    /// The fetched resource is not an image.
    #[error("not an image: {content_type}")]
    NotAnImage { content_type: String },

    /// The image host answered with a non-success status.
    #[error("HTTP error: {status} {reason}")]
    Http { status: u16, reason: String },

    /// Credentials or other configuration are missing.
    #[error("configuration error: {0}")]
    Config(String),

    /// API key rejected by the provider.
    #[error("authentication failed: {0}")]
    Auth(String),

    /// API returned an error response.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Rate limit exceeded.
    #[error("rate limited, retry after {retry_after:?}")]
    RateLimited { retry_after: Option<Duration> },

    /// Content was blocked by safety filters.
    #[error("content blocked: {0}")]
    ContentBlocked(String),

    /// The model returned no text.
    #[error("empty response from model")]
    EmptyResponse,

    /// Analysis failed for any other reason, including malformed output.
    #[error("analysis failed: {0}")]
    AnalysisFailed(String),

    /// Image search failed.
    #[error("search failed: {0}")]
    SearchFailed(String),

    /// Operation timed out.
    #[error("operation timed out after {0:?}")]
    Timeout(Duration),

    /// Operation was cancelled before it completed.
    #[error("operation cancelled")]
    Cancelled,

    /// Another operation is still in flight.
    #[error("another operation is already in progress")]
    Busy,

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error (e.g., saving an export).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ScribeError {
    /// Returns true if this error is likely transient and worth retrying.
    ///
    /// Nothing in this crate retries on its own; this is a hint for callers.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::RateLimited { .. } | Self::Timeout(_) | Self::Network(_)
        )
    }

    /// Returns the suggested retry delay, if available.
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            Self::RateLimited { retry_after } => *retry_after,
            Self::Timeout(_) => Some(Duration::from_secs(1)),
            Self::Network(_) => Some(Duration::from_secs(2)),
            _ => None,
        }
    }

    /// Message suitable for showing to an end user.
    pub fn user_message(&self) -> String {
        match self {
            Self::MalformedUrl(msg) if msg.is_empty() => "Please enter a valid URL.".into(),
            Self::MalformedUrl(msg) => msg.clone(),
            Self::BlockedDomain(_) => {
                "Social media and stock photo sites are not supported due to access restrictions."
                    .into()
            }
            Self::Network(msg) => msg.clone(),
            Self::NotAnImage { .. } => "URL does not point to a valid image.".into(),
            Self::Http { status, reason } => {
                format!("Failed to fetch image: {} {}", status, reason)
            }
            Self::Config(msg) => msg.clone(),
            Self::EmptyResponse | Self::AnalysisFailed(_) => {
                "Failed to analyze image. Please try again.".into()
            }
            Self::SearchFailed(_) => "Failed to perform search. Please try again.".into(),
            Self::Timeout(d) => format!(
                "The request took longer than {}s and was abandoned. Please try again.",
                d.as_secs()
            ),
            Self::Cancelled => "The request was cancelled.".into(),
            Self::Busy => "Please wait for the current request to finish.".into(),
            other => other.to_string(),
        }
    }
}

/// Result type alias for this crate.
pub type Result<T> = std::result::Result<T, ScribeError>;

/// Parses a `Retry-After` header value given in seconds.
pub(crate) fn parse_retry_after(headers: &reqwest::header::HeaderMap) -> Option<u64> {
    headers
        .get(reqwest::header::RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u64>().ok())
}

/// Strips anything that looks like a Google API key from provider text and
/// caps the length so raw bodies never flood a log line.
pub(crate) fn sanitize_error_message(text: &str) -> String {
    const MAX_LEN: usize = 500;

    let mut cleaned = String::with_capacity(text.len().min(MAX_LEN));
    for word in text.split_inclusive(char::is_whitespace) {
        let trimmed = word.trim_matches(|c: char| !c.is_ascii_alphanumeric() && c != '_');
        if trimmed.starts_with("AIza") && trimmed.len() >= 30 {
            cleaned.push_str(&word.replace(trimmed, "[REDACTED]"));
        } else {
            cleaned.push_str(word);
        }
    }

    if cleaned.chars().count() > MAX_LEN {
        let truncated: String = cleaned.chars().take(MAX_LEN).collect();
        format!("{}...", truncated)
    } else {
        cleaned
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_retryable() {
        assert!(ScribeError::RateLimited { retry_after: None }.is_retryable());
        assert!(ScribeError::Timeout(Duration::from_secs(30)).is_retryable());
        assert!(ScribeError::Network("reset".into()).is_retryable());

        assert!(!ScribeError::Auth("bad key".into()).is_retryable());
        assert!(!ScribeError::BlockedDomain("x.com".into()).is_retryable());
        assert!(!ScribeError::Busy.is_retryable());
        assert!(!ScribeError::EmptyResponse.is_retryable());
    }

    #[test]
    fn test_retry_after() {
        let rate_limited = ScribeError::RateLimited {
            retry_after: Some(Duration::from_secs(60)),
        };
        assert_eq!(rate_limited.retry_after(), Some(Duration::from_secs(60)));

        let timeout = ScribeError::Timeout(Duration::from_secs(30));
        assert_eq!(timeout.retry_after(), Some(Duration::from_secs(1)));

        assert_eq!(ScribeError::Cancelled.retry_after(), None);
    }

    #[test]
    fn test_error_display() {
        let err = ScribeError::Api {
            status: 404,
            message: "Not found".into(),
        };
        assert_eq!(err.to_string(), "API error: 404 - Not found");

        let err = ScribeError::Http {
            status: 403,
            reason: "Forbidden".into(),
        };
        assert_eq!(err.to_string(), "HTTP error: 403 Forbidden");
    }

    #[test]
    fn test_user_messages_are_never_empty() {
        let errors = [
            ScribeError::MalformedUrl(String::new()),
            ScribeError::BlockedDomain("instagram.com".into()),
            ScribeError::NotAnImage {
                content_type: "text/html".into(),
            },
            ScribeError::EmptyResponse,
            ScribeError::AnalysisFailed("bad json".into()),
            ScribeError::SearchFailed("boom".into()),
            ScribeError::Timeout(Duration::from_secs(5)),
            ScribeError::Cancelled,
            ScribeError::Busy,
        ];
        for err in errors {
            assert!(!err.user_message().is_empty(), "{:?}", err);
        }
    }

    #[test]
    fn test_analysis_failures_share_user_message() {
        assert_eq!(
            ScribeError::EmptyResponse.user_message(),
            "Failed to analyze image. Please try again."
        );
        assert_eq!(
            ScribeError::AnalysisFailed("x".into()).user_message(),
            "Failed to analyze image. Please try again."
        );
    }

    #[test]
    fn test_sanitize_redacts_api_keys() {
        let text = "API key AIzaSyA1234567890abcdefghijklmnopqrstu is invalid";
        let cleaned = sanitize_error_message(text);
        assert!(!cleaned.contains("AIzaSy"));
        assert!(cleaned.contains("[REDACTED]"));
        assert!(cleaned.ends_with("is invalid"));
    }

    #[test]
    fn test_sanitize_truncates_long_bodies() {
        let text = "x".repeat(2000);
        let cleaned = sanitize_error_message(&text);
        assert!(cleaned.len() <= 503);
        assert!(cleaned.ends_with("..."));
    }

    #[test]
    fn test_parse_retry_after() {
        let mut headers = reqwest::header::HeaderMap::new();
        assert_eq!(parse_retry_after(&headers), None);
        headers.insert(reqwest::header::RETRY_AFTER, "17".parse().unwrap());
        assert_eq!(parse_retry_after(&headers), Some(17));
    }
}
