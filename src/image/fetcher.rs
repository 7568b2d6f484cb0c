//! Image fetcher trait and the HTTP implementation.

use crate::error::{Result, ScribeError};
use crate::image::types::{EncodedImage, ImageFormat};
use async_trait::async_trait;
use std::time::Duration;
use url::Url;

const NETWORK_ERROR_HINT: &str = "Unable to access this image directly. The server hosting the \
    image may not allow external access. Please try an image from a more open source like \
    Wikimedia Commons or Unsplash, or a direct file link.";

/// Retrieves an image and encodes it for the model.
#[async_trait]
pub trait ImageFetcher: Send + Sync {
    /// Fetches `url` and returns its bytes as base64.
    async fn fetch(&self, url: &Url) -> Result<EncodedImage>;
}

/// Builder for HttpImageFetcher.
#[derive(Debug, Clone)]
pub struct HttpImageFetcherBuilder {
    timeout: Duration,
    user_agent: String,
}

impl Default for HttpImageFetcherBuilder {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            user_agent: concat!("visionary-scribe/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl HttpImageFetcherBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the per-request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the User-Agent header sent to image hosts.
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Builds the fetcher.
    pub fn build(self) -> Result<HttpImageFetcher> {
        let client = reqwest::Client::builder()
            .timeout(self.timeout)
            .user_agent(self.user_agent)
            .build()
            .map_err(|e| ScribeError::Config(format!("failed to build HTTP client: {}", e)))?;

        Ok(HttpImageFetcher {
            client,
            timeout: self.timeout,
        })
    }
}

/// Fetches images over HTTP(S) with reqwest.
pub struct HttpImageFetcher {
    client: reqwest::Client,
    timeout: Duration,
}

impl HttpImageFetcher {
    /// Creates a new `HttpImageFetcherBuilder`.
    pub fn builder() -> HttpImageFetcherBuilder {
        HttpImageFetcherBuilder::new()
    }

    fn map_transport_error(&self, err: reqwest::Error) -> ScribeError {
        if err.is_timeout() {
            return ScribeError::Timeout(self.timeout);
        }
        tracing::debug!(error = %err, "image fetch transport failure");
        ScribeError::Network(NETWORK_ERROR_HINT.to_string())
    }
}

#[async_trait]
impl ImageFetcher for HttpImageFetcher {
    async fn fetch(&self, url: &Url) -> Result<EncodedImage> {
        tracing::debug!(%url, "fetching image");

        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| self.map_transport_error(e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ScribeError::Http {
                status: status.as_u16(),
                reason: status.canonical_reason().unwrap_or("Unknown").to_string(),
            });
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        let bytes = response
            .bytes()
            .await
            .map_err(|e| self.map_transport_error(e))?;

        check_content_type(content_type.as_deref(), &bytes)?;

        let encoded = EncodedImage::from_bytes(&bytes, content_type.as_deref());
        tracing::debug!(
            bytes = bytes.len(),
            mime_type = %encoded.mime_type,
            "image fetched"
        );
        Ok(encoded)
    }
}

/// Accepts `image/*` content types. A missing header falls back to sniffing
/// the magic bytes; an explicit non-image type is always rejected.
fn check_content_type(content_type: Option<&str>, bytes: &[u8]) -> Result<()> {
    match content_type {
        Some(ct) if ct.trim().to_ascii_lowercase().starts_with("image/") => Ok(()),
        Some(ct) => Err(ScribeError::NotAnImage {
            content_type: ct.to_string(),
        }),
        None if ImageFormat::from_magic_bytes(bytes).is_some() => Ok(()),
        None => Err(ScribeError::NotAnImage {
            content_type: "unknown".into(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::{refused_url, serve_once};
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine;

    #[test]
    fn test_builder_defaults() {
        let builder = HttpImageFetcherBuilder::new();
        assert_eq!(builder.timeout, Duration::from_secs(30));
        assert!(builder.user_agent.starts_with("visionary-scribe/"));
    }

    #[test]
    fn test_builder_custom_timeout() {
        let fetcher = HttpImageFetcher::builder()
            .timeout(Duration::from_secs(5))
            .build()
            .unwrap();
        assert_eq!(fetcher.timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_content_type_accepts_images() {
        assert!(check_content_type(Some("image/jpeg"), b"").is_ok());
        assert!(check_content_type(Some("Image/PNG"), b"").is_ok());
        assert!(check_content_type(Some("image/webp; q=1"), b"").is_ok());
    }

    #[test]
    fn test_content_type_rejects_html() {
        let err = check_content_type(Some("text/html; charset=utf-8"), b"<html>").unwrap_err();
        assert!(matches!(err, ScribeError::NotAnImage { ref content_type } if content_type.starts_with("text/html")));
    }

    #[test]
    fn test_missing_content_type_sniffs_bytes() {
        let jpeg = [0xFF, 0xD8, 0xFF, 0xE0];
        assert!(check_content_type(None, &jpeg).is_ok());
        assert!(matches!(
            check_content_type(None, b"hello"),
            Err(ScribeError::NotAnImage { .. })
        ));
    }

    async fn fetch_from(base: &str, path: &str) -> Result<EncodedImage> {
        let url = Url::parse(&format!("{}{}", base, path)).unwrap();
        HttpImageFetcher::builder().build().unwrap().fetch(&url).await
    }

    #[tokio::test]
    async fn test_fetch_encodes_image() {
        let png = vec![0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0x00];
        let base = serve_once("200 OK", "image/png", png.clone()).await;

        let image = fetch_from(&base, "/a.png").await.unwrap();
        assert_eq!(image.mime_type, "image/png");
        assert_eq!(image.data, STANDARD.encode(&png));
    }

    #[tokio::test]
    async fn test_fetch_non_success_status_is_http_error() {
        let base = serve_once("404 Not Found", "text/plain", b"gone".to_vec()).await;

        let err = fetch_from(&base, "/missing.jpg").await.unwrap_err();
        assert!(matches!(
            err,
            ScribeError::Http { status: 404, ref reason } if reason == "Not Found"
        ));
    }

    #[tokio::test]
    async fn test_fetch_html_page_is_not_an_image() {
        let base = serve_once("200 OK", "text/html", b"<html></html>".to_vec()).await;

        let err = fetch_from(&base, "/page").await.unwrap_err();
        assert!(matches!(err, ScribeError::NotAnImage { ref content_type } if content_type == "text/html"));
    }

    #[tokio::test]
    async fn test_fetch_refused_connection_is_network_error() {
        let base = refused_url().await;

        let err = fetch_from(&base, "/a.jpg").await.unwrap_err();
        match err {
            ScribeError::Network(msg) => assert_eq!(msg, NETWORK_ERROR_HINT),
            other => panic!("expected Network, got {:?}", other),
        }
    }

    #[test]
    fn test_network_hint_suggests_alternatives() {
        assert!(NETWORK_ERROR_HINT.contains("external access"));
        assert!(NETWORK_ERROR_HINT.contains("Wikimedia Commons"));
    }
}
