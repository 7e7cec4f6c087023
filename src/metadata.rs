//! Outbound lookups: embed-info endpoints, page preview tags, image bytes.
//!
//! Every call is a single attempt bounded by the client timeout. Lookups fail
//! closed to `None`; only the byte fetch reports why it failed.

use std::time::Duration;

use reqwest::redirect::Policy;
use serde::Deserialize;
use tracing::debug;

use crate::constants::FETCH_USER_AGENT;
use crate::error::ThumbnailError;
use crate::hosts::VideoHost;
use crate::og_extractor::extract_preview_image;

/// Upper bound on downloaded image size.
pub const MAX_IMAGE_BYTES: usize = 20 * 1024 * 1024;

/// Upper bound on page markup read while looking for preview tags.
pub const MAX_PAGE_BYTES: usize = 5 * 1024 * 1024;

/// Optional fields of an oEmbed-style response. Anything missing or
/// malformed is treated as absent.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EmbedInfo {
    #[serde(default)]
    pub thumbnail_url: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub provider_name: Option<String>,
}

impl EmbedInfo {
    /// Parse a response body, failing closed.
    #[must_use]
    pub fn parse(body: &str) -> Option<Self> {
        serde_json::from_str(body).ok()
    }

    /// The thumbnail URL if it is a usable absolute http(s) URL.
    #[must_use]
    pub fn thumbnail(&self) -> Option<&str> {
        let raw = self.thumbnail_url.as_deref()?.trim();
        let parsed = url::Url::parse(raw).ok()?;
        matches!(parsed.scheme(), "http" | "https").then_some(raw)
    }
}

/// HTTP client for metadata lookups and image downloads.
#[derive(Debug, Clone)]
pub struct MetadataFetcher {
    client: reqwest::Client,
    max_image_bytes: usize,
    max_page_bytes: usize,
}

impl MetadataFetcher {
    /// Create a fetcher whose every request is bounded by `timeout`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(timeout: Duration) -> Result<Self, ThumbnailError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .redirect(Policy::limited(10))
            .user_agent(FETCH_USER_AGENT)
            .build()
            .map_err(|e| ThumbnailError::fetch("<client>", e))?;
        Ok(Self {
            client,
            max_image_bytes: MAX_IMAGE_BYTES,
            max_page_bytes: MAX_PAGE_BYTES,
        })
    }

    /// Override the download caps.
    #[must_use]
    pub fn with_limits(mut self, max_image_bytes: usize, max_page_bytes: usize) -> Self {
        self.max_image_bytes = max_image_bytes;
        self.max_page_bytes = max_page_bytes;
        self
    }

    /// Look up the thumbnail advertised by the host's embed endpoint.
    pub async fn fetch_embed_thumbnail(&self, host: &dyn VideoHost, url: &str) -> Option<String> {
        let endpoint = host.embed_endpoint()?;
        let request_url = format!(
            "{endpoint}?url={}&format=json",
            urlencoding::encode(url)
        );

        debug!(host = host.site_id(), url = %url, "Fetching embed info");

        let response = match self.client.get(&request_url).send().await {
            Ok(r) => r,
            Err(e) => {
                debug!(host = host.site_id(), error = %e, "Embed request failed");
                return None;
            }
        };

        if !response.status().is_success() {
            debug!(host = host.site_id(), status = %response.status(), "Embed request rejected");
            return None;
        }

        let body = response.text().await.ok()?;
        let info = EmbedInfo::parse(&body)?;
        info.thumbnail().map(ToString::to_string)
    }

    /// Fetch a page and return its social preview image as an absolute URL.
    ///
    /// Relative image paths are resolved against the final URL after redirects.
    pub async fn fetch_page_preview_image(&self, url: &str) -> Option<String> {
        debug!(url = %url, "Fetching page preview metadata");

        let response = match self.client.get(url).send().await {
            Ok(r) => r,
            Err(e) => {
                debug!(url = %url, error = %e, "Page request failed");
                return None;
            }
        };

        if !response.status().is_success() {
            debug!(url = %url, status = %response.status(), "Page request rejected");
            return None;
        }

        let final_url = response.url().clone();
        let body = match read_capped(response, self.max_page_bytes).await {
            Ok(b) => b,
            Err(e) => {
                debug!(url = %url, error = %e, "Page body unusable");
                return None;
            }
        };

        extract_preview_image(&String::from_utf8_lossy(&body), &final_url)
    }

    /// Download image bytes.
    ///
    /// # Errors
    ///
    /// Returns [`ThumbnailError::Fetch`] on network failure, timeout,
    /// non-success status, or an empty or oversized body.
    pub async fn fetch_image_bytes(&self, url: &str) -> Result<Vec<u8>, ThumbnailError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| ThumbnailError::fetch(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ThumbnailError::fetch(url, format!("HTTP {status}")));
        }

        let bytes = read_capped(response, self.max_image_bytes)
            .await
            .map_err(|e| ThumbnailError::fetch(url, e))?;

        if bytes.is_empty() {
            return Err(ThumbnailError::fetch(url, "empty body"));
        }

        debug!(url = %url, size = bytes.len(), "Image downloaded");
        Ok(bytes)
    }
}

/// Read a response body chunk by chunk, giving up as soon as it exceeds
/// `limit` bytes. A declared Content-Length over the limit fails up front.
async fn read_capped(mut response: reqwest::Response, limit: usize) -> Result<Vec<u8>, String> {
    if response
        .content_length()
        .is_some_and(|len| len > limit as u64)
    {
        return Err(format!("body larger than {limit} bytes"));
    }

    let mut body = Vec::new();
    while let Some(chunk) = response.chunk().await.map_err(|e| e.to_string())? {
        if body.len() + chunk.len() > limit {
            return Err(format!("body larger than {limit} bytes"));
        }
        body.extend_from_slice(&chunk);
    }
    Ok(body)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_embed_info_parse() {
        let info = EmbedInfo::parse(
            r#"{"title":"Bolsa","provider_name":"YouTube","thumbnail_url":"https://i.ytimg.com/vi/x/hqdefault.jpg","width":200}"#,
        )
        .unwrap();
        assert_eq!(info.thumbnail(), Some("https://i.ytimg.com/vi/x/hqdefault.jpg"));
        assert_eq!(info.provider_name.as_deref(), Some("YouTube"));
    }

    #[test]
    fn test_embed_info_fails_closed() {
        assert!(EmbedInfo::parse("not json").is_none());
        assert!(EmbedInfo::parse("[1,2,3]").is_none());

        let info = EmbedInfo::parse(r#"{"title":"no thumbnail"}"#).unwrap();
        assert_eq!(info.thumbnail(), None);

        let info = EmbedInfo::parse(r#"{"thumbnail_url":"/relative.jpg"}"#).unwrap();
        assert_eq!(info.thumbnail(), None);
    }

    fn response(body: Vec<u8>) -> reqwest::Response {
        reqwest::Response::from(axum::http::Response::new(body))
    }

    #[tokio::test]
    async fn test_read_capped_within_limit() {
        let body = read_capped(response(vec![7; 64]), 64).await.unwrap();
        assert_eq!(body.len(), 64);
    }

    #[tokio::test]
    async fn test_read_capped_stops_over_limit() {
        let err = read_capped(response(vec![7; 65]), 64).await.unwrap_err();
        assert!(err.contains("larger than 64 bytes"));
    }

    #[test]
    fn test_embed_info_wrong_field_type_is_absence() {
        // A non-string thumbnail_url makes the whole body unusable
        assert!(EmbedInfo::parse(r#"{"thumbnail_url": 42}"#).is_none());
    }
}
