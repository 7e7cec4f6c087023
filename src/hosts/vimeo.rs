use regex::Regex;

use super::traits::VideoHost;

static PATTERNS: std::sync::LazyLock<Vec<Regex>> = std::sync::LazyLock::new(|| {
    vec![
        Regex::new(r"^https?://(www\.)?vimeo\.com/").unwrap(),
        Regex::new(r"^https?://player\.vimeo\.com/video/").unwrap(),
    ]
});

const OEMBED_ENDPOINT: &str = "https://vimeo.com/api/oembed.json";

/// Vimeo thumbnails live on a CDN path that cannot be derived from the video
/// id, so this host only contributes its oEmbed endpoint.
pub struct VimeoHost {
    embed_endpoint: String,
}

impl VimeoHost {
    #[must_use]
    pub fn new() -> Self {
        Self::with_embed_endpoint(OEMBED_ENDPOINT)
    }

    #[must_use]
    pub fn with_embed_endpoint(endpoint: impl Into<String>) -> Self {
        Self {
            embed_endpoint: endpoint.into(),
        }
    }
}

impl Default for VimeoHost {
    fn default() -> Self {
        Self::new()
    }
}

impl VideoHost for VimeoHost {
    fn site_id(&self) -> &'static str {
        "vimeo"
    }

    fn url_patterns(&self) -> &[Regex] {
        &PATTERNS
    }

    fn priority(&self) -> i32 {
        50
    }

    fn embed_endpoint(&self) -> Option<&str> {
        Some(&self.embed_endpoint)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_can_handle() {
        let host = VimeoHost::new();
        assert!(host.can_handle("https://vimeo.com/76979871"));
        assert!(host.can_handle("https://player.vimeo.com/video/76979871"));
        assert!(!host.can_handle("https://youtu.be/abc123"));
    }

    #[test]
    fn test_never_derives_thumbnail() {
        let host = VimeoHost::new();
        assert!(host.thumbnail_url("https://vimeo.com/76979871").is_none());
        assert_eq!(host.embed_endpoint(), Some(OEMBED_ENDPOINT));
    }
}
