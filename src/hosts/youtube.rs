use once_cell::sync::Lazy;
use regex::Regex;

use super::traits::{is_valid_id, parse_host, VideoHost};

static PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    vec![
        Regex::new(r"^https?://(www\.)?youtube\.com/watch").unwrap(),
        Regex::new(r"^https?://(www\.)?youtube\.com/shorts/").unwrap(),
        Regex::new(r"^https?://(www\.)?youtube\.com/live/").unwrap(),
        Regex::new(r"^https?://(www\.)?youtube\.com/embed/").unwrap(),
        Regex::new(r"^https?://(www\.)?youtube-nocookie\.com/embed/").unwrap(),
        Regex::new(r"^https?://youtu\.be/").unwrap(),
        Regex::new(r"^https?://m\.youtube\.com/").unwrap(),
    ]
});

const OEMBED_ENDPOINT: &str = "https://www.youtube.com/oembed";

pub struct YouTubeHost {
    embed_endpoint: String,
}

impl YouTubeHost {
    #[must_use]
    pub fn new() -> Self {
        Self::with_embed_endpoint(OEMBED_ENDPOINT)
    }

    /// Use a different oEmbed endpoint (mirrors, tests).
    #[must_use]
    pub fn with_embed_endpoint(endpoint: impl Into<String>) -> Self {
        Self {
            embed_endpoint: endpoint.into(),
        }
    }
}

impl Default for YouTubeHost {
    fn default() -> Self {
        Self::new()
    }
}

impl VideoHost for YouTubeHost {
    fn site_id(&self) -> &'static str {
        "youtube"
    }

    fn url_patterns(&self) -> &[Regex] {
        &PATTERNS
    }

    fn priority(&self) -> i32 {
        100
    }

    fn video_id(&self, url: &str) -> Option<String> {
        let (parsed, host) = parse_host(url)?;
        let mut segments = parsed.path_segments()?.filter(|s| !s.is_empty());

        let id = match host.as_str() {
            "youtu.be" => segments.next()?.to_string(),
            "youtube.com" | "m.youtube.com" | "youtube-nocookie.com" => match segments.next()? {
                "watch" => parsed
                    .query_pairs()
                    .find(|(k, _)| k == "v")
                    .map(|(_, v)| v.into_owned())?,
                "embed" | "shorts" | "live" | "v" => segments.next()?.to_string(),
                _ => return None,
            },
            _ => return None,
        };

        is_valid_id(&id).then_some(id)
    }

    fn thumbnail_url(&self, url: &str) -> Option<String> {
        self.video_id(url)
            .map(|id| format!("https://img.youtube.com/vi/{id}/hqdefault.jpg"))
    }

    fn embed_endpoint(&self) -> Option<&str> {
        Some(&self.embed_endpoint)
    }
}
