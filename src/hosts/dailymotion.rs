use regex::Regex;

use super::traits::{is_valid_id, parse_host, VideoHost};

static PATTERNS: std::sync::LazyLock<Vec<Regex>> = std::sync::LazyLock::new(|| {
    vec![
        Regex::new(r"^https?://(www\.)?dailymotion\.com/video/").unwrap(),
        Regex::new(r"^https?://(www\.)?dailymotion\.com/embed/video/").unwrap(),
        Regex::new(r"^https?://dai\.ly/").unwrap(),
    ]
});

const OEMBED_ENDPOINT: &str = "https://www.dailymotion.com/services/oembed";

pub struct DailymotionHost {
    embed_endpoint: String,
}

impl DailymotionHost {
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

impl Default for DailymotionHost {
    fn default() -> Self {
        Self::new()
    }
}

impl VideoHost for DailymotionHost {
    fn site_id(&self) -> &'static str {
        "dailymotion"
    }

    fn url_patterns(&self) -> &[Regex] {
        &PATTERNS
    }

    fn priority(&self) -> i32 {
        50
    }

    fn video_id(&self, url: &str) -> Option<String> {
        let (parsed, host) = parse_host(url)?;
        let mut segments = parsed.path_segments()?.filter(|s| !s.is_empty());

        let raw = match host.as_str() {
            "dai.ly" => segments.next()?,
            "dailymotion.com" => match segments.next()? {
                "video" => segments.next()?,
                "embed" => match (segments.next()?, segments.next()?) {
                    ("video", id) => id,
                    _ => return None,
                },
                _ => return None,
            },
            _ => return None,
        };

        // Canonical links append a title slug: /video/x8abc12_some-title
        let id = raw.split('_').next().unwrap_or_default().to_string();
        is_valid_id(&id).then_some(id)
    }

    fn thumbnail_url(&self, url: &str) -> Option<String> {
        self.video_id(url)
            .map(|id| format!("https://www.dailymotion.com/thumbnail/video/{id}"))
    }

    fn embed_endpoint(&self) -> Option<&str> {
        Some(&self.embed_endpoint)
    }
}
