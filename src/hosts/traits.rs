use regex::Regex;

/// A video platform whose URLs can be mapped to a thumbnail.
///
/// `thumbnail_url` is the pure extraction path: no I/O, `None` for anything
/// it does not recognise. Hosts without a deterministic thumbnail pattern keep
/// the default and rely on their embed endpoint instead.
pub trait VideoHost: Send + Sync {
    /// Unique identifier for this host.
    fn site_id(&self) -> &'static str;

    /// URL patterns this host matches.
    fn url_patterns(&self) -> &[Regex];

    /// Check if this host recognises the given URL.
    fn can_handle(&self, url: &str) -> bool {
        self.url_patterns().iter().any(|p| p.is_match(url))
    }

    /// Priority for host selection (higher = preferred).
    fn priority(&self) -> i32 {
        0
    }

    /// Stable per-video identifier, if the URL has one of the known shapes.
    fn video_id(&self, _url: &str) -> Option<String> {
        None
    }

    /// Canonical thumbnail URL built from the video identifier.
    fn thumbnail_url(&self, _url: &str) -> Option<String> {
        None
    }

    /// Embed-info (oEmbed style) endpoint for this host, if it has one.
    fn embed_endpoint(&self) -> Option<&str> {
        None
    }
}

/// Identifiers are restricted to URL-safe characters so they can be dropped
/// into a thumbnail template verbatim.
pub(crate) fn is_valid_id(id: &str) -> bool {
    !id.is_empty()
        && id.len() <= 64
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

/// Parse an http(s) URL and return it with its lowercased host, minus `www.`.
pub(crate) fn parse_host(url: &str) -> Option<(url::Url, String)> {
    let parsed = url::Url::parse(url).ok()?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return None;
    }
    let host = parsed.host_str()?.to_lowercase();
    let host = host.strip_prefix("www.").unwrap_or(&host).to_string();
    Some((parsed, host))
}
