use std::cmp::Reverse;

use super::traits::VideoHost;

/// Registry of video hosts.
pub struct VideoHostRegistry {
    hosts: Vec<Box<dyn VideoHost>>,
}

impl VideoHostRegistry {
    /// Create a new empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self { hosts: Vec::new() }
    }

    /// Registry with every built-in host using its public endpoints.
    #[must_use]
    pub fn with_default_hosts() -> Self {
        let mut registry = Self::new();
        registry.register(Box::new(super::youtube::YouTubeHost::new()));
        registry.register(Box::new(super::dailymotion::DailymotionHost::new()));
        registry.register(Box::new(super::vimeo::VimeoHost::new()));
        registry
    }

    /// Register a host.
    pub fn register(&mut self, host: Box<dyn VideoHost>) {
        self.hosts.push(host);
        // Sort by priority (highest first)
        self.hosts.sort_by_key(|h| Reverse(h.priority()));
    }

    /// Find the host that recognises a URL.
    #[must_use]
    pub fn find_host(&self, url: &str) -> Option<&dyn VideoHost> {
        self.hosts
            .iter()
            .find(|h| h.can_handle(url))
            .map(AsRef::as_ref)
    }

    /// Derive the canonical thumbnail URL without any network call.
    ///
    /// Returns `None` for unknown hosts, malformed URLs, and hosts that have
    /// no deterministic thumbnail pattern.
    #[must_use]
    pub fn extract(&self, url: &str) -> Option<String> {
        self.find_host(url).and_then(|h| h.thumbnail_url(url))
    }

    /// Get all registered hosts.
    #[must_use]
    pub fn hosts(&self) -> &[Box<dyn VideoHost>] {
        &self.hosts
    }
}

impl Default for VideoHostRegistry {
    fn default() -> Self {
        Self::with_default_hosts()
    }
}
