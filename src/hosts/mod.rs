mod dailymotion;
mod registry;
mod traits;
mod vimeo;
mod youtube;

pub use dailymotion::DailymotionHost;
pub use registry::VideoHostRegistry;
pub use traits::VideoHost;
pub use vimeo::VimeoHost;
pub use youtube::YouTubeHost;

/// Global registry of the built-in video hosts.
pub static VIDEO_HOSTS: std::sync::LazyLock<VideoHostRegistry> =
    std::sync::LazyLock::new(VideoHostRegistry::with_default_hosts);

/// Derive a canonical thumbnail URL using the built-in hosts.
#[must_use]
pub fn extract_thumbnail_url(url: &str) -> Option<String> {
    VIDEO_HOSTS.extract(url)
}
