//! Shared constants used across the application.

/// User agent string used for outbound fetches.
///
/// A realistic browser user agent; some hosts refuse preview metadata to
/// obvious bots.
pub const FETCH_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Width of every stored thumbnail in pixels.
pub const THUMBNAIL_WIDTH: u32 = 640;

/// Height of every stored thumbnail in pixels.
pub const THUMBNAIL_HEIGHT: u32 = 360;

/// Content type of every stored thumbnail.
pub const THUMBNAIL_CONTENT_TYPE: &str = "image/png";
