//! Rasterize the first visible viewport of a page or PDF.

mod document;
mod screenshot;

use std::time::Duration;

use async_trait::async_trait;

use crate::error::ThumbnailError;

pub use document::MaterializedDocument;
pub use screenshot::{ChromiumRenderer, RenderConfig};

/// Default viewport width in pixels.
pub const DEFAULT_VIEWPORT_WIDTH: u32 = 1280;

/// Default viewport height in pixels.
pub const DEFAULT_VIEWPORT_HEIGHT: u32 = 720;

/// What is being rendered; decides how long to let the view settle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderKind {
    Page,
    Document,
}

impl RenderKind {
    /// Extra delay after the network goes idle, before capture.
    #[must_use]
    pub fn settle_delay(self) -> Duration {
        match self {
            Self::Page => Duration::from_millis(500),
            // The PDF viewer paints after its own load completes
            Self::Document => Duration::from_millis(1500),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderViewport {
    pub width: u32,
    pub height: u32,
}

impl Default for RenderViewport {
    fn default() -> Self {
        Self {
            width: DEFAULT_VIEWPORT_WIDTH,
            height: DEFAULT_VIEWPORT_HEIGHT,
        }
    }
}

/// Something that can turn a loadable URL into screenshot bytes.
///
/// Implementations own their isolated process for exactly one call and must
/// tear it down on every exit path.
#[async_trait]
pub trait RenderBackend: Send + Sync {
    /// Render `url` (http, https or file scheme) and capture the first viewport.
    ///
    /// # Errors
    ///
    /// Returns [`ThumbnailError::Render`] if the process fails to launch, the
    /// target fails to load in time, or the capture fails.
    async fn render_first_view(
        &self,
        url: &str,
        kind: RenderKind,
        viewport: RenderViewport,
    ) -> Result<Vec<u8>, ThumbnailError>;
}

/// Check that the render process can load the target directly.
pub(crate) fn validate_target(url: &str) -> Result<url::Url, ThumbnailError> {
    let parsed =
        url::Url::parse(url).map_err(|e| ThumbnailError::render(format!("invalid URL {url}: {e}")))?;
    if !matches!(parsed.scheme(), "http" | "https" | "file") {
        return Err(ThumbnailError::render(format!(
            "unsupported scheme for render: {}",
            parsed.scheme()
        )));
    }
    Ok(parsed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_target() {
        assert!(validate_target("https://example.com/recipe").is_ok());
        assert!(validate_target("file:///tmp/document.pdf").is_ok());
        assert!(validate_target("javascript:alert(1)").is_err());
        assert!(validate_target("not a url").is_err());
    }

    #[test]
    fn test_document_settles_longer() {
        assert!(RenderKind::Document.settle_delay() > RenderKind::Page.settle_delay());
    }

    #[test]
    fn test_default_viewport_is_wide() {
        let viewport = RenderViewport::default();
        assert_eq!(viewport.width, DEFAULT_VIEWPORT_WIDTH);
        assert_eq!(viewport.height, DEFAULT_VIEWPORT_HEIGHT);
    }
}
