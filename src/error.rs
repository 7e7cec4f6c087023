use thiserror::Error;

/// Failures produced by the thumbnail pipeline stages.
///
/// Stage failures are normally swallowed by the resolver and turned into a
/// fallthrough; only [`ThumbnailError::PlaceholderUnavailable`] escapes it.
#[derive(Debug, Error)]
pub enum ThumbnailError {
    #[error("fetch failed for {url}: {message}")]
    Fetch { url: String, message: String },
    #[error("render failed: {0}")]
    Render(String),
    #[error("failed to decode image: {0}")]
    ImageDecode(#[source] image::ImageError),
    #[error("failed to encode image: {0}")]
    ImageEncode(#[source] image::ImageError),
    #[error("failed to store {key}: {message}")]
    Storage { key: String, message: String },
    #[error("image worker failed: {0}")]
    Worker(String),
    #[error("placeholder thumbnail could not be stored: {0}")]
    PlaceholderUnavailable(#[source] Box<ThumbnailError>),
}

impl ThumbnailError {
    pub(crate) fn fetch(url: &str, message: impl std::fmt::Display) -> Self {
        Self::Fetch {
            url: url.to_string(),
            message: message.to_string(),
        }
    }

    pub(crate) fn render(message: impl std::fmt::Display) -> Self {
        Self::Render(message.to_string())
    }

    pub(crate) fn storage(key: &str, message: impl std::fmt::Display) -> Self {
        Self::Storage {
            key: key.to_string(),
            message: message.to_string(),
        }
    }
}
