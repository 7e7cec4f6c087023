use std::path::PathBuf;

use async_trait::async_trait;
use tracing::debug;

use super::{StoredImage, ThumbnailStore};
use crate::error::ThumbnailError;
use crate::fs_utils::write_atomic;

/// Files under a publicly served directory.
///
/// An image stored as `key` lands at `{public_dir}/{subdir}/{key}` and is
/// referenced as `/{subdir}/{key}`.
#[derive(Debug, Clone)]
pub struct LocalStore {
    public_dir: PathBuf,
    subdir: String,
}

impl LocalStore {
    #[must_use]
    pub fn new(public_dir: PathBuf, subdir: impl Into<String>) -> Self {
        Self {
            public_dir,
            subdir: subdir.into().trim_matches('/').to_string(),
        }
    }

    /// Directory the images are written to.
    #[must_use]
    pub fn directory(&self) -> PathBuf {
        self.public_dir.join(&self.subdir)
    }
}

#[async_trait]
impl ThumbnailStore for LocalStore {
    fn backend_id(&self) -> &'static str {
        "local"
    }

    async fn store(&self, image: &StoredImage) -> Result<String, ThumbnailError> {
        if image.key.contains(['/', '\\']) || image.key.starts_with('.') {
            return Err(ThumbnailError::storage(&image.key, "invalid key"));
        }

        let path = self.directory().join(&image.key);
        write_atomic(&path, &image.bytes)
            .await
            .map_err(|e| ThumbnailError::storage(&image.key, format!("{e:#}")))?;

        debug!(path = %path.display(), "Thumbnail stored locally");
        Ok(format!("/{}/{}", self.subdir, image.key))
    }
}
