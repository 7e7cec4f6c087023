use std::path::Path;

use tempfile::NamedTempFile;
use tracing::{debug, warn};

use crate::error::ThumbnailError;

/// Raw document bytes written to a uniquely named file the render process
/// can load through a `file://` URL.
///
/// The file is removed by [`MaterializedDocument::cleanup`], or on drop if
/// the caller unwinds before reaching it.
#[derive(Debug)]
pub struct MaterializedDocument {
    file: NamedTempFile,
    url: String,
}

impl MaterializedDocument {
    /// Write `bytes` to a fresh `document-*.pdf` file under `dir`.
    ///
    /// # Errors
    ///
    /// Returns [`ThumbnailError::Render`] for empty input or any I/O failure.
    pub async fn write(dir: &Path, bytes: &[u8]) -> Result<Self, ThumbnailError> {
        if bytes.is_empty() {
            return Err(ThumbnailError::render("document is empty"));
        }

        tokio::fs::create_dir_all(dir).await.map_err(|e| {
            ThumbnailError::render(format!("failed to create {}: {e}", dir.display()))
        })?;
        let dir = tokio::fs::canonicalize(dir).await.map_err(|e| {
            ThumbnailError::render(format!("failed to resolve {}: {e}", dir.display()))
        })?;

        let file = tempfile::Builder::new()
            .prefix("document-")
            .suffix(".pdf")
            .tempfile_in(&dir)
            .map_err(|e| ThumbnailError::render(format!("failed to create temp file: {e}")))?;

        tokio::fs::write(file.path(), bytes)
            .await
            .map_err(|e| ThumbnailError::render(format!("failed to write document: {e}")))?;

        let url = url::Url::from_file_path(file.path())
            .map_err(|()| {
                ThumbnailError::render(format!(
                    "cannot build file URL for {}",
                    file.path().display()
                ))
            })?
            .to_string();

        debug!(path = %file.path().display(), size = bytes.len(), "Document materialized");

        Ok(Self { file, url })
    }

    /// `file://` URL of the materialized document.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        self.file.path()
    }

    /// Delete the file, logging rather than failing.
    pub fn cleanup(self) {
        let path = self.file.path().to_path_buf();
        if let Err(e) = self.file.close() {
            warn!(path = %path.display(), error = %e, "Failed to remove materialized document");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_write_and_cleanup() {
        let dir = tempfile::TempDir::new().unwrap();
        let doc = MaterializedDocument::write(dir.path(), b"%PDF-1.4 test")
            .await
            .unwrap();

        let path = doc.path().to_path_buf();
        assert!(path.exists());
        assert!(doc.url().starts_with("file://"));
        assert!(doc.url().ends_with(".pdf"));
        assert_eq!(std::fs::read(&path).unwrap(), b"%PDF-1.4 test");

        doc.cleanup();
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_unique_names() {
        let dir = tempfile::TempDir::new().unwrap();
        let a = MaterializedDocument::write(dir.path(), b"a").await.unwrap();
        let b = MaterializedDocument::write(dir.path(), b"b").await.unwrap();
        assert_ne!(a.path(), b.path());
    }

    #[tokio::test]
    async fn test_empty_document_rejected() {
        let dir = tempfile::TempDir::new().unwrap();
        let result = MaterializedDocument::write(dir.path(), b"").await;
        assert!(matches!(result, Err(ThumbnailError::Render(_))));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_removed_on_drop() {
        let dir = tempfile::TempDir::new().unwrap();
        let doc = MaterializedDocument::write(dir.path(), b"x").await.unwrap();
        let path = doc.path().to_path_buf();
        drop(doc);
        assert!(!path.exists());
    }
}
