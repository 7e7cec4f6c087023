//! Persistence of normalized thumbnails.
//!
//! The backend is chosen once from configuration; callers only see
//! [`ThumbnailStore`].

mod local;
mod s3;

use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;

use crate::config::{Config, StorageBackend};
use crate::constants::{THUMBNAIL_HEIGHT, THUMBNAIL_WIDTH};
use crate::error::ThumbnailError;

pub use local::LocalStore;
pub use s3::{public_url_for, S3Store};

/// A normalized PNG waiting to be persisted under an opaque unique key.
#[derive(Debug, Clone)]
pub struct StoredImage {
    pub key: String,
    pub bytes: Vec<u8>,
}

impl StoredImage {
    pub const WIDTH: u32 = THUMBNAIL_WIDTH;
    pub const HEIGHT: u32 = THUMBNAIL_HEIGHT;

    /// Wrap normalized bytes under a fresh key derived from `prefix`.
    #[must_use]
    pub fn new(prefix: &str, bytes: Vec<u8>) -> Self {
        Self {
            key: unique_key(prefix),
            bytes,
        }
    }
}

/// `{prefix}-{unix millis}-{random}.png`
#[must_use]
pub fn unique_key(prefix: &str) -> String {
    format!(
        "{prefix}-{}-{:016x}.png",
        Utc::now().timestamp_millis(),
        rand::random::<u64>()
    )
}

/// Destination for normalized thumbnails.
#[async_trait]
pub trait ThumbnailStore: Send + Sync {
    /// Unique identifier for this backend.
    fn backend_id(&self) -> &'static str;

    /// Persist the image and return a publicly resolvable reference.
    ///
    /// # Errors
    ///
    /// Returns [`ThumbnailError::Storage`] if the write fails. No partial
    /// object is left under the final key.
    async fn store(&self, image: &StoredImage) -> Result<String, ThumbnailError>;
}

/// Build the backend selected by configuration.
///
/// # Errors
///
/// Returns an error if the S3 client cannot be created.
pub fn from_config(config: &Config) -> Result<Arc<dyn ThumbnailStore>> {
    match config.storage_backend {
        StorageBackend::Local => Ok(Arc::new(LocalStore::new(
            config.public_dir.clone(),
            config.thumbnail_subdir.clone(),
        ))),
        StorageBackend::S3 => {
            let store = S3Store::new(config).context("Failed to initialize S3 store")?;
            Ok(Arc::new(store))
        }
    }
}
