//! Thumbnail resolution: the fallback pipeline per source kind.
//!
//! Stages are tried strictly in order and each at most once. A stage that
//! fails is logged and skipped; the placeholder is the last resort, so a
//! resolution only fails when even the placeholder cannot be stored.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{debug, error, info, instrument, warn};

use crate::config::Config;
use crate::error::ThumbnailError;
use crate::hosts::VideoHostRegistry;
use crate::metadata::MetadataFetcher;
use crate::normalize::normalize;
use crate::placeholder::placeholder_png;
use crate::render::{
    ChromiumRenderer, MaterializedDocument, RenderBackend, RenderConfig, RenderKind,
    RenderViewport,
};
use crate::source::{Locator, Origin, SourceKind, SourceReference, ThumbnailResult};
use crate::storage::{self, StoredImage, ThumbnailStore};

/// Composes extraction, lookups, rendering, normalization and storage.
pub struct ThumbnailResolver {
    hosts: Arc<VideoHostRegistry>,
    metadata: MetadataFetcher,
    renderer: Arc<dyn RenderBackend>,
    store: Arc<dyn ThumbnailStore>,
    work_dir: PathBuf,
    viewport: RenderViewport,
}

impl ThumbnailResolver {
    #[must_use]
    pub fn new(
        metadata: MetadataFetcher,
        renderer: Arc<dyn RenderBackend>,
        store: Arc<dyn ThumbnailStore>,
    ) -> Self {
        Self {
            hosts: Arc::new(VideoHostRegistry::with_default_hosts()),
            metadata,
            renderer,
            store,
            work_dir: std::env::temp_dir(),
            viewport: RenderViewport::default(),
        }
    }

    /// Build the production pipeline from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client or the storage backend cannot be
    /// created.
    pub fn from_config(config: &Config) -> Result<Self> {
        let metadata =
            MetadataFetcher::new(config.fetch_timeout).context("Failed to build HTTP client")?;
        let renderer = Arc::new(ChromiumRenderer::new(RenderConfig::from(config)));
        let store = storage::from_config(config)?;

        Ok(Self::new(metadata, renderer, store).with_work_dir(config.work_dir.clone()))
    }

    #[must_use]
    pub fn with_hosts(mut self, hosts: VideoHostRegistry) -> Self {
        self.hosts = Arc::new(hosts);
        self
    }

    /// Directory for materialized document bytes.
    #[must_use]
    pub fn with_work_dir(mut self, work_dir: PathBuf) -> Self {
        self.work_dir = work_dir;
        self
    }

    #[must_use]
    pub fn with_viewport(mut self, viewport: RenderViewport) -> Self {
        self.viewport = viewport;
        self
    }

    #[must_use]
    pub fn hosts(&self) -> &VideoHostRegistry {
        &self.hosts
    }

    /// Resolve a source to a stored thumbnail.
    ///
    /// Every successful stage ends in normalize + store, so the reference
    /// always points at our own 640x360 PNG.
    ///
    /// # Errors
    ///
    /// Only [`ThumbnailError::PlaceholderUnavailable`], when the storage
    /// backend refuses even the placeholder.
    #[instrument(skip(self, source), fields(kind = %source.kind))]
    pub async fn resolve(&self, source: &SourceReference) -> Result<ThumbnailResult, ThumbnailError> {
        let prefix = source.file_prefix();

        let resolved = match source.kind {
            SourceKind::Video => self.video_stage(source, &prefix).await,
            SourceKind::Page => self.page_stage(source, &prefix).await,
            SourceKind::Document => self.document_stage(source, &prefix).await,
            SourceKind::Unknown => None,
        };

        match resolved {
            Some(result) => Ok(result),
            None => self.placeholder(&prefix).await,
        }
    }

    /// Like [`resolve`](Self::resolve), but an image URL obtained from host
    /// extraction, embed info or page preview tags is returned verbatim
    /// without downloading or storing it.
    ///
    /// # Errors
    ///
    /// Only [`ThumbnailError::PlaceholderUnavailable`].
    #[instrument(skip(self, source), fields(kind = %source.kind))]
    pub async fn get_or_create_thumbnail_for_source(
        &self,
        source: &SourceReference,
    ) -> Result<ThumbnailResult, ThumbnailError> {
        let prefix = source.file_prefix();

        let resolved = match (source.kind, source.url_str()) {
            (SourceKind::Video, Some(url)) => self.video_image_url(url).await.map(|(image, origin)| {
                info!(url = %url, image = %image, "Using external video thumbnail");
                ThumbnailResult::external(image, origin)
            }),
            (SourceKind::Page, Some(url)) => {
                match self.metadata.fetch_page_preview_image(url).await {
                    Some(image) => {
                        info!(url = %url, image = %image, "Using external page preview image");
                        Some(ThumbnailResult::external(image, Origin::Fetched))
                    }
                    None => self.render_url(url, RenderKind::Page, &prefix).await,
                }
            }
            (SourceKind::Document, _) => self.document_stage(source, &prefix).await,
            _ => None,
        };

        match resolved {
            Some(result) => Ok(result),
            None => self.placeholder(&prefix).await,
        }
    }

    /// Host extraction first, then the host's embed endpoint.
    async fn video_image_url(&self, url: &str) -> Option<(String, Origin)> {
        let Some(host) = self.hosts.find_host(url) else {
            debug!(url = %url, "No video host recognises URL");
            return None;
        };

        if let Some(image) = host.thumbnail_url(url) {
            return Some((image, Origin::Derived));
        }

        match self.metadata.fetch_embed_thumbnail(host, url).await {
            Some(image) => Some((image, Origin::Fetched)),
            None => {
                warn!(url = %url, host = host.site_id(), "Embed lookup produced no thumbnail");
                None
            }
        }
    }

    async fn video_stage(&self, source: &SourceReference, prefix: &str) -> Option<ThumbnailResult> {
        let url = source.url_str()?;
        let (image, _) = self.video_image_url(url).await?;
        self.store_remote_image(&image, prefix).await
    }

    /// Preview image first, screenshot second.
    async fn page_stage(&self, source: &SourceReference, prefix: &str) -> Option<ThumbnailResult> {
        let url = source.url_str()?;

        if let Some(image) = self.metadata.fetch_page_preview_image(url).await {
            if let Some(result) = self.store_remote_image(&image, prefix).await {
                return Some(result);
            }
        } else {
            debug!(url = %url, "No preview image tag found");
        }

        self.render_url(url, RenderKind::Page, prefix).await
    }

    async fn document_stage(&self, source: &SourceReference, prefix: &str) -> Option<ThumbnailResult> {
        match &source.locator {
            Locator::Url(url) => self.render_url(url, RenderKind::Document, prefix).await,
            Locator::Bytes(bytes) => {
                let document = match MaterializedDocument::write(&self.work_dir, bytes).await {
                    Ok(d) => d,
                    Err(e) => {
                        warn!(error = %e, "Could not materialize document");
                        return None;
                    }
                };
                let result = self
                    .render_url(document.url(), RenderKind::Document, prefix)
                    .await;
                document.cleanup();
                result
            }
        }
    }

    /// Download, normalize and store an external image.
    async fn store_remote_image(&self, image_url: &str, prefix: &str) -> Option<ThumbnailResult> {
        let bytes = match self.metadata.fetch_image_bytes(image_url).await {
            Ok(b) => b,
            Err(e) => {
                warn!(error = %e, "Image download failed, falling through");
                return None;
            }
        };

        match self.normalize_and_store(bytes, prefix).await {
            Ok(reference) => {
                info!(image = %image_url, reference = %reference, "Stored fetched thumbnail");
                Some(ThumbnailResult::stored(reference, Origin::Fetched))
            }
            Err(e) => {
                warn!(image = %image_url, error = %e, "Fetched image unusable, falling through");
                None
            }
        }
    }

    async fn render_url(&self, url: &str, kind: RenderKind, prefix: &str) -> Option<ThumbnailResult> {
        let bytes = match self
            .renderer
            .render_first_view(url, kind, self.viewport)
            .await
        {
            Ok(b) => b,
            Err(e) => {
                warn!(?kind, error = %e, "Render failed, falling through");
                return None;
            }
        };

        match self.normalize_and_store(bytes, prefix).await {
            Ok(reference) => {
                info!(?kind, reference = %reference, "Stored rendered thumbnail");
                Some(ThumbnailResult::stored(reference, Origin::Rendered))
            }
            Err(e) => {
                warn!(?kind, error = %e, "Rendered image unusable, falling through");
                None
            }
        }
    }

    async fn placeholder(&self, prefix: &str) -> Result<ThumbnailResult, ThumbnailError> {
        let stored = async {
            let png = run_blocking(|| placeholder_png().and_then(|png| normalize(&png))).await?;
            self.store.store(&StoredImage::new(prefix, png)).await
        }
        .await;

        match stored {
            Ok(reference) => {
                info!(reference = %reference, "Stored placeholder thumbnail");
                Ok(ThumbnailResult::stored(reference, Origin::Placeholder))
            }
            Err(e) => {
                error!(error = %e, "Placeholder thumbnail could not be stored");
                Err(ThumbnailError::PlaceholderUnavailable(Box::new(e)))
            }
        }
    }

    async fn normalize_and_store(&self, bytes: Vec<u8>, prefix: &str) -> Result<String, ThumbnailError> {
        let png = run_blocking(move || normalize(&bytes)).await?;
        self.store.store(&StoredImage::new(prefix, png)).await
    }
}

/// Decoding, resizing and encoding are CPU-bound and stay off the async workers.
async fn run_blocking<F>(work: F) -> Result<Vec<u8>, ThumbnailError>
where
    F: FnOnce() -> Result<Vec<u8>, ThumbnailError> + Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| ThumbnailError::Worker(e.to_string()))?
}
