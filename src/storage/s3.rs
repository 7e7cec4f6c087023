use anyhow::{Context, Result};
use async_trait::async_trait;
use s3::creds::Credentials;
use s3::region::Region;
use s3::Bucket;
use tracing::debug;

use super::{StoredImage, ThumbnailStore};
use crate::config::Config;
use crate::constants::THUMBNAIL_CONTENT_TYPE;
use crate::error::ThumbnailError;

/// Public-read objects in an S3-compatible bucket.
#[derive(Clone)]
pub struct S3Store {
    bucket: Box<Bucket>,
    prefix: String,
    region: String,
    endpoint: Option<String>,
    public_url: Option<String>,
}

impl S3Store {
    /// Create a store from configuration.
    ///
    /// Credentials come from `AWS_ACCESS_KEY_ID` and `AWS_SECRET_ACCESS_KEY`.
    ///
    /// # Errors
    ///
    /// Returns an error if credentials are missing or the bucket handle
    /// cannot be created.
    pub fn new(config: &Config) -> Result<Self> {
        let bucket_name = config.s3_bucket.as_deref().context("S3_BUCKET not set")?;
        let access_key = std::env::var("AWS_ACCESS_KEY_ID").context("AWS_ACCESS_KEY_ID not set")?;
        let secret_key =
            std::env::var("AWS_SECRET_ACCESS_KEY").context("AWS_SECRET_ACCESS_KEY not set")?;

        let credentials = Credentials::new(Some(&access_key), Some(&secret_key), None, None, None)
            .context("Failed to create S3 credentials")?;

        let region = if let Some(ref endpoint) = config.s3_endpoint {
            Region::Custom {
                region: config.s3_region.clone(),
                endpoint: endpoint.clone(),
            }
        } else {
            config.s3_region.parse().unwrap_or(Region::UsEast1)
        };

        let bucket =
            Bucket::new(bucket_name, region, credentials).context("Failed to create S3 bucket")?;

        // Use path-style for custom endpoints (MinIO, R2, etc.)
        let mut bucket = if config.s3_endpoint.is_some() {
            bucket.with_path_style()
        } else {
            bucket
        };
        bucket.add_header("x-amz-acl", "public-read");

        Ok(Self {
            bucket,
            prefix: config.s3_prefix.clone(),
            region: config.s3_region.clone(),
            endpoint: config.s3_endpoint.clone(),
            public_url: config.s3_public_url.clone(),
        })
    }

    fn object_key(&self, key: &str) -> String {
        format!("{}{key}", self.prefix)
    }
}

#[async_trait]
impl ThumbnailStore for S3Store {
    fn backend_id(&self) -> &'static str {
        "s3"
    }

    async fn store(&self, image: &StoredImage) -> Result<String, ThumbnailError> {
        let object_key = self.object_key(&image.key);

        debug!(key = %object_key, size = image.bytes.len(), "Uploading thumbnail to S3");

        let response = self
            .bucket
            .put_object_with_content_type(&object_key, &image.bytes, THUMBNAIL_CONTENT_TYPE)
            .await
            .map_err(|e| ThumbnailError::storage(&object_key, e))?;

        let status = response.status_code();
        if !(200..300).contains(&status) {
            return Err(ThumbnailError::storage(
                &object_key,
                format!("upload returned HTTP {status}"),
            ));
        }

        Ok(public_url_for(
            self.bucket.name().as_str(),
            &self.region,
            self.endpoint.as_deref(),
            self.public_url.as_deref(),
            &object_key,
        ))
    }
}

/// Public URL of an object.
///
/// An explicit public base URL wins; custom endpoints use path-style URLs;
/// plain AWS uses the virtual-hosted form.
#[must_use]
pub fn public_url_for(
    bucket: &str,
    region: &str,
    endpoint: Option<&str>,
    public_url: Option<&str>,
    object_key: &str,
) -> String {
    if let Some(base) = public_url {
        return format!("{}/{object_key}", base.trim_end_matches('/'));
    }
    if let Some(endpoint) = endpoint {
        return format!("{}/{bucket}/{object_key}", endpoint.trim_end_matches('/'));
    }
    format!("https://{bucket}.s3.{region}.amazonaws.com/{object_key}")
}

impl std::fmt::Debug for S3Store {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("S3Store")
            .field("bucket", &self.bucket.name())
            .field("prefix", &self.prefix)
            .finish()
    }
}
