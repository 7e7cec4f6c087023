use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),
    #[error("invalid value for {name}: {message}")]
    InvalidValue { name: String, message: String },
    #[error("failed to parse {name} as integer: {source}")]
    ParseInt {
        name: String,
        #[source]
        source: std::num::ParseIntError,
    },
    #[error("failed to parse {name} as boolean: {value}")]
    ParseBool { name: String, value: String },
}

/// Application configuration loaded from environment variables.
///
/// Read once at process start; nothing in the pipeline consults the
/// environment per call.
#[derive(Debug, Clone)]
pub struct Config {
    // Storage
    pub storage_backend: StorageBackend,
    pub public_dir: PathBuf,
    pub thumbnail_subdir: String,

    // S3 Storage
    pub s3_bucket: Option<String>,
    pub s3_region: String,
    pub s3_endpoint: Option<String>,
    pub s3_prefix: String,
    pub s3_public_url: Option<String>,

    // Fetching and rendering
    pub fetch_timeout: Duration,
    pub render_enabled: bool,
    pub render_timeout: Duration,
    pub chrome_path: Option<String>,
    pub work_dir: PathBuf,

    // Catalog
    pub catalog_path: PathBuf,

    // Web Server
    pub web_host: String,
    pub web_port: u16,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    /// Files under the public directory, served by the web layer.
    Local,
    /// Public-read objects in an S3-compatible bucket.
    S3,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if a variable is present but invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            // Storage
            storage_backend: parse_storage_backend(&env_or_default("STORAGE_BACKEND", "local"))?,
            public_dir: PathBuf::from(env_or_default("PUBLIC_DIR", "./public")),
            thumbnail_subdir: env_or_default("THUMBNAIL_SUBDIR", "thumbnails"),

            // S3 Storage
            s3_bucket: optional_env("S3_BUCKET"),
            s3_region: env_or_default("S3_REGION", "us-east-1"),
            s3_endpoint: optional_env("S3_ENDPOINT"),
            s3_prefix: env_or_default("S3_PREFIX", "thumbnails/"),
            s3_public_url: optional_env("S3_PUBLIC_URL"),

            // Fetching and rendering
            fetch_timeout: Duration::from_secs(parse_env_u64("FETCH_TIMEOUT_SECS", 15)?),
            render_enabled: parse_env_bool("RENDER_ENABLED", true)?,
            render_timeout: Duration::from_secs(parse_env_u64("RENDER_TIMEOUT_SECS", 30)?),
            chrome_path: optional_env("CHROME_PATH"),
            work_dir: PathBuf::from(env_or_default("WORK_DIR", "./data/tmp")),

            // Catalog
            catalog_path: PathBuf::from(env_or_default("CATALOG_PATH", "./data/items.json")),

            // Web Server
            web_host: env_or_default("WEB_HOST", "0.0.0.0"),
            web_port: parse_env_u16("WEB_PORT", 3000)?,
        })
    }

    /// Configuration for tests: local storage, rendering disabled, short timeouts.
    #[must_use]
    pub fn for_testing() -> Self {
        Self {
            storage_backend: StorageBackend::Local,
            public_dir: PathBuf::from("./public"),
            thumbnail_subdir: "thumbnails".to_string(),
            s3_bucket: None,
            s3_region: "us-east-1".to_string(),
            s3_endpoint: None,
            s3_prefix: "thumbnails/".to_string(),
            s3_public_url: None,
            fetch_timeout: Duration::from_secs(5),
            render_enabled: false,
            render_timeout: Duration::from_secs(5),
            chrome_path: None,
            work_dir: std::env::temp_dir(),
            catalog_path: PathBuf::from("./data/items.json"),
            web_host: "127.0.0.1".to_string(),
            web_port: 0,
        }
    }

    /// Validate that the configuration is usable.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.storage_backend == StorageBackend::S3 && self.s3_bucket.is_none() {
            return Err(ConfigError::MissingEnvVar("S3_BUCKET".to_string()));
        }
        if self.fetch_timeout.is_zero() {
            return Err(ConfigError::InvalidValue {
                name: "FETCH_TIMEOUT_SECS".to_string(),
                message: "must be at least 1".to_string(),
            });
        }
        if self.render_timeout.is_zero() {
            return Err(ConfigError::InvalidValue {
                name: "RENDER_TIMEOUT_SECS".to_string(),
                message: "must be at least 1".to_string(),
            });
        }
        if self.thumbnail_subdir.is_empty() || self.thumbnail_subdir.contains("..") {
            return Err(ConfigError::InvalidValue {
                name: "THUMBNAIL_SUBDIR".to_string(),
                message: "must be a plain relative directory name".to_string(),
            });
        }
        Ok(())
    }
}

fn optional_env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|s| !s.is_empty())
}

fn env_or_default(name: &str, default: &str) -> String {
    std::env::var(name)
        .ok()
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| default.to_string())
}

fn parse_env_u64(name: &str, default: u64) -> Result<u64, ConfigError> {
    match std::env::var(name) {
        Ok(val) if !val.is_empty() => val.parse().map_err(|e| ConfigError::ParseInt {
            name: name.to_string(),
            source: e,
        }),
        _ => Ok(default),
    }
}

fn parse_env_u16(name: &str, default: u16) -> Result<u16, ConfigError> {
    match std::env::var(name) {
        Ok(val) if !val.is_empty() => val.parse().map_err(|e| ConfigError::ParseInt {
            name: name.to_string(),
            source: e,
        }),
        _ => Ok(default),
    }
}

fn parse_env_bool(name: &str, default: bool) -> Result<bool, ConfigError> {
    match std::env::var(name) {
        Ok(val) if !val.is_empty() => match val.to_lowercase().as_str() {
            "true" | "1" | "yes" | "on" => Ok(true),
            "false" | "0" | "no" | "off" => Ok(false),
            _ => Err(ConfigError::ParseBool {
                name: name.to_string(),
                value: val,
            }),
        },
        _ => Ok(default),
    }
}

fn parse_storage_backend(value: &str) -> Result<StorageBackend, ConfigError> {
    match value.to_lowercase().as_str() {
        "local" | "fs" => Ok(StorageBackend::Local),
        "s3" | "bucket" => Ok(StorageBackend::S3),
        _ => Err(ConfigError::InvalidValue {
            name: "STORAGE_BACKEND".to_string(),
            message: format!("must be 'local' or 's3', got '{value}'"),
        }),
    }
}
