//! Crochet thumbnailer library.
//!
//! Resolves a representative 640x360 thumbnail for a video, web page or PDF
//! through a fixed fallback chain, stores it locally or in a bucket, and keeps
//! a small JSON catalog of submitted items.

// Allow raw string hashes for safety - they're harmless and prevent issues if content changes
#![allow(clippy::needless_raw_string_hashes)]

pub mod catalog;
pub mod config;
pub mod constants;
pub mod error;
pub mod fs_utils;
pub mod hosts;
pub mod metadata;
pub mod normalize;
pub mod og_extractor;
pub mod placeholder;
pub mod render;
pub mod resolver;
pub mod source;
pub mod storage;
pub mod web;

pub use error::ThumbnailError;
pub use resolver::ThumbnailResolver;
pub use source::{Locator, Origin, SourceKind, SourceReference, ThumbnailResult};
