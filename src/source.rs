//! Inputs and outputs of thumbnail resolution.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::hosts::VideoHostRegistry;

/// How a source reference should be resolved to a thumbnail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    Video,
    Page,
    Document,
    Unknown,
}

impl SourceKind {
    /// Map a catalog type label to a kind.
    ///
    /// Labels come from the upload form (`video`, `pdf`, `receita`, ...);
    /// anything unrecognised is `Unknown`.
    #[must_use]
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_lowercase().as_str() {
            "video" | "vídeo" => Self::Video,
            "pdf" | "document" | "documento" => Self::Document,
            "page" | "página" | "pagina" | "web" | "site" | "recipe" | "receita" => Self::Page,
            _ => Self::Unknown,
        }
    }

    /// Guess the kind from the URL alone.
    #[must_use]
    pub fn infer(url: &str, hosts: &VideoHostRegistry) -> Self {
        let Ok(parsed) = url::Url::parse(url) else {
            return Self::Unknown;
        };
        if !matches!(parsed.scheme(), "http" | "https") {
            return Self::Unknown;
        }
        if hosts.find_host(url).is_some() {
            return Self::Video;
        }
        if parsed.path().to_lowercase().ends_with(".pdf") {
            return Self::Document;
        }
        Self::Page
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Video => "video",
            Self::Page => "page",
            Self::Document => "document",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where the source lives.
#[derive(Clone, PartialEq, Eq)]
pub enum Locator {
    Url(String),
    /// Raw document bytes (PDF uploads).
    Bytes(Vec<u8>),
}

impl fmt::Debug for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Url(url) => f.debug_tuple("Url").field(url).finish(),
            Self::Bytes(bytes) => write!(f, "Bytes({} bytes)", bytes.len()),
        }
    }
}

/// Immutable input to resolution. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceReference {
    pub kind: SourceKind,
    pub locator: Locator,
    /// Human-readable prefix for stored file names.
    pub name_prefix: Option<String>,
}

impl SourceReference {
    #[must_use]
    pub fn url(kind: SourceKind, url: impl Into<String>) -> Self {
        Self {
            kind,
            locator: Locator::Url(url.into()),
            name_prefix: None,
        }
    }

    #[must_use]
    pub fn document_bytes(bytes: Vec<u8>) -> Self {
        Self {
            kind: SourceKind::Document,
            locator: Locator::Bytes(bytes),
            name_prefix: None,
        }
    }

    #[must_use]
    pub fn with_name_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.name_prefix = Some(prefix.into());
        self
    }

    /// The URL, when the locator is one.
    #[must_use]
    pub fn url_str(&self) -> Option<&str> {
        match &self.locator {
            Locator::Url(url) => Some(url),
            Locator::Bytes(_) => None,
        }
    }

    /// Sanitized prefix for stored names; falls back to the kind name.
    #[must_use]
    pub fn file_prefix(&self) -> String {
        let cleaned = self
            .name_prefix
            .as_deref()
            .map(sanitize_prefix)
            .unwrap_or_default();
        if cleaned.is_empty() {
            self.kind.as_str().to_string()
        } else {
            cleaned
        }
    }
}

/// Keep only word characters, capped at 32.
fn sanitize_prefix(prefix: &str) -> String {
    prefix
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_')
        .take(32)
        .collect::<String>()
        .to_lowercase()
}

/// Which pipeline stage produced a thumbnail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Origin {
    /// Built from a recognised video id, no network.
    Derived,
    /// Image URL found through embed metadata or page preview tags.
    Fetched,
    /// Screenshot of the page or document.
    Rendered,
    /// Locally drawn "no thumbnail" image.
    Placeholder,
}

/// Outcome of a resolution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThumbnailResult {
    pub reference: String,
    pub origin: Origin,
    /// True when new bytes were written to storage, false for an externally
    /// hosted URL returned verbatim.
    pub synthesized: bool,
}

impl ThumbnailResult {
    #[must_use]
    pub fn external(reference: impl Into<String>, origin: Origin) -> Self {
        Self {
            reference: reference.into(),
            origin,
            synthesized: false,
        }
    }

    #[must_use]
    pub fn stored(reference: impl Into<String>, origin: Origin) -> Self {
        Self {
            reference: reference.into(),
            origin,
            synthesized: true,
        }
    }
}
