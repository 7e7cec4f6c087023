//! Append-only JSON catalog of items and their thumbnails.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::fs_utils::write_atomic;

/// A catalog entry as stored on disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogItem {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(rename = "type", default)]
    pub item_type: String,
    #[serde(default)]
    pub source_url: String,
    #[serde(default)]
    pub thumbnail_url: Option<String>,
    #[serde(default)]
    pub created_at: String,
}

/// Older writers stored ids as JSON numbers.
fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Text(String),
        Number(serde_json::Number),
    }

    Ok(match RawId::deserialize(deserializer)? {
        RawId::Text(s) => s,
        RawId::Number(n) => n.to_string(),
    })
}

/// Fields supplied by the caller; id and timestamp are assigned on append.
#[derive(Debug, Clone)]
pub struct NewCatalogItem {
    pub title: String,
    pub item_type: String,
    pub source_url: String,
    pub thumbnail_url: Option<String>,
}

/// File-backed catalog. Appends are serialized within the process.
#[derive(Debug)]
pub struct Catalog {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl Catalog {
    #[must_use]
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            write_lock: Mutex::new(()),
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// All items in insertion order.
    ///
    /// A missing file is an empty catalog. An unreadable or malformed file is
    /// logged and also reads as empty; only [`append`](Self::append) refuses it.
    pub async fn list(&self) -> Vec<CatalogItem> {
        match self.load().await {
            Ok(items) => items,
            Err(e) => {
                warn!(path = %self.path.display(), "Failed to read catalog: {e:#}");
                Vec::new()
            }
        }
    }

    /// Read the file strictly: only a missing file counts as empty.
    async fn load(&self) -> Result<Vec<CatalogItem>> {
        let text = match tokio::fs::read_to_string(&self.path).await {
            Ok(t) => t,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(e)
                    .with_context(|| format!("Failed to read catalog: {}", self.path.display()))
            }
        };

        serde_json::from_str(&text)
            .with_context(|| format!("Catalog file is not valid JSON: {}", self.path.display()))
    }

    /// Append an item, assigning the next id, and rewrite the file.
    ///
    /// # Errors
    ///
    /// Returns an error if an existing file cannot be read or parsed, so its
    /// records are never replaced, or if the file cannot be written.
    pub async fn append(&self, item: NewCatalogItem) -> Result<CatalogItem> {
        let _guard = self.write_lock.lock().await;

        let mut items = self.load().await?;
        let item = CatalogItem {
            id: next_id(&items).to_string(),
            title: item.title,
            item_type: item.item_type,
            source_url: item.source_url,
            thumbnail_url: item.thumbnail_url,
            created_at: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        };
        items.push(item.clone());

        let json = serde_json::to_vec_pretty(&items).context("Failed to serialize catalog")?;
        write_atomic(&self.path, &json)
            .await
            .with_context(|| format!("Failed to write catalog: {}", self.path.display()))?;

        debug!(id = %item.id, "Catalog item appended");
        Ok(item)
    }

    /// Case-insensitive substring search over title and type.
    pub async fn search(&self, query: &str) -> Vec<CatalogItem> {
        let items = self.list().await;
        let query = query.trim().to_lowercase();
        if query.is_empty() {
            return items;
        }
        items
            .into_iter()
            .filter(|item| {
                item.title.to_lowercase().contains(&query)
                    || item.item_type.to_lowercase().contains(&query)
            })
            .collect()
    }
}

/// One past the highest numeric id; ids that do not parse are skipped.
fn next_id(items: &[CatalogItem]) -> u64 {
    items
        .iter()
        .filter_map(|item| item.id.trim().parse::<u64>().ok())
        .max()
        .map_or(1, |id| id + 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(id: &str) -> CatalogItem {
        CatalogItem {
            id: id.to_string(),
            title: "t".to_string(),
            item_type: "video".to_string(),
            source_url: "https://example.com".to_string(),
            thumbnail_url: None,
            created_at: "2024-01-01T00:00:00.000Z".to_string(),
        }
    }

    #[test]
    fn test_next_id() {
        assert_eq!(next_id(&[]), 1);
        assert_eq!(next_id(&[item("1"), item("2")]), 3);
        assert_eq!(next_id(&[item("9"), item("41")]), 42);
        assert_eq!(next_id(&[item("abc")]), 1);
    }

    #[test]
    fn test_next_id_skips_unparseable_last_id() {
        assert_eq!(next_id(&[item("1"), item("7"), item("draft")]), 8);
        assert_eq!(next_id(&[item("12"), item("3")]), 13);
    }

    #[test]
    fn test_lenient_record_shapes() {
        let items: Vec<CatalogItem> = serde_json::from_str(
            r#"[
                {"id": 1, "title": "Bolsa", "type": "video", "sourceUrl": "https://a"},
                {"id": "2", "title": "Tapete", "type": "pdf", "sourceUrl": "https://b", "thumbnailUrl": null}
            ]"#,
        )
        .unwrap();
        assert_eq!(items[0].id, "1");
        assert_eq!(items[0].created_at, "");
        assert_eq!(items[0].thumbnail_url, None);
        assert_eq!(items[1].id, "2");
    }

    #[test]
    fn test_json_field_names() {
        let json = serde_json::to_value(item("7")).unwrap();
        assert_eq!(json["id"], "7");
        assert_eq!(json["type"], "video");
        assert_eq!(json["sourceUrl"], "https://example.com");
        assert!(json["thumbnailUrl"].is_null());
        assert_eq!(json["createdAt"], "2024-01-01T00:00:00.000Z");
    }
}
