use std::path::Path;

use anyhow::{Context, Result};
use tracing::debug;

/// Write `data` to `dest` by writing a sibling temp file and renaming it over.
///
/// Readers see either the old content or the new content, never a partial
/// file. A crash can leave at most a hidden `.{name}.*.partial` file behind.
pub async fn write_atomic(dest: &Path, data: &[u8]) -> Result<()> {
    let parent = dest
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));

    tokio::fs::create_dir_all(parent)
        .await
        .with_context(|| format!("Failed to create directory: {}", parent.display()))?;

    let file_name = dest
        .file_name()
        .and_then(|n| n.to_str())
        .with_context(|| format!("Invalid destination path: {}", dest.display()))?;
    let temp_path = parent.join(format!(".{file_name}.{:016x}.partial", rand::random::<u64>()));

    if let Err(e) = tokio::fs::write(&temp_path, data).await {
        let _ = tokio::fs::remove_file(&temp_path).await;
        return Err(anyhow::Error::new(e))
            .with_context(|| format!("Failed to write {}", temp_path.display()));
    }

    if let Err(e) = tokio::fs::rename(&temp_path, dest).await {
        let _ = tokio::fs::remove_file(&temp_path).await;
        return Err(anyhow::Error::new(e))
            .with_context(|| format!("Failed to move file into place: {}", dest.display()));
    }

    debug!(path = %dest.display(), size = data.len(), "File written");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_write_atomic_creates_parents() {
        let dir = tempfile::TempDir::new().unwrap();
        let dest = dir.path().join("a").join("b").join("file.bin");

        write_atomic(&dest, b"hello").await.unwrap();
        assert_eq!(std::fs::read(&dest).unwrap(), b"hello");

        write_atomic(&dest, b"replaced").await.unwrap();
        assert_eq!(std::fs::read(&dest).unwrap(), b"replaced");

        // No temp files left behind
        let names: Vec<_> = std::fs::read_dir(dest.parent().unwrap())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(names.len(), 1);
    }

    #[tokio::test]
    async fn test_write_atomic_fails_cleanly() {
        let dir = tempfile::TempDir::new().unwrap();
        // Parent is a regular file, so the directory cannot be created
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, b"x").unwrap();

        let result = write_atomic(&blocker.join("file.bin"), b"data").await;
        assert!(result.is_err());
        assert_eq!(std::fs::read(&blocker).unwrap(), b"x");
    }
}
