//! Raw upload storage

use crate::errors::IngestionError;
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Writes uploaded files under a single directory with random names
#[derive(Debug, Clone)]
pub struct UploadStore {
    dir: PathBuf,
}

impl UploadStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Save `bytes` as `<dir>/<uuid><ext>`, keeping the original extension.
    /// Creates the directory when missing.
    pub async fn save(&self, original_filename: &str, bytes: &[u8]) -> Result<PathBuf, IngestionError> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|source| IngestionError::Storage {
                path: self.dir.display().to_string(),
                source,
            })?;

        let path = self.dir.join(stored_file_name(original_filename));

        tokio::fs::write(&path, bytes)
            .await
            .map_err(|source| IngestionError::Storage {
                path: path.display().to_string(),
                source,
            })?;

        tracing::debug!(path = %path.display(), size = bytes.len(), "Stored raw upload");
        Ok(path)
    }

    /// Delete a stored upload. Failures are logged, not returned.
    pub async fn remove(&self, path: &Path) {
        if let Err(e) = tokio::fs::remove_file(path).await {
            tracing::warn!(path = %path.display(), error = %e, "Failed to remove stored upload");
        }
    }
}

fn stored_file_name(original_filename: &str) -> String {
    let ext = Path::new(original_filename)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| format!(".{}", e))
        .unwrap_or_default();

    format!("{}{}", Uuid::new_v4(), ext)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stored_name_keeps_extension() {
        let name = stored_file_name("Attention Is All You Need.pdf");
        assert!(name.ends_with(".pdf"));
        assert!(Uuid::parse_str(name.trim_end_matches(".pdf")).is_ok());
    }

    #[test]
    fn test_stored_name_without_extension() {
        let name = stored_file_name("README");
        assert!(Uuid::parse_str(&name).is_ok());
    }

    #[tokio::test]
    async fn test_save_creates_directory() {
        let root = tempfile::tempdir().unwrap();
        let store = UploadStore::new(root.path().join("data").join("raw"));

        let path = store.save("paper.pdf", b"%PDF-1.5").await.unwrap();

        assert!(path.starts_with(store.dir()));
        assert_eq!(std::fs::read(&path).unwrap(), b"%PDF-1.5");
    }

    #[tokio::test]
    async fn test_remove_deletes_file() {
        let root = tempfile::tempdir().unwrap();
        let store = UploadStore::new(root.path());

        let path = store.save("paper.pdf", b"%PDF-1.5").await.unwrap();
        store.remove(&path).await;

        assert!(!path.exists());
        assert_eq!(std::fs::read_dir(root.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_saves_do_not_collide() {
        let root = tempfile::tempdir().unwrap();
        let store = UploadStore::new(root.path());

        let a = store.save("same.pdf", b"a").await.unwrap();
        let b = store.save("same.pdf", b"b").await.unwrap();
        assert_ne!(a, b);
    }
}
