//! Local object store for uploaded tender documents. Objects live under a
//! data directory as `<uuid>/<sanitized file name>` and are served back by
//! the /files route.

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, warn};
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("storage path escapes the data directory")]
    PathTraversal,
}

#[derive(Debug, Clone)]
pub struct StorageService {
    root: PathBuf,
}

impl StorageService {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Write an uploaded object, returning its relative storage path.
    pub async fn save(&self, file_name: &str, bytes: &[u8]) -> Result<String, StorageError> {
        let safe_name = sanitize_file_name(file_name);
        let relative = format!("{}/{}", Uuid::new_v4(), safe_name);
        let absolute = self.root.join(&relative);
        if let Some(parent) = absolute.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&absolute, bytes).await?;
        debug!(path = %absolute.display(), size = bytes.len(), "stored object");
        Ok(relative)
    }

    /// Remove a stored object. Missing files are not an error; the metadata
    /// row is already gone or going.
    pub async fn delete(&self, storage_path: &str) -> Result<(), StorageError> {
        let absolute = self.resolve(storage_path)?;
        match tokio::fs::remove_file(&absolute).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!(path = %absolute.display(), "object already missing on delete");
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Absolute path for a stored object, refusing traversal outside root.
    pub fn resolve(&self, storage_path: &str) -> Result<PathBuf, StorageError> {
        if Path::new(storage_path)
            .components()
            .any(|c| matches!(c, std::path::Component::ParentDir | std::path::Component::RootDir))
        {
            return Err(StorageError::PathTraversal);
        }
        Ok(self.root.join(storage_path))
    }
}

/// Keep only characters safe across filesystems; never empty.
fn sanitize_file_name(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || matches!(c, '.' | '-' | '_' | ' ') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let trimmed = cleaned.trim().to_string();
    if trimmed.is_empty() {
        "unnamed".to_string()
    } else {
        trimmed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn save_and_delete_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let storage = StorageService::new(dir.path().to_path_buf());

        let path = storage.save("bid.pdf", b"%PDF-1.7").await.unwrap();
        assert!(path.ends_with("/bid.pdf"));
        let absolute = storage.resolve(&path).unwrap();
        assert_eq!(tokio::fs::read(&absolute).await.unwrap(), b"%PDF-1.7");

        storage.delete(&path).await.unwrap();
        assert!(!absolute.exists());
        // second delete is a no-op
        storage.delete(&path).await.unwrap();
    }

    #[tokio::test]
    async fn traversal_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let storage = StorageService::new(dir.path().to_path_buf());
        assert!(matches!(
            storage.resolve("../../etc/passwd"),
            Err(StorageError::PathTraversal)
        ));
    }

    #[test]
    fn file_names_are_sanitized() {
        assert_eq!(sanitize_file_name("b/../id.pdf"), "b_.._id.pdf");
        assert_eq!(sanitize_file_name("final (v2).xlsx"), "final _v2_.xlsx");
        assert_eq!(sanitize_file_name("///"), "___");
        assert_eq!(sanitize_file_name(""), "unnamed");
    }
}
