use crate::errors::{AppError, Result};
use async_trait::async_trait;
use chrono::Utc;
use std::path::PathBuf;
use uuid::Uuid;

/// Flat keyed blob store backing evidence files. Workflow logic only ever
/// talks to this trait so the disk backend can be swapped for object storage.
#[async_trait]
pub trait ContentStore: Send + Sync {
    async fn put(&self, key: &str, bytes: &[u8]) -> Result<()>;
    async fn get(&self, key: &str) -> Result<Vec<u8>>;
    /// Deleting a key that is already absent is not an error.
    async fn delete(&self, key: &str) -> Result<()>;
}

/// Collision-resistant key for an uploaded file: upload time, uploader and
/// original name. The original name must not smuggle in path components.
pub fn storage_key(uploader_id: &Uuid, filename: &str) -> Result<String> {
    if filename.is_empty()
        || filename.contains('/')
        || filename.contains('\\')
        || filename.contains("..")
    {
        return Err(AppError::Validation("Invalid filename".to_string()));
    }
    Ok(format!(
        "{}-{}-{}",
        Utc::now().timestamp_millis(),
        uploader_id,
        filename
    ))
}

pub struct LocalDiskStore {
    root: PathBuf,
}

impl LocalDiskStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.root.join(key)
    }
}

#[async_trait]
impl ContentStore for LocalDiskStore {
    async fn put(&self, key: &str, bytes: &[u8]) -> Result<()> {
        tokio::fs::create_dir_all(&self.root)
            .await
            .map_err(|e| AppError::Storage(format!("Failed to create upload directory: {}", e)))?;
        tokio::fs::write(self.path_for(key), bytes)
            .await
            .map_err(|e| AppError::Storage(format!("Failed to write {}: {}", key, e)))
    }

    async fn get(&self, key: &str) -> Result<Vec<u8>> {
        match tokio::fs::read(self.path_for(key)).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(AppError::NotFound("File")),
            Err(e) => Err(AppError::Storage(format!("Failed to read {}: {}", key, e))),
        }
    }

    async fn delete(&self, key: &str) -> Result<()> {
        match tokio::fs::remove_file(self.path_for(key)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(AppError::Storage(format!("Failed to delete {}: {}", key, e))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn put_get_delete_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalDiskStore::new(dir.path());

        store.put("a-key", b"payload").await.unwrap();
        assert_eq!(store.get("a-key").await.unwrap(), b"payload");

        store.delete("a-key").await.unwrap();
        let err = store.get("a-key").await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn delete_of_absent_key_is_ok() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalDiskStore::new(dir.path());
        store.delete("never-existed").await.unwrap();
    }

    #[test]
    fn storage_key_embeds_uploader_and_name() {
        let uploader = Uuid::new_v4();
        let key = storage_key(&uploader, "site-photo.jpg").unwrap();
        assert!(key.contains(&uploader.to_string()));
        assert!(key.ends_with("site-photo.jpg"));
    }

    #[test]
    fn storage_key_rejects_path_components() {
        let uploader = Uuid::new_v4();
        assert!(storage_key(&uploader, "").is_err());
        assert!(storage_key(&uploader, "../etc/passwd").is_err());
        assert!(storage_key(&uploader, "a/b.jpg").is_err());
        assert!(storage_key(&uploader, "a\\b.jpg").is_err());
    }
}
