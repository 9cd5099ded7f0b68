use async_trait::async_trait;
use std::collections::BTreeMap;
use tokio::sync::RwLock;

use crate::storage::{BlobEntry, ObjectStore, StorageError, validate_path};

/// Volatile blob store. Handy for tests and throwaway runs.
#[derive(Default)]
pub struct MemoryStore {
    blobs: RwLock<BTreeMap<String, Vec<u8>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn contains(&self, path: &str) -> bool {
        self.blobs.read().await.contains_key(path)
    }

    pub async fn is_empty(&self) -> bool {
        self.blobs.read().await.is_empty()
    }
}

#[async_trait]
impl ObjectStore for MemoryStore {
    async fn upload(&self, path: &str, bytes: Vec<u8>) -> Result<(), StorageError> {
        validate_path(path)?;
        self.blobs.write().await.insert(path.to_string(), bytes);
        Ok(())
    }

    async fn download(&self, path: &str) -> Result<Vec<u8>, StorageError> {
        self.blobs
            .read()
            .await
            .get(path)
            .cloned()
            .ok_or_else(|| StorageError::NotFound(path.to_string()))
    }

    async fn delete(&self, path: &str) -> Result<(), StorageError> {
        match self.blobs.write().await.remove(path) {
            Some(_) => Ok(()),
            None => Err(StorageError::NotFound(path.to_string())),
        }
    }

    async fn resolve_url(&self, path: &str) -> Result<String, StorageError> {
        if self.blobs.read().await.contains_key(path) {
            Ok(format!("memory://{}", path))
        } else {
            Err(StorageError::NotFound(path.to_string()))
        }
    }

    async fn list(&self, prefix: &str) -> Result<Vec<BlobEntry>, StorageError> {
        let prefix = match prefix.trim_end_matches('/') {
            "" => String::new(),
            trimmed => format!("{}/", trimmed),
        };

        // BTreeMap iteration keeps the listing sorted by path.
        Ok(self
            .blobs
            .read()
            .await
            .keys()
            .filter_map(|path| {
                let rest = path.strip_prefix(&prefix)?;
                (!rest.contains('/')).then(|| BlobEntry::from_path(path.clone()))
            })
            .collect())
    }

    fn name(&self) -> &str {
        "In-Memory Object Store"
    }
}
