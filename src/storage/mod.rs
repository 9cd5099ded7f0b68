pub mod config;
pub mod error;
pub mod handlers;
pub mod providers;
pub mod types;

pub use config::*;
pub use error::*;
pub use types::*;

use async_trait::async_trait;
use std::sync::Arc;

/// Path-addressed blob storage holding original uploads and derived renditions.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    async fn upload(&self, path: &str, bytes: Vec<u8>) -> Result<(), StorageError>;
    async fn download(&self, path: &str) -> Result<Vec<u8>, StorageError>;
    async fn delete(&self, path: &str) -> Result<(), StorageError>;
    async fn resolve_url(&self, path: &str) -> Result<String, StorageError>;
    /// Lists blobs directly under `prefix`; nested "directories" are not descended into.
    async fn list(&self, prefix: &str) -> Result<Vec<BlobEntry>, StorageError>;
    fn name(&self) -> &str;
}

pub type DynObjectStore = Arc<dyn ObjectStore>;

pub fn create_store(config: &StorageConfig) -> Result<DynObjectStore, StorageError> {
    match &config.provider {
        StorageProviderConfig::Filesystem(fs_config) => Ok(Arc::new(
            providers::filesystem::FilesystemStore::new(fs_config, &config.url_prefix)?,
        )),
        StorageProviderConfig::Memory => Ok(Arc::new(providers::memory::MemoryStore::new())),
    }
}

/// Rejects paths that could escape the store root or address nothing.
pub(crate) fn validate_path(path: &str) -> Result<(), StorageError> {
    if path.is_empty() || path.starts_with('/') || path.contains('\\') {
        return Err(StorageError::InvalidPath(path.to_string()));
    }
    if path
        .split('/')
        .any(|segment| segment.is_empty() || segment == "." || segment == "..")
    {
        return Err(StorageError::InvalidPath(path.to_string()));
    }
    Ok(())
}
