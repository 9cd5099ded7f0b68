pub mod error;
pub mod local;
pub mod subscription;
pub mod types;

pub use error::*;
pub use local::LocalDocumentStore;
pub use subscription::Subscription;
pub use types::*;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;

/// Document database holding photo records and page/theme documents.
#[async_trait]
pub trait MetadataStore: Send + Sync {
    /// Inserts a record; the store assigns the id and `created_at`.
    async fn insert(&self, collection: &CollectionKey, photo: NewPhoto)
    -> Result<String, MetadataError>;

    async fn update(
        &self,
        collection: &CollectionKey,
        id: &str,
        patch: PhotoPatch,
    ) -> Result<(), MetadataError>;

    /// Deleting an id that does not exist succeeds.
    async fn delete(&self, collection: &CollectionKey, id: &str) -> Result<(), MetadataError>;

    async fn query(&self, query: &PhotoQuery) -> Result<Vec<PhotoRecord>, MetadataError>;

    /// Full result-set snapshots of `query`: one right away, then one per change.
    async fn subscribe(&self, query: PhotoQuery) -> Result<Subscription, MetadataError>;

    async fn get_document(&self, path: &str) -> Result<Option<Fields>, MetadataError>;

    /// With `merge`, fields absent from `fields` keep their stored values.
    async fn set_document(&self, path: &str, fields: Fields, merge: bool)
    -> Result<(), MetadataError>;

    fn name(&self) -> &str;
}

pub type DynMetadataStore = Arc<dyn MetadataStore>;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct DatabaseConfig {
    /// JSON snapshot file. Without one, documents live only in memory.
    #[serde(default)]
    pub path: Option<PathBuf>,
}

pub async fn create_metadata_store(
    config: &DatabaseConfig,
) -> Result<DynMetadataStore, MetadataError> {
    let store = match &config.path {
        Some(path) => LocalDocumentStore::open(path).await?,
        None => LocalDocumentStore::in_memory(),
    };
    Ok(Arc::new(store))
}
