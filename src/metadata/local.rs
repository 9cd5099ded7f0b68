use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, Weak};
use tokio::sync::{RwLock, watch};
use tracing::{debug, error, info};

use super::{
    CollectionKey, Fields, MetadataError, MetadataStore, NewPhoto, PhotoPatch, PhotoQuery,
    PhotoRecord, Subscription,
};

/// Document store kept in memory and, optionally, mirrored to a JSON file.
///
/// A write is acknowledged only after the snapshot file has been rewritten;
/// when that fails the in-memory change is rolled back and the caller gets a
/// [`MetadataError::WriteError`]. One lock serializes all writes, so each
/// document write is atomic and concurrent writers resolve last-write-wins.
pub struct LocalDocumentStore {
    inner: Arc<Inner>,
}

struct Inner {
    state: RwLock<StoreState>,
    snapshot_file: Option<PathBuf>,
    revisions: Mutex<HashMap<CollectionKey, watch::Sender<u64>>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct StoreState {
    #[serde(default)]
    collections: BTreeMap<CollectionKey, BTreeMap<String, PhotoRecord>>,
    #[serde(default)]
    documents: BTreeMap<String, Fields>,
}

impl LocalDocumentStore {
    pub fn in_memory() -> Self {
        Self::with_state(StoreState::default(), None)
    }

    /// Loads the snapshot at `path`, starting empty if it does not exist yet.
    pub async fn open(path: &Path) -> Result<Self, MetadataError> {
        let state = match tokio::fs::read_to_string(path).await {
            Ok(contents) => {
                let state: StoreState = serde_json::from_str(&contents)?;
                info!(
                    "Loaded metadata snapshot from {:?} ({} collections, {} documents)",
                    path,
                    state.collections.len(),
                    state.documents.len()
                );
                state
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!("No metadata snapshot at {:?}, starting empty", path);
                StoreState::default()
            }
            Err(e) => return Err(e.into()),
        };

        Ok(Self::with_state(state, Some(path.to_path_buf())))
    }

    fn with_state(state: StoreState, snapshot_file: Option<PathBuf>) -> Self {
        Self {
            inner: Arc::new(Inner {
                state: RwLock::new(state),
                snapshot_file,
                revisions: Mutex::new(HashMap::new()),
            }),
        }
    }
}

impl Inner {
    async fn persist(&self, state: &StoreState) -> Result<(), MetadataError> {
        let Some(path) = &self.snapshot_file else {
            return Ok(());
        };

        let json = serde_json::to_string_pretty(state)?;
        let tmp = path.with_extension("json.tmp");
        let write = async {
            if let Some(parent) = path.parent()
                && !parent.as_os_str().is_empty()
            {
                tokio::fs::create_dir_all(parent).await?;
            }
            tokio::fs::write(&tmp, json).await?;
            tokio::fs::rename(&tmp, path).await
        };

        write.await.map_err(|e| {
            error!("Failed to persist metadata snapshot to {:?}: {}", path, e);
            MetadataError::WriteError(e.to_string())
        })
    }

    /// Applies `mutate` to a copy of the state, persists it, and only then
    /// makes it visible.
    async fn write<T>(
        &self,
        mutate: impl FnOnce(&mut StoreState) -> Result<T, MetadataError>,
    ) -> Result<T, MetadataError> {
        let mut state = self.state.write().await;
        let mut next = state.clone();
        let value = mutate(&mut next)?;
        self.persist(&next).await?;
        *state = next;
        Ok(value)
    }

    fn revision_channel(&self, collection: &CollectionKey) -> watch::Receiver<u64> {
        let mut revisions = self.revisions.lock().unwrap_or_else(|e| e.into_inner());
        revisions
            .entry(collection.clone())
            .or_insert_with(|| watch::channel(0).0)
            .subscribe()
    }

    fn notify(&self, collection: &CollectionKey) {
        let revisions = self.revisions.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(sender) = revisions.get(collection) {
            sender.send_modify(|revision| *revision += 1);
        }
    }

    async fn query(&self, query: &PhotoQuery) -> Vec<PhotoRecord> {
        let state = self.state.read().await;
        let mut records: Vec<PhotoRecord> = state
            .collections
            .get(&query.collection)
            .map(|docs| docs.values().filter(|r| query.matches(r)).cloned().collect())
            .unwrap_or_default();
        drop(state);

        query.sort(&mut records);
        records
    }
}

#[async_trait]
impl MetadataStore for LocalDocumentStore {
    async fn insert(
        &self,
        collection: &CollectionKey,
        photo: NewPhoto,
    ) -> Result<String, MetadataError> {
        let id = uuid::Uuid::new_v4().simple().to_string();
        let record = photo.into_record(id.clone(), Utc::now());

        self.inner
            .write(|state| {
                state
                    .collections
                    .entry(collection.clone())
                    .or_default()
                    .insert(record.id.clone(), record);
                Ok(())
            })
            .await?;

        debug!("Inserted {} into {}", id, collection);
        self.inner.notify(collection);
        Ok(id)
    }

    async fn update(
        &self,
        collection: &CollectionKey,
        id: &str,
        patch: PhotoPatch,
    ) -> Result<(), MetadataError> {
        self.inner
            .write(|state| {
                let record = state
                    .collections
                    .get_mut(collection)
                    .and_then(|docs| docs.get_mut(id))
                    .ok_or_else(|| MetadataError::NotFound(format!("{}/{}", collection, id)))?;
                patch.apply(record);
                Ok(())
            })
            .await?;

        debug!("Updated {} in {}", id, collection);
        self.inner.notify(collection);
        Ok(())
    }

    async fn delete(&self, collection: &CollectionKey, id: &str) -> Result<(), MetadataError> {
        let removed = self
            .inner
            .write(|state| {
                Ok(state
                    .collections
                    .get_mut(collection)
                    .and_then(|docs| docs.remove(id))
                    .is_some())
            })
            .await?;

        if removed {
            debug!("Deleted {} from {}", id, collection);
            self.inner.notify(collection);
        }
        Ok(())
    }

    async fn query(&self, query: &PhotoQuery) -> Result<Vec<PhotoRecord>, MetadataError> {
        Ok(self.inner.query(query).await)
    }

    async fn subscribe(&self, query: PhotoQuery) -> Result<Subscription, MetadataError> {
        let changes = self.inner.revision_channel(&query.collection);
        let inner: Weak<Inner> = Arc::downgrade(&self.inner);

        Ok(Subscription::spawn(changes, move || {
            let inner = inner.upgrade();
            let query = query.clone();
            async move {
                match inner {
                    Some(inner) => Ok(inner.query(&query).await),
                    None => Err(MetadataError::SubscriptionClosed),
                }
            }
        }))
    }

    async fn get_document(&self, path: &str) -> Result<Option<Fields>, MetadataError> {
        Ok(self.inner.state.read().await.documents.get(path).cloned())
    }

    async fn set_document(
        &self,
        path: &str,
        fields: Fields,
        merge: bool,
    ) -> Result<(), MetadataError> {
        self.inner
            .write(|state| {
                match state.documents.get_mut(path) {
                    Some(existing) if merge => existing.extend(fields),
                    _ => {
                        state.documents.insert(path.to_string(), fields);
                    }
                }
                Ok(())
            })
            .await?;

        debug!("Wrote document {}", path);
        Ok(())
    }

    fn name(&self) -> &str {
        "Local Document Store"
    }
}
