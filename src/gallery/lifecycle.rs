use chrono::{Datelike, Utc};
use std::collections::HashSet;
use tracing::{debug, error, info, warn};

use super::paths::{self, UPLOAD_PREFIX};
use super::types::*;
use super::GalleryError;
use crate::metadata::{
    CollectionKey, Direction, DynMetadataStore, NewPhoto, PhotoQuery, SortField, Subscription,
};
use crate::storage::DynObjectStore;

pub fn current_year() -> i32 {
    Utc::now().year()
}

/// Keeps the object store and the photo collection of one gallery context
/// consistent across create, edit, delete and sync. Holds no copy of the
/// record list; readers subscribe to the metadata store instead.
pub struct GalleryManager {
    context: String,
    collection: CollectionKey,
    objects: DynObjectStore,
    metadata: DynMetadataStore,
}

impl GalleryManager {
    pub fn new(context: impl Into<String>, objects: DynObjectStore, metadata: DynMetadataStore) -> Self {
        let context = context.into();
        Self {
            collection: CollectionKey::for_context(&context),
            context,
            objects,
            metadata,
        }
    }

    pub fn context(&self) -> &str {
        &self.context
    }

    pub fn collection(&self) -> &CollectionKey {
        &self.collection
    }

    pub fn objects(&self) -> &DynObjectStore {
        &self.objects
    }

    /// Every record of the context, newest year first, then by manual order.
    pub fn gallery_query(&self) -> PhotoQuery {
        PhotoQuery::all(self.collection.clone())
            .order_by(SortField::Year, Direction::Descending)
            .order_by(SortField::Order, Direction::Ascending)
    }

    /// Uploads the original, then writes the record. The upload always
    /// completes before the insert starts, so a record never points at a blob
    /// that was not stored. If the insert fails the blob stays behind for sync.
    pub async fn create(&self, upload: PhotoUpload) -> Result<CreatedPhoto, GalleryError> {
        paths::validate_file_name(&upload.file_name)?;
        let predicted = paths::predict(&upload.file_name);

        info!(
            "[{}] Uploading {} ({} bytes)",
            self.context,
            predicted.original_path,
            upload.bytes.len()
        );

        self.objects
            .upload(&predicted.original_path, upload.bytes)
            .await
            .map_err(|e| {
                warn!("[{}] Upload of {} failed: {}", self.context, predicted.original_path, e);
                GalleryError::Upload(e)
            })?;

        let photo = NewPhoto {
            title: non_blank(upload.title).unwrap_or_else(|| paths::clean_title(&upload.file_name)),
            year: upload.year.unwrap_or_else(current_year),
            album: non_blank(upload.album).unwrap_or_else(|| DEFAULT_ALBUM.to_string()),
            color_label: upload.color_label.unwrap_or_default().trim().to_string(),
            original_path: predicted.original_path.clone(),
            standard_path: predicted.standard_path.clone(),
            order: 0,
        };

        let id = self
            .metadata
            .insert(&self.collection, photo)
            .await
            .map_err(|e| {
                error!(
                    "[{}] Record insert failed, {} is left for the next sync: {}",
                    self.context, predicted.original_path, e
                );
                GalleryError::MetadataWrite(e)
            })?;

        info!("[{}] Created photo {} ({})", self.context, id, predicted.original_path);

        Ok(CreatedPhoto {
            id,
            original_path: predicted.original_path,
            standard_path: predicted.standard_path,
        })
    }

    /// Patches title, year, order and album. Failures are not retried.
    pub async fn update(&self, id: &str, edit: PhotoEdit) -> Result<(), GalleryError> {
        if edit.is_empty() {
            return Err(GalleryError::InvalidInput("no fields to update".to_string()));
        }
        if edit.title.as_deref().is_some_and(|t| t.trim().is_empty()) {
            return Err(GalleryError::InvalidInput("title must not be empty".to_string()));
        }

        self.metadata
            .update(&self.collection, id, edit)
            .await
            .map_err(|e| {
                warn!("[{}] Update of {} rejected: {}", self.context, id, e);
                GalleryError::MetadataWrite(e)
            })?;

        info!("[{}] Updated photo {}", self.context, id);
        Ok(())
    }

    /// Removes both blobs, then the record. Blob failures are logged and
    /// reported, never returned: a rendition that was never produced is the
    /// common case. Only a failed record delete fails the operation, which
    /// leaves the record visible so the delete can be retried.
    pub async fn delete(&self, record: &PhotoRecord) -> Result<DeleteReport, GalleryError> {
        let original = self.delete_blob(&record.original_path).await;
        let standard = self.delete_blob(&record.standard_path).await;

        self.metadata
            .delete(&self.collection, &record.id)
            .await
            .map_err(|e| {
                error!("[{}] Delete of record {} failed: {}", self.context, record.id, e);
                GalleryError::MetadataWrite(e)
            })?;

        info!("[{}] Deleted photo {}", self.context, record.id);

        Ok(DeleteReport {
            id: record.id.clone(),
            original,
            standard,
        })
    }

    async fn delete_blob(&self, path: &str) -> BlobOutcome {
        match self.objects.delete(path).await {
            Ok(()) => BlobOutcome::Deleted,
            Err(e) if e.is_not_found() => {
                debug!("[{}] Blob {} already absent", self.context, path);
                BlobOutcome::AlreadyAbsent
            }
            Err(e) => {
                warn!("[{}] Could not delete blob {}: {}", self.context, path, e);
                BlobOutcome::Failed(e.to_string())
            }
        }
    }

    /// Imports blobs under the upload prefix that no record references.
    ///
    /// Additive only: existing records are never touched, and a path that is
    /// already referenced is skipped, so repeated runs are no-ops. A blob
    /// uploaded between the listing and the record read may be imported twice.
    pub async fn sync(&self) -> Result<SyncReport, GalleryError> {
        let listed = self
            .objects
            .list(UPLOAD_PREFIX)
            .await
            .map_err(GalleryError::Listing)?;
        let records = self.records().await?;

        let mut tracked: HashSet<String> = records.into_iter().map(|r| r.original_path).collect();
        let mut report = SyncReport {
            listed: listed.len(),
            ..Default::default()
        };

        for blob in listed {
            if tracked.contains(&blob.path) {
                report.already_tracked += 1;
                continue;
            }

            let photo = NewPhoto {
                title: paths::clean_title(&blob.name),
                year: current_year(),
                album: IMPORTED_ALBUM.to_string(),
                color_label: String::new(),
                original_path: blob.path.clone(),
                standard_path: paths::predict_from_original(&blob.path).standard_path,
                order: 0,
            };

            match self.metadata.insert(&self.collection, photo).await {
                Ok(id) => {
                    info!("[{}] Imported {} as {}", self.context, blob.path, id);
                    tracked.insert(blob.path);
                    report.imported.push(id);
                }
                Err(e) => {
                    warn!("[{}] Could not import {}: {}", self.context, blob.path, e);
                    report.failed.push(blob.path);
                }
            }
        }

        info!(
            "[{}] Sync finished: {} listed, {} tracked, {} imported, {} failed",
            self.context,
            report.listed,
            report.already_tracked,
            report.imported.len(),
            report.failed.len()
        );

        Ok(report)
    }

    pub async fn records(&self) -> Result<Vec<PhotoRecord>, GalleryError> {
        self.metadata
            .query(&self.gallery_query())
            .await
            .map_err(GalleryError::MetadataRead)
    }

    /// Reads one record straight from the store.
    pub async fn find_record(&self, id: &str) -> Result<Option<PhotoRecord>, GalleryError> {
        Ok(self.records().await?.into_iter().find(|r| r.id == id))
    }

    pub async fn subscribe(&self) -> Result<Subscription, GalleryError> {
        self.metadata
            .subscribe(self.gallery_query())
            .await
            .map_err(GalleryError::Subscription)
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
