// Gallery module - per-context photo lifecycle and live view
mod control;
mod error;
mod handlers;
mod lifecycle;
mod live;
pub mod paths;
mod types;
pub mod view;

pub use control::{Control, ControlGuard, ControlLatch};
pub use error::GalleryError;
pub use handlers::{
    admin_gallery_handler, admin_gallery_page_handler, create_photo_handler, delete_photo_handler,
    public_gallery_handler, sync_handler, update_photo_handler,
};
pub use lifecycle::{GalleryManager, current_year};
pub use live::{LiveGallery, ViewState};
pub use types::*;

use std::{collections::HashMap, sync::Arc};

use crate::metadata::DynMetadataStore;
use crate::storage::DynObjectStore;

pub type SharedGalleries = Arc<HashMap<String, Arc<GalleryContext>>>;

/// Everything one gallery context needs at runtime: the manager that writes,
/// the live view that reads, and the latch that guards admin controls.
pub struct GalleryContext {
    pub name: String,
    pub manager: Arc<GalleryManager>,
    pub live: LiveGallery,
    pub latch: ControlLatch,
}

impl GalleryContext {
    /// Must be called from within a tokio runtime; starts the live subscription.
    pub fn start(name: &str, objects: DynObjectStore, metadata: DynMetadataStore) -> Self {
        let manager = Arc::new(GalleryManager::new(name, objects, metadata));
        let live = LiveGallery::start(manager.clone());
        Self {
            name: name.to_string(),
            manager,
            live,
            latch: ControlLatch::new(),
        }
    }
}

pub fn start_galleries(
    contexts: &[String],
    objects: &DynObjectStore,
    metadata: &DynMetadataStore,
) -> SharedGalleries {
    let galleries = contexts
        .iter()
        .map(|name| {
            let context = GalleryContext::start(name, objects.clone(), metadata.clone());
            (name.clone(), Arc::new(context))
        })
        .collect();
    Arc::new(galleries)
}
