use serde::{Deserialize, Serialize};

pub use crate::metadata::{PhotoPatch as PhotoEdit, PhotoRecord};

pub const DEFAULT_ALBUM: &str = "general";
pub const IMPORTED_ALBUM: &str = "imported";

/// A photo submitted through the admin panel. Metadata fields are optional.
#[derive(Debug, Clone)]
pub struct PhotoUpload {
    pub file_name: String,
    pub bytes: Vec<u8>,
    pub title: Option<String>,
    pub year: Option<i32>,
    pub album: Option<String>,
    pub color_label: Option<String>,
}

impl PhotoUpload {
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            bytes,
            title: None,
            year: None,
            album: None,
            color_label: None,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_year(mut self, year: i32) -> Self {
        self.year = Some(year);
        self
    }

    pub fn with_album(mut self, album: impl Into<String>) -> Self {
        self.album = Some(album.into());
        self
    }

    pub fn with_color_label(mut self, color_label: impl Into<String>) -> Self {
        self.color_label = Some(color_label.into());
        self
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CreatedPhoto {
    pub id: String,
    pub original_path: String,
    pub standard_path: String,
}

/// What happened to one blob during a delete.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", content = "detail", rename_all = "snake_case")]
pub enum BlobOutcome {
    Deleted,
    AlreadyAbsent,
    Failed(String),
}

#[derive(Debug, Clone, Serialize)]
pub struct DeleteReport {
    pub id: String,
    pub original: BlobOutcome,
    pub standard: BlobOutcome,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct SyncReport {
    pub listed: usize,
    pub already_tracked: usize,
    pub imported: Vec<String>,
    pub failed: Vec<String>,
}

/// Upload metadata carried in the query string of the upload request.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UploadQuery {
    pub title: Option<String>,
    pub year: Option<i32>,
    pub album: Option<String>,
    pub color_label: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AdminGalleryQuery {
    pub edit: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PublicGalleryQuery {
    pub album: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DeleteQuery {
    #[serde(default)]
    pub confirm: bool,
}
