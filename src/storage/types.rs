use serde::{Deserialize, Serialize};

/// A blob found by [`super::ObjectStore::list`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlobEntry {
    /// Full path inside the store, e.g. `image/sunset.jpg`.
    pub path: String,
    /// Last path segment, e.g. `sunset.jpg`.
    pub name: String,
}

impl BlobEntry {
    pub fn from_path(path: impl Into<String>) -> Self {
        let path = path.into();
        let name = path.rsplit('/').next().unwrap_or(&path).to_string();
        Self { path, name }
    }
}
