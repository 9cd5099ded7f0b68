use thiserror::Error;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Upload rejected for {path}: {reason}")]
    Upload { path: String, reason: String },

    #[error("Blob not found: {0}")]
    NotFound(String),

    #[error("Delete failed for {path}: {reason}")]
    Delete { path: String, reason: String },

    #[error("Invalid storage path: {0}")]
    InvalidPath(String),

    #[error("Storage configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl StorageError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, StorageError::NotFound(_))
    }
}
