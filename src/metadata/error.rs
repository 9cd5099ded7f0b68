use thiserror::Error;

#[derive(Debug, Error)]
pub enum MetadataError {
    #[error("Write rejected: {0}")]
    WriteError(String),

    #[error("Document not found: {0}")]
    NotFound(String),

    #[error("Subscription closed: the metadata store is no longer available")]
    SubscriptionClosed,

    #[error("Serialization error: {0}")]
    SerdeError(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}
