use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::api::StatusResponse;
use crate::metadata::MetadataError;
use crate::storage::StorageError;

#[derive(Debug, Error)]
pub enum GalleryError {
    #[error("Upload failed: {0}")]
    Upload(#[source] StorageError),

    #[error("Metadata write failed: {0}")]
    MetadataWrite(#[source] MetadataError),

    #[error("Metadata read failed: {0}")]
    MetadataRead(#[source] MetadataError),

    #[error("Storage listing failed: {0}")]
    Listing(#[source] StorageError),

    #[error("Subscription failed: {0}")]
    Subscription(#[source] MetadataError),

    #[error("Template rendering failed: {0}")]
    Render(String),

    #[error("Gallery not found: {0}")]
    UnknownContext(String),

    #[error("Photo not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Another {0} is already in progress")]
    Busy(&'static str),

    #[error("Deleting a photo requires confirmation")]
    ConfirmationRequired,
}

impl IntoResponse for GalleryError {
    fn into_response(self) -> Response {
        let status = match &self {
            GalleryError::Upload(_)
            | GalleryError::MetadataWrite(_)
            | GalleryError::MetadataRead(_)
            | GalleryError::Listing(_) => StatusCode::BAD_GATEWAY,
            GalleryError::Subscription(_) => StatusCode::SERVICE_UNAVAILABLE,
            GalleryError::Render(_) => StatusCode::INTERNAL_SERVER_ERROR,
            GalleryError::UnknownContext(_) | GalleryError::NotFound(_) => StatusCode::NOT_FOUND,
            GalleryError::InvalidInput(_) | GalleryError::ConfirmationRequired => {
                StatusCode::BAD_REQUEST
            }
            GalleryError::Busy(_) => StatusCode::CONFLICT,
        };

        if status.is_server_error() {
            tracing::error!("Gallery request failed: {}", self);
        }

        (status, Json(StatusResponse::error(self.to_string()))).into_response()
    }
}
