use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::api::StatusResponse;
use crate::metadata::MetadataError;

#[derive(Debug, Error)]
pub enum ThemeError {
    #[error("Unknown design context: {0}")]
    UnknownContext(String),

    #[error("{field} must be between 0 and 100, got {value}")]
    OutOfRange { field: &'static str, value: i64 },

    #[error("{field} is not a hex color: {value}")]
    InvalidColor { field: &'static str, value: String },

    #[error("Theme store failed: {0}")]
    Store(#[from] MetadataError),
}

impl IntoResponse for ThemeError {
    fn into_response(self) -> Response {
        let status = match self {
            ThemeError::UnknownContext(_) => StatusCode::NOT_FOUND,
            ThemeError::OutOfRange { .. } | ThemeError::InvalidColor { .. } => {
                StatusCode::BAD_REQUEST
            }
            ThemeError::Store(_) => StatusCode::BAD_GATEWAY,
        };
        (status, Json(StatusResponse::error(self.to_string()))).into_response()
    }
}
