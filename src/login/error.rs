use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::api::StatusResponse;

#[derive(Debug, Error)]
pub enum LoginError {
    #[error("Sign in with an authorized account.")]
    NotSignedIn,

    #[error("Your account is not authorized to access this panel.")]
    NotAuthorized,

    #[error("Internal error: {0}")]
    InternalError(String),
}

impl IntoResponse for LoginError {
    fn into_response(self) -> Response {
        let status = match self {
            LoginError::NotSignedIn => StatusCode::UNAUTHORIZED,
            LoginError::NotAuthorized => StatusCode::FORBIDDEN,
            LoginError::InternalError(ref e) => {
                tracing::error!("Login failure: {}", e);
                return (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(StatusResponse::error("Internal server error")),
                )
                    .into_response();
            }
        };

        (status, Json(StatusResponse::error(self.to_string()))).into_response()
    }
}
