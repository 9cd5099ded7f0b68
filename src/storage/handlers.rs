use axum::{
    body::Body,
    extract::{Path, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use std::time::UNIX_EPOCH;
use tokio::fs::File;
use tokio_util::io::ReaderStream;
use tracing::{debug, error};

use crate::AppState;
use crate::storage::validate_path;

/// Serves a blob under the configured storage URL prefix. Filesystem blobs are
/// streamed from disk; other backends go through `ObjectStore::download`.
pub async fn blob_handler(State(app_state): State<AppState>, Path(path): Path<String>) -> Response {
    if validate_path(&path).is_err() {
        error!("Rejected blob path: {:?}", path);
        return (StatusCode::BAD_REQUEST, "Invalid path").into_response();
    }

    let content_type = mime_guess::from_path(&path)
        .first_or_octet_stream()
        .to_string();

    let Some(root) = app_state.config.storage.filesystem_root() else {
        return match app_state.objects.download(&path).await {
            Ok(bytes) => (
                StatusCode::OK,
                [(header::CONTENT_TYPE, content_type)],
                bytes,
            )
                .into_response(),
            Err(e) => {
                debug!("Blob {} unavailable: {}", path, e);
                (StatusCode::NOT_FOUND, "File not found").into_response()
            }
        };
    };

    let file_path = root.join(&path);
    let metadata = match tokio::fs::metadata(&file_path).await {
        Ok(m) if m.is_file() => m,
        _ => {
            debug!("Blob file missing: {:?}", file_path);
            return (StatusCode::NOT_FOUND, "File not found").into_response();
        }
    };

    let file = match File::open(&file_path).await {
        Ok(file) => file,
        Err(e) => {
            debug!("Failed to open blob {:?}: {}", file_path, e);
            return (StatusCode::NOT_FOUND, "File not found").into_response();
        }
    };

    let body = Body::from_stream(ReaderStream::new(file));

    let mut response = Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, content_type)
        .header(header::CACHE_CONTROL, "public, max-age=3600");

    if let Ok(modified) = metadata.modified()
        && let Ok(duration) = modified.duration_since(UNIX_EPOCH)
    {
        response = response
            .header(header::LAST_MODIFIED, httpdate::fmt_http_date(modified))
            .header(
                header::ETAG,
                format!("\"{}-{}\"", duration.as_secs(), metadata.len()),
            );
    }

    response.body(body).unwrap_or_else(|e| {
        error!("Failed to build blob response: {}", e);
        StatusCode::INTERNAL_SERVER_ERROR.into_response()
    })
}
