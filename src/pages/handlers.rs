use axum::{
    Json,
    extract::{Path, State},
};
use tracing::info;

use super::{LoadedPage, PageContent, PageError, load_page, save_page};
use crate::AppState;
use crate::api::StatusResponse;
use crate::login::AdminSession;

pub async fn get_page_handler(
    State(app_state): State<AppState>,
    Path(page): Path<String>,
) -> Result<Json<LoadedPage>, PageError> {
    Ok(Json(load_page(&app_state.metadata, &page).await?))
}

pub async fn save_page_handler(
    session: AdminSession,
    State(app_state): State<AppState>,
    Path(page): Path<String>,
    Json(content): Json<PageContent>,
) -> Result<Json<StatusResponse>, PageError> {
    save_page(&app_state.metadata, &page, content).await?;
    info!("Page {} saved by {}", page, session.email);
    Ok(Json(StatusResponse::ok("Changes saved.")))
}
