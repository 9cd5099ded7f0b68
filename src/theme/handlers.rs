use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::info;

use super::{DesignTheme, ThemeError, ThemeSettings, load_design, save_design};
use crate::AppState;
use crate::api::StatusResponse;
use crate::login::AdminSession;

#[derive(Debug, Deserialize)]
pub struct DesignQuery {
    pub album: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct DesignResponse {
    pub context: String,
    pub album: Option<String>,
    pub exists: bool,
    pub theme: ThemeSettings,
    pub css: BTreeMap<&'static str, String>,
}

fn check_context(app_state: &AppState, context: &str) -> Result<(), ThemeError> {
    if app_state.config.gallery.accepts_design(context) {
        Ok(())
    } else {
        Err(ThemeError::UnknownContext(context.to_string()))
    }
}

pub async fn get_design_handler(
    State(app_state): State<AppState>,
    Path(context): Path<String>,
    Query(query): Query<DesignQuery>,
) -> Result<Json<DesignResponse>, ThemeError> {
    check_context(&app_state, &context)?;
    let stored = load_design(&app_state.metadata, &context).await?;
    let exists = stored.is_some();
    let design = stored.unwrap_or_default();

    let theme = design.effective(query.album.as_deref()).clone();
    Ok(Json(DesignResponse {
        css: theme.css_variables(),
        context,
        album: query.album,
        exists,
        theme,
    }))
}

pub async fn save_design_handler(
    session: AdminSession,
    State(app_state): State<AppState>,
    Path(context): Path<String>,
    Json(design): Json<DesignTheme>,
) -> Result<Json<StatusResponse>, ThemeError> {
    check_context(&app_state, &context)?;
    save_design(&app_state.metadata, &context, &design).await?;
    info!("Theme for {} saved by {}", context, session.email);
    Ok(Json(StatusResponse::ok("Theme saved.")))
}
