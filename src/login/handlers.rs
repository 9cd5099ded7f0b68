use axum::{
    Json,
    extract::State,
    http::{HeaderMap, HeaderValue, header::SET_COOKIE},
    response::IntoResponse,
};
use tracing::info;

use super::{LoginError, SESSION_COOKIE, SessionStatus, authorize};
use crate::AppState;
use crate::api::{StatusResponse, create_signed_cookie};

const SESSION_MAX_AGE_SECS: u64 = 7 * 24 * 60 * 60;

fn cookie_header(value: &str, max_age: u64) -> Result<HeaderMap, LoginError> {
    let cookie = format!(
        "{}={}; Path=/; Max-Age={}; HttpOnly; SameSite=Lax",
        SESSION_COOKIE, value, max_age
    );
    let mut headers = HeaderMap::new();
    headers.insert(
        SET_COOKIE,
        HeaderValue::from_str(&cookie).map_err(|e| LoginError::InternalError(e.to_string()))?,
    );
    Ok(headers)
}

pub async fn session_status_handler(
    State(app_state): State<AppState>,
    headers: HeaderMap,
) -> Json<SessionStatus> {
    let status = match authorize(&headers, &app_state.config.app) {
        Ok(email) => SessionStatus {
            authenticated: true,
            email: Some(email),
            message: "Session verified.".to_string(),
        },
        Err(e) => SessionStatus {
            authenticated: false,
            email: None,
            message: e.to_string(),
        },
    };
    Json(status)
}

/// Turns the identity proxy's principal into a signed admin session.
pub async fn sign_in_handler(
    State(app_state): State<AppState>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, LoginError> {
    let app = &app_state.config.app;
    let email = authorize(&headers, app)?;

    let signed =
        create_signed_cookie(&app.session_secret, &email).map_err(LoginError::InternalError)?;
    let response_headers = cookie_header(&signed, SESSION_MAX_AGE_SECS)?;

    info!("Admin {} signed in", email);
    Ok((response_headers, Json(StatusResponse::ok("Session verified."))))
}

pub async fn sign_out_handler() -> Result<impl IntoResponse, LoginError> {
    let headers = cookie_header("", 0)?;
    Ok((headers, Json(StatusResponse::ok("Signed out."))))
}
