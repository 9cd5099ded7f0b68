use axum::{
    extract::FromRequestParts,
    http::{HeaderMap, request::Parts},
};
use tracing::{debug, warn};

use super::LoginError;
use crate::api::{get_cookie_value, verify_signed_cookie};
use crate::{AppConfig, AppState};

pub const SESSION_COOKIE: &str = "admin_session";

/// E-mail the identity proxy vouched for, if the header is present.
pub fn identity_email(headers: &HeaderMap, app: &AppConfig) -> Option<String> {
    let email = headers
        .get(app.identity_header.as_str())?
        .to_str()
        .ok()?
        .trim();
    (!email.is_empty()).then(|| email.to_string())
}

pub fn is_admin(app: &AppConfig, email: &str) -> bool {
    app.admin_emails.iter().any(|allowed| allowed == email)
}

/// Session cookie first, then the identity header. Returns the admin e-mail.
pub fn authorize(headers: &HeaderMap, app: &AppConfig) -> Result<String, LoginError> {
    if let Some(signed) = get_cookie_value(headers, SESSION_COOKIE)
        && let Some(email) = verify_signed_cookie(&app.session_secret, &signed)
    {
        if is_admin(app, &email) {
            return Ok(email);
        }
        debug!("Session cookie for {} no longer on the admin list", email);
    }

    match identity_email(headers, app) {
        Some(email) if is_admin(app, &email) => Ok(email),
        Some(email) => {
            warn!("Rejected admin access for {}", email);
            Err(LoginError::NotAuthorized)
        }
        None => Err(LoginError::NotSignedIn),
    }
}

/// Extractor guarding admin routes.
#[derive(Debug, Clone)]
pub struct AdminSession {
    pub email: String,
}

impl FromRequestParts<AppState> for AdminSession {
    type Rejection = LoginError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        authorize(&parts.headers, &state.config.app).map(|email| AdminSession { email })
    }
}
