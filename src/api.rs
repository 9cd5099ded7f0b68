use axum::http::HeaderMap;
use base64::{Engine, engine::general_purpose};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Body returned by write endpoints and by every error response.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StatusResponse {
    pub success: bool,
    pub message: String,
}

impl StatusResponse {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
        }
    }
}

pub fn create_signed_cookie(secret: &str, value: &str) -> Result<String, String> {
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).map_err(|_| "Invalid secret key")?;
    mac.update(value.as_bytes());
    let signature = mac.finalize().into_bytes();
    let signature_b64 = general_purpose::URL_SAFE_NO_PAD.encode(signature);
    Ok(format!("{}:{}", value, signature_b64))
}

/// Returns the signed value when the signature checks out.
pub fn verify_signed_cookie(secret: &str, signed_value: &str) -> Option<String> {
    // The signature never contains ':', the value may.
    let (value, signature_b64) = signed_value.rsplit_once(':')?;
    let signature = general_purpose::URL_SAFE_NO_PAD.decode(signature_b64).ok()?;
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).ok()?;
    mac.update(value.as_bytes());
    mac.verify_slice(&signature).ok()?;
    Some(value.to_string())
}

pub fn get_cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get("cookie")?
        .to_str()
        .ok()?
        .split(';')
        .find_map(|cookie| {
            let (key, value) = cookie.trim().split_once('=')?;
            (key.trim() == name).then(|| value.trim().to_string())
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_signed_cookie_roundtrip() {
        let signed = create_signed_cookie("secret", "ada@example.com").unwrap();
        assert_eq!(
            verify_signed_cookie("secret", &signed).as_deref(),
            Some("ada@example.com")
        );
        assert!(verify_signed_cookie("other", &signed).is_none());
    }

    #[test]
    fn test_tampered_cookie_rejected() {
        let signed = create_signed_cookie("secret", "ada@example.com").unwrap();
        let (_, signature) = signed.rsplit_once(':').unwrap();
        let forged = format!("eve@example.com:{}", signature);
        assert!(verify_signed_cookie("secret", &forged).is_none());
        assert!(verify_signed_cookie("secret", "no-signature").is_none());
    }

    #[test]
    fn test_get_cookie_value() {
        let mut headers = HeaderMap::new();
        headers.insert(
            "cookie",
            HeaderValue::from_static("theme=dark; admin_session=abc:def"),
        );
        assert_eq!(
            get_cookie_value(&headers, "admin_session").as_deref(),
            Some("abc:def")
        );
        assert!(get_cookie_value(&headers, "missing").is_none());
    }
}
