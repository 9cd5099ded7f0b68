use axum::http::{HeaderName, HeaderValue, StatusCode, header};
use axum_test::TestServer;
use folio::storage::StorageProviderConfig;
use folio::{Config, create_app};
use serde_json::{Value, json};

const ADMIN: &str = "ada@example.com";

async fn server() -> TestServer {
    let mut config = Config::default();
    config.storage.provider = StorageProviderConfig::Memory;
    config.app.admin_emails = vec![ADMIN.to_string()];
    config.app.session_secret = "integration-secret".to_string();
    TestServer::new(create_app(config).await.unwrap()).unwrap()
}

fn identity(email: &'static str) -> (HeaderName, HeaderValue) {
    (
        HeaderName::from_static("x-authenticated-email"),
        HeaderValue::from_static(email),
    )
}

#[tokio::test]
async fn test_admin_routes_require_sign_in() {
    let server = server().await;

    let response = server.get("/api/admin/gallery/inside").await;
    response.assert_status(StatusCode::UNAUTHORIZED);
    let body: Value = response.json();
    assert_eq!(body["success"], false);
    assert_eq!(body["message"], "Sign in with an authorized account.");

    server
        .post("/api/admin/gallery/inside/sync")
        .await
        .assert_status(StatusCode::UNAUTHORIZED);
    server
        .get("/admin/gallery/inside")
        .await
        .assert_status(StatusCode::UNAUTHORIZED);

    // Public routes stay open.
    server.get("/api/gallery/inside").await.assert_status_ok();
    server.get("/api/pages/home").await.assert_status_ok();
}

#[tokio::test]
async fn test_unlisted_account_is_forbidden() {
    let server = server().await;

    let (name, value) = identity("eve@example.com");
    let response = server
        .put("/api/admin/pages/home")
        .add_header(name, value)
        .json(&json!({ "main_title": "pwned", "main_subtitle": "" }))
        .await;
    response.assert_status(StatusCode::FORBIDDEN);
    let body: Value = response.json();
    assert_eq!(
        body["message"],
        "Your account is not authorized to access this panel."
    );

    let page: Value = server.get("/api/pages/home").await.json();
    assert_eq!(page["exists"], false);
}

#[tokio::test]
async fn test_session_cookie_flow() {
    let server = server().await;

    let status: Value = server.get("/api/session").await.json();
    assert_eq!(status["authenticated"], false);

    let (name, value) = identity(ADMIN);
    let response = server.post("/api/session").add_header(name, value).await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["message"], "Session verified.");

    let set_cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .and_then(|v| v.to_str().ok())
        .unwrap()
        .to_string();
    assert!(set_cookie.starts_with("admin_session="));
    assert!(set_cookie.contains("HttpOnly"));
    let cookie = set_cookie.split(';').next().unwrap().to_string();

    // The cookie alone is enough afterwards.
    let status: Value = server
        .get("/api/session")
        .add_header(header::COOKIE, HeaderValue::from_str(&cookie).unwrap())
        .await
        .json();
    assert_eq!(status["authenticated"], true);
    assert_eq!(status["email"], ADMIN);

    server
        .get("/api/admin/gallery/inside")
        .add_header(header::COOKIE, HeaderValue::from_str(&cookie).unwrap())
        .await
        .assert_status_ok();

    let response = server.delete("/api/session").await;
    response.assert_status_ok();
    let cleared = response
        .headers()
        .get(header::SET_COOKIE)
        .and_then(|v| v.to_str().ok())
        .unwrap();
    assert!(cleared.contains("Max-Age=0"));
}

#[tokio::test]
async fn test_forged_cookie_rejected() {
    let server = server().await;
    server
        .get("/api/admin/gallery/inside")
        .add_header(
            header::COOKIE,
            HeaderValue::from_static("admin_session=ada@example.com:Zm9yZ2Vk"),
        )
        .await
        .assert_status(StatusCode::UNAUTHORIZED);
}
