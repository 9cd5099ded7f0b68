use axum::http::{HeaderName, HeaderValue, StatusCode};
use axum_test::TestServer;
use folio::storage::StorageProviderConfig;
use folio::{Config, create_app};
use serde_json::{Value, json};
use tempfile::TempDir;

const ADMIN: &str = "ada@example.com";

fn test_config() -> Config {
    let mut config = Config::default();
    config.storage.provider = StorageProviderConfig::Memory;
    config.app.admin_emails = vec![ADMIN.to_string()];
    config.app.session_secret = "integration-secret".to_string();
    config
}

fn identity() -> (HeaderName, HeaderValue) {
    (
        HeaderName::from_static("x-authenticated-email"),
        HeaderValue::from_static(ADMIN),
    )
}

#[tokio::test]
async fn test_home_page_fallback_and_save() {
    let server = TestServer::new(create_app(test_config()).await.unwrap()).unwrap();

    let page: Value = server.get("/api/pages/home").await.json();
    assert_eq!(page["exists"], false);
    assert_eq!(page["main_title"], "Hello, I am Adrián Bernardino");
    assert_eq!(page["main_subtitle"], "0 — 🌲🌱📌🌐☀️🎬🕣💧🔥🌸🍇🪵📡 — ∞");

    let (name, value) = identity();
    server
        .put("/api/admin/pages/home")
        .add_header(name, value)
        .json(&json!({ "main_title": "Hi there", "main_subtitle": "photos" }))
        .await
        .assert_status_ok();

    let page: Value = server.get("/api/pages/home").await.json();
    assert_eq!(page["exists"], true);
    assert_eq!(page["main_title"], "Hi there");
    assert_eq!(page["main_subtitle"], "photos");

    server
        .get("/api/pages/bad.name")
        .await
        .assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_pages_survive_restart() {
    let temp = TempDir::new().unwrap();
    let mut config = test_config();
    config.database.path = Some(temp.path().join("folio.json"));

    {
        let server = TestServer::new(create_app(config.clone()).await.unwrap()).unwrap();
        let (name, value) = identity();
        server
            .put("/api/admin/pages/home")
            .add_header(name, value)
            .json(&json!({ "main_title": "Persisted", "main_subtitle": "" }))
            .await
            .assert_status_ok();
    }

    let server = TestServer::new(create_app(config).await.unwrap()).unwrap();
    let page: Value = server.get("/api/pages/home").await.json();
    assert_eq!(page["main_title"], "Persisted");
}

#[tokio::test]
async fn test_design_defaults_and_album_override() {
    let server = TestServer::new(create_app(test_config()).await.unwrap()).unwrap();

    let design: Value = server.get("/api/design/inside").await.json();
    assert_eq!(design["exists"], false);
    assert_eq!(design["css"]["--lava-c1"], "#4ade80");
    assert_eq!(design["css"]["--lava-duration"], "35s");
    assert_eq!(design["css"]["--lava-opacity"], "0.55");
    assert_eq!(design["css"]["--bg-base"], "#05040a");

    let (name, value) = identity();
    server
        .put("/api/admin/design/inside")
        .add_header(name, value)
        .json(&json!({
            "default_theme": { "lava_speed": 100, "background_mode": "infrared" },
            "albums": {
                "night": {
                    "use_custom_colors": true,
                    "lava_color_primary": "#ff00aa",
                    "lava_intensity": 0,
                    "background_mode": "neon_night"
                }
            }
        }))
        .await
        .assert_status_ok();

    let design: Value = server.get("/api/design/inside").await.json();
    assert_eq!(design["exists"], true);
    assert_eq!(design["css"]["--lava-duration"], "10s");
    assert_eq!(design["css"]["--lava-blend"], "difference");

    let night: Value = server
        .get("/api/design/inside")
        .add_query_param("album", "night")
        .await
        .json();
    assert_eq!(night["css"]["--lava-c1"], "#ff00aa");
    assert_eq!(night["css"]["--lava-opacity"], "0.3");
    assert_eq!(night["css"]["--lava-blend"], "screen");
    assert_eq!(night["css"]["--bg-base"], "#000000");

    // Themes are per context.
    let outside: Value = server.get("/api/design/outside").await.json();
    assert_eq!(outside["exists"], false);
}

#[tokio::test]
async fn test_design_validation() {
    let server = TestServer::new(create_app(test_config()).await.unwrap()).unwrap();

    let (name, value) = identity();
    let response = server
        .put("/api/admin/design/inside")
        .add_header(name, value)
        .json(&json!({ "default_theme": { "lava_speed": 150 } }))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["success"], false);

    server
        .get("/api/design/nowhere")
        .await
        .assert_status_not_found();
}

#[tokio::test]
async fn test_home_design_without_gallery() {
    let server = TestServer::new(create_app(test_config()).await.unwrap()).unwrap();

    let design: Value = server.get("/api/design/home").await.json();
    assert_eq!(design["context"], "home");
    assert_eq!(design["exists"], false);

    let (name, value) = identity();
    server
        .put("/api/admin/design/home")
        .add_header(name, value)
        .json(&json!({ "default_theme": { "background_mode": "classic_lava" } }))
        .await
        .assert_status_ok();

    let design: Value = server.get("/api/design/home").await.json();
    assert_eq!(design["exists"], true);
    assert_eq!(design["theme"]["background_mode"], "classic_lava");

    // Home has a theme but no photo collection.
    server
        .get("/api/gallery/home")
        .await
        .assert_status_not_found();
}
