use axum::http::{HeaderName, HeaderValue, StatusCode};
use axum_test::TestServer;
use axum::body::Bytes;
use folio::storage::{ObjectStore, StorageProviderConfig};
use folio::{AppState, Config, router};
use serde_json::{Value, json};
use std::time::Duration;

fn jpeg() -> Bytes {
    Bytes::from_static(b"\xff\xd8\xff\xe0 not really a jpeg")
}

const ADMIN: &str = "ada@example.com";

fn identity(email: &'static str) -> (HeaderName, HeaderValue) {
    (
        HeaderName::from_static("x-authenticated-email"),
        HeaderValue::from_static(email),
    )
}

async fn setup() -> (TestServer, AppState) {
    let mut config = Config::default();
    config.storage.provider = StorageProviderConfig::Memory;
    config.app.admin_emails = vec![ADMIN.to_string()];
    config.app.session_secret = "integration-secret".to_string();

    let state = AppState::new(config).await.unwrap();
    let server = TestServer::new(router(state.clone())).unwrap();
    (server, state)
}

fn rows(body: &Value) -> Vec<Value> {
    body["page"]["rows"].as_array().cloned().unwrap_or_default()
}

fn settled(body: &Value) -> bool {
    body["status"] == "ready"
        && rows(body)
            .iter()
            .all(|row| row["media"]["source"] != "pending")
}

/// Polls the admin view until `predicate` holds for a fully resolved snapshot.
async fn wait_for_view(server: &TestServer, predicate: impl Fn(&[Value]) -> bool) -> Value {
    for _ in 0..200 {
        let (name, value) = identity(ADMIN);
        let body: Value = server
            .get("/api/admin/gallery/inside")
            .add_header(name, value)
            .await
            .json();
        if settled(&body) && predicate(&rows(&body)) {
            return body;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("admin view never reached the expected state");
}

#[tokio::test]
async fn test_upload_edit_delete_scenario() {
    let (server, state) = setup().await;
    wait_for_view(&server, |rows| rows.is_empty()).await;

    let (name, value) = identity(ADMIN);
    let response = server
        .put("/api/admin/gallery/inside/photos/sunset.jpg")
        .add_header(name, value)
        .add_query_param("title", "Sunset")
        .add_query_param("year", 2024)
        .add_query_param("album", "trips")
        .bytes(jpeg())
        .await;
    response.assert_status(StatusCode::CREATED);
    let created: Value = response.json();
    assert_eq!(created["original_path"], "image/sunset.jpg");
    assert_eq!(created["standard_path"], "image/webp/sunset_2048x2048.webp");
    let id = created["id"].as_str().unwrap().to_string();

    let body = wait_for_view(&server, |rows| rows.len() == 1).await;
    let row = &rows(&body)[0];
    assert_eq!(row["id"], id.as_str());
    assert_eq!(row["title"], "Sunset");
    assert_eq!(row["year"], 2024);
    assert_eq!(row["album"], "trips");
    assert_eq!(row["order"], 0);
    // No rendition yet, so the original is shown.
    assert_eq!(row["media"]["source"], "original");
    assert_eq!(row["media"]["view_url"], "memory://image/sunset.jpg");

    let (name, value) = identity(ADMIN);
    server
        .patch(&format!("/api/admin/gallery/inside/photos/{}", id))
        .add_header(name, value)
        .json(&json!({ "order": 5 }))
        .await
        .assert_status_ok();

    let body = wait_for_view(&server, |rows| rows.len() == 1 && rows[0]["order"] == 5).await;
    let edited = &rows(&body)[0];
    assert_eq!(edited["title"], "Sunset");
    assert_eq!(edited["year"], 2024);
    assert_eq!(edited["album"], "trips");

    let (name, value) = identity(ADMIN);
    server
        .delete(&format!("/api/admin/gallery/inside/photos/{}", id))
        .add_header(name, value)
        .await
        .assert_status(StatusCode::BAD_REQUEST);

    let (name, value) = identity(ADMIN);
    let response = server
        .delete(&format!("/api/admin/gallery/inside/photos/{}", id))
        .add_header(name, value)
        .add_query_param("confirm", true)
        .await;
    response.assert_status_ok();
    let report: Value = response.json();
    assert_eq!(report["original"]["outcome"], "deleted");
    assert_eq!(report["standard"]["outcome"], "already_absent");

    wait_for_view(&server, |rows| rows.is_empty()).await;
    let records = state.galleries["inside"].manager.records().await.unwrap();
    assert!(records.is_empty());
}

#[tokio::test]
async fn test_delete_unknown_photo_is_not_found() {
    let (server, _state) = setup().await;
    wait_for_view(&server, |rows| rows.is_empty()).await;

    let (name, value) = identity(ADMIN);
    server
        .delete("/api/admin/gallery/inside/photos/missing")
        .add_header(name, value)
        .add_query_param("confirm", true)
        .await
        .assert_status_not_found();
}

#[tokio::test]
async fn test_public_gallery_prefers_rendition() {
    let (server, state) = setup().await;

    let (name, value) = identity(ADMIN);
    server
        .put("/api/admin/gallery/inside/photos/sunset.jpg")
        .add_header(name, value)
        .add_query_param("album", "trips")
        .bytes(jpeg())
        .await
        .assert_status(StatusCode::CREATED);

    let body: Value = server.get("/api/gallery/inside").await.json();
    assert_eq!(body["photos"][0]["view_url"], "memory://image/sunset.jpg");
    assert_eq!(body["photos"][0]["title"], "sunset");

    state
        .objects
        .upload("image/webp/sunset_2048x2048.webp", b"webp".to_vec())
        .await
        .unwrap();

    let body: Value = server.get("/api/gallery/inside").await.json();
    assert_eq!(
        body["photos"][0]["view_url"],
        "memory://image/webp/sunset_2048x2048.webp"
    );
    assert_eq!(
        body["photos"][0]["download_url"],
        "memory://image/sunset.jpg"
    );
    assert_eq!(body["albums"], json!(["trips"]));

    let body: Value = server
        .get("/api/gallery/inside")
        .add_query_param("album", "studio")
        .await
        .json();
    assert_eq!(body["photos"], json!([]));

    // Contexts are separate collections.
    let body: Value = server.get("/api/gallery/outside").await.json();
    assert_eq!(body["photos"], json!([]));
}

#[tokio::test]
async fn test_sync_imports_untracked_uploads_once() {
    let (server, state) = setup().await;
    state
        .objects
        .upload("image/beach_day.jpg", b"jpeg".to_vec())
        .await
        .unwrap();

    let (name, value) = identity(ADMIN);
    let first: Value = server
        .post("/api/admin/gallery/inside/sync")
        .add_header(name, value)
        .await
        .json();
    assert_eq!(first["imported"].as_array().unwrap().len(), 1);

    let (name, value) = identity(ADMIN);
    let second: Value = server
        .post("/api/admin/gallery/inside/sync")
        .add_header(name, value)
        .await
        .json();
    assert_eq!(second["imported"], json!([]));
    assert_eq!(second["already_tracked"], 1);

    let body = wait_for_view(&server, |rows| rows.len() == 1).await;
    let row = &rows(&body)[0];
    assert_eq!(row["title"], "beach day");
    assert_eq!(row["album"], "imported");
}

#[tokio::test]
async fn test_upload_validation() {
    let (server, _state) = setup().await;

    let (name, value) = identity(ADMIN);
    server
        .put("/api/admin/gallery/inside/photos/empty.jpg")
        .add_header(name, value)
        .await
        .assert_status(StatusCode::BAD_REQUEST);

    let (name, value) = identity(ADMIN);
    server
        .put("/api/admin/gallery/nowhere/photos/a.jpg")
        .add_header(name, value)
        .bytes(jpeg())
        .await
        .assert_status_not_found();
}

#[tokio::test]
async fn test_admin_page_renders_rows() {
    let (server, _state) = setup().await;

    let (name, value) = identity(ADMIN);
    server
        .put("/api/admin/gallery/inside/photos/sunset.jpg")
        .add_header(name, value)
        .add_query_param("title", "Sunset")
        .bytes(jpeg())
        .await
        .assert_status(StatusCode::CREATED);
    let body = wait_for_view(&server, |rows| rows.len() == 1).await;
    let id = rows(&body)[0]["id"].as_str().unwrap().to_string();

    let (name, value) = identity(ADMIN);
    let html = server
        .get("/admin/gallery/inside")
        .add_header(name, value)
        .add_query_param("edit", &id)
        .await
        .text();
    assert!(html.contains("Sunset"));
    assert!(html.contains("memory://image/sunset.jpg"));
    assert!(html.contains(&format!("data-id=\"{}\"", id)));
    assert!(html.contains("<form class=\"edit\""));
}

#[tokio::test]
async fn test_admin_page_escapes_stored_text() {
    let (server, _state) = setup().await;

    let (name, value) = identity(ADMIN);
    server
        .put("/api/admin/gallery/inside/photos/night.jpg")
        .add_header(name, value)
        .add_query_param("title", "Night")
        .add_query_param("album", "<script>alert(1)</script>")
        .add_query_param("color_label", "<img src=x onerror=alert(2)>")
        .bytes(jpeg())
        .await
        .assert_status(StatusCode::CREATED);
    wait_for_view(&server, |rows| rows.len() == 1).await;

    let (name, value) = identity(ADMIN);
    let html = server
        .get("/admin/gallery/inside")
        .add_header(name, value)
        .await
        .text();
    assert!(!html.contains("<script>alert(1)</script>"));
    assert!(!html.contains("<img src=x onerror=alert(2)>"));
    assert!(html.contains("&lt;script&gt;alert(1)&lt;/script&gt;"));
    assert!(html.contains("&lt;img src=x onerror=alert(2)&gt;"));
}

#[tokio::test]
async fn test_admin_page_wires_controls() {
    let (server, _state) = setup().await;
    wait_for_view(&server, |rows| rows.is_empty()).await;

    let (name, value) = identity(ADMIN);
    let html = server
        .get("/admin/gallery/inside")
        .add_header(name, value)
        .await
        .text();
    assert!(html.contains("id=\"sync-button\""));
    assert!(html.contains("id=\"upload-submit\""));
    assert!(html.contains("\"/api/admin/gallery/\" + context"));
    assert!(!html.contains("<form method=\"post\""));
}

#[tokio::test]
async fn test_delete_right_after_upload() {
    let (server, state) = setup().await;

    let (name, value) = identity(ADMIN);
    let created: Value = server
        .put("/api/admin/gallery/inside/photos/quick.jpg")
        .add_header(name, value)
        .bytes(jpeg())
        .await
        .json();
    let id = created["id"].as_str().unwrap().to_string();

    // No waiting for the live view to catch up.
    let (name, value) = identity(ADMIN);
    let response = server
        .delete(&format!("/api/admin/gallery/inside/photos/{}", id))
        .add_header(name, value)
        .add_query_param("confirm", true)
        .await;
    response.assert_status_ok();
    let report: Value = response.json();
    assert_eq!(report["original"]["outcome"], "deleted");

    let records = state.galleries["inside"].manager.records().await.unwrap();
    assert!(records.is_empty());
    assert!(state.objects.resolve_url("image/quick.jpg").await.is_err());
}
