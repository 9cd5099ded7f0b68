use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod api;
pub mod derive;
pub mod gallery;
pub mod login;
pub mod metadata;
pub mod pages;
pub mod startup_checks;
pub mod storage;
pub mod theme;

use derive::DeriveConfig;
use metadata::{DatabaseConfig, DynMetadataStore, MetadataError};
use storage::{DynObjectStore, StorageConfig, StorageError};

pub const DEFAULT_SESSION_SECRET: &str = "change-me-in-production";
pub const DEFAULT_IDENTITY_HEADER: &str = "x-authenticated-email";

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub app: AppConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub gallery: GalleryConfig,
    #[serde(default)]
    pub derive: DeriveConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AppConfig {
    pub name: String,
    /// Used when `--log-level` is not given.
    pub log_level: String,
    /// Key for signing admin session cookies.
    pub session_secret: String,
    /// Exact e-mail addresses allowed into the admin panel.
    #[serde(default)]
    pub admin_emails: Vec<String>,
    /// Header in which the identity proxy passes the signed-in e-mail.
    #[serde(default = "default_identity_header")]
    pub identity_header: String,
}

fn default_identity_header() -> String {
    DEFAULT_IDENTITY_HEADER.to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            name: "Folio".to_string(),
            log_level: "info".to_string(),
            session_secret: DEFAULT_SESSION_SECRET.to_string(),
            admin_emails: Vec::new(),
            identity_header: default_identity_header(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GalleryConfig {
    /// Independent galleries, each with its own photo collection.
    pub contexts: Vec<String>,
    /// Theme-only contexts with no photo collection of their own.
    #[serde(default = "default_design_contexts")]
    pub design_contexts: Vec<String>,
    pub max_upload_mb: usize,
}

fn default_design_contexts() -> Vec<String> {
    vec!["home".to_string()]
}

impl GalleryConfig {
    /// Every context a design theme may be stored for.
    pub fn accepts_design(&self, context: &str) -> bool {
        self.contexts
            .iter()
            .chain(&self.design_contexts)
            .any(|c| c == context)
    }
}

impl Default for GalleryConfig {
    fn default() -> Self {
        Self {
            contexts: vec!["inside".to_string(), "outside".to_string()],
            design_contexts: default_design_contexts(),
            max_upload_mb: 50,
        }
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Storage setup failed: {0}")]
    Storage(#[from] StorageError),

    #[error("Database setup failed: {0}")]
    Metadata(#[from] MetadataError),
}

use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post, put},
};
use tower_http::trace::TraceLayer;

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub objects: DynObjectStore,
    pub metadata: DynMetadataStore,
    pub galleries: gallery::SharedGalleries,
}

impl AppState {
    /// Opens both stores and starts one live gallery per configured context.
    pub async fn new(config: Config) -> Result<Self, AppError> {
        let objects = storage::create_store(&config.storage)?;
        let metadata = metadata::create_metadata_store(&config.database).await?;
        Ok(Self::with_stores(config, objects, metadata))
    }

    pub fn with_stores(
        config: Config,
        objects: DynObjectStore,
        metadata: DynMetadataStore,
    ) -> Self {
        tracing::info!(
            "Using {} and {} for {} gallery contexts",
            objects.name(),
            metadata.name(),
            config.gallery.contexts.len()
        );
        let galleries = gallery::start_galleries(&config.gallery.contexts, &objects, &metadata);
        Self {
            config,
            objects,
            metadata,
            galleries,
        }
    }

    /// Unsubscribes every live gallery.
    pub fn shutdown(&self) {
        for gallery in self.galleries.values() {
            gallery.live.shutdown();
        }
    }
}

pub async fn create_app(config: Config) -> Result<Router, AppError> {
    let state = AppState::new(config).await?;
    Ok(router(state))
}

pub fn router(app_state: AppState) -> Router {
    let blob_route = format!(
        "{}/{{*path}}",
        app_state.config.storage.url_prefix.trim_end_matches('/')
    );
    let upload_limit = app_state.config.gallery.max_upload_mb * 1024 * 1024;

    Router::new()
        .route(
            "/api/session",
            get(login::session_status_handler)
                .post(login::sign_in_handler)
                .delete(login::sign_out_handler),
        )
        .route("/api/pages/{page}", get(pages::get_page_handler))
        .route("/api/admin/pages/{page}", put(pages::save_page_handler))
        .route("/api/design/{context}", get(theme::get_design_handler))
        .route(
            "/api/admin/design/{context}",
            put(theme::save_design_handler),
        )
        .route(
            "/api/gallery/{context}",
            get(gallery::public_gallery_handler),
        )
        .route(
            "/api/admin/gallery/{context}",
            get(gallery::admin_gallery_handler),
        )
        .route(
            "/admin/gallery/{context}",
            get(gallery::admin_gallery_page_handler),
        )
        .route(
            "/api/admin/gallery/{context}/photos/{photo}",
            put(gallery::create_photo_handler)
                .patch(gallery::update_photo_handler)
                .delete(gallery::delete_photo_handler),
        )
        .route(
            "/api/admin/gallery/{context}/sync",
            post(gallery::sync_handler),
        )
        .route(&blob_route, get(storage::handlers::blob_handler))
        .layer(DefaultBodyLimit::max(upload_limit))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &axum::http::Request<_>| {
                    let method = request.method();
                    let uri = request.uri();
                    let matched_path = request
                        .extensions()
                        .get::<axum::extract::MatchedPath>()
                        .map(|matched_path| matched_path.as_str());

                    tracing::info_span!(
                        "http_request",
                        method = %method,
                        uri = %uri,
                        matched_path,
                    )
                })
                .on_request(|request: &axum::http::Request<_>, _span: &tracing::Span| {
                    let user_agent = request
                        .headers()
                        .get("user-agent")
                        .and_then(|h| h.to_str().ok())
                        .unwrap_or("-");

                    tracing::info!(
                        target: "access_log",
                        method = %request.method(),
                        path = %request.uri().path(),
                        query = ?request.uri().query(),
                        user_agent = %user_agent,
                        "request"
                    );
                })
                .on_response(
                    |response: &axum::http::Response<_>,
                     latency: std::time::Duration,
                     _span: &tracing::Span| {
                        tracing::info!(
                            target: "access_log",
                            status = %response.status(),
                            latency_ms = %latency.as_millis(),
                            "response"
                        );
                    },
                ),
        )
        .with_state(app_state)
}
