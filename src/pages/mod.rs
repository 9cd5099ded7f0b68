mod handlers;

pub use handlers::{get_page_handler, save_page_handler};

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use crate::api::StatusResponse;
use crate::metadata::{DynMetadataStore, Fields, MetadataError};

pub const FALLBACK_TITLE: &str = "Hello, I am Adrián Bernardino";
pub const FALLBACK_SUBTITLE: &str = "0 — 🌲🌱📌🌐☀️🎬🕣💧🔥🌸🍇🪵📡 — ∞";

#[derive(Debug, Error)]
pub enum PageError {
    #[error("Invalid page name: {0}")]
    InvalidName(String),

    #[error("Page store failed: {0}")]
    Store(#[from] MetadataError),
}

impl IntoResponse for PageError {
    fn into_response(self) -> Response {
        let status = match self {
            PageError::InvalidName(_) => StatusCode::BAD_REQUEST,
            PageError::Store(_) => StatusCode::BAD_GATEWAY,
        };
        (status, Json(StatusResponse::error(self.to_string()))).into_response()
    }
}

/// Editable text of a page such as `home`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageContent {
    #[serde(default)]
    pub main_title: String,
    #[serde(default)]
    pub main_subtitle: String,
}

impl PageContent {
    pub fn fallback() -> Self {
        Self {
            main_title: FALLBACK_TITLE.to_string(),
            main_subtitle: FALLBACK_SUBTITLE.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LoadedPage {
    #[serde(flatten)]
    pub content: PageContent,
    /// False when the fallback text is shown because nothing was saved yet.
    pub exists: bool,
}

pub fn document_path(page: &str) -> Result<String, PageError> {
    let valid = !page.is_empty()
        && page
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if !valid {
        return Err(PageError::InvalidName(page.to_string()));
    }
    Ok(format!("pages/{}", page))
}

pub async fn load_page(metadata: &DynMetadataStore, page: &str) -> Result<LoadedPage, PageError> {
    let path = document_path(page)?;
    match metadata.get_document(&path).await? {
        Some(fields) => {
            let content = serde_json::from_value(Value::Object(fields))
                .map_err(MetadataError::SerdeError)?;
            Ok(LoadedPage {
                content,
                exists: true,
            })
        }
        None => {
            debug!("Page {} not stored yet, using fallback", page);
            Ok(LoadedPage {
                content: PageContent::fallback(),
                exists: false,
            })
        }
    }
}

/// Merges the text fields into the stored document; unrelated fields survive.
pub async fn save_page(
    metadata: &DynMetadataStore,
    page: &str,
    content: PageContent,
) -> Result<(), PageError> {
    let path = document_path(page)?;
    let mut fields = Fields::new();
    fields.insert("main_title".to_string(), Value::String(content.main_title));
    fields.insert(
        "main_subtitle".to_string(),
        Value::String(content.main_subtitle),
    );
    metadata.set_document(&path, fields, true).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::LocalDocumentStore;
    use std::sync::Arc;

    fn store() -> DynMetadataStore {
        Arc::new(LocalDocumentStore::in_memory())
    }

    #[tokio::test]
    async fn test_missing_page_uses_fallback() {
        let loaded = load_page(&store(), "home").await.unwrap();
        assert!(!loaded.exists);
        assert_eq!(loaded.content.main_title, FALLBACK_TITLE);
        assert_eq!(loaded.content.main_subtitle, FALLBACK_SUBTITLE);
    }

    #[tokio::test]
    async fn test_save_merges_into_existing_document() {
        let metadata = store();
        let mut extra = Fields::new();
        extra.insert("hero_image".to_string(), Value::from("image/a.jpg"));
        metadata.set_document("pages/home", extra, false).await.unwrap();

        save_page(
            &metadata,
            "home",
            PageContent {
                main_title: "Hi".to_string(),
                main_subtitle: "there".to_string(),
            },
        )
        .await
        .unwrap();

        let loaded = load_page(&metadata, "home").await.unwrap();
        assert!(loaded.exists);
        assert_eq!(loaded.content.main_title, "Hi");

        let raw = metadata.get_document("pages/home").await.unwrap().unwrap();
        assert_eq!(raw["hero_image"], "image/a.jpg");
    }

    #[test]
    fn test_page_names() {
        assert_eq!(document_path("home").unwrap(), "pages/home");
        assert!(document_path("../home").is_err());
        assert!(document_path("a/b").is_err());
        assert!(document_path("").is_err());
    }
}
