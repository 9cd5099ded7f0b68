mod error;
mod handlers;
mod types;

pub use error::ThemeError;
pub use handlers::{get_design_handler, save_design_handler};
pub use types::*;

use serde_json::Value;

use crate::metadata::{DynMetadataStore, Fields, MetadataError};

pub fn document_path(context: &str) -> String {
    format!("pages/design_{}", context)
}

/// Stored theme of `context`, or `None` when none was saved yet.
pub async fn load_design(
    metadata: &DynMetadataStore,
    context: &str,
) -> Result<Option<DesignTheme>, ThemeError> {
    let Some(fields) = metadata.get_document(&document_path(context)).await? else {
        return Ok(None);
    };
    let design = serde_json::from_value(Value::Object(fields)).map_err(MetadataError::SerdeError)?;
    Ok(Some(design))
}

/// Replaces the whole theme document after validating it.
pub async fn save_design(
    metadata: &DynMetadataStore,
    context: &str,
    design: &DesignTheme,
) -> Result<(), ThemeError> {
    design.validate()?;
    let fields = match serde_json::to_value(design).map_err(MetadataError::SerdeError)? {
        Value::Object(fields) => fields,
        _ => Fields::new(),
    };
    metadata
        .set_document(&document_path(context), fields, false)
        .await?;
    Ok(())
}
