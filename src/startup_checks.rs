use crate::{Config, DEFAULT_SESSION_SECRET};
use std::collections::HashSet;
use std::path::Path;
use thiserror::Error;
use tracing::{error, info, warn};

#[derive(Debug, Error)]
pub enum StartupCheckError {
    #[error("Failed to create storage root: {0}")]
    StorageRootCreationFailed(std::io::Error),

    #[error("Failed to create database directory: {0}")]
    DatabaseDirectoryCreationFailed(std::io::Error),

    #[error("No gallery contexts configured")]
    NoGalleryContexts,

    #[error("Gallery context configured twice: {0}")]
    DuplicateContext(String),

    #[error("No admin e-mails configured, the admin panel is unreachable")]
    NoAdminEmails,

    #[error("Session secret is the default value")]
    DefaultSessionSecret,
}

impl StartupCheckError {
    /// Critical failures stop the server from starting.
    pub fn is_critical(&self) -> bool {
        matches!(
            self,
            StartupCheckError::StorageRootCreationFailed(_)
                | StartupCheckError::DatabaseDirectoryCreationFailed(_)
                | StartupCheckError::DuplicateContext(_)
        )
    }
}

async fn ensure_directory(dir: &Path, what: &str) -> Result<(), std::io::Error> {
    if dir.exists() {
        info!("{} exists: {:?}", what, dir);
        return Ok(());
    }
    info!("{} does not exist, creating: {:?}", what, dir);
    tokio::fs::create_dir_all(dir).await?;
    info!("{} created successfully", what);
    Ok(())
}

pub async fn perform_startup_checks(config: &Config) -> Result<(), Vec<StartupCheckError>> {
    let mut errors = Vec::new();

    info!("Performing startup checks...");

    if let Some(root) = config.storage.filesystem_root()
        && let Err(e) = ensure_directory(root, "Storage root").await
    {
        error!("Failed to create storage root {:?}: {}", root, e);
        errors.push(StartupCheckError::StorageRootCreationFailed(e));
    }

    if let Some(db_path) = &config.database.path
        && let Some(parent) = db_path.parent()
        && !parent.as_os_str().is_empty()
        && let Err(e) = ensure_directory(parent, "Database directory").await
    {
        error!("Failed to create database directory {:?}: {}", parent, e);
        errors.push(StartupCheckError::DatabaseDirectoryCreationFailed(e));
    }

    if config.gallery.contexts.is_empty() {
        warn!("No gallery contexts configured");
        errors.push(StartupCheckError::NoGalleryContexts);
    }
    let mut seen = HashSet::new();
    for context in &config.gallery.contexts {
        if !seen.insert(context) {
            error!("Gallery context '{}' is configured twice", context);
            errors.push(StartupCheckError::DuplicateContext(context.clone()));
        }
    }

    if config.app.admin_emails.is_empty() {
        warn!("No admin e-mails configured");
        errors.push(StartupCheckError::NoAdminEmails);
    }
    if config.app.session_secret == DEFAULT_SESSION_SECRET {
        warn!("Session secret is the default value; set app.session_secret");
        errors.push(StartupCheckError::DefaultSessionSecret);
    }

    if errors.is_empty() {
        info!("All startup checks passed");
        Ok(())
    } else {
        error!("Startup checks failed with {} errors", errors.len());
        Err(errors)
    }
}
