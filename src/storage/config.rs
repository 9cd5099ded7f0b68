use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageConfig {
    /// URL prefix under which filesystem blobs are served.
    #[serde(default = "default_url_prefix")]
    pub url_prefix: String,
    #[serde(flatten)]
    pub provider: StorageProviderConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(tag = "backend", rename_all = "lowercase")]
pub enum StorageProviderConfig {
    Filesystem(FilesystemConfig),
    Memory,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FilesystemConfig {
    pub root: PathBuf,
}

fn default_url_prefix() -> String {
    "/files".to_string()
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            url_prefix: default_url_prefix(),
            provider: StorageProviderConfig::Filesystem(FilesystemConfig {
                root: PathBuf::from("storage"),
            }),
        }
    }
}

impl StorageConfig {
    pub fn filesystem_root(&self) -> Option<&PathBuf> {
        match &self.provider {
            StorageProviderConfig::Filesystem(fs) => Some(&fs.root),
            StorageProviderConfig::Memory => None,
        }
    }
}
