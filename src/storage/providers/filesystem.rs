use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::PathBuf;
use tracing::debug;
use walkdir::WalkDir;

use crate::storage::{BlobEntry, FilesystemConfig, ObjectStore, StorageError, validate_path};

/// Blob store backed by a local directory. Blob paths map 1:1 onto relative file paths.
pub struct FilesystemStore {
    root: PathBuf,
    url_prefix: String,
}

impl FilesystemStore {
    pub fn new(config: &FilesystemConfig, url_prefix: &str) -> Result<Self, StorageError> {
        if config.root.as_os_str().is_empty() {
            return Err(StorageError::ConfigError(
                "filesystem storage root must not be empty".to_string(),
            ));
        }

        Ok(Self {
            root: config.root.clone(),
            url_prefix: url_prefix.trim_end_matches('/').to_string(),
        })
    }

    /// Maps a blob path onto the file that holds it.
    pub fn blob_file(&self, path: &str) -> Result<PathBuf, StorageError> {
        validate_path(path)?;
        Ok(self.root.join(path))
    }

    fn encode_url(&self, path: &str) -> String {
        let encoded: Vec<String> = path
            .split('/')
            .map(|segment| urlencoding::encode(segment).into_owned())
            .collect();
        format!("{}/{}", self.url_prefix, encoded.join("/"))
    }
}

#[async_trait]
impl ObjectStore for FilesystemStore {
    async fn upload(&self, path: &str, bytes: Vec<u8>) -> Result<(), StorageError> {
        let file = self.blob_file(path)?;
        let reject = |e: std::io::Error| StorageError::Upload {
            path: path.to_string(),
            reason: e.to_string(),
        };

        if let Some(parent) = file.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(reject)?;
        }
        tokio::fs::write(&file, &bytes).await.map_err(reject)?;

        debug!("Stored {} bytes at {:?}", bytes.len(), file);
        Ok(())
    }

    async fn download(&self, path: &str) -> Result<Vec<u8>, StorageError> {
        let file = self.blob_file(path)?;
        match tokio::fs::read(&file).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == ErrorKind::NotFound => Err(StorageError::NotFound(path.to_string())),
            Err(e) => Err(e.into()),
        }
    }

    async fn delete(&self, path: &str) -> Result<(), StorageError> {
        let file = self.blob_file(path)?;
        match tokio::fs::remove_file(&file).await {
            Ok(()) => {
                debug!("Removed blob {:?}", file);
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Err(StorageError::NotFound(path.to_string())),
            Err(e) => Err(StorageError::Delete {
                path: path.to_string(),
                reason: e.to_string(),
            }),
        }
    }

    async fn resolve_url(&self, path: &str) -> Result<String, StorageError> {
        let file = self.blob_file(path)?;
        match tokio::fs::metadata(&file).await {
            Ok(metadata) if metadata.is_file() => Ok(self.encode_url(path)),
            _ => Err(StorageError::NotFound(path.to_string())),
        }
    }

    async fn list(&self, prefix: &str) -> Result<Vec<BlobEntry>, StorageError> {
        let prefix = prefix.trim_end_matches('/');
        let directory = if prefix.is_empty() {
            self.root.clone()
        } else {
            validate_path(prefix)?;
            self.root.join(prefix)
        };

        if !directory.is_dir() {
            debug!("Listing {:?}: directory does not exist", directory);
            return Ok(Vec::new());
        }

        let mut entries = Vec::new();
        for entry in WalkDir::new(&directory)
            .min_depth(1)
            .max_depth(1)
            .into_iter()
            .flatten()
        {
            if entry.file_type().is_file()
                && let Some(name) = entry.file_name().to_str()
                && !name.starts_with('.')
            {
                let path = if prefix.is_empty() {
                    name.to_string()
                } else {
                    format!("{}/{}", prefix, name)
                };
                entries.push(BlobEntry::from_path(path));
            }
        }

        entries.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(entries)
    }

    fn name(&self) -> &str {
        "Filesystem Object Store"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn store(temp_dir: &TempDir) -> FilesystemStore {
        FilesystemStore::new(
            &FilesystemConfig {
                root: temp_dir.path().to_path_buf(),
            },
            "/files/",
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_upload_and_resolve() {
        let temp_dir = TempDir::new().unwrap();
        let store = store(&temp_dir);

        store
            .upload("image/sunset.jpg", b"jpeg".to_vec())
            .await
            .unwrap();

        assert!(temp_dir.path().join("image/sunset.jpg").exists());
        assert_eq!(
            store.resolve_url("image/sunset.jpg").await.unwrap(),
            "/files/image/sunset.jpg"
        );
        assert_eq!(store.download("image/sunset.jpg").await.unwrap(), b"jpeg");
    }

    #[tokio::test]
    async fn test_resolve_url_encodes_segments() {
        let temp_dir = TempDir::new().unwrap();
        let store = store(&temp_dir);

        store
            .upload("image/my photo.jpg", b"x".to_vec())
            .await
            .unwrap();

        assert_eq!(
            store.resolve_url("image/my photo.jpg").await.unwrap(),
            "/files/image/my%20photo.jpg"
        );
    }

    #[tokio::test]
    async fn test_missing_blob_is_not_found() {
        let temp_dir = TempDir::new().unwrap();
        let store = store(&temp_dir);

        assert!(store.resolve_url("image/nope.jpg").await.unwrap_err().is_not_found());
        assert!(store.delete("image/nope.jpg").await.unwrap_err().is_not_found());
        assert!(store.download("image/nope.jpg").await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_list_is_shallow() {
        let temp_dir = TempDir::new().unwrap();
        let store = store(&temp_dir);

        store.upload("image/b.jpg", b"b".to_vec()).await.unwrap();
        store.upload("image/a.jpg", b"a".to_vec()).await.unwrap();
        store
            .upload("image/webp/a_2048x2048.webp", b"w".to_vec())
            .await
            .unwrap();

        let listed = store.list("image/").await.unwrap();
        let paths: Vec<_> = listed.iter().map(|e| e.path.as_str()).collect();
        assert_eq!(paths, vec!["image/a.jpg", "image/b.jpg"]);
        assert_eq!(listed[0].name, "a.jpg");
    }

    #[tokio::test]
    async fn test_list_missing_prefix_is_empty() {
        let temp_dir = TempDir::new().unwrap();
        let store = store(&temp_dir);
        assert!(store.list("image/").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_rejects_escaping_paths() {
        let temp_dir = TempDir::new().unwrap();
        let store = store(&temp_dir);

        let result = store.upload("../outside.jpg", b"x".to_vec()).await;
        assert!(matches!(result, Err(StorageError::InvalidPath(_))));
    }
}
