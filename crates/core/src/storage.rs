//! Blob storage port and the local filesystem implementation.
//!
//! Paths handed out by a [`BlobStore`] are opaque, relative, `/`-separated
//! strings such as `products/1718000000_3f2a....jpg`. They are what the
//! image tables persist.

use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;

use crate::error::CoreError;

/// Storage for uploaded file contents.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Persist `bytes` under `suggested_name` and return the stored path.
    async fn store(&self, bytes: &[u8], suggested_name: &str) -> Result<String, CoreError>;

    async fn exists(&self, path: &str) -> Result<bool, CoreError>;

    /// Remove a stored blob. Removing a blob that does not exist succeeds.
    async fn delete(&self, path: &str) -> Result<(), CoreError>;
}

/// [`BlobStore`] backed by a directory on the local filesystem.
#[derive(Debug, Clone)]
pub struct LocalBlobStore {
    root: PathBuf,
}

impl LocalBlobStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Map a stored path onto the filesystem, refusing anything that would
    /// escape the root directory.
    fn resolve(&self, path: &str) -> Result<PathBuf, CoreError> {
        let relative = Path::new(path);
        let is_plain = !path.is_empty()
            && relative
                .components()
                .all(|c| matches!(c, Component::Normal(_)));
        if !is_plain {
            return Err(CoreError::Validation(format!("Invalid storage path '{path}'")));
        }
        Ok(self.root.join(relative))
    }
}

fn io_error(action: &str, path: &str, err: std::io::Error) -> CoreError {
    CoreError::Internal(format!("Failed to {action} '{path}': {err}"))
}

#[async_trait]
impl BlobStore for LocalBlobStore {
    async fn store(&self, bytes: &[u8], suggested_name: &str) -> Result<String, CoreError> {
        let target = self.resolve(suggested_name)?;
        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| io_error("create directory for", suggested_name, e))?;
        }
        tokio::fs::write(&target, bytes)
            .await
            .map_err(|e| io_error("write", suggested_name, e))?;
        Ok(suggested_name.to_string())
    }

    async fn exists(&self, path: &str) -> Result<bool, CoreError> {
        let target = self.resolve(path)?;
        tokio::fs::try_exists(&target)
            .await
            .map_err(|e| io_error("stat", path, e))
    }

    async fn delete(&self, path: &str) -> Result<(), CoreError> {
        let target = self.resolve(path)?;
        match tokio::fs::remove_file(&target).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(io_error("delete", path, e)),
        }
    }
}
