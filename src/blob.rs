//! Attachment payload storage.

use std::path::PathBuf;

use async_trait::async_trait;

use crate::error::AppError;

/// Durable storage for attachment payloads.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Writes `payload` under `file_name`, replacing any existing file.
    ///
    /// Returns the full path written.
    async fn persist(&self, file_name: &str, payload: &[u8]) -> Result<PathBuf, AppError>;
}

/// Stores payloads as flat files in Redmine's `files` directory.
#[derive(Debug, Clone)]
pub struct FsBlobStore {
    root: PathBuf,
}

impl FsBlobStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

#[async_trait]
impl BlobStore for FsBlobStore {
    async fn persist(&self, file_name: &str, payload: &[u8]) -> Result<PathBuf, AppError> {
        let path = self.root.join(file_name);
        tracing::info!("Writing {}", path.display());
        tokio::fs::write(&path, payload)
            .await
            .map_err(|source| AppError::BlobPersist {
                path: path.clone(),
                source,
            })?;
        Ok(path)
    }
}
