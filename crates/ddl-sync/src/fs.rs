//! Script file access.

use crate::error::{Result, SyncError};
use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::Path;

/// Where scripts are read from and written to.
#[async_trait]
pub trait FileStore: Send + Sync {
    /// Current content; a missing file reads as empty.
    async fn read(&self, path: &str) -> Result<String>;

    /// Replace the content, creating parent directories as needed.
    async fn write(&self, path: &str, text: &str) -> Result<()>;
}

/// Files on the local disk, paths used as given.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalFileStore;

#[async_trait]
impl FileStore for LocalFileStore {
    async fn read(&self, path: &str) -> Result<String> {
        match tokio::fs::read_to_string(path).await {
            Ok(text) => Ok(text),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(String::new()),
            Err(source) => Err(SyncError::FileRead {
                path: path.into(),
                source,
            }),
        }
    }

    async fn write(&self, path: &str, text: &str) -> Result<()> {
        let to_error = |source| SyncError::FileWrite {
            path: path.into(),
            source,
        };
        if let Some(parent) = Path::new(path).parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await.map_err(to_error)?;
            }
        }
        tokio::fs::write(path, text).await.map_err(to_error)
    }
}
