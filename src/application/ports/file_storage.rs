use async_trait::async_trait;
use std::path::Path;

#[derive(Debug)]
pub enum FileStorageError {
    IoError(String),
    InvalidPath(String),
}

impl std::fmt::Display for FileStorageError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FileStorageError::IoError(msg) => write!(f, "IO error: {}", msg),
            FileStorageError::InvalidPath(path) => write!(f, "Invalid path: {}", path),
        }
    }
}

impl std::error::Error for FileStorageError {}

/// A file that exists on disk for as long as the value is alive.
pub trait SpooledFile: Send + Sync {
    fn path(&self) -> &Path;
}

#[async_trait]
pub trait FileStorage: Send + Sync {
    /// Writes `data` to a scratch file ending in `suffix`. The file is removed
    /// when the returned handle is dropped.
    async fn spool(
        &self,
        data: &[u8],
        suffix: &str,
    ) -> Result<Box<dyn SpooledFile>, FileStorageError>;
}
