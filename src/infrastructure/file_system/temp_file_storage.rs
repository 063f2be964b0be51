use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tempfile::{Builder, NamedTempFile};
use tokio::fs;

use crate::application::ports::file_storage::{FileStorage, FileStorageError, SpooledFile};

const UPLOAD_PREFIX: &str = "upload-";

/// Spools uploads into the system temp directory (or `base_path` when set).
#[derive(Debug, Clone, Default)]
pub struct TempFileStorage {
    base_path: Option<PathBuf>,
}

impl TempFileStorage {
    pub fn new(base_path: Option<PathBuf>) -> Self {
        Self { base_path }
    }

    pub async fn ensure_directory_exists(&self) -> Result<(), FileStorageError> {
        match &self.base_path {
            Some(path) => fs::create_dir_all(path)
                .await
                .map_err(|e| FileStorageError::IoError(e.to_string())),
            None => Ok(()),
        }
    }

    fn create_temp_file(&self, suffix: &str) -> Result<NamedTempFile, FileStorageError> {
        let mut builder = Builder::new();
        builder.prefix(UPLOAD_PREFIX).suffix(suffix);

        match &self.base_path {
            Some(path) => builder.tempfile_in(path).map_err(|e| {
                FileStorageError::InvalidPath(format!("{}: {}", path.display(), e))
            }),
            None => builder
                .tempfile()
                .map_err(|e| FileStorageError::IoError(e.to_string())),
        }
    }
}

struct TempUpload {
    file: NamedTempFile,
}

impl SpooledFile for TempUpload {
    fn path(&self) -> &Path {
        self.file.path()
    }
}

#[async_trait]
impl FileStorage for TempFileStorage {
    async fn spool(
        &self,
        data: &[u8],
        suffix: &str,
    ) -> Result<Box<dyn SpooledFile>, FileStorageError> {
        self.ensure_directory_exists().await?;

        let file = self.create_temp_file(suffix)?;

        fs::write(file.path(), data)
            .await
            .map_err(|e| FileStorageError::IoError(e.to_string()))?;

        Ok(Box::new(TempUpload { file }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_spooled_file_holds_data_until_dropped() {
        let dir = TempDir::new().unwrap();
        let storage = TempFileStorage::new(Some(dir.path().to_path_buf()));

        let spooled = storage.spool(b"%PDF-1.5", ".pdf").await.unwrap();
        let path = spooled.path().to_path_buf();

        assert!(path.starts_with(dir.path()));
        assert_eq!(path.extension().unwrap(), "pdf");
        assert_eq!(std::fs::read(&path).unwrap(), b"%PDF-1.5");

        drop(spooled);
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_creates_missing_base_directory() {
        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("spool").join("uploads");
        let storage = TempFileStorage::new(Some(nested.clone()));

        let spooled = storage.spool(b"data", ".pdf").await.unwrap();

        assert!(spooled.path().starts_with(&nested));
    }
}
