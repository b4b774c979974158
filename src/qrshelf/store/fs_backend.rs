use super::KvBackend;
use crate::error::{QrError, Result};
use std::fs;
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// File-per-key backend: `<root>/<key>.json`.
#[derive(Debug, Clone)]
pub struct FsBackend {
    root: PathBuf,
}

impl FsBackend {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn blob_path(&self, key: &str) -> Result<PathBuf> {
        if key.is_empty()
            || !key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            return Err(QrError::Store(format!("Invalid storage key: {:?}", key)));
        }
        Ok(self.root.join(format!("{}.json", key)))
    }

    fn ensure_dir(&self) -> Result<()> {
        if !self.root.exists() {
            fs::create_dir_all(&self.root).map_err(QrError::Io)?;
        }
        Ok(())
    }
}

impl KvBackend for FsBackend {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let path = self.blob_path(key)?;
        if !path.exists() {
            return Ok(None);
        }
        let bytes = fs::read(path).map_err(QrError::Io)?;
        Ok(Some(bytes))
    }

    fn set(&self, key: &str, bytes: &[u8]) -> Result<()> {
        let path = self.blob_path(key)?;
        self.ensure_dir()?;

        // Atomic write
        let tmp_path = self.root.join(format!(".{}-{}.tmp", key, Uuid::new_v4()));
        fs::write(&tmp_path, bytes).map_err(QrError::Io)?;
        fs::rename(&tmp_path, path).map_err(QrError::Io)?;

        Ok(())
    }
}
