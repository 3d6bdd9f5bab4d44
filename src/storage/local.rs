//! Local filesystem storage adapter

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use super::{ByteRange, StorageError, StorageService};

/// Stores uploads under a local directory and serves them back by key.
pub struct LocalStorage {
    root: PathBuf,
    public_base: String,
}

impl LocalStorage {
    pub fn new(root: impl Into<PathBuf>, public_base: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            public_base: public_base.into(),
        }
    }

    fn object_path(&self, key: &str) -> Result<PathBuf, StorageError> {
        // Keys are flat filenames; anything path-like is rejected rather
        // than resolved.
        let name = Path::new(key);
        if name.components().count() != 1 || key.contains("..") {
            return Err(StorageError::NotFound(key.to_string()));
        }
        Ok(self.root.join(key))
    }
}

#[async_trait]
impl StorageService for LocalStorage {
    async fn upload(&self, bytes: &[u8], filename: &str) -> Result<String, StorageError> {
        let path = self.object_path(filename)?;
        tokio::fs::create_dir_all(&self.root)
            .await
            .map_err(|e| StorageError::UploadFailed(format!("create {:?}: {}", self.root, e)))?;
        tokio::fs::write(&path, bytes)
            .await
            .map_err(|e| StorageError::UploadFailed(format!("write {:?}: {}", path, e)))?;

        tracing::info!("stored {} bytes at {:?}", bytes.len(), path);
        Ok(self.url_for(filename))
    }

    fn url_for(&self, key: &str) -> String {
        format!("{}/{}", self.public_base.trim_end_matches('/'), key)
    }

    async fn fetch(&self, key: &str, range: Option<ByteRange>) -> Result<Vec<u8>, StorageError> {
        let path = self.object_path(key)?;
        let data = tokio::fs::read(&path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                StorageError::NotFound(key.to_string())
            } else {
                StorageError::Io(e)
            }
        })?;

        match range {
            None => Ok(data),
            Some(range) => {
                let len = data.len() as u64;
                if range.start >= len {
                    return Err(StorageError::InvalidRange(format!(
                        "start {} beyond object size {}",
                        range.start, len
                    )));
                }
                // HTTP ranges are inclusive; clamp the end to the object.
                let end = range.end.map_or(len - 1, |e| e.min(len - 1));
                Ok(data[range.start as usize..=end as usize].to_vec())
            }
        }
    }
}
