//! Storage boundary
//!
//! Upload and retrieval of published recordings. Adapters implement
//! `StorageService`; the local-filesystem adapter is the default, remote
//! object stores slot in behind the same trait.

pub mod local;

pub use local::LocalStorage;

use async_trait::async_trait;
use thiserror::Error;

/// Storage boundary errors
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("upload failed: {0}")]
    UploadFailed(String),

    #[error("object not found: {0}")]
    NotFound(String),

    #[error("invalid byte range: {0}")]
    InvalidRange(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Requested byte window of a stored object, parsed from a
/// `bytes=start-end` range header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteRange {
    /// First byte offset, inclusive
    pub start: u64,

    /// Last byte offset, inclusive; open-ended when absent
    pub end: Option<u64>,
}

impl ByteRange {
    /// Parse a `bytes=start-end` or `bytes=start-` header value.
    pub fn parse(header: &str) -> Result<Self, StorageError> {
        let window = header
            .trim()
            .strip_prefix("bytes=")
            .ok_or_else(|| StorageError::InvalidRange(format!("missing bytes= unit: {header}")))?;

        let (start_str, end_str) = window
            .split_once('-')
            .ok_or_else(|| StorageError::InvalidRange(format!("missing separator: {header}")))?;

        let start: u64 = start_str
            .parse()
            .map_err(|_| StorageError::InvalidRange(format!("bad start offset: {header}")))?;

        let end = if end_str.is_empty() {
            None
        } else {
            let end: u64 = end_str
                .parse()
                .map_err(|_| StorageError::InvalidRange(format!("bad end offset: {header}")))?;
            if end < start {
                return Err(StorageError::InvalidRange(format!(
                    "end before start: {header}"
                )));
            }
            Some(end)
        };

        Ok(Self { start, end })
    }
}

/// Object storage for published recordings.
#[async_trait]
pub trait StorageService: Send + Sync {
    /// Store `bytes` under `filename`, returning a stable retrieval URL
    async fn upload(&self, bytes: &[u8], filename: &str) -> Result<String, StorageError>;

    /// Public URL for a stored key
    fn url_for(&self, key: &str) -> String;

    /// Read a stored object, optionally limited to a byte range, so
    /// playback consumers can serve partial content
    async fn fetch(&self, key: &str, range: Option<ByteRange>) -> Result<Vec<u8>, StorageError>;
}
