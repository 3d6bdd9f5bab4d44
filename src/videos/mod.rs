//! Video record boundary
//!
//! Metadata documents for published recordings: creation, lookup, view
//! counting, and watch-completion samples. The in-memory store is the
//! default adapter; a database slots in behind the same trait.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Video store errors
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("video not found: {0}")]
    NotFound(String),
}

/// Stored metadata for one published recording
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoRecord {
    /// Record identifier
    pub id: String,

    /// Display title
    pub title: String,

    /// Stored object filename
    pub filename: String,

    /// Retrieval URL returned by the storage boundary
    pub url: String,

    /// Duration in seconds (best effort)
    pub duration_secs: f64,

    /// View counter
    pub views: u64,

    /// Watch-completion percentages, one per finished playback
    pub completion_samples: Vec<f32>,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

impl VideoRecord {
    /// Average watch completion, if any samples were recorded
    pub fn average_completion(&self) -> Option<f32> {
        if self.completion_samples.is_empty() {
            return None;
        }
        Some(self.completion_samples.iter().sum::<f32>() / self.completion_samples.len() as f32)
    }
}

/// Fields supplied when creating a record
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewVideoRecord {
    pub title: String,
    pub filename: String,
    pub url: String,
    pub duration_secs: f64,
}

/// Video record storage.
#[async_trait]
pub trait VideoStore: Send + Sync {
    /// Create a record for a freshly uploaded recording
    async fn create(&self, new: NewVideoRecord) -> Result<VideoRecord, StoreError>;

    /// Look up a record by id
    async fn get(&self, id: &str) -> Result<Option<VideoRecord>, StoreError>;

    /// Count one view
    async fn increment_views(&self, id: &str) -> Result<(), StoreError>;

    /// Record one watch-completion sample (percent, 0..=100)
    async fn append_completion(&self, id: &str, percent: f32) -> Result<(), StoreError>;
}

/// In-memory video store.
#[derive(Default)]
pub struct MemoryVideoStore {
    records: RwLock<HashMap<String, VideoRecord>>,
}

impl MemoryVideoStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl VideoStore for MemoryVideoStore {
    async fn create(&self, new: NewVideoRecord) -> Result<VideoRecord, StoreError> {
        let record = VideoRecord {
            id: Uuid::new_v4().to_string(),
            title: new.title,
            filename: new.filename,
            url: new.url,
            duration_secs: new.duration_secs,
            views: 0,
            completion_samples: Vec::new(),
            created_at: Utc::now(),
        };
        self.records
            .write()
            .insert(record.id.clone(), record.clone());
        tracing::debug!("created video record {}", record.id);
        Ok(record)
    }

    async fn get(&self, id: &str) -> Result<Option<VideoRecord>, StoreError> {
        Ok(self.records.read().get(id).cloned())
    }

    async fn increment_views(&self, id: &str) -> Result<(), StoreError> {
        let mut records = self.records.write();
        let record = records
            .get_mut(id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        record.views += 1;
        Ok(())
    }

    async fn append_completion(&self, id: &str, percent: f32) -> Result<(), StoreError> {
        let mut records = self.records.write();
        let record = records
            .get_mut(id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        record.completion_samples.push(percent.clamp(0.0, 100.0));
        Ok(())
    }
}
