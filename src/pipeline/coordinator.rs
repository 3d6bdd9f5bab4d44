//! Pipeline coordinator
//!
//! Sequences a captured artifact through the transcode engine and hands
//! the processed result to the storage and video-record boundaries.

use std::sync::Arc;

use chrono::Utc;
use thiserror::Error;
use uuid::Uuid;

use crate::recorder::{CaptureRecorder, CapturedArtifact, RecorderError};
use crate::storage::{StorageError, StorageService};
use crate::transcode::{TranscodeEngine, TranscodeError, TrimRange};
use crate::videos::{NewVideoRecord, StoreError, VideoStore};

/// Pipeline errors: stage failures propagate verbatim
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error(transparent)]
    Recorder(#[from] RecorderError),

    #[error(transparent)]
    Transcode(#[from] TranscodeError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Reference to a published recording
#[derive(Debug, Clone)]
pub struct ArtifactRef {
    /// Created video record id
    pub video_id: String,

    /// Retrieval URL for the uploaded clip
    pub url: String,
}

/// Wires recorder output through trim and on to the boundaries.
pub struct PipelineCoordinator {
    engine: TranscodeEngine,
    storage: Arc<dyn StorageService>,
    videos: Arc<dyn VideoStore>,
}

impl PipelineCoordinator {
    pub fn new(
        engine: TranscodeEngine,
        storage: Arc<dyn StorageService>,
        videos: Arc<dyn VideoStore>,
    ) -> Self {
        Self {
            engine,
            storage,
            videos,
        }
    }

    /// Trim `artifact` to `range` and publish the result.
    ///
    /// The upload boundary is only reached once a transcode result exists,
    /// and the record boundary only once the upload succeeded. A failed
    /// transcode leaves `artifact` untouched for a re-attempt with a
    /// different range.
    pub async fn run(
        &self,
        artifact: &CapturedArtifact,
        range: TrimRange,
        title: Option<String>,
    ) -> Result<ArtifactRef, PipelineError> {
        let result = self.engine.trim(artifact, range).await?;

        let filename = object_key(result.extension);
        let url = self.storage.upload(&result.data, &filename).await?;

        let record = self
            .videos
            .create(NewVideoRecord {
                title: title
                    .unwrap_or_else(|| format!("Screen Recording {}", Utc::now().format("%Y-%m-%d %H:%M"))),
                filename,
                url: url.clone(),
                duration_secs: result.duration_secs,
            })
            .await?;

        tracing::info!(
            "published {} ({} bytes, {}) as video {}",
            record.filename,
            result.data.len(),
            result.media_type,
            record.id
        );

        Ok(ArtifactRef {
            video_id: record.id,
            url,
        })
    }

    /// Stop `recorder` and publish its artifact in one step.
    pub async fn record_and_publish(
        &self,
        recorder: &mut CaptureRecorder,
        range: TrimRange,
        title: Option<String>,
    ) -> Result<ArtifactRef, PipelineError> {
        let artifact = recorder.stop().await?;
        self.run(&artifact, range, title).await
    }
}

/// Flat object key: timestamp plus a short random suffix.
fn object_key(extension: &str) -> String {
    let suffix = Uuid::new_v4().simple().to_string();
    format!(
        "{}-{}.{}",
        Utc::now().timestamp_millis(),
        &suffix[..8],
        extension
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn object_keys_are_unique_and_carry_extension() {
        let a = object_key("webm");
        let b = object_key("webm");
        assert_ne!(a, b);
        assert!(a.ends_with(".webm"));
    }
}
