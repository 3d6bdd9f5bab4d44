//! Error types and handling
//!
//! Aggregate error type and the stable string codes surfaced to callers.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::pipeline::PipelineError;
use crate::recorder::RecorderError;
use crate::storage::StorageError;
use crate::transcode::TranscodeError;
use crate::videos::StoreError;

/// Application-wide error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Recorder(#[from] RecorderError),

    #[error(transparent)]
    Transcode(#[from] TranscodeError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("configuration error: {0}")]
    Config(String),
}

impl From<PipelineError> for AppError {
    fn from(error: PipelineError) -> Self {
        match error {
            PipelineError::Recorder(e) => e.into(),
            PipelineError::Transcode(e) => e.into(),
            PipelineError::Storage(e) => e.into(),
            PipelineError::Store(e) => e.into(),
        }
    }
}

/// Error response surfaced to callers
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub code: String,
    pub message: String,
}

impl From<AppError> for ErrorResponse {
    fn from(error: AppError) -> Self {
        let code = match &error {
            AppError::Recorder(e) => match e {
                RecorderError::PermissionDenied(_) => "PERMISSION_DENIED",
                RecorderError::CaptureUnavailable(_) => "CAPTURE_UNAVAILABLE",
                RecorderError::EmptyCapture => "EMPTY_CAPTURE",
                RecorderError::AlreadyRecording => "ALREADY_RECORDING",
                RecorderError::NotRecording => "NOT_RECORDING",
                RecorderError::Encoder(_) => "ENCODER_ERROR",
            },
            AppError::Transcode(e) => match e {
                TranscodeError::InvalidRange(_) => "INVALID_RANGE",
                TranscodeError::RuntimeInitFailed(_) => "RUNTIME_INIT_FAILED",
                TranscodeError::TranscodeFailed { .. } => "TRANSCODE_FAILED",
                TranscodeError::Runtime(_) => "RUNTIME_ERROR",
            },
            AppError::Storage(e) => match e {
                StorageError::UploadFailed(_) => "UPLOAD_FAILED",
                StorageError::NotFound(_) => "NOT_FOUND",
                StorageError::InvalidRange(_) => "INVALID_BYTE_RANGE",
                StorageError::Io(_) => "IO_ERROR",
            },
            AppError::Store(StoreError::NotFound(_)) => "NOT_FOUND",
            AppError::Io(_) => "IO_ERROR",
            AppError::Serialization(_) => "SERIALIZATION_ERROR",
            AppError::Config(_) => "CONFIG_ERROR",
        };

        ErrorResponse {
            code: code.to_string(),
            message: error.to_string(),
        }
    }
}

/// Result type alias using AppError
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recorder_errors_map_to_stable_codes() {
        let response: ErrorResponse = AppError::from(RecorderError::EmptyCapture).into();
        assert_eq!(response.code, "EMPTY_CAPTURE");

        let response: ErrorResponse =
            AppError::from(RecorderError::PermissionDenied("screen".to_string())).into();
        assert_eq!(response.code, "PERMISSION_DENIED");
    }

    #[test]
    fn transcode_errors_map_to_stable_codes() {
        let response: ErrorResponse = AppError::from(TranscodeError::TranscodeFailed {
            attempts: Vec::new(),
        })
        .into();
        assert_eq!(response.code, "TRANSCODE_FAILED");
    }

    #[test]
    fn pipeline_errors_flatten_into_module_codes() {
        let pipeline_error =
            PipelineError::Storage(StorageError::UploadFailed("disk full".to_string()));
        let response: ErrorResponse = AppError::from(pipeline_error).into();
        assert_eq!(response.code, "UPLOAD_FAILED");
        assert!(response.message.contains("disk full"));
    }
}
