//! Transcode types and errors

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::runtime::RuntimeError;

/// User-chosen trim window in seconds.
///
/// Valid when `0 ≤ start < end ≤ source duration`. Times keep sub-second
/// precision end to end; they are never truncated to whole seconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrimRange {
    /// Start of the kept window, seconds into the source
    pub start_secs: f64,

    /// End of the kept window, seconds into the source
    pub end_secs: f64,
}

impl TrimRange {
    pub fn new(start_secs: f64, end_secs: f64) -> Self {
        Self {
            start_secs,
            end_secs,
        }
    }

    /// Length of the kept window
    pub fn duration_secs(&self) -> f64 {
        self.end_secs - self.start_secs
    }

    /// Validate the range, optionally against a known source duration.
    ///
    /// A source duration of zero means "unknown" and skips the upper-bound
    /// check (wall-clock accounting may be absent for ingested files).
    pub fn validate(&self, source_duration_secs: Option<f64>) -> Result<(), TranscodeError> {
        if !self.start_secs.is_finite() || !self.end_secs.is_finite() {
            return Err(TranscodeError::InvalidRange(
                "trim bounds must be finite".to_string(),
            ));
        }
        if self.start_secs < 0.0 {
            return Err(TranscodeError::InvalidRange(format!(
                "start must be non-negative, got {:.3}",
                self.start_secs
            )));
        }
        if self.start_secs >= self.end_secs {
            return Err(TranscodeError::InvalidRange(format!(
                "start ({:.3}) must be before end ({:.3})",
                self.start_secs, self.end_secs
            )));
        }
        if let Some(duration) = source_duration_secs {
            if duration > 0.0 && self.end_secs > duration {
                return Err(TranscodeError::InvalidRange(format!(
                    "end ({:.3}) exceeds source duration ({:.3})",
                    self.end_secs, duration
                )));
            }
        }
        Ok(())
    }
}

/// One failed strategy attempt, kept for diagnostics
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttemptFailure {
    /// Strategy that failed
    pub strategy: String,

    /// What the runtime reported
    pub message: String,
}

/// Output of a successful transcode.
#[derive(Clone)]
pub struct TranscodeResult {
    /// Encoded output bytes
    pub data: Vec<u8>,

    /// Media type declared by the winning strategy
    pub media_type: &'static str,

    /// File extension matching the output container
    pub extension: &'static str,

    /// Reported duration: the length of the requested window
    pub duration_secs: f64,

    /// Name of the winning strategy
    pub strategy: &'static str,
}

impl std::fmt::Debug for TranscodeResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TranscodeResult")
            .field("size", &self.data.len())
            .field("media_type", &self.media_type)
            .field("duration_secs", &self.duration_secs)
            .field("strategy", &self.strategy)
            .finish()
    }
}

/// Transcode errors
#[derive(Error, Debug)]
pub enum TranscodeError {
    #[error("invalid trim range: {0}")]
    InvalidRange(String),

    #[error("media runtime initialization failed: {0}")]
    RuntimeInitFailed(String),

    #[error("every transcode strategy failed after {} attempt(s)", .attempts.len())]
    TranscodeFailed { attempts: Vec<AttemptFailure> },

    #[error("media runtime error: {0}")]
    Runtime(#[from] RuntimeError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_inverted_range() {
        let err = TrimRange::new(7.0, 2.0).validate(None).unwrap_err();
        assert!(matches!(err, TranscodeError::InvalidRange(_)));
    }

    #[test]
    fn rejects_zero_length_range() {
        assert!(TrimRange::new(3.0, 3.0).validate(None).is_err());
    }

    #[test]
    fn rejects_negative_start() {
        assert!(TrimRange::new(-0.5, 2.0).validate(None).is_err());
    }

    #[test]
    fn rejects_end_past_source_duration() {
        assert!(TrimRange::new(2.0, 12.5).validate(Some(10.0)).is_err());
    }

    #[test]
    fn unknown_source_duration_skips_upper_bound() {
        assert!(TrimRange::new(2.0, 12.5).validate(Some(0.0)).is_ok());
        assert!(TrimRange::new(2.0, 12.5).validate(None).is_ok());
    }

    #[test]
    fn keeps_sub_second_precision() {
        let range = TrimRange::new(2.25, 7.75);
        assert!(range.validate(Some(10.0)).is_ok());
        assert!((range.duration_secs() - 5.5).abs() < 1e-9);
    }
}
