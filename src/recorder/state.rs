//! Recording state management
//!
//! Defines the recorder state machine, per-span session accounting, and
//! the captured artifact a finished session produces.

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::capture::format::MediaFormat;

/// Current state of the capture recorder
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecorderState {
    /// No recording in progress
    Idle,
    /// Waiting on capture permission prompts
    Requesting,
    /// Currently recording
    Recording,
    /// Recording is paused
    Paused,
    /// Finalizing the current session
    Stopping,
}

impl Default for RecorderState {
    fn default() -> Self {
        Self::Idle
    }
}

/// One active span of a recording session.
///
/// A new span starts on `start()` and on every `resume()`; the current span
/// ends on `pause()` and `stop()`. Summing span durations yields active
/// capture time with paused stretches excluded.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSpan {
    /// Span index (0, 1, 2, ...)
    pub index: usize,

    /// Process time when the span started, seconds since recording start
    pub start_secs: f64,

    /// Process time when the span ended
    pub end_secs: f64,

    /// Unix timestamp when the span started
    pub unix_start_ms: u64,

    /// Unix timestamp when the span ended
    pub unix_end_ms: u64,

    #[serde(skip)]
    ended: bool,
}

impl SessionSpan {
    /// Create a new span starting now
    pub fn new(index: usize, start_secs: f64) -> Self {
        let now = Utc::now().timestamp_millis() as u64;
        Self {
            index,
            start_secs,
            end_secs: start_secs,
            unix_start_ms: now,
            unix_end_ms: now,
            ended: false,
        }
    }

    /// End the span. Later calls are no-ops.
    pub fn end(&mut self, at_secs: f64) {
        if self.ended {
            return;
        }
        self.end_secs = at_secs;
        self.unix_end_ms = Utc::now().timestamp_millis() as u64;
        self.ended = true;
    }

    pub fn is_ended(&self) -> bool {
        self.ended
    }

    /// Active duration covered by this span
    pub fn duration_secs(&self) -> f64 {
        (self.end_secs - self.start_secs).max(0.0)
    }
}

/// Recorder tuning knobs
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RecorderConfig {
    /// Milliseconds between chunk emissions
    pub chunk_interval_ms: u64,
}

impl Default for RecorderConfig {
    fn default() -> Self {
        Self {
            chunk_interval_ms: 1_000,
        }
    }
}

/// Immutable output of a finished recording session.
///
/// Owns the concatenated chunk bytes, the format the session negotiated,
/// and a best-effort active-capture duration.
#[derive(Clone)]
pub struct CapturedArtifact {
    /// Concatenated encoded bytes, in chunk emission order
    pub data: Vec<u8>,

    /// Format negotiated at session start
    pub format: MediaFormat,

    /// Active capture time in seconds (paused time excluded)
    pub duration_secs: f64,
}

impl CapturedArtifact {
    /// Total size in bytes
    pub fn size(&self) -> usize {
        self.data.len()
    }

    /// Media type tag for the artifact
    pub fn media_type(&self) -> &'static str {
        self.format.mime_type()
    }
}

impl std::fmt::Debug for CapturedArtifact {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CapturedArtifact")
            .field("size", &self.data.len())
            .field("format", &self.format)
            .field("duration_secs", &self.duration_secs)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn span_duration_is_end_minus_start() {
        let mut span = SessionSpan::new(0, 1.5);
        span.end(4.0);
        assert!((span.duration_secs() - 2.5).abs() < 1e-9);
    }

    #[test]
    fn span_end_is_idempotent() {
        let mut span = SessionSpan::new(0, 0.0);
        span.end(2.0);
        span.end(9.0);
        assert!((span.duration_secs() - 2.0).abs() < 1e-9);
    }

    #[test]
    fn unended_span_has_zero_duration() {
        let span = SessionSpan::new(1, 3.0);
        assert_eq!(span.duration_secs(), 0.0);
        assert!(!span.is_ended());
    }

    #[test]
    fn default_chunk_interval_is_one_second() {
        assert_eq!(RecorderConfig::default().chunk_interval_ms, 1_000);
    }
}
