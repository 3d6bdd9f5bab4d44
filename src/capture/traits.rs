//! Capture trait definitions
//!
//! Seams between the recorder and whatever produces live media: capture
//! sources hand out track sets, a stream encoder turns a track set into
//! timed encoded chunks. Platform adapters live behind these traits.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::format::MediaFormat;

/// Errors raised while acquiring or encoding capture media
#[derive(Error, Debug)]
pub enum CaptureError {
    #[error("permission denied: {0}")]
    PermissionDenied(String),

    #[error("capture source unavailable: {0}")]
    Unavailable(String),

    #[error("encoder error: {0}")]
    Encoder(String),
}

/// Result type for capture operations
pub type CaptureResult<T> = Result<T, CaptureError>;

/// Kind of media a track carries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrackKind {
    Video,
    Audio,
}

impl std::fmt::Display for TrackKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TrackKind::Video => write!(f, "video"),
            TrackKind::Audio => write!(f, "audio"),
        }
    }
}

/// One live media track handed out by a capture source.
///
/// `stop` releases the underlying capture and must be idempotent. A track
/// may also go dead on its own (the user revokes capture through a system
/// control); `is_live` reflects that.
pub trait MediaTrack: Send + Sync {
    /// Stable track identifier
    fn id(&self) -> &str;

    /// Kind of media this track carries
    fn kind(&self) -> TrackKind;

    /// Human-readable source label
    fn label(&self) -> &str;

    /// Whether the track is still producing media
    fn is_live(&self) -> bool;

    /// Release the underlying capture
    fn stop(&self);
}

/// Ordered collection of live tracks owned by one recording session.
pub struct MediaTrackSet {
    tracks: Vec<Box<dyn MediaTrack>>,
}

impl MediaTrackSet {
    pub fn new(tracks: Vec<Box<dyn MediaTrack>>) -> Self {
        Self { tracks }
    }

    pub fn tracks(&self) -> &[Box<dyn MediaTrack>] {
        &self.tracks
    }

    pub fn into_tracks(self) -> Vec<Box<dyn MediaTrack>> {
        self.tracks
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    /// Number of tracks of the given kind
    pub fn count(&self, kind: TrackKind) -> usize {
        self.tracks.iter().filter(|t| t.kind() == kind).count()
    }

    /// Whether any video track has gone dead out of band
    pub fn video_ended(&self) -> bool {
        self.tracks
            .iter()
            .any(|t| t.kind() == TrackKind::Video && !t.is_live())
    }

    /// Release every track. Idempotent.
    pub fn stop_all(&self) {
        for track in &self.tracks {
            track.stop();
        }
    }
}

impl std::fmt::Debug for MediaTrackSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let ids: Vec<&str> = self.tracks.iter().map(|t| t.id()).collect();
        f.debug_struct("MediaTrackSet").field("tracks", &ids).finish()
    }
}

/// A source of live media tracks (display surface, microphone, ...).
///
/// `acquire` performs the permission request and is the only suspension
/// point; a denied request surfaces as `CaptureError::PermissionDenied`.
#[async_trait]
pub trait CaptureSource: Send + Sync {
    /// Source identifier (e.g. "display", "microphone")
    fn id(&self) -> &str;

    /// Request access and hand out live tracks
    async fn acquire(&mut self) -> CaptureResult<MediaTrackSet>;
}

/// Encodes a combined track set into timed binary chunks.
///
/// `poll_chunk` drains whatever the encoder produced since the last poll;
/// the recorder calls it once per chunk interval. `finish` flushes any
/// trailing buffered data when the session stops.
pub trait StreamEncoder: Send + Sync {
    /// Whether this encoder can produce the given format
    fn supports(&self, format: MediaFormat) -> bool;

    /// Bind the encoder to a track set with a negotiated format
    fn begin(&mut self, tracks: &MediaTrackSet, format: MediaFormat) -> CaptureResult<()>;

    /// Suspend encoding (no data accumulates while paused)
    fn pause(&mut self);

    /// Resume encoding after a pause
    fn resume(&mut self);

    /// Drain encoded bytes produced since the last poll
    fn poll_chunk(&mut self) -> CaptureResult<Option<Vec<u8>>>;

    /// Flush trailing buffered data and end the encode
    fn finish(&mut self) -> CaptureResult<Option<Vec<u8>>>;
}
