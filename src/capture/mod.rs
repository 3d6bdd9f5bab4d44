//! Capture sources and track composition
//!
//! Trait seams to the platform capture surfaces plus the combiner that
//! merges display and microphone tracks into one session stream.

pub mod combiner;
pub mod format;
pub mod traits;

pub use combiner::combine;
pub use format::{Container, MediaFormat};
pub use traits::{
    CaptureError, CaptureResult, CaptureSource, MediaTrack, MediaTrackSet, StreamEncoder,
    TrackKind,
};
