//! Track combiner
//!
//! Merges a display-capture track set and a microphone-capture track set
//! into the single logical set a recording session runs over.

use super::traits::{MediaTrackSet, TrackKind};

/// Combine display and microphone captures into one track set.
///
/// The result carries every video track from the display source followed by
/// every audio track from the microphone source, in their original order.
/// Audio offered by the display source is dropped on purpose: keeping both
/// it and the microphone track doubles the captured audio. This policy is
/// not configurable.
///
/// Dropped tracks are released immediately so no capture outlives its use.
pub fn combine(display: MediaTrackSet, microphone: MediaTrackSet) -> MediaTrackSet {
    let mut combined = Vec::new();
    let mut dropped = 0usize;

    for track in display.into_tracks() {
        match track.kind() {
            TrackKind::Video => combined.push(track),
            TrackKind::Audio => {
                track.stop();
                dropped += 1;
            }
        }
    }

    for track in microphone.into_tracks() {
        match track.kind() {
            TrackKind::Audio => combined.push(track),
            TrackKind::Video => {
                track.stop();
                dropped += 1;
            }
        }
    }

    if dropped > 0 {
        tracing::debug!("combiner dropped {} track(s) from source streams", dropped);
    }

    MediaTrackSet::new(combined)
}
