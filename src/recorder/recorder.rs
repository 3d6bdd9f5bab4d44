//! Capture recorder
//!
//! Drives a recording session over combined display and microphone tracks:
//! acquires the sources, negotiates a format, collects encoded chunks into
//! an ordered buffer at a fixed interval, and assembles the final artifact
//! on stop.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::{Mutex, RwLock};
use thiserror::Error;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::Instant;

use super::state::{CapturedArtifact, RecorderConfig, RecorderState, SessionSpan};
use crate::capture::combiner::combine;
use crate::capture::format::MediaFormat;
use crate::capture::traits::{CaptureError, CaptureSource, MediaTrackSet, StreamEncoder, TrackKind};

/// Errors that can end a recording session
#[derive(Error, Debug)]
pub enum RecorderError {
    #[error("capture permission denied: {0}")]
    PermissionDenied(String),

    #[error("capture unavailable: {0}")]
    CaptureUnavailable(String),

    #[error("recording produced no data")]
    EmptyCapture,

    #[error("already recording")]
    AlreadyRecording,

    #[error("not recording")]
    NotRecording,

    #[error("encoder error: {0}")]
    Encoder(String),
}

/// Result type for recorder operations
pub type RecorderResult<T> = Result<T, RecorderError>;

/// Events emitted during recording
#[derive(Debug, Clone)]
pub enum RecorderEvent {
    /// Recording started
    Started,
    /// Recording stopped
    Stopped,
    /// Recording paused
    Paused,
    /// Recording resumed
    Resumed,
    /// The capture surface ended outside our API (user revoked capture);
    /// chunk emission has halted and `stop()` will finalize the session
    SourceEnded,
    /// Error occurred
    Error(String),
}

/// Stateful recorder over a display source and a microphone source.
///
/// State machine: `Idle → Requesting → Recording ⇄ Paused → Stopping →
/// Idle`; one artifact per cycle. Chunks are appended synchronously to an
/// owned ordered buffer at every interval tick and read out once on stop,
/// so late ticks cannot race the final concatenation.
pub struct CaptureRecorder {
    config: RecorderConfig,
    state: Arc<RwLock<RecorderState>>,
    chunks: Arc<Mutex<Vec<Vec<u8>>>>,
    encoder: Arc<Mutex<Box<dyn StreamEncoder>>>,
    display: Box<dyn CaptureSource>,
    microphone: Box<dyn CaptureSource>,
    tracks: Option<Arc<MediaTrackSet>>,
    format: Option<MediaFormat>,
    spans: Vec<SessionSpan>,
    started_at: Option<Instant>,
    tick_task: Option<JoinHandle<()>>,
    event_tx: broadcast::Sender<RecorderEvent>,
}

impl CaptureRecorder {
    /// Create a recorder over the given sources and encoder
    pub fn new(
        display: Box<dyn CaptureSource>,
        microphone: Box<dyn CaptureSource>,
        encoder: Box<dyn StreamEncoder>,
        config: RecorderConfig,
    ) -> Self {
        let (event_tx, _) = broadcast::channel(64);
        Self {
            config,
            state: Arc::new(RwLock::new(RecorderState::Idle)),
            chunks: Arc::new(Mutex::new(Vec::new())),
            encoder: Arc::new(Mutex::new(encoder)),
            display,
            microphone,
            tracks: None,
            format: None,
            spans: Vec::new(),
            started_at: None,
            tick_task: None,
            event_tx,
        }
    }

    /// Get the current recorder state
    pub fn state(&self) -> RecorderState {
        *self.state.read()
    }

    /// Negotiated format of the active session, if any
    pub fn format(&self) -> Option<MediaFormat> {
        self.format
    }

    /// Subscribe to recorder events
    pub fn subscribe(&self) -> broadcast::Receiver<RecorderEvent> {
        self.event_tx.subscribe()
    }

    /// Seconds since recording started (process time)
    fn process_time_secs(&self) -> f64 {
        self.started_at
            .map(|t| t.elapsed().as_secs_f64())
            .unwrap_or(0.0)
    }

    /// Active capture time in seconds, with paused stretches excluded
    pub fn duration_secs(&self) -> f64 {
        let completed: f64 = self.spans.iter().map(|s| s.duration_secs()).sum();

        let current = if *self.state.read() == RecorderState::Recording {
            self.spans
                .last()
                .filter(|s| !s.is_ended())
                .map(|s| self.process_time_secs() - s.start_secs)
                .unwrap_or(0.0)
        } else {
            0.0
        };

        completed + current
    }

    /// Start recording
    ///
    /// Acquires the display source, then the microphone source, combines
    /// their tracks, negotiates the session format, and begins chunk
    /// emission. On any failure the recorder returns to `Idle` with no
    /// partial state retained.
    pub async fn start(&mut self) -> RecorderResult<()> {
        if *self.state.read() != RecorderState::Idle {
            return Err(RecorderError::AlreadyRecording);
        }
        *self.state.write() = RecorderState::Requesting;

        tracing::info!("requesting capture sources");

        let display_tracks = match self.display.acquire().await {
            Ok(tracks) => tracks,
            Err(e) => {
                *self.state.write() = RecorderState::Idle;
                return Err(map_capture_error(e));
            }
        };
        if display_tracks.count(TrackKind::Video) == 0 {
            display_tracks.stop_all();
            *self.state.write() = RecorderState::Idle;
            return Err(RecorderError::CaptureUnavailable(
                "display source produced no video track".to_string(),
            ));
        }

        let microphone_tracks = match self.microphone.acquire().await {
            Ok(tracks) => tracks,
            Err(e) => {
                display_tracks.stop_all();
                *self.state.write() = RecorderState::Idle;
                return Err(map_capture_error(e));
            }
        };
        if microphone_tracks.count(TrackKind::Audio) == 0 {
            microphone_tracks.stop_all();
            display_tracks.stop_all();
            *self.state.write() = RecorderState::Idle;
            return Err(RecorderError::CaptureUnavailable(
                "microphone source produced no audio track".to_string(),
            ));
        }

        let tracks = combine(display_tracks, microphone_tracks);

        // First supported entry wins and stays fixed for the session.
        let format = match MediaFormat::PREFERENCE
            .iter()
            .copied()
            .find(|f| self.encoder.lock().supports(*f))
        {
            Some(format) => format,
            None => {
                tracks.stop_all();
                *self.state.write() = RecorderState::Idle;
                return Err(RecorderError::CaptureUnavailable(
                    "no supported recording format".to_string(),
                ));
            }
        };
        tracing::info!("negotiated recording format: {}", format);

        if let Err(e) = self.encoder.lock().begin(&tracks, format) {
            tracks.stop_all();
            *self.state.write() = RecorderState::Idle;
            return Err(RecorderError::Encoder(e.to_string()));
        }

        let tracks = Arc::new(tracks);
        self.tracks = Some(tracks.clone());
        self.format = Some(format);
        self.chunks.lock().clear();
        self.spans.clear();
        self.spans.push(SessionSpan::new(0, 0.0));
        self.started_at = Some(Instant::now());

        *self.state.write() = RecorderState::Recording;
        self.spawn_tick_task(tracks);
        let _ = self.event_tx.send(RecorderEvent::Started);

        tracing::info!("recording started");
        Ok(())
    }

    /// Chunk emission loop: one poll per interval tick while recording.
    fn spawn_tick_task(&mut self, tracks: Arc<MediaTrackSet>) {
        let state = self.state.clone();
        let chunks = self.chunks.clone();
        let encoder = self.encoder.clone();
        let event_tx = self.event_tx.clone();
        let interval = Duration::from_millis(self.config.chunk_interval_ms);

        let task = tokio::spawn(async move {
            // Default burst catch-up keeps one chunk per elapsed interval
            // even when the loop falls behind.
            let mut ticker = tokio::time::interval(interval);
            // The first tick completes immediately; consume it so the first
            // chunk lands one full interval after start.
            ticker.tick().await;

            loop {
                ticker.tick().await;
                let current = *state.read();
                match current {
                    RecorderState::Recording => {
                        if tracks.video_ended() {
                            // Out-of-band stop: halt emission and leave
                            // finalization to stop().
                            *state.write() = RecorderState::Stopping;
                            let _ = event_tx.send(RecorderEvent::SourceEnded);
                            tracing::info!("capture source ended; awaiting stop");
                            break;
                        }
                        let polled = encoder.lock().poll_chunk();
                        match polled {
                            // Zero-length chunks are dropped.
                            Ok(Some(data)) if !data.is_empty() => chunks.lock().push(data),
                            Ok(_) => {}
                            Err(e) => {
                                tracing::warn!("chunk poll failed: {}", e);
                                let _ = event_tx.send(RecorderEvent::Error(e.to_string()));
                            }
                        }
                    }
                    RecorderState::Paused => continue,
                    _ => break,
                }
            }
        });

        self.tick_task = Some(task);
    }

    /// Pause recording: chunk emission and the duration counter freeze
    pub fn pause(&mut self) -> RecorderResult<()> {
        if *self.state.read() != RecorderState::Recording {
            return Err(RecorderError::NotRecording);
        }

        let now = self.process_time_secs();
        if let Some(span) = self.spans.last_mut() {
            span.end(now);
        }
        self.encoder.lock().pause();

        *self.state.write() = RecorderState::Paused;
        let _ = self.event_tx.send(RecorderEvent::Paused);

        tracing::info!("recording paused at {:.1}s", now);
        Ok(())
    }

    /// Resume recording: chunk emission and the counter continue
    pub fn resume(&mut self) -> RecorderResult<()> {
        if *self.state.read() != RecorderState::Paused {
            return Err(RecorderError::NotRecording);
        }

        let index = self.spans.len();
        self.spans
            .push(SessionSpan::new(index, self.process_time_secs()));
        self.encoder.lock().resume();

        *self.state.write() = RecorderState::Recording;
        let _ = self.event_tx.send(RecorderEvent::Resumed);

        tracing::info!("recording resumed");
        Ok(())
    }

    /// Stop recording and assemble the captured artifact.
    ///
    /// Flushes the encoder's trailing buffer, concatenates all chunks in
    /// emission order, and releases every track. Track teardown happens
    /// unconditionally, even when the flush or concatenation fails. Also
    /// finalizes sessions the capture surface ended out of band.
    pub async fn stop(&mut self) -> RecorderResult<CapturedArtifact> {
        let current = *self.state.read();
        if !matches!(
            current,
            RecorderState::Recording | RecorderState::Paused | RecorderState::Stopping
        ) {
            return Err(RecorderError::NotRecording);
        }
        *self.state.write() = RecorderState::Stopping;

        let now = self.process_time_secs();
        if let Some(span) = self.spans.last_mut() {
            span.end(now);
        }

        // Wait the tick task out so no append can race the drain below.
        if let Some(task) = self.tick_task.take() {
            task.abort();
            let _ = task.await;
        }

        // Flush the in-flight chunk before finalizing.
        let flush_error = {
            let mut encoder = self.encoder.lock();
            match encoder.finish() {
                Ok(Some(data)) if !data.is_empty() => {
                    self.chunks.lock().push(data);
                    None
                }
                Ok(_) => None,
                Err(e) => Some(RecorderError::Encoder(e.to_string())),
            }
        };

        // Teardown is unconditional.
        if let Some(tracks) = self.tracks.take() {
            tracks.stop_all();
        }

        let format = self.format.take();
        let duration_secs: f64 = self.spans.iter().map(|s| s.duration_secs()).sum();
        let drained: Vec<Vec<u8>> = std::mem::take(&mut *self.chunks.lock());
        self.spans.clear();
        self.started_at = None;

        *self.state.write() = RecorderState::Idle;
        let _ = self.event_tx.send(RecorderEvent::Stopped);

        if let Some(e) = flush_error {
            return Err(e);
        }
        let format = format.ok_or(RecorderError::NotRecording)?;

        let total: usize = drained.iter().map(Vec::len).sum();
        if total == 0 {
            tracing::warn!("recording stopped with no captured data");
            return Err(RecorderError::EmptyCapture);
        }

        let mut data = Vec::with_capacity(total);
        for chunk in &drained {
            data.extend_from_slice(chunk);
        }

        tracing::info!(
            "recording stopped: {} chunks, {} bytes, {:.1}s active",
            drained.len(),
            total,
            duration_secs
        );

        Ok(CapturedArtifact {
            data,
            format,
            duration_secs,
        })
    }
}

fn map_capture_error(e: CaptureError) -> RecorderError {
    match e {
        CaptureError::PermissionDenied(msg) => RecorderError::PermissionDenied(msg),
        CaptureError::Unavailable(msg) => RecorderError::CaptureUnavailable(msg),
        CaptureError::Encoder(msg) => RecorderError::Encoder(msg),
    }
}
