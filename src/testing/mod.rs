//! Synthetic capture and scripted runtime for offline tests
//!
//! Hardware-free stand-ins for the capture and transcode seams, so the
//! whole pipeline can be exercised without a display server, microphone,
//! or ffmpeg install.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use uuid::Uuid;

use crate::capture::format::MediaFormat;
use crate::capture::traits::{
    CaptureError, CaptureResult, CaptureSource, MediaTrack, MediaTrackSet, StreamEncoder,
    TrackKind,
};
use crate::transcode::runtime::{MediaRuntime, RuntimeError};

/// A live track backed by nothing but a liveness flag.
pub struct SyntheticTrack {
    id: String,
    kind: TrackKind,
    label: String,
    live: Arc<AtomicBool>,
}

impl SyntheticTrack {
    pub fn new(kind: TrackKind, label: &str) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            kind,
            label: label.to_string(),
            live: Arc::new(AtomicBool::new(true)),
        }
    }

    fn with_flag(kind: TrackKind, label: &str, live: Arc<AtomicBool>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            kind,
            label: label.to_string(),
            live,
        }
    }

    /// Shared liveness flag; clear it to simulate the user revoking
    /// capture through a system control.
    pub fn live_flag(&self) -> Arc<AtomicBool> {
        self.live.clone()
    }
}

impl MediaTrack for SyntheticTrack {
    fn id(&self) -> &str {
        &self.id
    }

    fn kind(&self) -> TrackKind {
        self.kind
    }

    fn label(&self) -> &str {
        &self.label
    }

    fn is_live(&self) -> bool {
        self.live.load(Ordering::SeqCst)
    }

    fn stop(&self) {
        self.live.store(false, Ordering::SeqCst);
    }
}

/// Behavior of a [`SyntheticSource`] when asked to acquire.
enum SourceBehavior {
    Grant(Vec<TrackKind>),
    Deny,
    Empty,
}

/// A capture source that grants, denies, or yields no tracks on demand.
pub struct SyntheticSource {
    id: String,
    behavior: SourceBehavior,
    live: Arc<AtomicBool>,
}

impl SyntheticSource {
    /// A display surface: one video track plus one system-audio track.
    pub fn display() -> Self {
        Self {
            id: "display".to_string(),
            behavior: SourceBehavior::Grant(vec![TrackKind::Video, TrackKind::Audio]),
            live: Arc::new(AtomicBool::new(true)),
        }
    }

    /// A microphone: one audio track.
    pub fn microphone() -> Self {
        Self {
            id: "microphone".to_string(),
            behavior: SourceBehavior::Grant(vec![TrackKind::Audio]),
            live: Arc::new(AtomicBool::new(true)),
        }
    }

    /// A source whose permission prompt the user rejects.
    pub fn denied(id: &str) -> Self {
        Self {
            id: id.to_string(),
            behavior: SourceBehavior::Deny,
            live: Arc::new(AtomicBool::new(true)),
        }
    }

    /// A source that grants but produces no tracks.
    pub fn empty(id: &str) -> Self {
        Self {
            id: id.to_string(),
            behavior: SourceBehavior::Empty,
            live: Arc::new(AtomicBool::new(true)),
        }
    }

    /// Liveness flag shared by every track this source hands out.
    pub fn live_flag(&self) -> Arc<AtomicBool> {
        self.live.clone()
    }
}

#[async_trait]
impl CaptureSource for SyntheticSource {
    fn id(&self) -> &str {
        &self.id
    }

    async fn acquire(&mut self) -> CaptureResult<MediaTrackSet> {
        match &self.behavior {
            SourceBehavior::Deny => Err(CaptureError::PermissionDenied(format!(
                "{} capture rejected",
                self.id
            ))),
            SourceBehavior::Empty => Ok(MediaTrackSet::new(Vec::new())),
            SourceBehavior::Grant(kinds) => {
                let tracks = kinds
                    .iter()
                    .map(|kind| {
                        Box::new(SyntheticTrack::with_flag(
                            *kind,
                            &format!("{}-{}", self.id, kind),
                            self.live.clone(),
                        )) as Box<dyn MediaTrack>
                    })
                    .collect();
                Ok(MediaTrackSet::new(tracks))
            }
        }
    }
}

/// Deterministic encoder: one fixed-size chunk per poll, byte content
/// derived from the chunk index so concatenation order is checkable.
pub struct SyntheticEncoder {
    supported: Vec<MediaFormat>,
    chunk_size: usize,
    silent: bool,
    active: bool,
    paused: bool,
    counter: u8,
}

impl SyntheticEncoder {
    pub fn new() -> Self {
        Self {
            supported: MediaFormat::PREFERENCE.to_vec(),
            chunk_size: 1_000,
            silent: false,
            active: false,
            paused: false,
            counter: 0,
        }
    }

    /// An encoder that never produces data (for empty-capture scenarios).
    pub fn silent() -> Self {
        Self {
            silent: true,
            ..Self::new()
        }
    }

    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    pub fn with_formats(mut self, formats: Vec<MediaFormat>) -> Self {
        self.supported = formats;
        self
    }
}

impl Default for SyntheticEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl StreamEncoder for SyntheticEncoder {
    fn supports(&self, format: MediaFormat) -> bool {
        self.supported.contains(&format)
    }

    fn begin(&mut self, tracks: &MediaTrackSet, _format: MediaFormat) -> CaptureResult<()> {
        if tracks.is_empty() {
            return Err(CaptureError::Encoder("no tracks to encode".to_string()));
        }
        self.active = true;
        self.paused = false;
        self.counter = 0;
        Ok(())
    }

    fn pause(&mut self) {
        self.paused = true;
    }

    fn resume(&mut self) {
        self.paused = false;
    }

    fn poll_chunk(&mut self) -> CaptureResult<Option<Vec<u8>>> {
        if !self.active || self.paused || self.silent {
            return Ok(None);
        }
        let chunk = vec![self.counter; self.chunk_size];
        self.counter = self.counter.wrapping_add(1);
        Ok(Some(chunk))
    }

    fn finish(&mut self) -> CaptureResult<Option<Vec<u8>>> {
        self.active = false;
        Ok(None)
    }
}

/// How the scripted runtime reacts to one exec invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecScript {
    /// Every command succeeds.
    Succeed,
    /// Stream-copy commands fail; re-encodes succeed.
    FailCopy,
    /// Commands fail unless they produce the given extension.
    SucceedOnlyExtension(&'static str),
    /// Every command fails.
    FailAll,
}

/// In-memory [`MediaRuntime`] with scripted failures.
///
/// Records every exec invocation so tests can assert whether and how the
/// runtime was driven.
pub struct ScriptedRuntime {
    script: ExecScript,
    files: Mutex<HashMap<String, Vec<u8>>>,
    execs: Mutex<Vec<Vec<String>>>,
}

impl ScriptedRuntime {
    pub fn new(script: ExecScript) -> Self {
        Self {
            script,
            files: Mutex::new(HashMap::new()),
            execs: Mutex::new(Vec::new()),
        }
    }

    /// All exec invocations so far, in order.
    pub fn exec_log(&self) -> Vec<Vec<String>> {
        self.execs.lock().clone()
    }

    /// Number of exec invocations so far.
    pub fn exec_count(&self) -> usize {
        self.execs.lock().len()
    }

    fn is_copy(args: &[String]) -> bool {
        args.windows(2)
            .any(|w| w[0] == "-c:v" && w[1] == "copy")
    }

    fn should_fail(&self, args: &[String], output: &str) -> bool {
        match self.script {
            ExecScript::Succeed => false,
            ExecScript::FailAll => true,
            ExecScript::FailCopy => Self::is_copy(args),
            ExecScript::SucceedOnlyExtension(ext) => !output.ends_with(ext),
        }
    }
}

#[async_trait]
impl MediaRuntime for ScriptedRuntime {
    async fn write_input(&self, name: &str, data: &[u8]) -> Result<(), RuntimeError> {
        self.files.lock().insert(name.to_string(), data.to_vec());
        Ok(())
    }

    async fn exec(&self, args: &[String]) -> Result<(), RuntimeError> {
        self.execs.lock().push(args.to_vec());

        let output = args
            .last()
            .cloned()
            .unwrap_or_default();
        if self.should_fail(args, &output) {
            return Err(RuntimeError::CommandFailed(
                "scripted failure".to_string(),
            ));
        }

        // Successful commands "transcode" the input by stamping it with the
        // winning command line.
        let payload = format!("transcoded:{}", args.join(" ")).into_bytes();
        self.files.lock().insert(output, payload);
        Ok(())
    }

    async fn read_output(&self, name: &str) -> Result<Vec<u8>, RuntimeError> {
        self.files.lock().get(name).cloned().ok_or_else(|| {
            RuntimeError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("no such workspace file: {name}"),
            ))
        })
    }

    async fn remove(&self, name: &str) {
        self.files.lock().remove(name);
    }
}
