//! Media runtime
//!
//! Wraps the ffmpeg executable behind a process-wide handle with a scratch
//! workspace for per-call input and output files. The handle is lazily
//! initialized exactly once per process; initialization verifies the binary
//! and is the only slow operation. Everything after assumes the runtime is
//! resident.

use std::path::PathBuf;
use std::process::Stdio;

use async_trait::async_trait;
use tempfile::TempDir;
use thiserror::Error;
use tokio::process::Command;
use tokio::sync::OnceCell;

use super::types::TranscodeError;

/// Errors from driving the media runtime
#[derive(Error, Debug)]
pub enum RuntimeError {
    #[error("command failed: {0}")]
    CommandFailed(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Execution surface of the media runtime.
///
/// `exec` runs one full command against the workspace; file helpers move
/// bytes in and out. Callers must use per-call unique names so concurrent
/// invocations cannot collide.
#[async_trait]
pub trait MediaRuntime: Send + Sync {
    /// Write a named input file into the runtime workspace
    async fn write_input(&self, name: &str, data: &[u8]) -> Result<(), RuntimeError>;

    /// Execute one command against the workspace
    async fn exec(&self, args: &[String]) -> Result<(), RuntimeError>;

    /// Read a produced output file
    async fn read_output(&self, name: &str) -> Result<Vec<u8>, RuntimeError>;

    /// Best-effort removal of a workspace file
    async fn remove(&self, name: &str);
}

static RUNTIME: OnceCell<std::sync::Arc<FfmpegRuntime>> = OnceCell::const_new();

/// The ffmpeg-backed media runtime.
pub struct FfmpegRuntime {
    binary: PathBuf,
    workspace: TempDir,
}

impl FfmpegRuntime {
    /// Process-wide runtime handle, initialized on first use.
    ///
    /// All callers share one workspace; later calls return the resident
    /// handle without re-running initialization.
    pub async fn global() -> Result<std::sync::Arc<FfmpegRuntime>, TranscodeError> {
        let runtime = RUNTIME
            .get_or_try_init(|| async {
                FfmpegRuntime::initialize(None).await.map(std::sync::Arc::new)
            })
            .await?;
        Ok(runtime.clone())
    }

    /// Locate and verify the ffmpeg binary, then create the workspace.
    ///
    /// Resolution order: explicit override, the `CLIPCAST_FFMPEG`
    /// environment variable, then `ffmpeg` on `PATH`.
    pub async fn initialize(binary_override: Option<PathBuf>) -> Result<Self, TranscodeError> {
        let binary = binary_override
            .or_else(|| std::env::var_os("CLIPCAST_FFMPEG").map(PathBuf::from))
            .unwrap_or_else(|| PathBuf::from("ffmpeg"));

        let output = Command::new(&binary)
            .arg("-version")
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| {
                TranscodeError::RuntimeInitFailed(format!("cannot run {:?}: {}", binary, e))
            })?;
        if !output.status.success() {
            return Err(TranscodeError::RuntimeInitFailed(format!(
                "{:?} -version exited with {}",
                binary, output.status
            )));
        }

        let workspace = TempDir::new()
            .map_err(|e| TranscodeError::RuntimeInitFailed(format!("workspace: {}", e)))?;

        let version = String::from_utf8_lossy(&output.stdout)
            .lines()
            .next()
            .unwrap_or("unknown version")
            .to_string();
        tracing::info!(
            "media runtime ready: {} (workspace {:?})",
            version,
            workspace.path()
        );

        Ok(Self { binary, workspace })
    }

    fn resolve(&self, name: &str) -> PathBuf {
        self.workspace.path().join(name)
    }
}

#[async_trait]
impl MediaRuntime for FfmpegRuntime {
    async fn write_input(&self, name: &str, data: &[u8]) -> Result<(), RuntimeError> {
        tokio::fs::write(self.resolve(name), data).await?;
        Ok(())
    }

    async fn exec(&self, args: &[String]) -> Result<(), RuntimeError> {
        let output = Command::new(&self.binary)
            .args(args)
            .current_dir(self.workspace.path())
            .stdin(Stdio::null())
            .output()
            .await?;

        if !output.status.success() {
            return Err(RuntimeError::CommandFailed(stderr_tail(&output.stderr)));
        }
        Ok(())
    }

    async fn read_output(&self, name: &str) -> Result<Vec<u8>, RuntimeError> {
        Ok(tokio::fs::read(self.resolve(name)).await?)
    }

    async fn remove(&self, name: &str) {
        let _ = tokio::fs::remove_file(self.resolve(name)).await;
    }
}

/// Last few stderr lines; ffmpeg puts the actionable message at the end.
fn stderr_tail(raw: &[u8]) -> String {
    let text = String::from_utf8_lossy(raw);
    let lines: Vec<&str> = text.lines().filter(|l| !l.trim().is_empty()).collect();
    let start = lines.len().saturating_sub(6);
    lines[start..].join("\n")
}
