//! Application configuration
//!
//! Typed configuration with defaults, optionally loaded from a TOML file.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::recorder::RecorderConfig;
use crate::utils::error::{AppError, AppResult};

/// Storage adapter settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Directory uploads land in
    pub upload_dir: PathBuf,

    /// Base path/URL stored objects are served under
    pub public_base: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            upload_dir: PathBuf::from("uploads"),
            public_base: "/uploads".to_string(),
        }
    }
}

/// Transcode runtime settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TranscodeConfig {
    /// Explicit ffmpeg binary; falls back to `CLIPCAST_FFMPEG`, then `PATH`
    pub ffmpeg_path: Option<PathBuf>,
}

/// Top-level application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub recorder: RecorderConfig,
    pub storage: StorageConfig,
    pub transcode: TranscodeConfig,
}

impl AppConfig {
    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> AppResult<Self> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| AppError::Config(format!("{:?}: {}", path, e)))
    }

    /// Load from `path` when given, defaults otherwise
    pub fn load_or_default(path: Option<&Path>) -> AppResult<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sensible() {
        let config = AppConfig::default();
        assert_eq!(config.recorder.chunk_interval_ms, 1_000);
        assert_eq!(config.storage.public_base, "/uploads");
        assert!(config.transcode.ffmpeg_path.is_none());
    }

    #[test]
    fn partial_toml_fills_in_defaults() {
        let config: AppConfig = toml::from_str(
            r#"
            [recorder]
            chunk_interval_ms = 250

            [storage]
            upload_dir = "/tmp/clips"
            "#,
        )
        .unwrap();

        assert_eq!(config.recorder.chunk_interval_ms, 250);
        assert_eq!(config.storage.upload_dir, PathBuf::from("/tmp/clips"));
        assert_eq!(config.storage.public_base, "/uploads");
    }

    #[test]
    fn load_missing_file_is_an_error() {
        assert!(AppConfig::load(Path::new("/definitely/not/here.toml")).is_err());
    }
}
