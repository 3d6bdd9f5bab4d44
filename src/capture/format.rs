//! Recording format negotiation
//!
//! Formats a session can be encoded in, ordered by how widely the result
//! can be decoded.

use serde::{Deserialize, Serialize};

/// Container families the pipeline can produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Container {
    Webm,
    Mp4,
}

impl Container {
    /// File extension for this container
    pub const fn extension(&self) -> &'static str {
        match self {
            Container::Webm => "webm",
            Container::Mp4 => "mp4",
        }
    }

    /// Media type (MIME) for this container
    pub const fn media_type(&self) -> &'static str {
        match self {
            Container::Webm => "video/webm",
            Container::Mp4 => "video/mp4",
        }
    }
}

/// A concrete recording format: container plus codec pairing.
///
/// `PREFERENCE` orders these by decodability; the recorder picks the first
/// entry its encoder supports and keeps it for the whole session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MediaFormat {
    WebmVp8Opus,
    WebmVp9Opus,
    Webm,
    Mp4,
}

impl MediaFormat {
    /// Negotiation order: more widely decodable formats first.
    pub const PREFERENCE: [MediaFormat; 4] = [
        MediaFormat::WebmVp8Opus,
        MediaFormat::WebmVp9Opus,
        MediaFormat::Webm,
        MediaFormat::Mp4,
    ];

    /// Full media type tag, including codec parameters where known
    pub const fn mime_type(&self) -> &'static str {
        match self {
            MediaFormat::WebmVp8Opus => "video/webm; codecs=vp8,opus",
            MediaFormat::WebmVp9Opus => "video/webm; codecs=vp9,opus",
            MediaFormat::Webm => "video/webm",
            MediaFormat::Mp4 => "video/mp4",
        }
    }

    /// Container family of this format
    pub const fn container(&self) -> Container {
        match self {
            MediaFormat::WebmVp8Opus | MediaFormat::WebmVp9Opus | MediaFormat::Webm => {
                Container::Webm
            }
            MediaFormat::Mp4 => Container::Mp4,
        }
    }

    /// File extension for this format
    pub const fn extension(&self) -> &'static str {
        self.container().extension()
    }

    /// Map a file extension to the base format of its container.
    ///
    /// Used when ingesting an already-recorded file whose codec parameters
    /// are unknown.
    pub fn from_extension(ext: &str) -> Option<MediaFormat> {
        match ext.to_ascii_lowercase().as_str() {
            "webm" => Some(MediaFormat::Webm),
            "mp4" => Some(MediaFormat::Mp4),
            _ => None,
        }
    }
}

impl std::fmt::Display for MediaFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.mime_type())
    }
}
