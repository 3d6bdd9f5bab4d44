//! Transcode strategy ladder
//!
//! The fallback tiers are plain data: an ordered list of codec/container
//! descriptors the engine iterates first-success. New tiers are added by
//! extending the ladder, not by restructuring control flow.

use serde::{Deserialize, Serialize};

use super::types::TrimRange;
use crate::capture::format::{Container, MediaFormat};

/// Whether a strategy copies streams or re-encodes them
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StrategyMode {
    Copy,
    Reencode,
}

/// One tier of the fallback ladder
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TranscodeStrategy {
    /// Stable name used in logs and failure reports
    pub name: &'static str,

    /// Copy or re-encode
    pub mode: StrategyMode,

    /// Output container, which also declares the result media type
    pub container: Container,

    /// Video codec for re-encode tiers
    pub video_codec: Option<&'static str>,

    /// Audio codec for re-encode tiers
    pub audio_codec: Option<&'static str>,

    /// Container-specific trailing flags
    pub extra_args: &'static [&'static str],
}

impl TranscodeStrategy {
    /// Media type the result will be tagged with
    pub const fn media_type(&self) -> &'static str {
        self.container.media_type()
    }

    /// File extension for the output
    pub const fn extension(&self) -> &'static str {
        self.container.extension()
    }

    /// Build the full command for one attempt.
    ///
    /// `-ss` after `-i` keeps the seek accurate (decode-based) rather than
    /// snapping to the previous keyframe, which matters for recordings with
    /// sparse keyframes. Times are written with millisecond precision.
    pub fn build_args(&self, input: &str, range: TrimRange, output: &str) -> Vec<String> {
        let mut args: Vec<String> = vec![
            "-y".to_string(),
            "-i".to_string(),
            input.to_string(),
            "-ss".to_string(),
            format!("{:.3}", range.start_secs),
            "-t".to_string(),
            format!("{:.3}", range.duration_secs()),
        ];

        match self.mode {
            StrategyMode::Copy => {
                args.extend(["-c:v", "copy", "-c:a", "copy"].map(String::from));
            }
            StrategyMode::Reencode => {
                if let Some(video) = self.video_codec {
                    args.extend(["-c:v".to_string(), video.to_string()]);
                }
                if let Some(audio) = self.audio_codec {
                    args.extend(["-c:a".to_string(), audio.to_string()]);
                }
            }
        }

        args.extend(self.extra_args.iter().map(|s| s.to_string()));
        args.push(output.to_string());
        args
    }
}

/// Fallback ladder for an artifact recorded in `format`, fastest and most
/// faithful tier first:
///
/// 1. stream copy in the native container
/// 2. baseline re-encode in the same container family
/// 3. newer-codec re-encode in the same family (WebM only)
/// 4. cross-container re-encode as the last resort
pub fn ladder_for(format: MediaFormat) -> Vec<TranscodeStrategy> {
    match format.container() {
        Container::Webm => vec![
            TranscodeStrategy {
                name: "webm-copy",
                mode: StrategyMode::Copy,
                container: Container::Webm,
                video_codec: None,
                audio_codec: None,
                extra_args: &[],
            },
            // VP8 + Vorbis decodes practically everywhere.
            TranscodeStrategy {
                name: "webm-vp8",
                mode: StrategyMode::Reencode,
                container: Container::Webm,
                video_codec: Some("libvpx"),
                audio_codec: Some("libvorbis"),
                extra_args: &["-crf", "23", "-b:v", "0"],
            },
            TranscodeStrategy {
                name: "webm-vp9",
                mode: StrategyMode::Reencode,
                container: Container::Webm,
                video_codec: Some("libvpx-vp9"),
                audio_codec: Some("libopus"),
                extra_args: &["-crf", "32", "-b:v", "0"],
            },
            TranscodeStrategy {
                name: "mp4-h264",
                mode: StrategyMode::Reencode,
                container: Container::Mp4,
                video_codec: Some("libx264"),
                audio_codec: Some("aac"),
                extra_args: &["-pix_fmt", "yuv420p", "-movflags", "+faststart"],
            },
        ],
        Container::Mp4 => vec![
            TranscodeStrategy {
                name: "mp4-copy",
                mode: StrategyMode::Copy,
                container: Container::Mp4,
                video_codec: None,
                audio_codec: None,
                extra_args: &["-movflags", "+faststart"],
            },
            TranscodeStrategy {
                name: "mp4-h264",
                mode: StrategyMode::Reencode,
                container: Container::Mp4,
                video_codec: Some("libx264"),
                audio_codec: Some("aac"),
                extra_args: &["-pix_fmt", "yuv420p", "-movflags", "+faststart"],
            },
            TranscodeStrategy {
                name: "webm-vp8",
                mode: StrategyMode::Reencode,
                container: Container::Webm,
                video_codec: Some("libvpx"),
                audio_codec: Some("libvorbis"),
                extra_args: &["-crf", "23", "-b:v", "0"],
            },
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn webm_ladder_starts_with_copy_and_ends_cross_container() {
        let ladder = ladder_for(MediaFormat::WebmVp8Opus);
        assert_eq!(ladder[0].name, "webm-copy");
        assert_eq!(ladder[0].mode, StrategyMode::Copy);
        assert_eq!(ladder.last().unwrap().container, Container::Mp4);
    }

    #[test]
    fn mp4_ladder_falls_back_to_webm() {
        let ladder = ladder_for(MediaFormat::Mp4);
        assert_eq!(ladder[0].name, "mp4-copy");
        assert_eq!(ladder.last().unwrap().container, Container::Webm);
    }

    #[test]
    fn copy_args_request_stream_copy() {
        let ladder = ladder_for(MediaFormat::Webm);
        let args = ladder[0].build_args("in.webm", TrimRange::new(2.0, 7.0), "out.webm");
        let joined = args.join(" ");
        assert!(joined.contains("-c:v copy"));
        assert!(joined.contains("-c:a copy"));
        assert_eq!(args.last().unwrap(), "out.webm");
    }

    #[test]
    fn times_keep_millisecond_precision() {
        let ladder = ladder_for(MediaFormat::Webm);
        let args = ladder[0].build_args("in.webm", TrimRange::new(2.5, 7.125), "out.webm");
        let ss = args.iter().position(|a| a == "-ss").unwrap();
        assert_eq!(args[ss + 1], "2.500");
        let t = args.iter().position(|a| a == "-t").unwrap();
        assert_eq!(args[t + 1], "4.625");
    }

    #[test]
    fn reencode_args_carry_codecs_and_extras() {
        let ladder = ladder_for(MediaFormat::Webm);
        let vp8 = ladder[1];
        let args = vp8.build_args("in.webm", TrimRange::new(0.0, 1.0), "out.webm");
        let joined = args.join(" ");
        assert!(joined.contains("-c:v libvpx"));
        assert!(joined.contains("-c:a libvorbis"));
        assert!(joined.contains("-crf 23"));
    }
}
