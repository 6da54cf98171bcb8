//! Transcode Engine
//!
//! The engine performs one copy or reencode operation per call and reports
//! success plus a short diagnostic. It never decides fallback policy; that
//! lives in [`crate::strategy`].

pub mod ffmpeg;

use serde::Serialize;
use std::path::PathBuf;

use crate::codec::EncoderChoice;

pub use self::ffmpeg::FfmpegEngine;

/// How a single channel of a track is addressed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ChannelAddressing {
    /// Channel mapping applied to the selected track
    Generic,
    /// Channel mapping qualified with the input stream specifier
    StreamQualified,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ChannelSelector {
    pub channel: u16,
    pub addressing: ChannelAddressing,
}

/// What the engine does with the selected audio
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum EngineMode {
    /// Stream or channel selection only; samples are not recompressed
    Copy,
    /// Decode and encode with the given encoder
    Reencode(EncoderChoice),
}

/// One engine invocation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TranscodeSpec {
    pub input_path: PathBuf,
    /// 0-based audio track ordinal
    pub track: usize,
    pub channel: Option<ChannelSelector>,
    pub mode: EngineMode,
    /// Codec of the source track; used to keep PCM bit-exact on channel copy
    pub source_codec: String,
    pub preserve_metadata: bool,
    pub overwrite: bool,
    pub output_path: PathBuf,
}

impl TranscodeSpec {
    pub fn is_copy(&self) -> bool {
        self.mode == EngineMode::Copy
    }
}

/// Result of one engine invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineOutput {
    pub success: bool,
    /// Last non-empty line of the engine's error output
    pub diagnostic: String,
}

impl EngineOutput {
    pub fn ok() -> Self {
        Self {
            success: true,
            diagnostic: String::new(),
        }
    }

    pub fn failed(diagnostic: impl Into<String>) -> Self {
        Self {
            success: false,
            diagnostic: diagnostic.into(),
        }
    }
}

/// Anything that can carry out a [`TranscodeSpec`]. Calls block until the
/// operation finishes.
pub trait TranscodeEngine: Send + Sync {
    /// Name of the engine (for logging)
    fn name(&self) -> &'static str;

    fn run(&self, spec: &TranscodeSpec) -> EngineOutput;
}

/// Last non-empty line of a tool's stderr, or an empty string
pub fn stderr_tail(stderr: &[u8]) -> String {
    String::from_utf8_lossy(stderr)
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .last()
        .unwrap_or_default()
        .to_string()
}
