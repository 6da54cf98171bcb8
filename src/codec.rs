//! Codec classification and lookup tables
//!
//! Every probed codec name is mapped once to a [`CodecFamily`]; the container
//! and encoder tables are keyed by family so unknown codecs take an explicit
//! default path instead of falling through a string match.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Uncompressed codecs whose channels can be separated without reencoding
const PCM_CODECS: &[&str] = &[
    "pcm_s16le",
    "pcm_s16be",
    "pcm_s24le",
    "pcm_s24be",
    "pcm_s32le",
    "pcm_s32be",
    "pcm_f32le",
    "pcm_f32be",
    "pcm_f64le",
    "pcm_u8",
    "pcm_s8",
    "pcm_alaw",
    "pcm_mulaw",
    "pcm_bluray",
    "pcm_dvd",
];

/// Whether a codec allows lossless per-channel splitting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CodecClass {
    /// Losslessly splittable per channel
    Pcm,
    /// Channel isolation requires reencoding
    Compressed,
}

/// Codec family used to key the container and encoder tables
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CodecFamily {
    Aac,
    Mp3,
    Flac,
    Opus,
    Pcm,
    Unknown,
}

/// Encoder and bitrate used for a reencode attempt
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EncoderChoice {
    /// FFmpeg encoder name (e.g. "aac", "libmp3lame")
    pub encoder: &'static str,
    /// Target bitrate, `None` for lossless encoders
    pub bitrate: Option<String>,
}

impl CodecFamily {
    /// Classify a probed codec name
    pub fn from_codec_name(name: &str) -> Self {
        let name = name.trim().to_ascii_lowercase();
        match name.as_str() {
            "aac" => Self::Aac,
            "mp3" | "mp3float" => Self::Mp3,
            "flac" => Self::Flac,
            "opus" => Self::Opus,
            n if PCM_CODECS.contains(&n) => Self::Pcm,
            _ => Self::Unknown,
        }
    }

    pub fn class(self) -> CodecClass {
        match self {
            Self::Pcm => CodecClass::Pcm,
            _ => CodecClass::Compressed,
        }
    }

    /// Native output container (file extension) for this family
    pub fn container(self) -> &'static str {
        match self {
            Self::Aac => "m4a",
            Self::Mp3 => "mp3",
            Self::Flac => "flac",
            Self::Opus => "opus",
            Self::Pcm => "wav",
            Self::Unknown => "m4a",
        }
    }

    /// Encoder used when this family has to be reencoded
    pub fn encoder(self) -> EncoderChoice {
        let (encoder, bitrate) = match self {
            Self::Aac => ("aac", Some("192k")),
            Self::Mp3 => ("libmp3lame", Some("192k")),
            Self::Flac => ("flac", None),
            Self::Opus => ("libopus", Some("128k")),
            Self::Pcm => ("pcm_s16le", None),
            Self::Unknown => ("aac", Some("192k")),
        };
        EncoderChoice {
            encoder,
            bitrate: bitrate.map(str::to_string),
        }
    }

    /// Encoder for reencoding a track with this probed codec name. PCM
    /// sources keep their sample format instead of dropping to 16-bit.
    pub fn encoder_for(self, codec_name: &str) -> EncoderChoice {
        match self {
            Self::Pcm => EncoderChoice {
                encoder: wav_pcm_encoder(codec_name),
                bitrate: None,
            },
            _ => self.encoder(),
        }
    }
}

/// WAV-compatible PCM encoder holding every sample of the source codec
fn wav_pcm_encoder(codec_name: &str) -> &'static str {
    match codec_name.trim().to_ascii_lowercase().as_str() {
        "pcm_s24le" | "pcm_s24be" => "pcm_s24le",
        "pcm_s32le" | "pcm_s32be" => "pcm_s32le",
        "pcm_f32le" | "pcm_f32be" => "pcm_f32le",
        "pcm_f64le" => "pcm_f64le",
        "pcm_u8" | "pcm_s8" => "pcm_u8",
        "pcm_alaw" => "pcm_alaw",
        "pcm_mulaw" => "pcm_mulaw",
        // Blu-ray and DVD LPCM may carry 20 or 24-bit samples
        "pcm_bluray" | "pcm_dvd" => "pcm_s24le",
        _ => "pcm_s16le",
    }
}

/// Output format a user can force every task into
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum TargetFormat {
    Mp3,
    Aac,
    Flac,
    Opus,
    Wav,
}

impl TargetFormat {
    fn family(self) -> CodecFamily {
        match self {
            Self::Mp3 => CodecFamily::Mp3,
            Self::Aac => CodecFamily::Aac,
            Self::Flac => CodecFamily::Flac,
            Self::Opus => CodecFamily::Opus,
            Self::Wav => CodecFamily::Pcm,
        }
    }

    pub fn container(self) -> &'static str {
        self.family().container()
    }

    /// Encoder for this target; the bitrate override only applies to lossy encoders
    pub fn encoder(self, bitrate: Option<&str>) -> EncoderChoice {
        let mut choice = self.family().encoder();
        if let (Some(_), Some(b)) = (&choice.bitrate, bitrate) {
            choice.bitrate = Some(b.to_string());
        }
        choice
    }
}

impl fmt::Display for TargetFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Mp3 => "mp3",
            Self::Aac => "aac",
            Self::Flac => "flac",
            Self::Opus => "opus",
            Self::Wav => "wav",
        })
    }
}
