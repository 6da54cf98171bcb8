//! Extractor configuration

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::codec::TargetFormat;
use crate::plan::{ExtractionMode, PlanOptions};

/// What gets extracted and where it goes
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionConfig {
    /// Whole tracks or one file per channel
    pub mode: ExtractionMode,

    /// Replace existing output files
    pub overwrite: bool,

    /// Copy container metadata into every output
    pub preserve_metadata: bool,

    /// Concurrent engine invocations, 0 = host parallelism
    pub max_workers: usize,

    /// Output directory; `None` writes next to each input
    pub output_dir: Option<PathBuf>,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            mode: ExtractionMode::WholeTrackOnly,
            overwrite: false,
            preserve_metadata: true,
            max_workers: 0,
            output_dir: None,
        }
    }
}

/// Forced reencode settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EncodingConfig {
    /// Reencode every task into this format instead of copying
    pub target_format: Option<TargetFormat>,

    /// Bitrate for lossy target formats (e.g. "192k")
    pub bitrate: Option<String>,
}

/// External tool locations
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolsConfig {
    pub ffmpeg: PathBuf,
    pub ffprobe: PathBuf,

    /// Probe through the linked FFmpeg libraries instead of ffprobe
    /// (needs the `libav` feature)
    pub in_process_probe: bool,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            ffmpeg: PathBuf::from("ffmpeg"),
            ffprobe: PathBuf::from("ffprobe"),
            in_process_probe: false,
        }
    }
}

/// Log output format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pretty,
        }
    }
}

/// Extractor configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExtractConfig {
    pub extraction: ExtractionConfig,
    pub encoding: EncodingConfig,
    pub tools: ToolsConfig,
    pub logging: LoggingConfig,
}

impl ExtractConfig {
    /// Planning options for one batch
    pub fn plan_options(&self) -> PlanOptions {
        PlanOptions {
            mode: self.extraction.mode,
            overwrite: self.extraction.overwrite,
            preserve_metadata: self.extraction.preserve_metadata,
            target_format: self.encoding.target_format,
            bitrate: self.encoding.bitrate.clone(),
        }
    }

    /// Default tracing filter for the configured level
    pub fn log_filter(&self) -> String {
        format!("track_extract={}", self.logging.level)
    }
}
