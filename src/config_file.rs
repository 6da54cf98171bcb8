//! Configuration file support
//!
//! Loads extractor configuration from TOML files. Every section and key is
//! optional; missing values fall back to [`ExtractConfig::default`].

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::codec::TargetFormat;
use crate::config::{
    EncodingConfig, ExtractConfig, ExtractionConfig, LogFormat, LoggingConfig, ToolsConfig,
};
use crate::error::{ExtractError, Result};
use crate::plan::ExtractionMode;

/// Configuration file format
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConfigFile {
    /// Extraction settings
    pub extraction: Option<ExtractionSettings>,
    /// Forced reencode settings
    pub encoding: Option<EncodingSettings>,
    /// External tool paths
    pub tools: Option<ToolsSettings>,
    /// Logging settings
    pub logging: Option<LoggingSettings>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExtractionSettings {
    /// "whole" or "per-channel"
    pub mode: Option<ExtractionMode>,
    pub overwrite: Option<bool>,
    pub preserve_metadata: Option<bool>,
    /// 0 = host parallelism
    pub max_workers: Option<usize>,
    pub output_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EncodingSettings {
    /// mp3, aac, flac, opus or wav
    pub target_format: Option<TargetFormat>,
    pub bitrate: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ToolsSettings {
    pub ffmpeg: Option<PathBuf>,
    pub ffprobe: Option<PathBuf>,
    pub in_process_probe: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoggingSettings {
    /// Log level (trace, debug, info, warn, error)
    pub level: Option<String>,
    /// Output format (json, pretty)
    pub format: Option<LogFormat>,
}

impl ConfigFile {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content)
            .map_err(|e| ExtractError::Config(format!("{}: {}", path.display(), e)))
    }

    /// Save configuration to a TOML file
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content =
            toml::to_string_pretty(self).map_err(|e| ExtractError::Config(e.to_string()))?;
        std::fs::write(path.as_ref(), content)?;
        Ok(())
    }

    /// Configuration file with every key set to its default
    pub fn default_config() -> Self {
        let defaults = ExtractConfig::default();
        Self {
            extraction: Some(ExtractionSettings {
                mode: Some(defaults.extraction.mode),
                overwrite: Some(defaults.extraction.overwrite),
                preserve_metadata: Some(defaults.extraction.preserve_metadata),
                max_workers: Some(defaults.extraction.max_workers),
                output_dir: None,
            }),
            encoding: Some(EncodingSettings {
                target_format: None,
                bitrate: None,
            }),
            tools: Some(ToolsSettings {
                ffmpeg: Some(defaults.tools.ffmpeg),
                ffprobe: Some(defaults.tools.ffprobe),
                in_process_probe: Some(defaults.tools.in_process_probe),
            }),
            logging: Some(LoggingSettings {
                level: Some(defaults.logging.level),
                format: Some(defaults.logging.format),
            }),
        }
    }

    /// Convert to ExtractConfig
    pub fn into_extract_config(self) -> ExtractConfig {
        let base = ExtractConfig::default();
        let extraction = self.extraction.unwrap_or_default();
        let encoding = self.encoding.unwrap_or_default();
        let tools = self.tools.unwrap_or_default();
        let logging = self.logging.unwrap_or_default();

        ExtractConfig {
            extraction: ExtractionConfig {
                mode: extraction.mode.unwrap_or(base.extraction.mode),
                overwrite: extraction.overwrite.unwrap_or(base.extraction.overwrite),
                preserve_metadata: extraction
                    .preserve_metadata
                    .unwrap_or(base.extraction.preserve_metadata),
                max_workers: extraction.max_workers.unwrap_or(base.extraction.max_workers),
                output_dir: extraction.output_dir.or(base.extraction.output_dir),
            },
            encoding: EncodingConfig {
                target_format: encoding.target_format,
                bitrate: encoding.bitrate,
            },
            tools: ToolsConfig {
                ffmpeg: tools.ffmpeg.unwrap_or(base.tools.ffmpeg),
                ffprobe: tools.ffprobe.unwrap_or(base.tools.ffprobe),
                in_process_probe: tools
                    .in_process_probe
                    .unwrap_or(base.tools.in_process_probe),
            },
            logging: LoggingConfig {
                level: logging.level.unwrap_or(base.logging.level),
                format: logging.format.unwrap_or(base.logging.format),
            },
        }
    }
}

/// Generate default configuration file at the specified path
pub fn generate_default_config<P: AsRef<Path>>(path: P) -> Result<()> {
    ConfigFile::default_config().to_file(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config() {
        let config = ConfigFile::default_config().into_extract_config();
        assert_eq!(config.extraction.mode, ExtractionMode::WholeTrackOnly);
        assert!(config.extraction.preserve_metadata);
        assert_eq!(config.tools.ffmpeg, PathBuf::from("ffmpeg"));
    }

    #[test]
    fn test_partial_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        writeln!(
            temp_file,
            "[extraction]\nmode = \"per-channel\"\nmax_workers = 2\n\n[encoding]\ntarget_format = \"mp3\"\nbitrate = \"256k\"\n\n[logging]\nformat = \"json\""
        )
        .unwrap();

        let config = ConfigFile::from_file(temp_file.path())
            .unwrap()
            .into_extract_config();

        assert_eq!(config.extraction.mode, ExtractionMode::PerChannel);
        assert_eq!(config.extraction.max_workers, 2);
        assert!(!config.extraction.overwrite);
        assert_eq!(config.encoding.target_format, Some(TargetFormat::Mp3));
        assert_eq!(config.encoding.bitrate.as_deref(), Some("256k"));
        assert_eq!(config.logging.format, LogFormat::Json);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_invalid_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        writeln!(temp_file, "[extraction]\nmode = \"sideways\"").unwrap();

        let err = ConfigFile::from_file(temp_file.path()).unwrap_err();
        assert!(matches!(err, ExtractError::Config(_)));
    }

    #[test]
    fn test_generate_default_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("track-extract.toml");

        generate_default_config(&path).unwrap();

        assert!(path.exists());
        let loaded = ConfigFile::from_file(&path).unwrap();
        assert_eq!(loaded.extraction.unwrap().max_workers, Some(0));
    }
}
