//! Command-line arguments

use clap::Parser;
use std::path::PathBuf;

use crate::codec::TargetFormat;
use crate::config::ExtractConfig;
use crate::plan::ExtractionMode;
use crate::scheduler::MAX_WORKERS;

/// Extract audio tracks (or single channels) from video containers.
#[derive(Parser, Debug, Clone, Default)]
#[command(name = "track-extract")]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Video files or directories of video files
    pub inputs: Vec<PathBuf>,

    /// Output directory (defaults to the directory of each input)
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,

    /// Whole tracks or one file per channel
    #[arg(short, long, value_enum)]
    pub mode: Option<ExtractionMode>,

    /// Replace existing output files
    #[arg(long)]
    pub overwrite: bool,

    /// Strip container metadata from outputs
    #[arg(long)]
    pub no_metadata: bool,

    /// Concurrent extractions (0 = number of CPUs)
    #[arg(short, long)]
    pub jobs: Option<usize>,

    /// Reencode everything into this format
    #[arg(short, long, value_enum)]
    pub format: Option<TargetFormat>,

    /// Bitrate for lossy formats, e.g. 192k
    #[arg(short, long)]
    pub bitrate: Option<String>,

    /// TOML configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Print the reports as JSON
    #[arg(long)]
    pub json: bool,

    /// Write a default configuration file and exit
    #[arg(long, value_name = "FILE")]
    pub init_config: Option<PathBuf>,
}

impl Args {
    /// Validate argument combinations
    pub fn validate(&self) -> Result<(), String> {
        if self.init_config.is_none() && self.inputs.is_empty() {
            return Err("No input files or directories given".to_string());
        }
        if let Some(jobs) = self.jobs {
            if jobs > MAX_WORKERS {
                return Err(format!(
                    "--jobs {} is too large, the limit is {}",
                    jobs, MAX_WORKERS
                ));
            }
        }
        if let Some(ref bitrate) = self.bitrate {
            if !is_valid_bitrate(bitrate) {
                return Err(format!(
                    "Invalid bitrate '{}', expected a value like 192k",
                    bitrate
                ));
            }
        }
        Ok(())
    }

    /// Apply command-line overrides on top of a loaded configuration
    pub fn apply(&self, config: &mut ExtractConfig) {
        if let Some(ref dir) = self.output_dir {
            config.extraction.output_dir = Some(dir.clone());
        }
        if let Some(mode) = self.mode {
            config.extraction.mode = mode;
        }
        if self.overwrite {
            config.extraction.overwrite = true;
        }
        if self.no_metadata {
            config.extraction.preserve_metadata = false;
        }
        if let Some(jobs) = self.jobs {
            config.extraction.max_workers = jobs;
        }
        if let Some(format) = self.format {
            config.encoding.target_format = Some(format);
        }
        if let Some(ref bitrate) = self.bitrate {
            config.encoding.bitrate = Some(bitrate.clone());
        }
    }
}

fn is_valid_bitrate(bitrate: &str) -> bool {
    match bitrate.strip_suffix(|c| c == 'k' || c == 'K') {
        Some(n) => n.parse::<u32>().map(|n| n > 0).unwrap_or(false),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_args() {
        let args = Args::parse_from([
            "track-extract",
            "--mode",
            "per-channel",
            "-j",
            "4",
            "--format",
            "opus",
            "--bitrate",
            "96k",
            "a.mkv",
            "shows/",
        ]);

        assert_eq!(args.inputs, vec![PathBuf::from("a.mkv"), PathBuf::from("shows/")]);
        assert_eq!(args.mode, Some(ExtractionMode::PerChannel));
        assert_eq!(args.jobs, Some(4));
        assert_eq!(args.format, Some(TargetFormat::Opus));
        assert!(args.validate().is_ok());
    }

    #[test]
    fn test_validate() {
        let args = Args::default();
        assert!(args.validate().is_err());

        let args = Args {
            inputs: vec![PathBuf::from("a.mkv")],
            bitrate: Some("loud".to_string()),
            ..Default::default()
        };
        assert!(args.validate().is_err());

        let args = Args {
            inputs: vec![PathBuf::from("a.mkv")],
            jobs: Some(usize::MAX),
            ..Default::default()
        };
        assert!(args.validate().is_err());

        let args = Args {
            init_config: Some(PathBuf::from("track-extract.toml")),
            ..Default::default()
        };
        assert!(args.validate().is_ok());
    }

    #[test]
    fn test_apply_overrides() {
        let mut config = ExtractConfig::default();
        let args = Args {
            inputs: vec![PathBuf::from("a.mkv")],
            overwrite: true,
            no_metadata: true,
            jobs: Some(1),
            ..Default::default()
        };

        args.apply(&mut config);

        assert!(config.extraction.overwrite);
        assert!(!config.extraction.preserve_metadata);
        assert_eq!(config.extraction.max_workers, 1);
        assert_eq!(config.extraction.mode, ExtractionMode::WholeTrackOnly);
    }
}
