//! ffprobe-backed Probe Service

use serde::Deserialize;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::process::Command;

use super::{AudioTrackDescriptor, ProbeService};
use crate::engine::stderr_tail;
use crate::error::ProbeError;

/// Probes containers by running the `ffprobe` binary
#[derive(Debug, Clone)]
pub struct FfprobeProbe {
    program: PathBuf,
}

#[derive(Debug, Deserialize)]
struct ProbeOutput {
    #[serde(default)]
    streams: Vec<ProbeStream>,
}

#[derive(Debug, Deserialize)]
struct ProbeStream {
    codec_name: Option<String>,
    channels: Option<u16>,
    channel_layout: Option<String>,
    #[serde(default)]
    tags: ProbeTags,
}

#[derive(Debug, Default, Deserialize)]
struct ProbeTags {
    language: Option<String>,
}

impl FfprobeProbe {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    fn args(path: &Path) -> Vec<std::ffi::OsString> {
        let mut args: Vec<std::ffi::OsString> = [
            "-v",
            "error",
            "-select_streams",
            "a",
            "-show_entries",
            "stream=index,codec_name,channels,channel_layout:stream_tags=language",
            "-of",
            "json",
        ]
        .iter()
        .map(|a| std::ffi::OsString::from(*a))
        .collect();
        args.push(path.as_os_str().to_owned());
        args
    }

    /// Parse ffprobe JSON output into descriptors, numbering audio tracks
    /// in the order ffprobe lists them.
    pub fn parse(stdout: &[u8]) -> Result<Vec<AudioTrackDescriptor>, ProbeError> {
        let output: ProbeOutput = serde_json::from_slice(stdout)
            .map_err(|e| ProbeError::InvalidOutput(e.to_string()))?;

        Ok(output
            .streams
            .into_iter()
            .enumerate()
            .map(|(index, s)| AudioTrackDescriptor {
                index,
                codec_name: s.codec_name.unwrap_or_default(),
                channel_count: s.channels.unwrap_or(0),
                channel_layout: s.channel_layout.filter(|l| !l.is_empty()),
                language_tag: s.tags.language.filter(|l| !l.is_empty() && l != "und"),
            })
            .collect())
    }
}

impl Default for FfprobeProbe {
    fn default() -> Self {
        Self::new("ffprobe")
    }
}

impl ProbeService for FfprobeProbe {
    fn name(&self) -> &'static str {
        "ffprobe"
    }

    fn probe(&self, path: &Path) -> Result<Vec<AudioTrackDescriptor>, ProbeError> {
        let output = Command::new(&self.program)
            .args(Self::args(path))
            .output()
            .map_err(|e| match e.kind() {
                ErrorKind::NotFound | ErrorKind::PermissionDenied => {
                    ProbeError::ProbeToolUnavailable(format!("{}: {}", self.program.display(), e))
                }
                _ => ProbeError::Unreadable(e.to_string()),
            })?;

        if !output.status.success() {
            return Err(ProbeError::Unreadable(stderr_tail(&output.stderr)));
        }

        let tracks = Self::parse(&output.stdout)?;
        tracing::debug!("Probed {:?}: {} audio track(s)", path, tracks.len());
        Ok(tracks)
    }
}
