//! Probe Service
//!
//! Turns a container path into an ordered list of audio track descriptors.
//! Containers are probed fresh on every planning call; nothing is cached.

pub mod ffprobe;
#[cfg(feature = "libav")]
pub mod libav;

use serde::Serialize;
use std::path::Path;

use crate::error::ProbeError;

pub use ffprobe::FfprobeProbe;
#[cfg(feature = "libav")]
pub use libav::LibavProbe;

/// One audio track as reported by the Probe Service
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AudioTrackDescriptor {
    /// 0-based ordinal among the container's audio tracks
    pub index: usize,
    pub codec_name: String,
    pub channel_count: u16,
    pub channel_layout: Option<String>,
    pub language_tag: Option<String>,
}

/// Anything that can list the audio tracks of a container
pub trait ProbeService: Send + Sync {
    /// Name of the prober (for logging)
    fn name(&self) -> &'static str;

    /// Probe a container. An empty list is a valid answer; the planner
    /// decides what an empty container means.
    fn probe(&self, path: &Path) -> Result<Vec<AudioTrackDescriptor>, ProbeError>;
}
