//! Track/channel planner - turns probe results into extraction tasks

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::output_path::{container_base_name, resolve};
use crate::codec::{CodecClass, CodecFamily, EncoderChoice, TargetFormat};
use crate::error::ProbeError;
use crate::probe::{AudioTrackDescriptor, ProbeService};

/// What to extract from each track
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum,
)]
pub enum ExtractionMode {
    /// One output per track
    #[default]
    #[serde(rename = "whole")]
    #[value(name = "whole")]
    WholeTrackOnly,
    /// One output per channel of every multi-channel track
    #[serde(rename = "per-channel")]
    #[value(name = "per-channel")]
    PerChannel,
}

/// Planning options shared by every container of a batch
#[derive(Debug, Clone, Default)]
pub struct PlanOptions {
    pub mode: ExtractionMode,
    pub overwrite: bool,
    pub preserve_metadata: bool,
    /// Force every task to be reencoded into this format
    pub target_format: Option<TargetFormat>,
    /// Bitrate override for lossy target formats
    pub bitrate: Option<String>,
}

/// Stable identity of a task, used to correlate results with tasks
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct TaskId {
    pub container_path: PathBuf,
    pub track_index: usize,
    pub channel_index: Option<u16>,
}

/// Unit of work: one track, or one channel of one track
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExtractionTask {
    pub container_path: PathBuf,
    pub track_index: usize,
    /// `None` means the whole track
    pub channel_index: Option<u16>,
    pub source_codec: String,
    pub codec_class: CodecClass,
    pub desired_extension: String,
    pub output_path: PathBuf,
    pub overwrite: bool,
    pub preserve_metadata: bool,
    /// Whether a lossless copy attempt precedes the reencode
    pub copy_permitted: bool,
    /// Encoder used by the reencode attempt
    pub encoder: EncoderChoice,
}

impl ExtractionTask {
    pub fn id(&self) -> TaskId {
        TaskId {
            container_path: self.container_path.clone(),
            track_index: self.track_index,
            channel_index: self.channel_index,
        }
    }

    pub fn is_per_channel(&self) -> bool {
        self.channel_index.is_some()
    }
}

/// Plan the extraction tasks of one container.
///
/// The Probe Service is called exactly once. A container without audio
/// tracks is an error; no tasks are produced for it.
pub fn plan(
    probe: &dyn ProbeService,
    container_path: &Path,
    output_dir: &Path,
    options: &PlanOptions,
) -> Result<Vec<ExtractionTask>, ProbeError> {
    let tracks = probe.probe(container_path)?;
    if tracks.is_empty() {
        return Err(ProbeError::NoAudioStreams);
    }

    let tasks = plan_tracks(container_path, output_dir, &tracks, options);
    tracing::info!(
        "Planned {} task(s) for {:?} ({} track(s), mode={:?})",
        tasks.len(),
        container_path,
        tracks.len(),
        options.mode
    );
    Ok(tasks)
}

/// Build tasks from already-probed descriptors, ordered by
/// `(track_index, channel_index)`.
pub fn plan_tracks(
    container_path: &Path,
    output_dir: &Path,
    tracks: &[AudioTrackDescriptor],
    options: &PlanOptions,
) -> Vec<ExtractionTask> {
    let base = container_base_name(container_path);
    let mut ordered: Vec<&AudioTrackDescriptor> = tracks.iter().collect();
    ordered.sort_by_key(|t| t.index);

    let mut tasks = Vec::new();
    for track in ordered {
        let family = CodecFamily::from_codec_name(&track.codec_name);
        let split = options.mode == ExtractionMode::PerChannel && track.channel_count > 1;

        let (extension, encoder, forced) = match options.target_format {
            Some(TargetFormat::Wav) if family == CodecFamily::Pcm => (
                TargetFormat::Wav.container(),
                family.encoder_for(&track.codec_name),
                true,
            ),
            Some(target) => (
                target.container(),
                target.encoder(options.bitrate.as_deref()),
                true,
            ),
            None => (
                family.container(),
                family.encoder_for(&track.codec_name),
                false,
            ),
        };

        let make_task = |channel_index: Option<u16>, copy_permitted: bool| ExtractionTask {
            container_path: container_path.to_path_buf(),
            track_index: track.index,
            channel_index,
            source_codec: track.codec_name.clone(),
            codec_class: family.class(),
            desired_extension: extension.to_string(),
            output_path: resolve(&base, output_dir, track.index, channel_index, extension),
            overwrite: options.overwrite,
            preserve_metadata: options.preserve_metadata,
            copy_permitted,
            encoder: encoder.clone(),
        };

        if !split {
            tasks.push(make_task(None, !forced));
            continue;
        }

        // Compressed channels cannot be isolated without reencoding
        let copy_permitted = !forced && family.class() == CodecClass::Pcm;
        for ch in 0..track.channel_count {
            tasks.push(make_task(Some(ch), copy_permitted));
        }
    }

    tasks
}
