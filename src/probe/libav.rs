//! In-process Probe Service backed by the FFmpeg libraries

use ffmpeg_next as ffmpeg;
use std::path::Path;

use super::{AudioTrackDescriptor, ProbeService};
use crate::error::ProbeError;

/// Reads audio stream parameters without spawning ffprobe
#[derive(Debug, Default, Clone, Copy)]
pub struct LibavProbe;

impl LibavProbe {
    pub fn new() -> Result<Self, ProbeError> {
        ffmpeg::init().map_err(|e| {
            ProbeError::ProbeToolUnavailable(format!("ffmpeg::init() failed: {}", e))
        })?;
        Ok(Self)
    }
}

/// Extract language from stream metadata
fn stream_language(stream: &ffmpeg::Stream) -> Option<String> {
    stream
        .metadata()
        .get("language")
        .filter(|l| !l.is_empty() && *l != "und")
        .map(|s| s.to_string())
}

fn codec_name(codec_id: ffmpeg::codec::Id) -> String {
    ffmpeg::codec::decoder::find(codec_id)
        .map(|c| c.name().to_string())
        .unwrap_or_else(|| format!("{:?}", codec_id).to_ascii_lowercase())
}

impl ProbeService for LibavProbe {
    fn name(&self) -> &'static str {
        "libav"
    }

    fn probe(&self, path: &Path) -> Result<Vec<AudioTrackDescriptor>, ProbeError> {
        let context = ffmpeg::format::input(&path)
            .map_err(|e| ProbeError::Unreadable(format!("Failed to open {:?}: {}", path, e)))?;

        let mut tracks = Vec::new();
        for stream in context.streams() {
            if stream.parameters().medium() != ffmpeg::media::Type::Audio {
                continue;
            }

            let codec_id = stream.parameters().id();
            let channels = unsafe {
                let params_ptr = stream.parameters().as_ptr();
                (*params_ptr).ch_layout.nb_channels as u16
            };

            tracks.push(AudioTrackDescriptor {
                index: tracks.len(),
                codec_name: codec_name(codec_id),
                channel_count: channels,
                channel_layout: None,
                language_tag: stream_language(&stream),
            });
        }

        tracing::debug!("Probed {:?} in-process: {} audio track(s)", path, tracks.len());
        Ok(tracks)
    }
}
