//! Test fixtures
//!
//! In-memory Probe Service and Transcode Engine doubles, so the planner,
//! strategy and scheduler can be exercised without real media files or an
//! ffmpeg install.

use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use crate::engine::{ChannelAddressing, EngineOutput, TranscodeEngine, TranscodeSpec};
use crate::error::ProbeError;
use crate::plan::{plan_tracks, ExtractionTask, PlanOptions};
use crate::probe::{AudioTrackDescriptor, ProbeService};
use crate::scheduler::TaskExecutor;
use crate::strategy::TaskOutcome;

/// Audio track descriptor with no layout or language
pub fn descriptor(index: usize, codec: &str, channels: u16) -> AudioTrackDescriptor {
    AudioTrackDescriptor {
        index,
        codec_name: codec.to_string(),
        channel_count: channels,
        channel_layout: None,
        language_tag: None,
    }
}

/// `count` whole-track AAC tasks of one container
pub fn sample_tasks(count: usize) -> Vec<ExtractionTask> {
    let tracks: Vec<_> = (0..count).map(|i| descriptor(i, "aac", 2)).collect();
    plan_tracks(
        Path::new("/media/sample.mkv"),
        Path::new("/out"),
        &tracks,
        &PlanOptions::default(),
    )
}

/// Probe Service answering from a fixed table
#[derive(Default)]
pub struct MockProbe {
    answers: HashMap<PathBuf, Result<Vec<AudioTrackDescriptor>, ProbeError>>,
    calls: Mutex<Vec<PathBuf>>,
}

impl MockProbe {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tracks(mut self, path: impl Into<PathBuf>, tracks: Vec<AudioTrackDescriptor>) -> Self {
        self.answers.insert(path.into(), Ok(tracks));
        self
    }

    pub fn with_error(mut self, path: impl Into<PathBuf>, error: ProbeError) -> Self {
        self.answers.insert(path.into(), Err(error));
        self
    }

    /// Number of times `path` was probed
    pub fn probe_count(&self, path: &Path) -> usize {
        self.calls.lock().iter().filter(|p| p.as_path() == path).count()
    }
}

impl ProbeService for MockProbe {
    fn name(&self) -> &'static str {
        "mock"
    }

    fn probe(&self, path: &Path) -> Result<Vec<AudioTrackDescriptor>, ProbeError> {
        self.calls.lock().push(path.to_path_buf());
        self.answers
            .get(path)
            .cloned()
            .unwrap_or_else(|| Err(ProbeError::Unreadable(format!("{}: No such file", path.display()))))
    }
}

/// Transcode Engine with scripted failures.
///
/// Successful calls write a small file at the output path. Like the real
/// engine without overwrite, a call whose output already exists fails.
#[derive(Default)]
pub struct ScriptedEngine {
    fail_copy: bool,
    fail_generic_channel: bool,
    reencode_failure: Option<String>,
    failing_tracks: HashSet<usize>,
    leave_partial: bool,
    delay: Option<Duration>,
    calls: Mutex<Vec<TranscodeSpec>>,
}

impl ScriptedEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every copy attempt fails
    pub fn fail_copy(mut self) -> Self {
        self.fail_copy = true;
        self
    }

    /// Copy attempts using generic channel addressing fail
    pub fn fail_generic_channel(mut self) -> Self {
        self.fail_generic_channel = true;
        self
    }

    /// Every reencode attempt fails with `diagnostic`
    pub fn fail_reencode_with(mut self, diagnostic: &str) -> Self {
        self.reencode_failure = Some(diagnostic.to_string());
        self
    }

    /// Every attempt on this track index fails
    pub fn fail_track(mut self, track: usize) -> Self {
        self.failing_tracks.insert(track);
        self
    }

    /// Failed attempts leave a truncated file behind
    pub fn leave_partial_output(mut self) -> Self {
        self.leave_partial = true;
        self
    }

    /// Every call takes this long before touching the output
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> Vec<TranscodeSpec> {
        self.calls.lock().clone()
    }

    fn scripted_failure(&self, spec: &TranscodeSpec) -> Option<String> {
        if self.failing_tracks.contains(&spec.track) {
            return Some(format!("Stream #0:a:{} decode error", spec.track));
        }
        if spec.is_copy() {
            let generic = spec
                .channel
                .map(|c| c.addressing == ChannelAddressing::Generic)
                .unwrap_or(false);
            if self.fail_copy || (self.fail_generic_channel && generic) {
                return Some("Filtering and streamcopy cannot be used together.".to_string());
            }
            return None;
        }
        self.reencode_failure.clone()
    }
}

impl TranscodeEngine for ScriptedEngine {
    fn name(&self) -> &'static str {
        "scripted"
    }

    fn run(&self, spec: &TranscodeSpec) -> EngineOutput {
        self.calls.lock().push(spec.clone());
        if let Some(delay) = self.delay {
            std::thread::sleep(delay);
        }

        if !spec.overwrite && spec.output_path.exists() {
            return EngineOutput::failed(format!(
                "File '{}' already exists. Exiting.",
                spec.output_path.display()
            ));
        }

        if let Some(diagnostic) = self.scripted_failure(spec) {
            if self.leave_partial {
                let _ = std::fs::write(&spec.output_path, b"partial");
            }
            return EngineOutput::failed(diagnostic);
        }

        match std::fs::write(&spec.output_path, b"audio") {
            Ok(()) => EngineOutput::ok(),
            Err(e) => EngineOutput::failed(e.to_string()),
        }
    }
}

/// Task executor recording execution order and peak concurrency
#[derive(Default)]
pub struct RecordingExecutor {
    delay: Option<Duration>,
    panic_track: Option<usize>,
    executed: Mutex<Vec<ExtractionTask>>,
    active: AtomicUsize,
    peak: AtomicUsize,
}

impl RecordingExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn panic_on_track(mut self, track: usize) -> Self {
        self.panic_track = Some(track);
        self
    }

    /// Tasks in the order they started executing
    pub fn executed(&self) -> Vec<ExtractionTask> {
        self.executed.lock().clone()
    }

    pub fn max_concurrency(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }
}

impl TaskExecutor for RecordingExecutor {
    fn execute(&self, task: &ExtractionTask) -> TaskOutcome {
        let active = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(active, Ordering::SeqCst);
        self.executed.lock().push(task.clone());

        if let Some(delay) = self.delay {
            std::thread::sleep(delay);
        }
        self.active.fetch_sub(1, Ordering::SeqCst);

        if self.panic_track == Some(task.track_index) {
            panic!("scripted panic on track {}", task.track_index);
        }
        TaskOutcome::SucceededViaCopy {
            path: task.output_path.clone(),
        }
    }
}
