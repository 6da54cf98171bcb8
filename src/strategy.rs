//! Fallback execution strategy
//!
//! Per task: existence gate, then the lossless copy attempt when the codec
//! class permits it, then exactly one reencode attempt if the copy was not
//! permitted or failed. Nothing is retried beyond that sequence.
//!
//! A per-channel PCM copy tries two channel addressing forms (generic, then
//! stream-qualified); both belong to the copy step.

use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;

use crate::engine::{
    ChannelAddressing, ChannelSelector, EngineMode, TranscodeEngine, TranscodeSpec,
};
use crate::plan::{check_existing, ExtractionTask, SkipReason};
use crate::scheduler::TaskExecutor;

/// Final result of one task. Exactly one per planned task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status")]
pub enum TaskOutcome {
    Skipped { reason: SkipReason },
    SucceededViaCopy { path: PathBuf },
    SucceededViaReencode { path: PathBuf, encoder: String },
    Failed { diagnostic: String },
}

impl TaskOutcome {
    pub fn is_success(&self) -> bool {
        matches!(
            self,
            Self::SucceededViaCopy { .. } | Self::SucceededViaReencode { .. }
        )
    }

    /// Path of the file this outcome produced, if any
    pub fn created_path(&self) -> Option<&PathBuf> {
        match self {
            Self::SucceededViaCopy { path } | Self::SucceededViaReencode { path, .. } => Some(path),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AttemptKind {
    Copy,
    Reencode,
}

/// Progress of one attempt kind
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub enum AttemptState {
    #[default]
    NotTried,
    /// Invoked without success
    Attempted,
    /// Invoked and succeeded
    Done,
}

/// One engine invocation made on behalf of a task
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AttemptRecord {
    pub kind: AttemptKind,
    pub addressing: Option<ChannelAddressing>,
    pub succeeded: bool,
    pub diagnostic: String,
}

/// Fallback state machine of one task
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FallbackProgress {
    pub copy: AttemptState,
    pub reencode: AttemptState,
    pub attempts: Vec<AttemptRecord>,
}

impl FallbackProgress {
    fn record(
        &mut self,
        kind: AttemptKind,
        addressing: Option<ChannelAddressing>,
        result: &Result<(), String>,
    ) {
        let state = match result {
            Ok(()) => AttemptState::Done,
            Err(_) => AttemptState::Attempted,
        };
        match kind {
            AttemptKind::Copy => self.copy = state,
            AttemptKind::Reencode => self.reencode = state,
        }
        self.attempts.push(AttemptRecord {
            kind,
            addressing,
            succeeded: result.is_ok(),
            diagnostic: result.as_ref().err().cloned().unwrap_or_default(),
        });
    }
}

/// Copy-then-reencode strategy over a Transcode Engine
pub struct FallbackStrategy {
    engine: Arc<dyn TranscodeEngine>,
}

impl FallbackStrategy {
    pub fn new(engine: Arc<dyn TranscodeEngine>) -> Self {
        Self { engine }
    }

    /// Run the fallback sequence for one task
    pub fn execute(&self, task: &ExtractionTask) -> TaskOutcome {
        self.execute_traced(task).0
    }

    /// Run the fallback sequence and return the state machine alongside the outcome
    pub fn execute_traced(&self, task: &ExtractionTask) -> (TaskOutcome, FallbackProgress) {
        let mut progress = FallbackProgress::default();

        if let Some(reason) = check_existing(&task.output_path, task.overwrite) {
            tracing::debug!("Skipping {:?}: {:?}", task.output_path, reason);
            return (TaskOutcome::Skipped { reason }, progress);
        }

        if task.copy_permitted {
            match self.attempt_copy(task, &mut progress) {
                Ok(()) => {
                    return (
                        TaskOutcome::SucceededViaCopy {
                            path: task.output_path.clone(),
                        },
                        progress,
                    )
                }
                Err(diagnostic) => {
                    tracing::warn!(
                        "Copy failed for {:?} track {} channel {:?}, reencoding: {}",
                        task.container_path,
                        task.track_index,
                        task.channel_index,
                        diagnostic
                    );
                }
            }
        }

        let outcome = match self.attempt_reencode(task, &mut progress) {
            Ok(()) => TaskOutcome::SucceededViaReencode {
                path: task.output_path.clone(),
                encoder: task.encoder.encoder.to_string(),
            },
            Err(diagnostic) => {
                tracing::warn!(
                    "Reencode failed for {:?} track {} channel {:?}: {}",
                    task.container_path,
                    task.track_index,
                    task.channel_index,
                    diagnostic
                );
                TaskOutcome::Failed { diagnostic }
            }
        };
        (outcome, progress)
    }

    /// Lossless copy step; per-channel tasks try both addressing forms
    fn attempt_copy(
        &self,
        task: &ExtractionTask,
        progress: &mut FallbackProgress,
    ) -> Result<(), String> {
        let forms: &[Option<ChannelAddressing>] = if task.is_per_channel() {
            &[
                Some(ChannelAddressing::Generic),
                Some(ChannelAddressing::StreamQualified),
            ]
        } else {
            &[None]
        };

        let mut diagnostic = String::new();
        for &addressing in forms {
            let spec = self.spec(task, addressing, EngineMode::Copy);
            let result = self.invoke(task, &spec);
            progress.record(AttemptKind::Copy, addressing, &result);
            match result {
                Ok(()) => return Ok(()),
                Err(d) => diagnostic = d,
            }
        }
        Err(diagnostic)
    }

    /// Reencode step, run at most once per task
    fn attempt_reencode(
        &self,
        task: &ExtractionTask,
        progress: &mut FallbackProgress,
    ) -> Result<(), String> {
        let addressing = task.channel_index.map(|_| ChannelAddressing::Generic);
        let spec = self.spec(task, addressing, EngineMode::Reencode(task.encoder.clone()));
        let result = self.invoke(task, &spec);
        progress.record(AttemptKind::Reencode, addressing, &result);
        result
    }

    fn spec(
        &self,
        task: &ExtractionTask,
        addressing: Option<ChannelAddressing>,
        mode: EngineMode,
    ) -> TranscodeSpec {
        TranscodeSpec {
            input_path: task.container_path.clone(),
            track: task.track_index,
            channel: task.channel_index.zip(addressing).map(|(channel, addressing)| {
                ChannelSelector {
                    channel,
                    addressing,
                }
            }),
            mode,
            source_codec: task.source_codec.clone(),
            preserve_metadata: task.preserve_metadata,
            overwrite: task.overwrite,
            output_path: task.output_path.clone(),
        }
    }

    fn invoke(&self, task: &ExtractionTask, spec: &TranscodeSpec) -> Result<(), String> {
        tracing::debug!(
            "{} attempt via {}: {:?} -> {:?}",
            if spec.is_copy() { "copy" } else { "reencode" },
            self.engine.name(),
            spec.input_path,
            spec.output_path
        );
        let existed_before = spec.output_path.exists();
        let output = self.engine.run(spec);
        if output.success {
            Ok(())
        } else {
            if !existed_before {
                discard_partial(task);
            }
            Err(output.diagnostic)
        }
    }
}

/// Remove whatever a failed attempt left behind so the next attempt does
/// not trip over it. Only called when the output did not exist before the
/// attempt started; a file already there belongs to someone else.
fn discard_partial(task: &ExtractionTask) {
    if task.overwrite {
        return;
    }
    match std::fs::remove_file(&task.output_path) {
        Ok(()) => tracing::debug!("Removed partial output {:?}", task.output_path),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => tracing::warn!(
            "Failed to remove partial output {:?}: {}",
            task.output_path,
            e
        ),
    }
}

impl TaskExecutor for FallbackStrategy {
    fn execute(&self, task: &ExtractionTask) -> TaskOutcome {
        FallbackStrategy::execute(self, task)
    }
}
