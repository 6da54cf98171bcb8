//! Result aggregation
//!
//! Folds `(task, outcome)` pairs into one immutable report per container.
//! Pairs may arrive in any completion order; entries are correlated by task
//! identity and re-sorted by `(track, channel)` before the report is built.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use uuid::Uuid;

use crate::error::ContainerError;
use crate::plan::{ExtractionTask, TaskId};
use crate::strategy::TaskOutcome;

/// One task and its final outcome
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaskReport {
    pub task: ExtractionTask,
    pub outcome: TaskOutcome,
}

/// Outcome counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct OutcomeSummary {
    pub copied: usize,
    pub reencoded: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl OutcomeSummary {
    fn count(&mut self, outcome: &TaskOutcome) {
        match outcome {
            TaskOutcome::SucceededViaCopy { .. } => self.copied += 1,
            TaskOutcome::SucceededViaReencode { .. } => self.reencoded += 1,
            TaskOutcome::Skipped { .. } => self.skipped += 1,
            TaskOutcome::Failed { .. } => self.failed += 1,
        }
    }

    fn add(&mut self, other: &OutcomeSummary) {
        self.copied += other.copied;
        self.reencoded += other.reencoded;
        self.skipped += other.skipped;
        self.failed += other.failed;
    }

    pub fn total(&self) -> usize {
        self.copied + self.reencoded + self.skipped + self.failed
    }

    pub fn succeeded(&self) -> usize {
        self.copied + self.reencoded
    }
}

/// Report for one input container
#[derive(Debug, Clone, Serialize)]
pub struct ExtractionReport {
    pub batch_id: Uuid,
    pub container_path: PathBuf,
    /// Set when the whole container was abandoned; `entries` is then empty
    pub error: Option<ContainerError>,
    pub entries: Vec<TaskReport>,
    /// Output files actually written by this run
    pub created: BTreeSet<PathBuf>,
    pub summary: OutcomeSummary,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl ExtractionReport {
    /// Report for a container abandoned before any task ran
    pub fn container_error(
        batch_id: Uuid,
        container_path: &Path,
        error: ContainerError,
        started_at: DateTime<Utc>,
    ) -> Self {
        Self {
            batch_id,
            container_path: container_path.to_path_buf(),
            error: Some(error),
            entries: Vec::new(),
            created: BTreeSet::new(),
            summary: OutcomeSummary::default(),
            started_at,
            finished_at: Utc::now(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.error.is_none() && self.summary.failed == 0
    }

    pub fn outcome_of(&self, track_index: usize, channel_index: Option<u16>) -> Option<&TaskOutcome> {
        self.entries
            .iter()
            .find(|e| e.task.track_index == track_index && e.task.channel_index == channel_index)
            .map(|e| &e.outcome)
    }
}

/// Build the report of one container from its task results.
///
/// Pairs belonging to other containers are ignored. If a task identity
/// shows up twice the later pair wins.
pub fn aggregate(
    container_path: &Path,
    pairs: Vec<(ExtractionTask, TaskOutcome)>,
    batch_id: Uuid,
    started_at: DateTime<Utc>,
) -> ExtractionReport {
    let mut by_id: BTreeMap<TaskId, TaskReport> = BTreeMap::new();
    for (task, outcome) in pairs {
        if task.container_path != container_path {
            continue;
        }
        by_id.insert(task.id(), TaskReport { task, outcome });
    }

    let mut summary = OutcomeSummary::default();
    let mut created = BTreeSet::new();
    for entry in by_id.values() {
        summary.count(&entry.outcome);
        if let Some(path) = entry.outcome.created_path() {
            created.insert(path.clone());
        }
    }

    // TaskId orders by container, then track, then channel (whole track first)
    let entries: Vec<TaskReport> = by_id.into_values().collect();

    tracing::info!(
        "{:?}: {} copied, {} reencoded, {} skipped, {} failed",
        container_path,
        summary.copied,
        summary.reencoded,
        summary.skipped,
        summary.failed
    );

    ExtractionReport {
        batch_id,
        container_path: container_path.to_path_buf(),
        error: None,
        entries,
        created,
        summary,
        started_at,
        finished_at: Utc::now(),
    }
}

/// Totals across every container of a batch
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BatchSummary {
    pub containers: usize,
    pub container_errors: usize,
    pub outcomes: OutcomeSummary,
}

impl BatchSummary {
    pub fn from_reports(reports: &[ExtractionReport]) -> Self {
        let mut summary = Self {
            containers: reports.len(),
            ..Default::default()
        };
        for report in reports {
            if report.error.is_some() {
                summary.container_errors += 1;
            }
            summary.outcomes.add(&report.summary);
        }
        summary
    }

    pub fn is_success(&self) -> bool {
        self.container_errors == 0 && self.outcomes.failed == 0
    }

    /// Process exit code for a batch with these totals
    pub fn exit_code(&self) -> i32 {
        if self.is_success() {
            0
        } else {
            1
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProbeError;
    use crate::plan::{plan_tracks, ExtractionMode, PlanOptions, SkipReason};
    use crate::tests::fixtures::descriptor;

    fn tasks() -> Vec<ExtractionTask> {
        let opts = PlanOptions {
            mode: ExtractionMode::PerChannel,
            ..Default::default()
        };
        plan_tracks(
            Path::new("/media/r.mkv"),
            Path::new("/out"),
            &[descriptor(0, "aac", 1), descriptor(1, "pcm_s16le", 2)],
            &opts,
        )
    }

    #[test]
    fn test_aggregate_resorts_completion_order() {
        let tasks = tasks();
        let mut pairs: Vec<_> = tasks
            .iter()
            .cloned()
            .map(|t| {
                let path = t.output_path.clone();
                (t, TaskOutcome::SucceededViaCopy { path })
            })
            .collect();
        pairs.reverse();

        let report = aggregate(Path::new("/media/r.mkv"), pairs, Uuid::new_v4(), Utc::now());

        let order: Vec<_> = report
            .entries
            .iter()
            .map(|e| (e.task.track_index, e.task.channel_index))
            .collect();
        assert_eq!(order, vec![(0, None), (1, Some(0)), (1, Some(1))]);
        assert_eq!(report.created.len(), 3);
        assert!(report.is_success());
    }

    #[test]
    fn test_aggregate_counts() {
        let tasks = tasks();
        let outcomes = vec![
            TaskOutcome::Skipped {
                reason: SkipReason::AlreadyExists,
            },
            TaskOutcome::SucceededViaReencode {
                path: tasks[1].output_path.clone(),
                encoder: "pcm_s16le".to_string(),
            },
            TaskOutcome::Failed {
                diagnostic: "boom".to_string(),
            },
        ];
        let pairs = tasks.into_iter().zip(outcomes).collect();

        let report = aggregate(Path::new("/media/r.mkv"), pairs, Uuid::new_v4(), Utc::now());

        assert_eq!(
            report.summary,
            OutcomeSummary {
                copied: 0,
                reencoded: 1,
                skipped: 1,
                failed: 1
            }
        );
        assert_eq!(report.created, BTreeSet::from([PathBuf::from("/out/r.a1.ch0.wav")]));
        assert!(!report.is_success());
        assert!(matches!(report.outcome_of(1, Some(1)), Some(TaskOutcome::Failed { .. })));
    }

    #[test]
    fn test_aggregate_ignores_other_containers() {
        let pairs = tasks()
            .into_iter()
            .map(|t| (t, TaskOutcome::Failed { diagnostic: String::new() }))
            .collect();
        let report = aggregate(Path::new("/media/other.mkv"), pairs, Uuid::new_v4(), Utc::now());
        assert!(report.entries.is_empty());
    }

    #[test]
    fn test_batch_summary() {
        let batch = Uuid::new_v4();
        let ok = aggregate(
            Path::new("/media/r.mkv"),
            tasks()
                .into_iter()
                .map(|t| {
                    let path = t.output_path.clone();
                    (t, TaskOutcome::SucceededViaCopy { path })
                })
                .collect(),
            batch,
            Utc::now(),
        );
        let summary = BatchSummary::from_reports(std::slice::from_ref(&ok));
        assert!(summary.is_success());
        assert_eq!(summary.exit_code(), 0);
        assert_eq!(summary.outcomes.total(), 3);

        let broken = ExtractionReport::container_error(
            batch,
            Path::new("/media/d.mkv"),
            ProbeError::NoAudioStreams.into(),
            Utc::now(),
        );
        let summary = BatchSummary::from_reports(&[ok, broken]);
        assert_eq!(summary.containers, 2);
        assert_eq!(summary.container_errors, 1);
        assert_eq!(summary.exit_code(), 1);
    }

    #[test]
    fn test_report_serializes() {
        let report = ExtractionReport::container_error(
            Uuid::new_v4(),
            Path::new("/media/d.mkv"),
            ProbeError::NoAudioStreams.into(),
            Utc::now(),
        );
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["error"]["kind"], "Probe");
        assert_eq!(json["error"]["detail"]["kind"], "NoAudioStreams");
        assert_eq!(json["summary"]["failed"], 0);
    }
}
