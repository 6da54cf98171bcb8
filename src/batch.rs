//! Batch entry point
//!
//! Plans every container, runs all planned tasks through one shared worker
//! pool and folds the results back into one report per container. A
//! container that cannot be planned (output directory or probe failure)
//! gets an error report; its siblings are unaffected.

use chrono::Utc;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use uuid::Uuid;

use crate::engine::TranscodeEngine;
use crate::error::{ContainerError, ProbeError};
use crate::plan::{self, ExtractionTask, PlanOptions};
use crate::probe::ProbeService;
use crate::report::{aggregate, BatchSummary, ExtractionReport};
use crate::scheduler::run_all;
use crate::strategy::{FallbackStrategy, TaskOutcome};

/// Directory a container's outputs go to
pub fn output_dir_for(container_path: &Path, output_dir: Option<&Path>) -> PathBuf {
    match output_dir {
        Some(dir) => dir.to_path_buf(),
        None => match container_path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        },
    }
}

enum Planned {
    Tasks(PathBuf),
    Abandoned(ExtractionReport),
}

/// Extract the audio of every container.
///
/// `output_dir` of `None` writes each container's outputs next to it.
/// Returns one report per distinct container, in input order.
pub async fn run_extraction(
    containers: &[PathBuf],
    output_dir: Option<&Path>,
    options: &PlanOptions,
    max_workers: usize,
    probe: Arc<dyn ProbeService>,
    engine: Arc<dyn TranscodeEngine>,
) -> Vec<ExtractionReport> {
    let batch_id = Uuid::new_v4();
    let started_at = Utc::now();
    tracing::info!(
        "Batch {} started: {} container(s), probe={}, engine={}",
        batch_id,
        containers.len(),
        probe.name(),
        engine.name()
    );

    let mut seen = HashSet::new();
    let mut claimed: HashMap<PathBuf, PathBuf> = HashMap::new();
    let mut planned = Vec::with_capacity(containers.len());
    let mut runnable: Vec<ExtractionTask> = Vec::new();
    let mut decided: Vec<(ExtractionTask, TaskOutcome)> = Vec::new();

    for container in containers {
        // Two spellings of one file must not both run
        if !seen.insert(normalized(container).await) {
            tracing::warn!("Ignoring duplicate input {:?}", container);
            continue;
        }

        let out_dir = output_dir_for(container, output_dir);
        if let Err(e) = tokio::fs::create_dir_all(&out_dir).await {
            tracing::error!("Cannot create output directory {:?}: {}", out_dir, e);
            let error = ContainerError::DirectoryCreate {
                path: out_dir,
                message: e.to_string(),
            };
            planned.push(Planned::Abandoned(ExtractionReport::container_error(
                batch_id, container, error, started_at,
            )));
            continue;
        }
        // Output paths double as collision keys, so build them on the
        // resolved directory
        let out_dir = normalized(&out_dir).await;

        let tasks = match plan_container(&probe, container, &out_dir, options).await {
            Ok(tasks) => tasks,
            Err(e) => {
                tracing::error!("Cannot plan {:?}: {}", container, e);
                planned.push(Planned::Abandoned(ExtractionReport::container_error(
                    batch_id,
                    container,
                    e.into(),
                    started_at,
                )));
                continue;
            }
        };

        for task in tasks {
            match claimed.get(&task.output_path) {
                Some(owner) => {
                    let diagnostic = format!(
                        "output path {} is already targeted by {}",
                        task.output_path.display(),
                        owner.display()
                    );
                    tracing::warn!("{}", diagnostic);
                    decided.push((task, TaskOutcome::Failed { diagnostic }));
                }
                None => {
                    claimed.insert(task.output_path.clone(), container.clone());
                    runnable.push(task);
                }
            }
        }
        planned.push(Planned::Tasks(container.clone()));
    }

    let executor = Arc::new(FallbackStrategy::new(engine));
    let mut results = run_all(runnable, max_workers, executor).await;
    results.extend(decided);

    let mut by_container: HashMap<PathBuf, Vec<(ExtractionTask, TaskOutcome)>> = HashMap::new();
    for (task, outcome) in results {
        by_container
            .entry(task.container_path.clone())
            .or_default()
            .push((task, outcome));
    }

    let reports: Vec<ExtractionReport> = planned
        .into_iter()
        .map(|slot| match slot {
            Planned::Abandoned(report) => report,
            Planned::Tasks(container) => {
                let pairs = by_container.remove(&container).unwrap_or_default();
                aggregate(&container, pairs, batch_id, started_at)
            }
        })
        .collect();

    let summary = BatchSummary::from_reports(&reports);
    tracing::info!(
        "Batch {} finished: {} copied, {} reencoded, {} skipped, {} failed, {} container error(s)",
        batch_id,
        summary.outcomes.copied,
        summary.outcomes.reencoded,
        summary.outcomes.skipped,
        summary.outcomes.failed,
        summary.container_errors
    );
    reports
}

/// Canonical form of an existing path, or the path as given
async fn normalized(path: &Path) -> PathBuf {
    tokio::fs::canonicalize(path)
        .await
        .unwrap_or_else(|_| path.to_path_buf())
}

/// Probe and plan one container on the blocking pool
async fn plan_container(
    probe: &Arc<dyn ProbeService>,
    container: &Path,
    out_dir: &Path,
    options: &PlanOptions,
) -> Result<Vec<ExtractionTask>, ProbeError> {
    let probe = Arc::clone(probe);
    let container = container.to_path_buf();
    let out_dir = out_dir.to_path_buf();
    let options = options.clone();

    tokio::task::spawn_blocking(move || plan::plan(probe.as_ref(), &container, &out_dir, &options))
        .await
        .map_err(|e| ProbeError::Unreadable(format!("probe worker failed: {}", e)))?
}
