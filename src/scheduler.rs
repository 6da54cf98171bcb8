//! Concurrency scheduler - bounded worker pool over independent tasks
//!
//! Every task runs on the blocking pool (its only suspension point is the
//! wait on the external engine process). A semaphore owned by the scheduler
//! bounds how many run at once. A failing or panicking task never affects
//! the others, and `run_all` waits for every submitted task.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::Semaphore;

use crate::plan::ExtractionTask;
use crate::strategy::TaskOutcome;

/// Executes one task to completion, turning every failure into an outcome
pub trait TaskExecutor: Send + Sync {
    fn execute(&self, task: &ExtractionTask) -> TaskOutcome;
}

/// Largest worker count the pool accepts
pub const MAX_WORKERS: usize = Semaphore::MAX_PERMITS;

/// Worker count to use: `0` means the host's available parallelism.
/// Larger requests are capped at [`MAX_WORKERS`].
pub fn resolve_worker_count(max_workers: usize) -> usize {
    if max_workers > 0 {
        return max_workers.min(MAX_WORKERS);
    }
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

/// Run every task and return each with its outcome.
///
/// Pairs come back in submission order, but tasks may finish in any order;
/// with one worker they also execute in submission order.
pub async fn run_all(
    tasks: Vec<ExtractionTask>,
    max_workers: usize,
    executor: Arc<dyn TaskExecutor>,
) -> Vec<(ExtractionTask, TaskOutcome)> {
    let workers = resolve_worker_count(max_workers);
    let total = tasks.len();
    tracing::info!("Running {} task(s) with {} worker(s)", total, workers);

    let semaphore = Arc::new(Semaphore::new(workers));
    let finished = Arc::new(AtomicUsize::new(0));
    let mut handles = Vec::with_capacity(total);

    for task in tasks {
        // Waiting here keeps the queue in the scheduler: a task is only
        // handed to the blocking pool once a worker slot is free.
        let permit = Arc::clone(&semaphore).acquire_owned().await.ok();
        let executor = Arc::clone(&executor);
        let finished = Arc::clone(&finished);
        let job = task.clone();

        let handle = tokio::task::spawn_blocking(move || {
            let _permit = permit;
            let outcome = executor.execute(&job);
            let done = finished.fetch_add(1, Ordering::Relaxed) + 1;
            tracing::info!(
                "[{}/{}] {:?} -> {}",
                done,
                total,
                job.output_path,
                outcome_label(&outcome)
            );
            outcome
        });
        handles.push((task, handle));
    }

    let mut results = Vec::with_capacity(total);
    for (task, handle) in handles {
        let outcome = match handle.await {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::error!("Worker for {:?} did not finish: {}", task.output_path, e);
                TaskOutcome::Failed {
                    diagnostic: format!("worker panicked: {}", e),
                }
            }
        };
        results.push((task, outcome));
    }
    results
}

fn outcome_label(outcome: &TaskOutcome) -> &'static str {
    match outcome {
        TaskOutcome::Skipped { .. } => "skipped",
        TaskOutcome::SucceededViaCopy { .. } => "copied",
        TaskOutcome::SucceededViaReencode { .. } => "reencoded",
        TaskOutcome::Failed { .. } => "failed",
    }
}
