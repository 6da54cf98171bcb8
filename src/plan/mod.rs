//! Extraction planning
//!
//! - Track/channel task planning from probe results
//! - Deterministic output naming and the existence gate

pub mod output_path;
pub mod planner;

pub use output_path::{check_existing, resolve, SkipReason};
pub use planner::{plan, plan_tracks, ExtractionMode, ExtractionTask, PlanOptions, TaskId};
