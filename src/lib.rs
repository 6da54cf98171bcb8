//! Concurrent audio track extraction
//!
//! Plans one extraction task per audio track (or per channel), runs the
//! tasks through a bounded worker pool with a copy-then-reencode fallback,
//! and reports every task's outcome per input container.

pub mod batch;
pub mod cli;
pub mod codec;
pub mod config;
pub mod config_file;
pub mod discover;
pub mod engine;
pub mod error;
pub mod plan;
pub mod probe;
pub mod report;
pub mod scheduler;
pub mod strategy;

#[cfg(test)]
pub(crate) mod tests;

pub use batch::run_extraction;
pub use error::{ContainerError, ExtractError, ProbeError, Result};
pub use report::{BatchSummary, ExtractionReport};
