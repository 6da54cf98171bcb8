use std::path::PathBuf;

use serde::Serialize;
use thiserror::Error;

/// Main error type for the extractor
#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Report serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Probe Service errors. Fatal for planning one container only.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "detail")]
pub enum ProbeError {
    #[error("No audio streams found")]
    NoAudioStreams,

    #[error("Probe tool unavailable: {0}")]
    ProbeToolUnavailable(String),

    #[error("Failed to read container: {0}")]
    Unreadable(String),

    #[error("Invalid probe output: {0}")]
    InvalidOutput(String),
}

/// Container-level errors. Each one abandons a single container's batch.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "detail")]
pub enum ContainerError {
    #[error("Probe failed: {0}")]
    Probe(ProbeError),

    #[error("Cannot create output directory {path:?}: {message}")]
    DirectoryCreate { path: PathBuf, message: String },
}

impl From<ProbeError> for ContainerError {
    fn from(e: ProbeError) -> Self {
        Self::Probe(e)
    }
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, ExtractError>;
