//! Error types for the StandGrid harness.

use standgrid_core::ClusterError;
use thiserror::Error;

/// Errors surfaced by the command-line harness.
#[derive(Debug, Error)]
pub enum SimError {
    /// The clustering core rejected the run
    #[error("Clustering failed: {0}")]
    Cluster(#[from] ClusterError),

    /// Reading a request or writing an export failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Request or export (de)serialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A command-line argument could not be interpreted
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

impl SimError {
    /// Creates an invalid-argument error.
    pub fn argument(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }
}
