//! Error types for StandGrid clustering.

use thiserror::Error;

/// Errors that can occur while configuring or running a clustering pass.
///
/// Every variant except `InvalidPartition` is raised before any cluster
/// state is built, so a failed run never yields a partial partition.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ClusterError {
    /// Target cluster count is zero or exceeds the number of present stands
    #[error("Invalid target cluster count {requested} for {stands} present stands")]
    InvalidTarget { requested: usize, stands: usize },

    /// A numeric parameter or raw score is out of its allowed domain
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// The grid holds no stands at all
    #[error("Grid contains no stands")]
    EmptyGrid,

    /// The adjacency graph splits into more components than the target allows
    #[error("Target of {requested} clusters is unreachable: grid has {reachable} disconnected components")]
    UnreachableTarget { requested: usize, reachable: usize },

    /// A partition failed the coverage or contiguity checks
    #[error("Invalid partition: {0}")]
    InvalidPartition(String),
}

impl ClusterError {
    /// Creates an invalid-parameter error.
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidParameter(msg.into())
    }

    /// Creates an invalid-partition error.
    pub fn partition(msg: impl Into<String>) -> Self {
        Self::InvalidPartition(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = ClusterError::UnreachableTarget { requested: 2, reachable: 3 };
        assert_eq!(
            err.to_string(),
            "Target of 2 clusters is unreachable: grid has 3 disconnected components"
        );

        let err = ClusterError::invalid("pixel_index_weight must be non-negative");
        assert_eq!(err.to_string(), "Invalid parameter: pixel_index_weight must be non-negative");
    }
}
