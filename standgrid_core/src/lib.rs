//! StandGrid Core - Contiguity-Constrained Clustering of Stand Grids
//!
//! Reduces a sparse grid of land units ("stands"), each carrying named
//! condition scores, to a requested number of spatially contiguous,
//! internally homogeneous clusters:
//! 1. **Grid**: sparse stand table + fixed 4-neighbour adjacency
//! 2. **Features**: mean-centred, weight-normalized conditions + spatial bias
//! 3. **Engine**: greedy minimum-distance merging of adjacent clusters
//! 4. **Partition**: deterministic cluster ids and member order
//!
//! The whole pass is a deterministic function of its inputs.

pub mod clustering;
pub mod config;
pub mod engine;
pub mod error;
pub mod features;
pub mod grid;
pub mod partition;
pub mod validation;

// Re-export key types for convenience
pub use clustering::{cluster_stands, ClusterOutcome};
pub use config::ClusterConfig;
pub use engine::{MergeEngine, MergeEvent};
pub use error::ClusterError;
pub use features::{ConditionStats, FeatureNormalizer, FeatureVector};
pub use grid::{ConditionScores, GridIndex, NestedScores, StandCoord, StandGrid};
pub use partition::Partition;
pub use validation::{ClusterStats, PartitionStats};
