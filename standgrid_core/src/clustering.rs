//! End-to-end clustering pass: validate, index, normalize, merge, emit.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::ClusterConfig;
use crate::engine::{MergeEngine, MergeEvent};
use crate::error::ClusterError;
use crate::features::FeatureNormalizer;
use crate::grid::{GridIndex, StandGrid};
use crate::partition::Partition;

/// Result of a successful clustering pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterOutcome {
    pub partition: Partition,
    /// Every merge in the order it was applied
    pub merges: Vec<MergeEvent>,
}

/// Reduce `grid` to `config.target_cluster_count` contiguous clusters.
///
/// All configuration problems, including a target the adjacency graph
/// cannot reach, are reported before any merging starts.
pub fn cluster_stands(grid: &StandGrid, config: &ClusterConfig) -> Result<ClusterOutcome, ClusterError> {
    config.validate(grid.len())?;

    let index = GridIndex::build(grid);
    let reachable = index.component_count();
    if reachable > config.target_cluster_count {
        return Err(ClusterError::UnreachableTarget {
            requested: config.target_cluster_count,
            reachable,
        });
    }

    let normalizer = FeatureNormalizer::fit(grid, config)?;
    debug!(
        "Clustering {} stands ({} edges, {} components) into {} clusters; conditions: {:?}",
        index.len(),
        index.edge_count(),
        reachable,
        config.target_cluster_count,
        normalizer.active_conditions().collect::<Vec<_>>()
    );

    let mut engine = MergeEngine::new(&index, normalizer.vectors(grid));
    engine.run_to(config.target_cluster_count)?;

    let (groups, merges) = engine.into_parts();
    Ok(ClusterOutcome {
        partition: Partition::from_indices(&index, groups),
        merges,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strip(values: &[f64]) -> StandGrid {
        let mut grid = StandGrid::new(values.len() as u32, 1);
        for (col, &v) in values.iter().enumerate() {
            grid.insert((col as i32, 0).into(), "foo", v);
        }
        grid
    }

    #[test]
    fn test_target_equal_to_stand_count_is_identity() {
        let grid = strip(&[0.1, 0.5, 0.9]);
        let config = ClusterConfig::new(3).with_priority_weight("foo", 1.0);
        let outcome = cluster_stands(&grid, &config).unwrap();

        assert_eq!(outcome.partition.len(), 3);
        assert!(outcome.merges.is_empty());
    }

    #[test]
    fn test_single_cluster() {
        let grid = strip(&[0.1, 0.5, 0.9, 0.2]);
        let config = ClusterConfig::new(1).with_priority_weight("foo", 1.0);
        let outcome = cluster_stands(&grid, &config).unwrap();

        assert_eq!(outcome.partition.len(), 1);
        assert_eq!(outcome.partition.stand_count(), 4);
        assert_eq!(outcome.merges.len(), 3);
        assert_eq!(outcome.merges.last().unwrap().size, 4);
    }

    #[test]
    fn test_unreachable_target_rejected_up_front() {
        let mut grid = strip(&[0.1, 0.5]);
        grid.insert((5, 0).into(), "foo", 0.3);
        grid.insert((9, 9).into(), "foo", 0.3);
        let config = ClusterConfig::new(2).with_priority_weight("foo", 1.0);

        assert_eq!(
            cluster_stands(&grid, &config),
            Err(ClusterError::UnreachableTarget { requested: 2, reachable: 3 })
        );
    }

    #[test]
    fn test_invalid_target_rejected() {
        let grid = strip(&[0.1, 0.5]);
        let config = ClusterConfig::new(3);
        assert_eq!(
            cluster_stands(&grid, &config),
            Err(ClusterError::InvalidTarget { requested: 3, stands: 2 })
        );
        assert_eq!(
            cluster_stands(&StandGrid::new(0, 0), &ClusterConfig::new(1)),
            Err(ClusterError::EmptyGrid)
        );
    }
}
