//! Validation Module - Partition Invariants and Compactness Metrics
//! ==================================================================
//!
//! Checks a finished [`Partition`] against the stand set it was built from
//! and measures how compact its clusters are.
//!
//! Invariants:
//! - Every present stand appears in exactly one cluster
//! - No cluster holds an absent coordinate
//! - Every cluster is connected under 4-adjacency
//!
//! Compactness is the perimeter-to-area ratio: a cell edge counts toward
//! the perimeter unless the cell across it belongs to the same cluster.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet, VecDeque};

use crate::error::ClusterError;
use crate::grid::{GridIndex, StandCoord};
use crate::partition::Partition;

// =============================================================================
// INVARIANT CHECKS
// =============================================================================

/// Verify coverage, disjointness and contiguity of `partition`.
pub fn validate_partition(partition: &Partition, index: &GridIndex) -> Result<(), ClusterError> {
    let mut owner: HashMap<StandCoord, usize> = HashMap::with_capacity(index.len());

    for (id, members) in partition.iter() {
        if members.is_empty() {
            return Err(ClusterError::partition(format!("cluster {} is empty", id)));
        }
        for coord in members {
            if !index.contains(coord) {
                return Err(ClusterError::partition(format!(
                    "cluster {} contains absent stand {}",
                    id, coord
                )));
            }
            if let Some(previous) = owner.insert(*coord, id) {
                return Err(ClusterError::partition(format!(
                    "stand {} appears in clusters {} and {}",
                    coord, previous, id
                )));
            }
        }
        if !is_contiguous(members, index) {
            return Err(ClusterError::partition(format!(
                "cluster {} is not 4-connected",
                id
            )));
        }
    }

    if let Some(missing) = index.coords().iter().find(|c| !owner.contains_key(*c)) {
        return Err(ClusterError::partition(format!(
            "stand {} is not assigned to any cluster",
            missing
        )));
    }

    Ok(())
}

/// True if `members` form one connected subgraph under 4-adjacency.
pub fn is_contiguous(members: &[StandCoord], index: &GridIndex) -> bool {
    let Some(&start) = members.first() else {
        return false;
    };
    let set: HashSet<StandCoord> = members.iter().copied().collect();
    let mut seen: HashSet<StandCoord> = HashSet::from([start]);
    let mut queue = VecDeque::from([start]);

    while let Some(current) = queue.pop_front() {
        for next in index.neighbors(&current) {
            if set.contains(&next) && seen.insert(next) {
                queue.push_back(next);
            }
        }
    }

    seen.len() == set.len()
}

// =============================================================================
// COMPACTNESS METRICS
// =============================================================================

/// Size and shape of one cluster.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterStats {
    pub id: usize,
    pub size: usize,
    /// Cell edges not shared with another member of the same cluster
    pub perimeter: usize,
}

impl ClusterStats {
    /// Perimeter per member stand (4.0 for a singleton, lower is rounder)
    pub fn perimeter_to_area(&self) -> f64 {
        if self.size > 0 {
            self.perimeter as f64 / self.size as f64
        } else {
            0.0
        }
    }
}

/// Per-cluster metrics of a partition.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PartitionStats {
    pub clusters: Vec<ClusterStats>,
}

impl PartitionStats {
    pub fn compute(partition: &Partition, index: &GridIndex) -> Self {
        let labels = partition.labels();

        let clusters = partition
            .iter()
            .map(|(id, members)| {
                let shared: usize = members
                    .iter()
                    .map(|coord| {
                        index
                            .neighbors(coord)
                            .filter(|n| labels.get(n) == Some(&id))
                            .count()
                    })
                    .sum();
                ClusterStats {
                    id,
                    size: members.len(),
                    perimeter: 4 * members.len() - shared,
                }
            })
            .collect();

        Self { clusters }
    }

    /// Mean perimeter-to-area ratio over all clusters
    pub fn average_perimeter_to_area(&self) -> f64 {
        if self.clusters.is_empty() {
            return 0.0;
        }
        self.clusters
            .iter()
            .map(ClusterStats::perimeter_to_area)
            .sum::<f64>()
            / self.clusters.len() as f64
    }

    /// Size of the largest cluster
    pub fn max_size(&self) -> usize {
        self.clusters.iter().map(|c| c.size).max().unwrap_or(0)
    }

    /// Size of the smallest cluster
    pub fn min_size(&self) -> usize {
        self.clusters.iter().map(|c| c.size).min().unwrap_or(0)
    }
}
