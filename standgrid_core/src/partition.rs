//! Final partition emitted once the merge loop reaches its target.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::ClusterError;
use crate::grid::{GridIndex, StandCoord};
use crate::validation::{self, PartitionStats};

/// Immutable grouping of stands into clusters with contiguous ids.
///
/// Cluster `i` is `clusters[i]`. Ids are assigned by descending member
/// count, ties broken by the smallest member coordinate; members are
/// listed in ascending (column, row) order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Partition {
    clusters: Vec<Vec<StandCoord>>,
}

impl Partition {
    /// Canonicalize arbitrary member groups into a partition.
    ///
    /// Empty groups are dropped.
    pub fn from_groups(groups: Vec<Vec<StandCoord>>) -> Self {
        let mut clusters: Vec<Vec<StandCoord>> = groups
            .into_iter()
            .filter(|g| !g.is_empty())
            .map(|mut g| {
                g.sort();
                g
            })
            .collect();

        // groups are disjoint, so the first member breaks every size tie
        clusters.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a[0].cmp(&b[0])));

        Self { clusters }
    }

    /// Build from member stand indices of `index`.
    pub fn from_indices(index: &GridIndex, groups: Vec<Vec<usize>>) -> Self {
        Self::from_groups(
            groups
                .into_iter()
                .map(|g| g.into_iter().map(|i| index.coord(i)).collect())
                .collect(),
        )
    }

    /// Number of clusters.
    pub fn len(&self) -> usize {
        self.clusters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clusters.is_empty()
    }

    /// Members of cluster `id`.
    pub fn get(&self, id: usize) -> Option<&[StandCoord]> {
        self.clusters.get(id).map(Vec::as_slice)
    }

    /// `(id, members)` pairs in id order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &[StandCoord])> {
        self.clusters.iter().map(Vec::as_slice).enumerate()
    }

    /// Total number of stands across all clusters.
    pub fn stand_count(&self) -> usize {
        self.clusters.iter().map(Vec::len).sum()
    }

    /// Cluster id containing `coord`.
    pub fn cluster_of(&self, coord: &StandCoord) -> Option<usize> {
        self.clusters
            .iter()
            .position(|members| members.binary_search(coord).is_ok())
    }

    /// Stand -> cluster id lookup for every member.
    pub fn labels(&self) -> BTreeMap<StandCoord, usize> {
        self.iter()
            .flat_map(|(id, members)| members.iter().map(move |c| (*c, id)))
            .collect()
    }

    /// The id -> members mapping handed to downstream consumers.
    pub fn to_map(&self) -> BTreeMap<usize, Vec<StandCoord>> {
        self.clusters.iter().cloned().enumerate().collect()
    }

    /// Check coverage, disjointness and 4-contiguity against `index`.
    pub fn validate(&self, index: &GridIndex) -> Result<(), ClusterError> {
        validation::validate_partition(self, index)
    }

    /// Size and perimeter figures for every cluster.
    pub fn stats(&self, index: &GridIndex) -> PartitionStats {
        PartitionStats::compute(self, index)
    }
}
