//! JSON exporter for finished partitions.

use serde::{Deserialize, Serialize};
use standgrid_core::{ClusterOutcome, GridIndex, MergeEvent};
use std::fs::File;
use std::io::Write;

/// One exported cluster.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClusterExport {
    pub id: usize,
    pub size: usize,
    pub perimeter: usize,
    /// Member coordinates as `[column, row]`
    pub members: Vec<[i32; 2]>,
}

/// Complete export of one clustering run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PartitionExport {
    /// Requested cluster count
    pub target: usize,

    /// Present stands clustered
    pub stand_count: usize,

    /// Seed of the synthetic grid, if one was used
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,

    pub clusters: Vec<ClusterExport>,

    /// Merge history in application order
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub merges: Vec<MergeEvent>,

    pub average_perimeter_to_area: f64,
}

impl PartitionExport {
    /// Build the export for `outcome` over the stands of `index`.
    pub fn new(outcome: &ClusterOutcome, index: &GridIndex) -> Self {
        let stats = outcome.partition.stats(index);

        let clusters = outcome
            .partition
            .iter()
            .zip(&stats.clusters)
            .map(|((id, members), cluster)| ClusterExport {
                id,
                size: cluster.size,
                perimeter: cluster.perimeter,
                members: members.iter().map(|c| [c.column, c.row]).collect(),
            })
            .collect();

        Self {
            target: outcome.partition.len(),
            stand_count: outcome.partition.stand_count(),
            seed: None,
            clusters,
            merges: outcome.merges.clone(),
            average_perimeter_to_area: stats.average_perimeter_to_area(),
        }
    }

    /// Attach the synthetic seed.
    pub fn with_seed(mut self, seed: Option<u64>) -> Self {
        self.seed = seed;
        self
    }

    /// Drop the merge history (keeps exports of large grids small).
    pub fn without_merges(mut self) -> Self {
        self.merges.clear();
        self
    }

    /// Writes to a JSON file.
    pub fn write_to_file(&self, path: &str) -> std::io::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        let mut file = File::create(path)?;
        file.write_all(json.as_bytes())?;
        Ok(())
    }
}
