//! JSON clustering requests.
//!
//! A request carries the nested column -> row -> condition scores plus the
//! clustering parameters at the top level:
//!
//! ```json
//! {
//!   "width": 3, "height": 2,
//!   "scores": { "0": { "0": { "foo": 0.5 }, "1": { "foo": 0.2 } } },
//!   "target_cluster_count": 2,
//!   "priority_weights": { "foo": 10 },
//!   "pixel_index_weight": 0.0,
//!   "score_scale_reference": 1.0
//! }
//! ```

use serde::{Deserialize, Serialize};
use standgrid_core::{ClusterConfig, NestedScores, StandGrid};
use std::collections::BTreeMap;
use std::path::Path;

use crate::error::SimError;

/// One clustering job as handed over by the surrounding system.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterRequest {
    #[serde(default)]
    pub width: u32,
    #[serde(default)]
    pub height: u32,
    pub scores: NestedScores,
    pub target_cluster_count: usize,
    #[serde(default)]
    pub pixel_index_weight: f64,
    #[serde(default = "default_score_scale_reference")]
    pub score_scale_reference: f64,
    #[serde(default)]
    pub priority_weights: BTreeMap<String, f64>,
}

fn default_score_scale_reference() -> f64 {
    1.0
}

impl ClusterRequest {
    /// Parse a request from JSON text.
    pub fn from_json(json: &str) -> Result<Self, SimError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Read and parse a request file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SimError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Wrap an in-memory grid; used for synthetic runs.
    pub fn from_grid(grid: &StandGrid, config: ClusterConfig) -> Self {
        let mut scores = NestedScores::new();
        for (coord, stand) in grid.iter() {
            scores
                .entry(coord.column)
                .or_default()
                .insert(coord.row, stand.clone());
        }
        Self {
            width: grid.width,
            height: grid.height,
            scores,
            target_cluster_count: config.target_cluster_count,
            pixel_index_weight: config.pixel_index_weight,
            score_scale_reference: config.score_scale_reference,
            priority_weights: config.priority_weights,
        }
    }

    /// Clustering parameters of this request.
    pub fn config(&self) -> ClusterConfig {
        ClusterConfig::new(self.target_cluster_count)
            .with_pixel_index_weight(self.pixel_index_weight)
            .with_score_scale_reference(self.score_scale_reference)
            .with_priority_weights(self.priority_weights.clone())
    }

    /// The sparse stand table described by this request.
    pub fn grid(&self) -> StandGrid {
        StandGrid::from_nested(self.width, self.height, &self.scores)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_nested_scores() {
        let json = r#"{
            "width": 3, "height": 2,
            "scores": {
                "0": { "0": { "foo": 0.5 } },
                "2": { "1": { "foo": 0.6 }, "0": {} }
            },
            "target_cluster_count": 2,
            "priority_weights": { "foo": 10 }
        }"#;
        let request = ClusterRequest::from_json(json).unwrap();

        let config = request.config();
        assert_eq!(config.target_cluster_count, 2);
        assert_eq!(config.pixel_index_weight, 0.0);
        assert_eq!(config.score_scale_reference, 1.0);
        assert_eq!(config.priority_weights["foo"], 10.0);

        let grid = request.grid();
        assert_eq!(grid.len(), 3);
        assert!(grid.contains(&(2, 0).into()));
        assert!(grid.scores(&(2, 0).into()).unwrap().is_empty());
    }

    #[test]
    fn test_grid_round_trip() {
        let mut grid = StandGrid::new(2, 2);
        grid.insert((1, 1).into(), "foo", 0.25);
        let request = ClusterRequest::from_grid(&grid, ClusterConfig::new(1));
        assert_eq!(request.grid(), grid);
    }

    #[test]
    fn test_malformed_request() {
        let err = ClusterRequest::from_json(r#"{"scores": 5}"#).unwrap_err();
        assert!(matches!(err, SimError::Json(_)));
    }
}
