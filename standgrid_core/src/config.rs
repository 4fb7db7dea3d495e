//! Clustering configuration.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::ClusterError;

/// Parameters of one clustering run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClusterConfig {
    /// Number of clusters to reduce the grid to (1..=present stands)
    pub target_cluster_count: usize,

    /// Spatial-compactness bias; 0.0 disables the position features
    pub pixel_index_weight: f64,

    /// Nominal width of the raw score domain (1.0 for [0, 1], 100.0 for [0, 100])
    pub score_scale_reference: f64,

    /// Relative importance per condition. Conditions absent here are ignored.
    pub priority_weights: BTreeMap<String, f64>,
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            target_cluster_count: 1,
            pixel_index_weight: 0.0,
            score_scale_reference: 1.0,
            priority_weights: BTreeMap::new(),
        }
    }
}

impl ClusterConfig {
    /// Create a configuration targeting `target_cluster_count` clusters.
    pub fn new(target_cluster_count: usize) -> Self {
        Self {
            target_cluster_count,
            ..Default::default()
        }
    }

    /// Builder-style setter for the spatial bias.
    pub fn with_pixel_index_weight(mut self, weight: f64) -> Self {
        self.pixel_index_weight = weight;
        self
    }

    /// Builder-style setter for the score scale reference.
    pub fn with_score_scale_reference(mut self, scale: f64) -> Self {
        self.score_scale_reference = scale;
        self
    }

    /// Builder-style setter for one condition's priority weight.
    pub fn with_priority_weight(mut self, condition: impl Into<String>, weight: f64) -> Self {
        self.priority_weights.insert(condition.into(), weight);
        self
    }

    /// Builder-style setter replacing all priority weights.
    pub fn with_priority_weights(mut self, weights: BTreeMap<String, f64>) -> Self {
        self.priority_weights = weights;
        self
    }

    /// Check every parameter against a grid of `stand_count` present stands.
    ///
    /// Reachability of the target depends on the adjacency graph and is
    /// checked separately.
    pub fn validate(&self, stand_count: usize) -> Result<(), ClusterError> {
        if stand_count == 0 {
            return Err(ClusterError::EmptyGrid);
        }
        if self.target_cluster_count == 0 || self.target_cluster_count > stand_count {
            return Err(ClusterError::InvalidTarget {
                requested: self.target_cluster_count,
                stands: stand_count,
            });
        }
        if !self.pixel_index_weight.is_finite() || self.pixel_index_weight < 0.0 {
            return Err(ClusterError::invalid(format!(
                "pixel_index_weight must be finite and non-negative, got {}",
                self.pixel_index_weight
            )));
        }
        if !self.score_scale_reference.is_finite() || self.score_scale_reference <= 0.0 {
            return Err(ClusterError::invalid(format!(
                "score_scale_reference must be finite and positive, got {}",
                self.score_scale_reference
            )));
        }
        for (name, &weight) in &self.priority_weights {
            if !weight.is_finite() || weight <= 0.0 {
                return Err(ClusterError::invalid(format!(
                    "priority weight for '{}' must be finite and positive, got {}",
                    name, weight
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ClusterConfig::default();
        assert_eq!(config.target_cluster_count, 1);
        assert_eq!(config.pixel_index_weight, 0.0);
        assert_eq!(config.score_scale_reference, 1.0);
        assert!(config.priority_weights.is_empty());
    }

    #[test]
    fn test_target_bounds() {
        let config = ClusterConfig::new(0);
        assert_eq!(
            config.validate(6),
            Err(ClusterError::InvalidTarget { requested: 0, stands: 6 })
        );

        let config = ClusterConfig::new(7);
        assert!(matches!(config.validate(6), Err(ClusterError::InvalidTarget { .. })));

        assert!(ClusterConfig::new(6).validate(6).is_ok());
        assert_eq!(ClusterConfig::new(1).validate(0), Err(ClusterError::EmptyGrid));
    }

    #[test]
    fn test_parameter_domains() {
        let negative_bias = ClusterConfig::new(1).with_pixel_index_weight(-1.0);
        assert!(matches!(negative_bias.validate(2), Err(ClusterError::InvalidParameter(_))));

        let zero_scale = ClusterConfig::new(1).with_score_scale_reference(0.0);
        assert!(matches!(zero_scale.validate(2), Err(ClusterError::InvalidParameter(_))));

        let zero_weight = ClusterConfig::new(1).with_priority_weight("foo", 0.0);
        assert!(matches!(zero_weight.validate(2), Err(ClusterError::InvalidParameter(_))));

        let nan_bias = ClusterConfig::new(1).with_pixel_index_weight(f64::NAN);
        assert!(nan_bias.validate(2).is_err());
    }

    #[test]
    fn test_deserialize_with_defaults() {
        let json = r#"{"target_cluster_count": 3, "priority_weights": {"foo": 10.0}}"#;
        let config: ClusterConfig = serde_json::from_str(json).unwrap();

        assert_eq!(config.target_cluster_count, 3);
        assert_eq!(config.score_scale_reference, 1.0);
        assert_eq!(config.priority_weights["foo"], 10.0);
    }
}
