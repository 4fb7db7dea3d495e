//! The "FEATURE" layer - Condition Normalization + Spatial Bias
//!
//! Turns sparse raw condition scores into comparable feature vectors:
//! 1. Per-condition deviation from the mean over the reporting stands,
//!    measured in units of `score_scale_reference`
//! 2. Priority weights divided by their L2 norm over the active conditions
//! 3. Two trailing spatial components `(column, row) * pixel_index_weight`
//!
//! Step 1 keeps the spatial-bias trade-off tied to the nominal score domain
//! rather than to how spread out a particular grid happens to be. Step 2
//! keeps the condition block's magnitude independent of how many
//! equally-behaved conditions are active and of a uniform weight rescale.

use nalgebra::DVector;
use tracing::debug;

use crate::config::ClusterConfig;
use crate::error::ClusterError;
use crate::grid::{ConditionScores, StandCoord, StandGrid};

/// Relative spread below which a condition is treated as constant.
pub const ZERO_SPREAD_TOLERANCE: f64 = 1e-9;

// ============================================================================
// CONDITION STATISTICS
// ============================================================================

/// Mean and population standard deviation of one condition.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConditionStats {
    pub mean: f64,
    pub std_dev: f64,
    /// Number of stands reporting the condition
    pub count: usize,
}

impl ConditionStats {
    /// Returns `None` when no values are given.
    pub fn from_values(values: &[f64]) -> Option<Self> {
        if values.is_empty() {
            return None;
        }
        let n = values.len() as f64;
        let mean = values.iter().sum::<f64>() / n;
        let variance = values.iter().map(|v| (v - mean) * (v - mean)).sum::<f64>() / n;

        Some(Self {
            mean,
            std_dev: variance.sqrt(),
            count: values.len(),
        })
    }

    /// Deviation of `raw` from the mean in units of `scale`.
    ///
    /// Zero when the spread is at or below `ZERO_SPREAD_TOLERANCE * scale`.
    pub fn normalize(&self, raw: f64, scale: f64) -> f64 {
        if self.std_dev <= ZERO_SPREAD_TOLERANCE * scale {
            0.0
        } else {
            (raw - self.mean) / scale
        }
    }
}

// ============================================================================
// FEATURE VECTOR
// ============================================================================

/// A (possibly partial) feature vector with per-component support counts.
///
/// `counts[k]` is the number of stands that contributed to component `k`;
/// a component with count zero is absent and is skipped by [`distance`].
/// The same type holds a single stand's vector and a cluster's running mean.
///
/// [`distance`]: FeatureVector::distance
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureVector {
    values: DVector<f64>,
    counts: DVector<f64>,
}

impl FeatureVector {
    /// Build a stand vector; `None` components are absent.
    pub fn from_components(components: &[Option<f64>]) -> Self {
        let values = DVector::from_iterator(
            components.len(),
            components.iter().map(|c| c.unwrap_or(0.0)),
        );
        let counts = DVector::from_iterator(
            components.len(),
            components.iter().map(|c| if c.is_some() { 1.0 } else { 0.0 }),
        );
        Self { values, counts }
    }

    pub fn dim(&self) -> usize {
        self.values.len()
    }

    /// Component `k`, or `None` when no member reports it.
    pub fn get(&self, k: usize) -> Option<f64> {
        (self.counts[k] > 0.0).then(|| self.values[k])
    }

    /// Euclidean distance over the components present in both vectors.
    pub fn distance(&self, other: &FeatureVector) -> f64 {
        let mut sum = 0.0;
        for k in 0..self.dim() {
            if self.counts[k] > 0.0 && other.counts[k] > 0.0 {
                let d = self.values[k] - other.values[k];
                sum += d * d;
            }
        }
        sum.sqrt()
    }

    /// Count-weighted mean of two vectors, component by component.
    ///
    /// O(dim): the merged mean never revisits individual members.
    pub fn merged(&self, other: &FeatureVector) -> FeatureVector {
        let dim = self.dim();
        let mut values = DVector::zeros(dim);
        let counts = &self.counts + &other.counts;

        for k in 0..dim {
            let (ca, cb) = (self.counts[k], other.counts[k]);
            values[k] = if ca == 0.0 {
                other.values[k]
            } else if cb == 0.0 {
                self.values[k]
            } else {
                (self.values[k] * ca + other.values[k] * cb) / (ca + cb)
            };
        }

        FeatureVector { values, counts }
    }
}

// ============================================================================
// FEATURE NORMALIZER
// ============================================================================

/// A condition that takes part in the feature space.
#[derive(Debug, Clone)]
struct ActiveCondition {
    name: String,
    stats: ConditionStats,
    weight: f64,
}

/// Fitted normalizer: statistics, weight scaling and spatial bias.
#[derive(Debug, Clone)]
pub struct FeatureNormalizer {
    conditions: Vec<ActiveCondition>,
    /// L2 norm of the active priority weights
    weight_norm: f64,
    spatial_weight: f64,
    score_scale: f64,
}

impl FeatureNormalizer {
    /// Compute condition statistics over `grid` for the weighted conditions.
    ///
    /// Conditions without a priority weight, or reported by no stand, are
    /// ignored. Raw scores must be finite.
    pub fn fit(grid: &StandGrid, config: &ClusterConfig) -> Result<Self, ClusterError> {
        for (coord, scores) in grid.iter() {
            if let Some((name, value)) = scores.iter().find(|(_, v)| !v.is_finite()) {
                return Err(ClusterError::invalid(format!(
                    "non-finite score {} for condition '{}' at stand {}",
                    value, name, coord
                )));
            }
        }

        let mut conditions = Vec::new();
        for (name, &weight) in &config.priority_weights {
            let values: Vec<f64> = grid
                .iter()
                .filter_map(|(_, scores)| scores.get(name).copied())
                .collect();

            match ConditionStats::from_values(&values) {
                Some(stats) => conditions.push(ActiveCondition {
                    name: name.clone(),
                    stats,
                    weight,
                }),
                None => debug!("Condition '{}' has no reporting stands; ignored", name),
            }
        }

        let weight_norm = conditions
            .iter()
            .map(|c| c.weight * c.weight)
            .sum::<f64>()
            .sqrt();

        Ok(Self {
            conditions,
            weight_norm,
            spatial_weight: config.pixel_index_weight,
            score_scale: config.score_scale_reference,
        })
    }

    /// Names of the conditions contributing a feature component, in order.
    pub fn active_conditions(&self) -> impl Iterator<Item = &str> {
        self.conditions.iter().map(|c| c.name.as_str())
    }

    pub fn stats(&self, condition: &str) -> Option<&ConditionStats> {
        self.conditions
            .iter()
            .find(|c| c.name == condition)
            .map(|c| &c.stats)
    }

    /// Length of every feature vector: active conditions plus two spatial.
    pub fn dim(&self) -> usize {
        self.conditions.len() + 2
    }

    /// Feature vector of one stand.
    pub fn vector(&self, coord: StandCoord, scores: &ConditionScores) -> FeatureVector {
        let mut components: Vec<Option<f64>> = self
            .conditions
            .iter()
            .map(|c| {
                scores.get(&c.name).map(|&raw| {
                    c.stats.normalize(raw, self.score_scale) * c.weight / self.weight_norm
                })
            })
            .collect();

        components.push(Some(coord.column as f64 * self.spatial_weight));
        components.push(Some(coord.row as f64 * self.spatial_weight));

        FeatureVector::from_components(&components)
    }

    /// Vectors for every stand of `grid`, in ascending coordinate order.
    pub fn vectors(&self, grid: &StandGrid) -> Vec<FeatureVector> {
        grid.iter()
            .map(|(coord, scores)| self.vector(coord, scores))
            .collect()
    }
}
