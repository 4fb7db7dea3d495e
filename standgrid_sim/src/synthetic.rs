//! Seeded synthetic stand grids.
//!
//! Each condition is a linear gradient across the grid in a random
//! direction, plus uniform noise, clamped to [0, 1]. All randomness comes
//! from a single `ChaCha8Rng` seed, so a seed always yields the same grid.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use standgrid_core::{ClusterConfig, StandCoord, StandGrid};

/// Shape of a synthetic grid.
#[derive(Debug, Clone)]
pub struct SyntheticSpec {
    pub width: u32,
    pub height: u32,
    /// Number of conditions, named `c0`, `c1`, ...
    pub conditions: usize,
    /// Probability that a cell has no stand at all
    pub missing_fraction: f64,
    /// Probability that a present stand lacks a given condition
    pub condition_dropout: f64,
    /// Half-width of the uniform noise added to each score
    pub noise: f64,
}

impl Default for SyntheticSpec {
    fn default() -> Self {
        Self {
            width: 32,
            height: 32,
            conditions: 3,
            missing_fraction: 0.05,
            condition_dropout: 0.02,
            noise: 0.1,
        }
    }
}

impl SyntheticSpec {
    /// Parse a `WxH` size such as `64x48`.
    pub fn with_size(mut self, size: &str) -> Option<Self> {
        let (w, h) = size.split_once(|c: char| c == 'x' || c == 'X')?;
        self.width = w.trim().parse().ok()?;
        self.height = h.trim().parse().ok()?;
        (self.width > 0 && self.height > 0).then_some(self)
    }

    pub fn condition_name(index: usize) -> String {
        format!("c{}", index)
    }

    /// Equal priority weights for every generated condition.
    pub fn uniform_weights(&self, config: ClusterConfig) -> ClusterConfig {
        (0..self.conditions).fold(config, |config, k| {
            config.with_priority_weight(Self::condition_name(k), 1.0)
        })
    }

    /// Generate the grid for `seed`.
    pub fn generate(&self, seed: u64) -> StandGrid {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);

        let directions: Vec<(f64, f64)> = (0..self.conditions)
            .map(|_| {
                let angle = rng.gen_range(0.0..std::f64::consts::TAU);
                (angle.cos(), angle.sin())
            })
            .collect();

        let mut grid = StandGrid::new(self.width, self.height);
        let span_x = (self.width.max(2) - 1) as f64;
        let span_y = (self.height.max(2) - 1) as f64;

        for column in 0..self.width {
            for row in 0..self.height {
                if rng.gen::<f64>() < self.missing_fraction {
                    continue;
                }
                let coord = StandCoord::new(column as i32, row as i32);
                grid.insert_stand(coord, Default::default());

                let x = column as f64 / span_x;
                let y = row as f64 / span_y;
                for (k, (dx, dy)) in directions.iter().enumerate() {
                    if rng.gen::<f64>() < self.condition_dropout {
                        continue;
                    }
                    // projection onto the direction lies in [-1, 1] for the unit square
                    let base = 0.5 + 0.5 * (x * dx + y * dy) / (dx.abs() + dy.abs()).max(1e-9);
                    let jitter = if self.noise > 0.0 {
                        rng.gen_range(-self.noise..self.noise)
                    } else {
                        0.0
                    };
                    grid.insert(coord, Self::condition_name(k), (base + jitter).clamp(0.0, 1.0));
                }
            }
        }

        grid
    }
}
