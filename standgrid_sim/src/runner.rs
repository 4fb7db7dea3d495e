//! Runs one clustering request end to end and summarizes the result.

use standgrid_core::{cluster_stands, ClusterOutcome, GridIndex, PartitionStats};
use std::time::Instant;
use tracing::{debug, info, warn};

use crate::error::SimError;
use crate::request::ClusterRequest;

/// Outcome of a harness run, with the metrics printed in the summary.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub outcome: ClusterOutcome,
    pub index: GridIndex,
    pub stats: PartitionStats,
    pub components: usize,
    pub elapsed_ms: f64,
}

/// Cluster the request's grid and self-check the resulting partition.
pub fn run_request(request: &ClusterRequest) -> Result<RunReport, SimError> {
    let grid = request.grid();
    let config = request.config();
    let index = GridIndex::build(&grid);
    let components = index.component_count();

    debug!(
        "Request: {}x{} bounds, {} stands, {} components, {} conditions",
        request.width,
        request.height,
        grid.len(),
        components,
        grid.condition_names().len()
    );

    let started = Instant::now();
    let outcome = cluster_stands(&grid, &config).map_err(|e| {
        warn!("Rejected request: {}", e);
        e
    })?;
    let elapsed_ms = started.elapsed().as_secs_f64() * 1000.0;

    outcome.partition.validate(&index)?;
    let stats = outcome.partition.stats(&index);

    info!(
        "Clustered {} stands into {} clusters in {:.2}ms (sizes {}..={}, avg perimeter/area {:.3})",
        index.len(),
        outcome.partition.len(),
        elapsed_ms,
        stats.min_size(),
        stats.max_size(),
        stats.average_perimeter_to_area()
    );

    Ok(RunReport {
        outcome,
        index,
        stats,
        components,
        elapsed_ms,
    })
}
