//! StandGrid CLI
//!
//! Cluster a stand grid from a JSON request or a seeded synthetic grid.

use clap::Parser;
use standgrid_core::{ClusterConfig, GridIndex};
use standgrid_sim::{run_request, ClusterRequest, PartitionExport, RunReport, SimError, SyntheticSpec};
use tracing::{error, info, Level};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// StandGrid clustering CLI
#[derive(Parser, Debug)]
#[command(name = "standgrid")]
#[command(about = "Reduce a stand grid to contiguous, homogeneous clusters", long_about = None)]
struct Args {
    /// JSON request file (scores + clustering parameters)
    #[arg(short, long, conflicts_with = "synthetic")]
    request: Option<String>,

    /// Generate a synthetic WxH grid instead of reading a request
    #[arg(long)]
    synthetic: Option<String>,

    /// Seed for the synthetic grid
    #[arg(short, long, default_value = "42")]
    seed: u64,

    /// Number of conditions in the synthetic grid
    #[arg(long, default_value = "3")]
    conditions: usize,

    /// Fraction of synthetic cells left without a stand
    #[arg(long, default_value = "0.05")]
    missing: f64,

    /// Target cluster count (overrides the request's value)
    #[arg(short, long)]
    target: Option<usize>,

    /// Spatial-compactness bias (overrides the request's value)
    #[arg(short, long)]
    pixel_index_weight: Option<f64>,

    /// Export the partition to a JSON file
    #[arg(long)]
    export: Option<String>,

    /// Leave the merge history out of the export
    #[arg(long)]
    no_merges: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    /// JSON summary on stdout for scripting
    #[arg(long)]
    json: bool,
}

fn build_request(args: &Args) -> Result<(ClusterRequest, Option<u64>), SimError> {
    let (mut request, seed) = match (&args.request, &args.synthetic) {
        (Some(path), _) => (ClusterRequest::load(path)?, None),
        (None, Some(size)) => {
            let spec = SyntheticSpec {
                conditions: args.conditions,
                missing_fraction: args.missing,
                ..SyntheticSpec::default()
            }
            .with_size(size)
            .ok_or_else(|| SimError::argument(format!("bad grid size '{}', expected WxH", size)))?;

            let grid = spec.generate(args.seed);
            // default target: roughly one cluster per 16 stands, never below
            // the number of disconnected components
            let components = GridIndex::build(&grid).component_count();
            let target = (grid.len() / 16).max(components).max(1);
            let config = spec.uniform_weights(ClusterConfig::new(target));
            (ClusterRequest::from_grid(&grid, config), Some(args.seed))
        }
        (None, None) => {
            return Err(SimError::argument("either --request or --synthetic is required"));
        }
    };

    if let Some(target) = args.target {
        request.target_cluster_count = target;
    }
    if let Some(weight) = args.pixel_index_weight {
        request.pixel_index_weight = weight;
    }

    Ok((request, seed))
}

fn print_json_summary(report: &RunReport) -> Result<(), SimError> {
    let summary = serde_json::json!({
        "stands": report.index.len(),
        "components": report.components,
        "clusters": report.outcome.partition.len(),
        "merges": report.outcome.merges.len(),
        "elapsed_ms": report.elapsed_ms,
        "min_size": report.stats.min_size(),
        "max_size": report.stats.max_size(),
        "average_perimeter_to_area": report.stats.average_perimeter_to_area(),
    });
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}

fn run(args: &Args) -> Result<(), SimError> {
    let (request, seed) = build_request(args)?;
    let report = run_request(&request)?;

    if args.json {
        print_json_summary(&report)?;
    } else {
        for (id, cluster) in report.stats.clusters.iter().enumerate().take(10) {
            info!("  cluster {:>3}: {:>5} stands, perimeter {}", id, cluster.size, cluster.perimeter);
        }
        if report.stats.clusters.len() > 10 {
            info!("  ... {} more", report.stats.clusters.len() - 10);
        }
    }

    if let Some(path) = &args.export {
        let mut export = PartitionExport::new(&report.outcome, &report.index).with_seed(seed);
        if args.no_merges {
            export = export.without_merges();
        }
        export.write_to_file(path)?;
        info!("Exported {} clusters to {}", export.clusters.len(), path);
    }

    Ok(())
}

fn main() {
    let args = Args::parse();

    // Initialize logging; RUST_LOG takes precedence over --verbose
    let level = if args.verbose { Level::DEBUG } else { Level::INFO };
    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::from_level(level).into())
        .from_env_lossy();
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .expect("Failed to set tracing subscriber");

    if !args.json {
        info!("StandGrid v{}", env!("CARGO_PKG_VERSION"));
    }

    if let Err(e) = run(&args) {
        error!("{}", e);
        std::process::exit(1);
    }
}
