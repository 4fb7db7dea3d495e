//! StandGrid Harness
//!
//! Stand-in for the surrounding system: loads a JSON clustering request
//! (or generates a seeded synthetic grid), runs the core, self-checks the
//! partition and exports it as JSON. All file I/O lives here.

mod error;
mod exporter;
mod request;
mod runner;
pub mod synthetic;

pub use error::SimError;
pub use exporter::{ClusterExport, PartitionExport};
pub use request::ClusterRequest;
pub use runner::{run_request, RunReport};
pub use synthetic::SyntheticSpec;
