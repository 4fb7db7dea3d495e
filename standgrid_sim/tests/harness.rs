//! End-to-end harness tests: request parsing, runs and exports.

use proptest::prelude::*;
use standgrid_core::{ClusterConfig, ClusterError, GridIndex, StandCoord};
use standgrid_sim::{run_request, ClusterRequest, PartitionExport, SimError, SyntheticSpec};

const SIX_STANDS: &str = r#"{
    "width": 3,
    "height": 2,
    "scores": {
        "0": { "0": { "foo": 0.5 },  "1": { "foo": 0.2 } },
        "1": { "0": { "foo": 0.45 }, "1": { "foo": 0.2 } },
        "2": { "0": { "foo": 0.3 },  "1": { "foo": 0.6 } }
    },
    "target_cluster_count": 5,
    "priority_weights": { "foo": 10 },
    "pixel_index_weight": 0
}"#;

#[test]
fn test_request_run_and_export() {
    let request = ClusterRequest::from_json(SIX_STANDS).unwrap();
    let report = run_request(&request).unwrap();

    let partition = &report.outcome.partition;
    assert_eq!(partition.len(), 5);
    assert_eq!(
        partition.get(0),
        Some(&[StandCoord::new(0, 1), StandCoord::new(1, 1)][..])
    );
    assert_eq!(report.components, 1);

    let export = PartitionExport::new(&report.outcome, &report.index);
    assert_eq!(export.stand_count, 6);
    assert_eq!(export.clusters[0].members, vec![[0, 1], [1, 1]]);
    assert_eq!(export.clusters[0].perimeter, 6);
    assert_eq!(export.merges.len(), 1);

    let json = serde_json::to_value(&export).unwrap();
    assert!(json.get("seed").is_none());
    assert_eq!(json["clusters"].as_array().unwrap().len(), 5);

    let trimmed = serde_json::to_value(export.without_merges()).unwrap();
    assert!(trimmed.get("merges").is_none());
}

#[test]
fn test_rejected_request_surfaces_core_error() {
    let mut request = ClusterRequest::from_json(SIX_STANDS).unwrap();
    request.target_cluster_count = 0;

    match run_request(&request) {
        Err(SimError::Cluster(ClusterError::InvalidTarget { requested, stands })) => {
            assert_eq!((requested, stands), (0, 6));
        }
        other => panic!("unexpected result: {:?}", other.map(|r| r.outcome)),
    }
}

#[test]
fn test_export_writes_file() {
    let request = ClusterRequest::from_json(SIX_STANDS).unwrap();
    let report = run_request(&request).unwrap();
    let path = std::env::temp_dir().join(format!("standgrid_export_{}.json", std::process::id()));
    let path = path.to_str().unwrap().to_string();

    PartitionExport::new(&report.outcome, &report.index)
        .with_seed(Some(7))
        .write_to_file(&path)
        .unwrap();

    let written: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(written["seed"], 7);
    assert_eq!(written["target"], 5);
    std::fs::remove_file(&path).unwrap();
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    #[test]
    fn prop_synthetic_runs_validate(seed in any::<u64>(), bias in 0.0f64..1.0) {
        let spec = SyntheticSpec {
            missing_fraction: 0.1,
            ..SyntheticSpec::default()
        }
        .with_size("10x10")
        .unwrap();
        let grid = spec.generate(seed);
        let target = GridIndex::build(&grid).component_count().max(6);
        let config = spec
            .uniform_weights(ClusterConfig::new(target))
            .with_pixel_index_weight(bias);

        let report = run_request(&ClusterRequest::from_grid(&grid, config)).unwrap();
        prop_assert_eq!(report.outcome.partition.len(), target);
        prop_assert_eq!(report.outcome.partition.stand_count(), grid.len());
    }
}
