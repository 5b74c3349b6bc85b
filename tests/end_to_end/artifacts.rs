//! Report files written by a run

use std::fs;

use crate::common::*;

#[test]
fn run_writes_every_artifact() {
    let dir = temp_dir();
    let config = small_config(dir.path(), BackendKind::Redb);
    run(&config).unwrap();

    for stage in Stage::ALL {
        let raw = fs::read_to_string(config.stage_log_path(stage)).unwrap();
        let expected = if stage == Stage::Fill { 100 } else { 10 };
        assert_eq!(raw.lines().count(), expected, "{}", stage);
        assert!(raw.lines().all(|l| l.parse::<f64>().is_ok()));
    }

    let summary = fs::read_to_string(config.summary_path()).unwrap();
    let headings: Vec<&str> = summary.lines().filter(|l| l.starts_with("[Stage")).collect();
    assert_eq!(
        headings,
        vec![
            "[Stage 1] Insert 100 keys",
            "[Stage 2] Point lookup 10 keys",
            "[Stage 3] Sequentially delete 10 keys",
            "[Stage 4] Sequentially update 10 keys",
            "[Stage 5] Range lookup 10 keys",
        ]
    );
    assert_eq!(summary.matches("Total operations: ").count(), 5);
    assert_eq!(summary.matches("DB stats:").count(), 5);

    let json: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(config.json_summary_path()).unwrap()).unwrap();
    assert_eq!(json["seed"], SEED);
    assert_eq!(json["backend"], "redb");
    assert_eq!(json["stages"].as_array().unwrap().len(), 5);
    assert_eq!(json["stages"][4]["stage"], "range_scan");
}

#[test]
fn custom_prefix_names_artifacts() {
    let dir = temp_dir();
    let config = BenchConfig {
        log_prefix: "nightly".to_string(),
        ..small_config(dir.path(), BackendKind::Memory)
    };
    run(&config).unwrap();

    let reports = dir.path().join("reports");
    assert!(reports.join("nightly.log").exists());
    assert!(reports.join("nightly-stage_1.log").exists());
    assert!(reports.join("nightly-stage_5.log").exists());
    assert!(reports.join("nightly.json").exists());
}

#[test]
fn second_run_replaces_summary() {
    let dir = temp_dir();
    let config = small_config(dir.path(), BackendKind::Memory);
    run(&config).unwrap();
    run(&config).unwrap();

    let summary = fs::read_to_string(config.summary_path()).unwrap();
    assert_eq!(summary.matches("[Stage 1]").count(), 1);
}
