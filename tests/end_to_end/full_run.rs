//! Complete runs with a fixed seed

use crate::common::*;

fn assert_complete(report: &RunReport) {
    let stages: Vec<Stage> = report.stages.iter().map(|s| s.stage).collect();
    assert_eq!(stages, Stage::ALL.to_vec());

    assert_eq!(report.stages[0].count, 100);
    assert_eq!(report.stages[0].recorder.len(), 100);
    for stage in &report.stages[1..] {
        assert_eq!(stage.count, 10);
        assert_eq!(stage.recorder.len(), 10);
    }
    for stage in &report.stages {
        let stats = stage.recorder.statistics().unwrap();
        assert!(stats.min <= stats.median && stats.median <= stats.p99 && stats.p99 <= stats.max);
        assert!(stage.recorder.diagnostics().is_some());
    }
    assert_eq!(report.seed, SEED);
}

#[test]
fn memory_backend_passes_all_stages() {
    let dir = temp_dir();
    let report = run(&small_config(dir.path(), BackendKind::Memory)).unwrap();
    assert_complete(&report);
}

#[test]
fn redb_backend_passes_all_stages() {
    let dir = temp_dir();
    let report = run(&small_config(dir.path(), BackendKind::Redb)).unwrap();
    assert_complete(&report);
    assert!(report.stages[4]
        .recorder
        .diagnostics()
        .unwrap()
        .contains("backend: redb"));
}

#[test]
fn redb_backend_with_sync_writes() {
    let dir = temp_dir();
    let config = BenchConfig {
        sync_writes: true,
        ..small_config(dir.path(), BackendKind::Redb)
    };
    assert_complete(&run(&config).unwrap());
}

#[test]
fn default_sizes_with_small_count() {
    // Full-size keys and values, 24 and 1000 bytes
    let dir = temp_dir();
    let config = BenchConfig {
        insert_count: 300,
        ..small_config(dir.path(), BackendKind::Redb)
    };
    let report = run(&config).unwrap();
    assert_eq!(report.stages[1].count, 30);
}

#[test]
fn random_seed_is_reported() {
    let dir = temp_dir();
    let config = BenchConfig {
        seed: None,
        ..small_config(dir.path(), BackendKind::Memory)
    };
    let mut harness = Harness::new(config).unwrap();
    let seed = harness.seed();
    let report = harness.run::<MemoryStore>().unwrap();
    assert_eq!(report.seed, seed);
}

#[test]
fn invalid_config_fails_before_running() {
    let dir = temp_dir();
    let config = BenchConfig {
        key_length: 1,
        insert_count: 1000,
        ..small_config(dir.path(), BackendKind::Redb)
    };
    assert!(matches!(run(&config), Err(BenchError::Config(_))));
    assert!(!config.db_path.exists());
}
