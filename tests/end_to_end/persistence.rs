//! What the redb backend leaves on disk after a run

use crate::common::*;

#[test]
fn redb_store_reopens_with_run_contents() {
    let dir = temp_dir();
    let config = small_config(dir.path(), BackendKind::Redb);
    run(&config).unwrap();

    // 100 inserted, 10 deleted
    let store = RedbStore::open(&config.db_path, &OpenOptions::default()).unwrap();
    let pairs = scan_all(&store);
    assert_eq!(pairs.len(), 90);
    assert!(pairs.iter().all(|(k, v)| k.len() == 24 && v.len() == 1000));
}

#[test]
fn clean_start_discards_previous_database() {
    let dir = temp_dir();
    let config = small_config(dir.path(), BackendKind::Redb);

    {
        let mut store = RedbStore::open(&config.db_path, &OpenOptions::default()).unwrap();
        store.put(b"\x01 not printable", b"left over").unwrap();
        store.close().unwrap();
    }

    // verify_after_stage would flag the leftover key if it survived
    run(&config).unwrap();
    let store = RedbStore::open(&config.db_path, &OpenOptions::default()).unwrap();
    assert_eq!(store.get(b"\x01 not printable").unwrap(), None);
}

#[test]
fn leftover_database_without_clean_start_is_detected() {
    let dir = temp_dir();
    let config = BenchConfig {
        clean_start: false,
        ..small_config(dir.path(), BackendKind::Redb)
    };

    {
        let mut store = RedbStore::open(&config.db_path, &OpenOptions::default()).unwrap();
        store.put(b"\x01 not printable", b"left over").unwrap();
        store.close().unwrap();
    }

    let err = run(&config).unwrap_err();
    assert!(err.is_violation());
    assert_eq!(err.stage(), Some(Stage::Fill));
}
