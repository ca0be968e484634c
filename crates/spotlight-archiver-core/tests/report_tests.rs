use std::fs;
use tempfile::tempdir;

use spotlight_archiver_core::persistence::RecordStore;
use spotlight_archiver_core::report::report_duplicates;
use spotlight_archiver_core::REPORT_FILENAME;

#[test]
fn shared_fingerprint_is_reported() {
    let dir = tempdir().unwrap();
    let store = RecordStore::initialize(dir.path()).unwrap();
    store.upsert("http://x/a", Some("aaaaaaaaaaaaaaaa"), "a.jpg").unwrap();
    store.upsert("http://x/b", Some("aaaaaaaaaaaaaaaa"), "b.jpg").unwrap();
    store.upsert("http://x/c", Some("bbbbbbbbbbbbbbbb"), "c.jpg").unwrap();

    let report_path = dir.path().join(REPORT_FILENAME);
    assert!(report_duplicates(&store, &report_path, 0).unwrap());

    let report = fs::read_to_string(&report_path).unwrap();
    assert_eq!(report.matches("## phash").count(), 1);
    assert_eq!(report.matches("\n- ").count(), 2);
    assert!(report.contains("![phash aaaaaaaaaaaaaaaa](http://x/a)"));
    assert!(!report.contains("http://x/c"));

    // Reporting never touches the records
    assert_eq!(store.count().unwrap(), 3);
}

#[test]
fn distinct_fingerprints_write_nothing() {
    let dir = tempdir().unwrap();
    let store = RecordStore::initialize(dir.path()).unwrap();
    store.upsert("http://x/a", Some("aaaaaaaaaaaaaaaa"), "a.jpg").unwrap();
    store.upsert("http://x/b", Some("bbbbbbbbbbbbbbbb"), "b.jpg").unwrap();
    store.upsert("http://x/c", None, "c.jpg").unwrap();
    store.upsert("http://x/d", None, "d.jpg").unwrap();

    let report_path = dir.path().join(REPORT_FILENAME);
    assert!(!report_duplicates(&store, &report_path, 0).unwrap());
    assert!(!report_path.exists());
}

#[test]
fn threshold_catches_near_identical_pictures() {
    let dir = tempdir().unwrap();
    let store = RecordStore::initialize(dir.path()).unwrap();
    store.upsert("http://x/a", Some("f0f0f0f0f0f0f0f0"), "a.jpg").unwrap();
    store.upsert("http://x/b", Some("f0f0f0f0f0f0f0f1"), "b.jpg").unwrap();

    let report_path = dir.path().join(REPORT_FILENAME);
    assert!(!report_duplicates(&store, &report_path, 0).unwrap());
    assert!(report_duplicates(&store, &report_path, 4).unwrap());
}
