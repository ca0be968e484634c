#[allow(clippy::module_inception)]
#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::tempdir;

    use super::super::db::RecordStore;

    #[test]
    fn test_initialize_creates_database() {
        let temp_dir = tempdir().unwrap();

        let store = RecordStore::initialize(temp_dir.path()).unwrap();
        assert!(store.path().exists());
        assert_eq!(
            store.path(),
            temp_dir.path().join(".cache/downloaded_images.sqlite")
        );
    }

    #[test]
    fn test_initialize_is_idempotent() {
        let temp_dir = tempdir().unwrap();

        let store = RecordStore::initialize(temp_dir.path()).unwrap();
        store.upsert("http://x/1.jpg", Some("aa"), "1.jpg").unwrap();
        drop(store);

        let store = RecordStore::initialize(temp_dir.path()).unwrap();
        assert_eq!(store.count().unwrap(), 1);
    }

    #[test]
    fn test_lookup_missing_url() {
        let temp_dir = tempdir().unwrap();
        let store = RecordStore::initialize(temp_dir.path()).unwrap();

        assert!(store.lookup_by_url("http://x/none.jpg").unwrap().is_none());
    }

    #[test]
    fn test_upsert_replaces_existing_record() {
        let temp_dir = tempdir().unwrap();
        let store = RecordStore::initialize(temp_dir.path()).unwrap();

        store.upsert("http://x/1.jpg", None, "old.jpg").unwrap();
        store.upsert("http://x/1.jpg", Some("ff00"), "1.jpg").unwrap();
        store.upsert("http://x/1.jpg", Some("ff01"), "1.jpg").unwrap();

        assert_eq!(store.count().unwrap(), 1);

        let record = store.lookup_by_url("http://x/1.jpg").unwrap().unwrap();
        assert_eq!(record.fingerprint.as_deref(), Some("ff01"));
        assert_eq!(record.filename, "1.jpg");
    }

    #[test]
    fn test_filename_validity_requires_record_and_file() {
        let temp_dir = tempdir().unwrap();
        let image_dir = temp_dir.path().join("1080p");
        fs::create_dir_all(&image_dir).unwrap();
        let store = RecordStore::initialize(temp_dir.path()).unwrap();

        // File on disk but no record
        fs::write(image_dir.join("orphan.jpg"), b"data").unwrap();
        assert!(!store.is_filename_valid("orphan.jpg", &image_dir).unwrap());

        // Record and file
        fs::write(image_dir.join("1.jpg"), b"data").unwrap();
        store.upsert("http://x/1.jpg", Some("aa"), "1.jpg").unwrap();
        assert!(store.is_filename_valid("1.jpg", &image_dir).unwrap());

        // Record but file deleted externally
        fs::remove_file(image_dir.join("1.jpg")).unwrap();
        assert!(!store.is_filename_valid("1.jpg", &image_dir).unwrap());
    }

    #[test]
    fn test_all_records_in_insertion_order() {
        let temp_dir = tempdir().unwrap();
        let store = RecordStore::initialize(temp_dir.path()).unwrap();

        store.upsert("http://x/b.jpg", Some("b"), "b.jpg").unwrap();
        store.upsert("http://x/a.jpg", Some("a"), "a.jpg").unwrap();

        let urls: Vec<_> = store
            .all_records()
            .unwrap()
            .into_iter()
            .map(|r| r.url)
            .collect();
        assert_eq!(urls, vec!["http://x/b.jpg", "http://x/a.jpg"]);
    }

    #[test]
    fn test_reads_rows_written_with_default_timestamp() {
        let temp_dir = tempdir().unwrap();
        let store = RecordStore::initialize(temp_dir.path()).unwrap();
        drop(store);

        let conn = rusqlite::Connection::open(
            temp_dir.path().join(".cache/downloaded_images.sqlite"),
        )
        .unwrap();
        conn.execute(
            "INSERT INTO downloaded_images (url, phash, filename) VALUES (?1, ?2, ?3)",
            rusqlite::params!["http://x/legacy.jpg", "abcd", "legacy.jpg"],
        )
        .unwrap();
        drop(conn);

        let store = RecordStore::initialize(temp_dir.path()).unwrap();
        let record = store.lookup_by_url("http://x/legacy.jpg").unwrap().unwrap();
        assert_eq!(record.filename, "legacy.jpg");
    }
}
