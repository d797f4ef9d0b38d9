//! Bulk log export to object storage.

mod common;

use std::cell::RefCell;
use std::fs;

use ci_migrate::migrate::migrate_logs_to_object_storage;
use ci_migrate::storage::{FsObjectStore, ObjectStore, StorageError};
use common::Fixture;

/// Records uploads and rejects the keys it is told to.
#[derive(Default)]
struct RecordingStore {
    puts: RefCell<Vec<(String, String, bool)>>,
    reject: Vec<String>,
}

impl ObjectStore for RecordingStore {
    fn put(
        &self,
        bucket: &str,
        key: &str,
        _data: &[u8],
        private: bool,
    ) -> Result<(), StorageError> {
        if self.reject.iter().any(|k| k == key) {
            return Err(StorageError::Rejected {
                status: 503,
                message: "slow down".to_string(),
            });
        }
        self.puts
            .borrow_mut()
            .push((bucket.to_string(), key.to_string(), private));
        Ok(())
    }
}

fn seeded() -> Fixture {
    let fx = Fixture::new();
    fx.seed();
    fx.add_build(1, 1);
    fx.add_build(2, 4);
    fx.add_build(3, 2);

    fx.add_step(10, 1, 0, Some("pipeline"));
    fx.add_step(11, 1, 10, Some("cloning"));
    fx.add_step(12, 1, 10, Some(""));
    fx.add_step(13, 1, 10, None);
    fx.add_step(21, 2, 20, Some("system build"));
    fx.add_step(31, 3, 30, Some("npm test"));
    fx
}

#[test]
fn test_uploads_private_objects_under_prefix() {
    let fx = seeded();
    let store = RecordingStore::default();

    let report = migrate_logs_to_object_storage(&fx.source, &store, "ci-logs", "logs", 0).unwrap();
    assert_eq!(report.total, 4);
    assert_eq!(report.inserted, 2);
    assert_eq!(report.skipped, 2);

    assert_eq!(
        *store.puts.borrow(),
        [
            ("ci-logs".to_string(), "/logs/11".to_string(), true),
            ("ci-logs".to_string(), "/logs/31".to_string(), true),
        ]
    );
}

#[test]
fn test_failed_upload_does_not_stop_export() {
    let fx = seeded();
    let store = RecordingStore {
        reject: vec!["/logs/11".to_string()],
        ..RecordingStore::default()
    };

    let report = migrate_logs_to_object_storage(&fx.source, &store, "ci-logs", "logs", 0).unwrap();
    assert_eq!(report.inserted, 1);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures.iter().next().unwrap().item, "step 11");
    assert_eq!(store.puts.borrow()[0].1, "/logs/31");
}

#[test]
fn test_export_resumes_after_build() {
    let fx = seeded();
    let store = RecordingStore::default();

    let report = migrate_logs_to_object_storage(&fx.source, &store, "ci-logs", "", 2).unwrap();
    assert_eq!(report.inserted, 1);
    assert_eq!(store.puts.borrow()[0].1, "/31");
}

#[test]
fn test_filesystem_store_receives_log_bodies() {
    let fx = seeded();
    let root = fx.temp_dir.path().join("objects");
    let store = FsObjectStore::new(&root);

    migrate_logs_to_object_storage(&fx.source, &store, "ci-logs", "archive/logs", 0).unwrap();

    let body = fs::read(root.join("ci-logs/archive/logs/11")).unwrap();
    assert_eq!(body, b"cloning");
    assert!(root.join("ci-logs/archive/logs/31").exists());
    assert!(!root.join("ci-logs/archive/logs/10").exists());
}
