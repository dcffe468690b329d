use hashwatch::{CurrentHash, JsonStateStore, MonitoredFile, Registry, StateStore, EMPTY_SHA256};
use tempfile::TempDir;

const DOCUMENT: &str = r#"{
    "files": [
        {
            "name": "passwd",
            "path": "/etc/passwd",
            "baseline_hash": "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855",
            "current_hash": "REMOVED",
            "last_modified": "2024-01-01T00:00:00Z"
        },
        {
            "name": "hosts",
            "path": "/etc/hosts",
            "baseline_hash": "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855",
            "current_hash": "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855",
            "last_modified": "2024-02-03T04:05:06Z"
        }
    ]
}
"#;

#[test]
fn test_load_existing_document() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("fim_data.json");
    std::fs::write(&path, DOCUMENT).unwrap();

    let registry = JsonStateStore::new(&path).load().unwrap();

    assert_eq!(registry.len(), 2);
    assert_eq!(registry.files[0].current_hash, CurrentHash::Removed);
    assert_eq!(registry.files[1].current_hash.digest(), Some(EMPTY_SHA256));
    assert_eq!(registry.files[1].last_modified, "2024-02-03T04:05:06Z");
}

#[test]
fn test_save_of_load_reproduces_document() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("fim_data.json");
    std::fs::write(&path, DOCUMENT).unwrap();

    let store = JsonStateStore::new(&path);
    let registry = store.load().unwrap();
    store.save(&registry).unwrap();

    assert_eq!(std::fs::read_to_string(&path).unwrap(), DOCUMENT);
    assert_eq!(store.load().unwrap(), registry);
}

#[test]
fn test_missing_fields_fall_back_to_empty() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("fim_data.json");
    std::fs::write(&path, r#"{"files": [{"name": "a"}]}"#).unwrap();

    let store = JsonStateStore::new(&path);
    assert!(store.load().is_err());
    assert_eq!(store.load_or_default(), Registry::default());
}

#[test]
fn test_save_leaves_no_temporary_files() {
    let dir = TempDir::new().unwrap();
    let store = JsonStateStore::new(dir.path().join("fim_data.json"));

    for i in 0..3 {
        let registry = Registry::new(vec![MonitoredFile::new(
            format!("f{}", i),
            format!("./f{}", i),
            EMPTY_SHA256,
            "2024-01-01T00:00:00Z",
        )]);
        store.save(&registry).unwrap();
    }

    let entries: Vec<_> = std::fs::read_dir(dir.path()).unwrap().collect();
    assert_eq!(entries.len(), 1);
    assert_eq!(store.load().unwrap().files[0].name, "f2");
}
