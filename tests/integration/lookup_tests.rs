use revhash::corpus::CorpusIndex;
use revhash::digest::Hasher;
use revhash::lookup::{LookupResponse, LookupResult, LookupService};
use revhash::scanner::{FileIndexer, ScanConfig};
use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tempfile::tempdir;

fn service_for(root: &Path) -> LookupService {
    LookupService::new(
        CorpusIndex::with_defaults(),
        root,
        FileIndexer::new(ScanConfig::default()),
    )
}

#[test]
fn test_string_wins_over_file_with_same_content() {
    let dir = tempdir().unwrap();
    let root = dir.path().join("files_to_check");
    fs::create_dir(&root).unwrap();
    fs::write(root.join("a.txt"), "hello").unwrap();

    let service = service_for(&root);
    let hex = Hasher::new().digest_str("hello").to_hex();

    assert_eq!(
        service.lookup(&hex).unwrap(),
        LookupResult::FoundString("hello".to_string())
    );
    // The file is still indexed under the same digest
    assert_eq!(service.status().file_index_size, 1);
}

#[test]
fn test_file_only_content_resolves_to_path() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("report.pdf"), b"%PDF-1.4 not really").unwrap();

    let service = service_for(dir.path());
    let hex = Hasher::new().digest_bytes(b"%PDF-1.4 not really").to_hex();

    match service.lookup(&hex).unwrap() {
        LookupResult::FoundFile(path) => {
            assert!(path.is_absolute());
            assert!(path.ends_with("report.pdf"));
        }
        other => panic!("Expected FoundFile, got {:?}", other),
    }
}

#[test]
fn test_lookup_accepts_uppercase_and_whitespace() {
    let dir = tempdir().unwrap();
    let service = service_for(dir.path());
    let hex = Hasher::new().digest_str("flask").to_hex();

    let padded = format!("  {}\n", hex.to_uppercase());
    assert_eq!(
        service.lookup(&padded).unwrap(),
        LookupResult::FoundString("flask".to_string())
    );
}

#[test]
fn test_unknown_digest_is_not_found() {
    let dir = tempdir().unwrap();
    let service = service_for(dir.path());

    let result = service.lookup(&"0".repeat(128)).unwrap();
    assert_eq!(result, LookupResult::NotFound);
    assert!(!result.is_found());
}

#[test]
fn test_malformed_digest_is_validation_error() {
    let dir = tempdir().unwrap();
    let service = service_for(dir.path());

    assert!(service.lookup("abc").is_err());
    assert!(service.lookup(&"g".repeat(128)).is_err());
    assert!(service.lookup("").is_err());
}

#[test]
fn test_missing_root_still_answers_corpus() {
    let dir = tempdir().unwrap();
    let service = service_for(&dir.path().join("files_to_check"));

    let status = service.status();
    assert!(!status.scan_root_valid);
    assert_eq!(status.file_index_size, 0);
    assert_eq!(status.corpus_size, 6);

    let hex = Hasher::new().digest_str("chatbot").to_hex();
    assert_eq!(
        service.lookup(&hex).unwrap(),
        LookupResult::FoundString("chatbot".to_string())
    );
}

#[test]
fn test_rescan_picks_up_new_files() {
    let dir = tempdir().unwrap();
    let service = service_for(dir.path());
    let hex = Hasher::new().digest_str("added later").to_hex();

    assert_eq!(service.lookup(&hex).unwrap(), LookupResult::NotFound);

    fs::write(dir.path().join("late.txt"), "added later").unwrap();
    let snapshot = service.rescan();

    assert_eq!(snapshot.index().len(), 1);
    assert!(service.lookup(&hex).unwrap().is_found());
}

#[test]
fn test_rescan_is_idempotent() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("a.txt"), "alpha").unwrap();
    fs::write(dir.path().join("b.txt"), "beta").unwrap();

    let service = service_for(dir.path());
    let before = service.snapshot();
    let after = service.rescan();

    assert_eq!(before.index(), after.index());
    assert!(after.completed_at() >= before.completed_at());
}

#[test]
fn test_concurrent_lookups_during_rescan() {
    let dir = tempdir().unwrap();
    for i in 0..10 {
        fs::write(dir.path().join(format!("f{}.txt", i)), format!("body {}", i)).unwrap();
    }
    let service = service_for(dir.path());
    let hex = Hasher::new().digest_str("body 3").to_hex();

    std::thread::scope(|s| {
        s.spawn(|| {
            for _ in 0..3 {
                service.rescan();
            }
        });
        for _ in 0..4 {
            s.spawn(|| {
                for _ in 0..50 {
                    assert!(service.lookup(&hex).unwrap().is_found());
                }
            });
        }
    });
}

#[test]
fn test_response_wire_shape() {
    let found = LookupResponse::from(LookupResult::FoundString("123".to_string()));
    assert_eq!(serde_json::to_string(&found).unwrap(), r#"{"result":"123"}"#);

    let missing = LookupResponse::from(LookupResult::NotFound);
    assert_eq!(serde_json::to_string(&missing).unwrap(), r#"{"result":null}"#);
}

#[test]
fn test_interrupted_rescan_keeps_previous_index() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("a.txt"), "kept across rescans").unwrap();

    let flag = Arc::new(AtomicBool::new(false));
    let service = LookupService::new(
        CorpusIndex::with_defaults(),
        dir.path(),
        FileIndexer::new(ScanConfig::default()).with_shutdown_flag(Arc::clone(&flag)),
    );
    let hex = Hasher::new().digest_str("kept across rescans").to_hex();
    let expected = fs::canonicalize(dir.path().join("a.txt")).unwrap();
    assert_eq!(
        service.lookup(&hex).unwrap(),
        LookupResult::FoundFile(expected.clone())
    );
    let before = service.snapshot();

    flag.store(true, Ordering::SeqCst);
    let returned = service.rescan();

    assert!(Arc::ptr_eq(&returned, &before));
    assert!(!service.status().interrupted);
    assert_eq!(service.status().file_index_size, 1);
    assert_eq!(service.lookup(&hex).unwrap(), LookupResult::FoundFile(expected));
}

#[test]
fn test_interrupted_initial_scan_is_reported() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("a.txt"), "never reached").unwrap();

    let service = LookupService::new(
        CorpusIndex::with_defaults(),
        dir.path(),
        FileIndexer::new(ScanConfig::default())
            .with_shutdown_flag(Arc::new(AtomicBool::new(true))),
    );

    let status = service.status();
    assert!(status.interrupted);
    assert_eq!(status.file_index_size, 0);
}
