use revhash::digest::Hasher;
use revhash::scanner::{scan_directory, FileIndexer, ScanConfig, WalkerConfig};
use std::fs::{self, File};
use std::io::Write;
use tempfile::tempdir;

#[test]
fn test_scan_empty_directory() {
    let dir = tempdir().unwrap();
    let outcome = FileIndexer::new(ScanConfig::default()).scan(dir.path());

    assert!(outcome.index.is_empty());
    assert!(outcome.report.root_valid);
    assert!(outcome.report.warning.is_none());
    assert_eq!(outcome.report.files_seen, 0);
}

#[test]
fn test_scan_indexes_every_file() {
    let dir = tempdir().unwrap();

    File::create(dir.path().join("a.txt"))
        .unwrap()
        .write_all(b"content a")
        .unwrap();
    File::create(dir.path().join("b.txt"))
        .unwrap()
        .write_all(b"content b")
        .unwrap();
    fs::create_dir(dir.path().join("nested")).unwrap();
    File::create(dir.path().join("nested/c.txt"))
        .unwrap()
        .write_all(b"content c")
        .unwrap();

    let outcome = FileIndexer::new(ScanConfig::default()).scan(dir.path());

    assert_eq!(outcome.index.len(), 3);
    assert_eq!(outcome.report.files_seen, 3);
    assert_eq!(outcome.report.files_indexed, 3);
    assert_eq!(outcome.report.bytes_hashed, 27);
    assert!(outcome.report.errors.is_empty());

    let hasher = Hasher::new();
    let nested = outcome
        .index
        .get(&hasher.digest_bytes(b"content c"))
        .expect("nested file should be indexed");
    assert!(nested.is_absolute());
    assert!(nested.ends_with("nested/c.txt"));
}

#[test]
fn test_scan_indexes_empty_file() {
    let dir = tempdir().unwrap();
    File::create(dir.path().join("empty.txt")).unwrap();

    let index = scan_directory(dir.path());
    let empty = Hasher::new().digest_bytes(b"");

    assert_eq!(index.len(), 1);
    assert!(index.get(&empty).unwrap().ends_with("empty.txt"));
}

#[test]
fn test_scan_identical_content_last_write_wins() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("a.txt"), "same").unwrap();
    fs::write(dir.path().join("b.txt"), "same").unwrap();
    fs::write(dir.path().join("c.txt"), "same").unwrap();

    let outcome = FileIndexer::new(ScanConfig::default()).scan(dir.path());
    let digest = Hasher::new().digest_str("same");

    assert_eq!(outcome.index.len(), 1);
    assert_eq!(outcome.report.collisions, 2);
    assert!(outcome.index.get(&digest).unwrap().ends_with("c.txt"));
}

#[test]
fn test_scan_is_deterministic_across_thread_counts() {
    let dir = tempdir().unwrap();
    for i in 0..20 {
        let sub = dir.path().join(format!("dir_{}", i % 4));
        fs::create_dir_all(&sub).unwrap();
        // Every fifth file shares content so collisions are exercised
        fs::write(sub.join(format!("file_{}.txt", i)), format!("content {}", i % 5)).unwrap();
    }

    let single = FileIndexer::new(ScanConfig::default().with_io_threads(1)).scan(dir.path());
    let many = FileIndexer::new(ScanConfig::default().with_io_threads(8)).scan(dir.path());

    assert_eq!(single.index, many.index);
    assert_eq!(single.report.collisions, many.report.collisions);
}

#[test]
fn test_scan_large_file_multiple_chunks() {
    let dir = tempdir().unwrap();
    let data: Vec<u8> = (0..100_000u32).map(|i| (i % 251) as u8).collect();
    fs::write(dir.path().join("big.bin"), &data).unwrap();

    let outcome = FileIndexer::new(ScanConfig::default().with_buffer_size(4096)).scan(dir.path());
    let expected = Hasher::new().digest_bytes(&data);

    assert!(outcome.index.get(&expected).is_some());
    assert_eq!(outcome.report.bytes_hashed, 100_000);
}

#[test]
fn test_scan_respects_walker_filters() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("keep.txt"), "keep").unwrap();
    fs::write(dir.path().join("skip.tmp"), "skip").unwrap();
    fs::write(dir.path().join(".hidden"), "hidden").unwrap();

    let walker = WalkerConfig::default()
        .with_skip_hidden(true)
        .with_ignore_patterns(vec!["*.tmp".to_string()]);
    let outcome = FileIndexer::new(ScanConfig::default().with_walker(walker)).scan(dir.path());

    assert_eq!(outcome.index.len(), 1);
    let hasher = Hasher::new();
    assert!(outcome.index.get(&hasher.digest_str("keep")).is_some());
    assert!(outcome.index.get(&hasher.digest_str("skip")).is_none());
    assert!(outcome.index.get(&hasher.digest_str("hidden")).is_none());
}
