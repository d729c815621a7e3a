#![cfg(unix)]

use revhash::digest::Hasher;
use revhash::scanner::{FileIndexer, ScanConfig, ScanError, WalkerConfig};
use std::fs;
use std::os::unix::fs::symlink;
use tempfile::tempdir;

fn following() -> ScanConfig {
    ScanConfig::default().with_walker(WalkerConfig::default().with_follow_symlinks(true))
}

#[test]
fn test_file_symlink_skipped_by_default() {
    let dir = tempdir().unwrap();
    let outside = tempdir().unwrap();
    fs::write(outside.path().join("target.txt"), "linked content").unwrap();
    symlink(outside.path().join("target.txt"), dir.path().join("link.txt")).unwrap();

    let outcome = FileIndexer::new(ScanConfig::default()).scan(dir.path());

    assert!(outcome.index.is_empty());
    assert!(outcome.report.errors.is_empty());
}

#[test]
fn test_file_symlink_followed_when_enabled() {
    let dir = tempdir().unwrap();
    let outside = tempdir().unwrap();
    fs::write(outside.path().join("target.txt"), "linked content").unwrap();
    symlink(outside.path().join("target.txt"), dir.path().join("link.txt")).unwrap();

    let outcome = FileIndexer::new(following()).scan(dir.path());
    let digest = Hasher::new().digest_str("linked content");

    assert_eq!(outcome.index.len(), 1);
    assert!(outcome.index.get(&digest).unwrap().ends_with("link.txt"));
}

#[test]
fn test_directory_cycle_terminates() {
    let dir = tempdir().unwrap();
    let sub = dir.path().join("sub");
    fs::create_dir(&sub).unwrap();
    fs::write(sub.join("data.txt"), "inside the loop").unwrap();
    symlink(dir.path(), sub.join("back")).unwrap();

    let outcome = FileIndexer::new(following()).scan(dir.path());

    assert_eq!(outcome.index.len(), 1);
    assert!(outcome
        .report
        .errors
        .iter()
        .any(|e| matches!(e, ScanError::Loop { .. })));
}

#[test]
fn test_dangling_symlink_does_not_abort_scan() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("real.txt"), "real").unwrap();
    symlink(dir.path().join("gone.txt"), dir.path().join("dangling.txt")).unwrap();

    let outcome = FileIndexer::new(following()).scan(dir.path());

    assert!(outcome
        .index
        .get(&Hasher::new().digest_str("real"))
        .is_some());
    assert_eq!(outcome.index.len(), 1);
}
