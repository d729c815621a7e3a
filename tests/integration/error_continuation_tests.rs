use revhash::scanner::{ConfigurationWarning, FileIndexer, ScanConfig};
use std::fs;
use tempfile::tempdir;

#[test]
fn test_missing_root_yields_warning_and_empty_index() {
    let dir = tempdir().unwrap();
    let missing = dir.path().join("files_to_check");

    let outcome = FileIndexer::new(ScanConfig::default()).scan(&missing);

    assert!(outcome.index.is_empty());
    assert!(!outcome.report.root_valid);
    assert_eq!(
        outcome.report.warning,
        Some(ConfigurationWarning::RootNotFound(missing))
    );
}

#[test]
fn test_file_root_yields_not_a_directory() {
    let dir = tempdir().unwrap();
    let file = dir.path().join("file.txt");
    fs::write(&file, "not a dir").unwrap();

    let outcome = FileIndexer::new(ScanConfig::default()).scan(&file);

    assert!(outcome.index.is_empty());
    assert_eq!(
        outcome.report.warning,
        Some(ConfigurationWarning::NotADirectory(file))
    );
}

#[cfg(unix)]
#[test]
fn test_unreadable_file_is_skipped_and_scan_continues() {
    use std::os::unix::fs::PermissionsExt;

    let dir = tempdir().unwrap();
    let locked = dir.path().join("locked.txt");
    fs::write(&locked, "secret").unwrap();
    fs::write(dir.path().join("open.txt"), "public").unwrap();
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();

    // Privileged users can read regardless of mode bits
    let enforced = fs::read(&locked).is_err();

    let outcome = FileIndexer::new(ScanConfig::default()).scan(dir.path());

    fs::set_permissions(&locked, fs::Permissions::from_mode(0o644)).unwrap();

    if enforced {
        assert_eq!(outcome.index.len(), 1);
        assert_eq!(outcome.report.errors.len(), 1);
        assert!(outcome.report.errors[0].path().ends_with("locked.txt"));
    } else {
        assert_eq!(outcome.index.len(), 2);
    }
    assert_eq!(outcome.report.files_seen, 2);
}

#[cfg(unix)]
#[test]
fn test_unreadable_directory_is_skipped_and_scan_continues() {
    use std::os::unix::fs::PermissionsExt;

    let dir = tempdir().unwrap();
    let sub = dir.path().join("no_access");
    fs::create_dir(&sub).unwrap();
    fs::write(sub.join("hidden.txt"), "secret").unwrap();
    fs::write(dir.path().join("ok.txt"), "public").unwrap();
    fs::set_permissions(&sub, fs::Permissions::from_mode(0o000)).unwrap();

    let enforced = fs::read_dir(&sub).is_err();

    let outcome = FileIndexer::new(ScanConfig::default()).scan(dir.path());

    fs::set_permissions(&sub, fs::Permissions::from_mode(0o755)).unwrap();

    if enforced {
        assert_eq!(outcome.index.len(), 1);
        assert!(!outcome.report.errors.is_empty());
    } else {
        assert_eq!(outcome.index.len(), 2);
    }
}
