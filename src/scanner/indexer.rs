//! File indexer: walks a root, digests every file, builds the reverse index.
//!
//! # Overview
//!
//! A scan runs in three steps:
//! 1. **Walk**: collect regular files in deterministic (sorted) order
//! 2. **Digest**: stream each file through SHA-512 on a bounded rayon pool
//! 3. **Merge**: a single writer inserts results in walk order, so
//!    last-write-wins resolves collisions the same way on every scan
//!
//! Per-file failures are recorded in the [`ScanReport`] and skipped. An
//! unusable root yields an empty index plus a [`ConfigurationWarning`].

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;

use bytesize::ByteSize;
use rayon::prelude::*;

use super::walker::log_read_error;
use super::{
    ConfigurationWarning, DiscoveredFile, FileIndex, ScanConfig, ScanError, ScanOutcome,
    ScanReport, Walker,
};
use crate::digest::{Digest, Hasher, ReadError};
use crate::progress::{ProgressCallback, PHASE_HASHING, PHASE_WALKING};

/// Builds a [`FileIndex`] from a directory tree.
pub struct FileIndexer {
    config: ScanConfig,
    hasher: Hasher,
    shutdown_flag: Option<Arc<AtomicBool>>,
    progress_callback: Option<Arc<dyn ProgressCallback>>,
}

impl std::fmt::Debug for FileIndexer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileIndexer")
            .field("config", &self.config)
            .field("shutdown_flag", &self.shutdown_flag)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<callback>"),
            )
            .finish()
    }
}

impl FileIndexer {
    #[must_use]
    pub fn new(config: ScanConfig) -> Self {
        let hasher = Hasher::new().with_buffer_size(config.buffer_size);
        Self {
            config,
            hasher,
            shutdown_flag: None,
            progress_callback: None,
        }
    }

    /// Set the shutdown flag for graceful termination.
    ///
    /// The flag stops the walk and aborts in-flight digests between chunks.
    #[must_use]
    pub fn with_shutdown_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.hasher = self.hasher.with_shutdown_flag(Arc::clone(&flag));
        self.shutdown_flag = Some(flag);
        self
    }

    /// Set the progress callback.
    #[must_use]
    pub fn with_progress_callback(mut self, callback: Arc<dyn ProgressCallback>) -> Self {
        self.progress_callback = Some(callback);
        self
    }

    #[must_use]
    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    fn is_shutdown_requested(&self) -> bool {
        self.shutdown_flag
            .as_ref()
            .is_some_and(|f| f.load(Ordering::SeqCst))
    }

    /// Scan `root` and build a fresh index.
    ///
    /// Never fails: a bad root produces an empty index with
    /// `report.root_valid == false`, and unreadable files end up in
    /// `report.errors`.
    pub fn scan(&self, root: &Path) -> ScanOutcome {
        let start = Instant::now();
        let mut report = ScanReport::new(root);

        let root = match validate_root(root) {
            Ok(canonical) => canonical,
            Err(warning) => {
                log::warn!("{}; file hashing unavailable", warning);
                report.warning = Some(warning);
                report.duration = start.elapsed();
                return ScanOutcome {
                    index: FileIndex::new(),
                    report,
                };
            }
        };
        report.root = root.clone();
        report.root_valid = true;

        let files = self.discover(&root, &mut report);
        report.files_seen = files.len();

        let digests = self.digest_all(files);
        let index = merge(digests, &mut report);

        report.interrupted = self.is_shutdown_requested();
        report.duration = start.elapsed();

        if report.interrupted {
            log::info!("Scan of {} interrupted by shutdown signal", root.display());
        }
        log::info!(
            "Indexed {} of {} files under {} ({}, {} errors, {} collisions) in {:.2?}",
            report.files_indexed,
            report.files_seen,
            root.display(),
            ByteSize::b(report.bytes_hashed),
            report.errors.len(),
            report.collisions,
            report.duration
        );

        ScanOutcome { index, report }
    }

    /// Walk the tree, collecting files and recording walk errors.
    fn discover(&self, root: &Path, report: &mut ScanReport) -> Vec<DiscoveredFile> {
        if let Some(ref callback) = self.progress_callback {
            callback.on_phase_start(PHASE_WALKING, 0);
        }

        let mut walker = Walker::new(root, self.config.walker.clone());
        if let Some(ref flag) = self.shutdown_flag {
            walker = walker.with_shutdown_flag(Arc::clone(flag));
        }

        let mut files = Vec::new();
        for result in walker.walk() {
            match result {
                Ok(file) => {
                    files.push(file);
                    if let Some(ref callback) = self.progress_callback {
                        callback.on_progress(files.len(), "");
                    }
                }
                Err(e) => report.errors.push(e),
            }
        }

        if let Some(ref callback) = self.progress_callback {
            callback.on_phase_end(PHASE_WALKING);
        }
        log::debug!("Discovered {} files under {}", files.len(), root.display());
        files
    }

    /// Digest every file with limited I/O parallelism, preserving input order.
    fn digest_all(&self, files: Vec<DiscoveredFile>) -> Vec<(DiscoveredFile, StreamResult)> {
        if files.is_empty() {
            return Vec::new();
        }

        if let Some(ref callback) = self.progress_callback {
            callback.on_phase_start(PHASE_HASHING, files.len());
        }

        let completed = AtomicUsize::new(0);
        let job = || -> Vec<(DiscoveredFile, StreamResult)> {
            files
                .into_par_iter()
                .map(|file| {
                    let result = self.hasher.stream_file(&file.path);
                    match result {
                        Ok((_, bytes)) => {
                            log::trace!("Digest computed: {}", file.path.display());
                            if let Some(ref callback) = self.progress_callback {
                                callback.on_item_completed(bytes);
                            }
                        }
                        Err(ref e) => log_read_error(e),
                    }
                    let done = completed.fetch_add(1, Ordering::Relaxed) + 1;
                    if let Some(ref callback) = self.progress_callback {
                        callback.on_progress(done, file.path.to_string_lossy().as_ref());
                    }
                    (file, result)
                })
                .collect()
        };

        let results = match rayon::ThreadPoolBuilder::new()
            .num_threads(self.config.io_threads.max(1))
            .build()
        {
            Ok(pool) => pool.install(job),
            Err(e) => {
                log::warn!(
                    "Failed to create custom thread pool ({}), using global pool with {} threads",
                    e,
                    rayon::current_num_threads()
                );
                job()
            }
        };

        if let Some(ref callback) = self.progress_callback {
            callback.on_phase_end(PHASE_HASHING);
        }
        results
    }
}

/// Digest and bytes actually read, or why the file was skipped.
type StreamResult = Result<(Digest, u64), ReadError>;

/// Insert digests in walk order; later files overwrite earlier ones.
fn merge(digests: Vec<(DiscoveredFile, StreamResult)>, report: &mut ScanReport) -> FileIndex {
    let mut index = FileIndex::new();

    for (file, result) in digests {
        match result {
            Ok((digest, bytes)) => {
                report.files_indexed += 1;
                report.bytes_hashed += bytes;
                if let Some(previous) = index.insert(digest, file.path) {
                    report.collisions += 1;
                    log::debug!(
                        "Digest {} collision: replacing {}",
                        digest,
                        previous.display()
                    );
                }
            }
            // Shutdown is reported once via `report.interrupted`.
            Err(ReadError::Interrupted(_)) => {}
            Err(e) => report.errors.push(ScanError::Read(e)),
        }
    }

    index
}

/// Check that `root` is a directory and return its canonical path.
fn validate_root(root: &Path) -> Result<PathBuf, ConfigurationWarning> {
    let metadata = fs::metadata(root).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => ConfigurationWarning::RootNotFound(root.to_path_buf()),
        _ => ConfigurationWarning::Unreadable {
            path: root.to_path_buf(),
            message: e.to_string(),
        },
    })?;

    if !metadata.is_dir() {
        return Err(ConfigurationWarning::NotADirectory(root.to_path_buf()));
    }

    fs::canonicalize(root).map_err(|e| ConfigurationWarning::Unreadable {
        path: root.to_path_buf(),
        message: e.to_string(),
    })
}

/// Scan `root` with default settings and return just the index.
///
/// # Example
///
/// ```no_run
/// use revhash::scanner::scan_directory;
/// use std::path::Path;
///
/// let index = scan_directory(Path::new("./files_to_check"));
/// println!("{} distinct digests", index.len());
/// ```
#[must_use]
pub fn scan_directory(root: &Path) -> FileIndex {
    FileIndexer::new(ScanConfig::default()).scan(root).index
}
