//! Lookup service answering digest queries against both indexes.
//!
//! # Overview
//!
//! [`LookupService`] owns the immutable [`CorpusIndex`] and the current
//! [`FileSnapshot`]. Queries consult the corpus first and the file index
//! second, so a digest that matches both resolves to the string.
//!
//! The file snapshot sits behind an [`ArcSwap`]: a rescan builds a complete
//! new snapshot off to the side and swaps the pointer, so a reader sees
//! either the whole old index or the whole new one.
//!
//! # Example
//!
//! ```no_run
//! use revhash::corpus::CorpusIndex;
//! use revhash::lookup::{LookupResult, LookupService};
//! use revhash::scanner::{FileIndexer, ScanConfig};
//!
//! let service = LookupService::new(
//!     CorpusIndex::with_defaults(),
//!     "./files_to_check",
//!     FileIndexer::new(ScanConfig::default()),
//! );
//!
//! let hex = revhash::digest::Hasher::new().digest_str("hello").to_hex();
//! assert_eq!(
//!     service.lookup(&hex).unwrap(),
//!     LookupResult::FoundString("hello".to_string())
//! );
//! ```

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use arc_swap::ArcSwap;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::corpus::CorpusIndex;
use crate::digest::Digest;
use crate::error::ValidationError;
use crate::scanner::{FileIndex, FileIndexer, ScanOutcome, ScanReport};

/// Answer to a well-formed digest query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LookupResult {
    /// The digest belongs to a corpus string.
    FoundString(String),
    /// The digest belongs to a scanned file.
    FoundFile(PathBuf),
    /// Nothing indexed has this digest.
    NotFound,
}

impl LookupResult {
    #[must_use]
    pub fn is_found(&self) -> bool {
        !matches!(self, Self::NotFound)
    }
}

/// Wire shape of a lookup answer: `{"result": "..."}` or `{"result": null}`.
///
/// Validation failures collapse to `null` here; callers that need to tell
/// them apart use [`LookupService::lookup`] directly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LookupResponse {
    pub result: Option<String>,
}

impl From<LookupResult> for LookupResponse {
    fn from(result: LookupResult) -> Self {
        let result = match result {
            LookupResult::FoundString(s) => Some(s),
            LookupResult::FoundFile(path) => Some(path.to_string_lossy().into_owned()),
            LookupResult::NotFound => None,
        };
        Self { result }
    }
}

impl From<Result<LookupResult, ValidationError>> for LookupResponse {
    fn from(outcome: Result<LookupResult, ValidationError>) -> Self {
        match outcome {
            Ok(result) => result.into(),
            Err(_) => Self { result: None },
        }
    }
}

/// One complete file index and how it was built.
#[derive(Debug)]
pub struct FileSnapshot {
    index: FileIndex,
    report: ScanReport,
    completed_at: DateTime<Utc>,
}

impl FileSnapshot {
    fn from_outcome(outcome: ScanOutcome) -> Self {
        Self {
            index: outcome.index,
            report: outcome.report,
            completed_at: Utc::now(),
        }
    }

    #[must_use]
    pub fn index(&self) -> &FileIndex {
        &self.index
    }

    #[must_use]
    pub fn report(&self) -> &ScanReport {
        &self.report
    }

    /// When the scan that produced this snapshot finished.
    #[must_use]
    pub fn completed_at(&self) -> DateTime<Utc> {
        self.completed_at
    }
}

/// Health and size information for diagnostics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IndexStatus {
    /// Distinct digests in the corpus index
    pub corpus_size: usize,
    /// Distinct digests in the current file index
    pub file_index_size: usize,
    /// Root of the current file index
    pub scan_root: PathBuf,
    /// False when the root was missing or not a directory
    pub scan_root_valid: bool,
    /// Completion time of the current file index
    pub last_scan: DateTime<Utc>,
    /// Contained errors from the last scan
    pub scan_errors: usize,
    /// Whether the last scan stopped early
    pub interrupted: bool,
}

/// Digest lookup over a string corpus and a scanned directory.
pub struct LookupService {
    corpus: CorpusIndex,
    root: PathBuf,
    indexer: FileIndexer,
    files: ArcSwap<FileSnapshot>,
    rescan_lock: Mutex<()>,
}

impl std::fmt::Debug for LookupService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LookupService")
            .field("corpus_size", &self.corpus.len())
            .field("root", &self.root)
            .field("file_index_size", &self.files.load().index.len())
            .finish()
    }
}

impl LookupService {
    /// Build the service and run the initial scan of `root`.
    ///
    /// A missing or invalid root is not an error: the service starts with an
    /// empty file index and answers corpus lookups only.
    ///
    /// There is no earlier snapshot to fall back on, so an initial scan cut
    /// short by shutdown is published as is, with `interrupted` set in its
    /// report and in [`status`](Self::status). Later rescans never replace a
    /// snapshot with an interrupted one.
    pub fn new(corpus: CorpusIndex, root: impl Into<PathBuf>, indexer: FileIndexer) -> Self {
        let root = root.into();
        let snapshot = FileSnapshot::from_outcome(indexer.scan(&root));

        Self {
            corpus,
            root,
            indexer,
            files: ArcSwap::from_pointee(snapshot),
            rescan_lock: Mutex::new(()),
        }
    }

    /// Look up a hex digest as submitted by a caller.
    ///
    /// The input is trimmed and matched case-insensitively.
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] if the input is not a well-formed
    /// SHA-512 hex digest. A well-formed digest that matches nothing is
    /// `Ok(LookupResult::NotFound)`.
    pub fn lookup(&self, digest_hex: &str) -> Result<LookupResult, ValidationError> {
        let digest = Digest::from_hex(digest_hex)?;
        Ok(self.lookup_digest(&digest))
    }

    /// Look up a parsed digest: corpus first, then files.
    #[must_use]
    pub fn lookup_digest(&self, digest: &Digest) -> LookupResult {
        if let Some(s) = self.corpus.get(digest) {
            log::trace!("Lookup {}: corpus hit", digest);
            return LookupResult::FoundString(s.to_string());
        }

        match self.files.load().index.get(digest) {
            Some(path) => {
                log::trace!("Lookup {}: file hit {}", digest, path.display());
                LookupResult::FoundFile(path.to_path_buf())
            }
            None => {
                log::trace!("Lookup {}: not found", digest);
                LookupResult::NotFound
            }
        }
    }

    /// Current status of both indexes.
    #[must_use]
    pub fn status(&self) -> IndexStatus {
        let snapshot = self.files.load();
        IndexStatus {
            corpus_size: self.corpus.len(),
            file_index_size: snapshot.index.len(),
            scan_root: snapshot.report.root.clone(),
            scan_root_valid: snapshot.report.root_valid,
            last_scan: snapshot.completed_at,
            scan_errors: snapshot.report.errors.len(),
            interrupted: snapshot.report.interrupted,
        }
    }

    /// The file snapshot readers currently see.
    #[must_use]
    pub fn snapshot(&self) -> Arc<FileSnapshot> {
        self.files.load_full()
    }

    #[must_use]
    pub fn corpus(&self) -> &CorpusIndex {
        &self.corpus
    }

    /// Configured scan root, as given (not canonicalized).
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Rebuild the file index from scratch and swap it in.
    ///
    /// Lookups keep answering from the previous snapshot until the new one
    /// is complete. A rescan interrupted by shutdown is discarded and the
    /// current snapshot is returned unchanged. Concurrent rescans run one at
    /// a time.
    pub fn rescan(&self) -> Arc<FileSnapshot> {
        let _guard = self
            .rescan_lock
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        log::info!("Rescanning {}", self.root.display());
        let outcome = self.indexer.scan(&self.root);
        if outcome.report.interrupted {
            log::info!(
                "Rescan of {} interrupted; keeping previous index ({} files)",
                self.root.display(),
                self.files.load().index.len()
            );
            return self.files.load_full();
        }

        let snapshot = Arc::new(FileSnapshot::from_outcome(outcome));
        self.files.store(Arc::clone(&snapshot));
        snapshot
    }
}
