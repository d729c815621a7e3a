//! Scanner module for directory traversal and file indexing.
//!
//! This module provides functionality for:
//! - Sorted directory walking using walkdir
//! - Parallel SHA-512 digests on a bounded rayon pool
//! - A digest → absolute path index with last-write-wins collisions
//!
//! # Architecture
//!
//! The scanner is divided into submodules:
//! - [`walker`]: Directory traversal and file discovery
//! - [`indexer`]: Digest computation and index construction
//!
//! # Example
//!
//! ```no_run
//! use revhash::scanner::{FileIndexer, ScanConfig};
//! use std::path::Path;
//!
//! let indexer = FileIndexer::new(ScanConfig::default());
//! let outcome = indexer.scan(Path::new("./files_to_check"));
//! println!(
//!     "{} files indexed, {} errors",
//!     outcome.report.files_indexed,
//!     outcome.report.errors.len()
//! );
//! ```

pub mod indexer;
pub mod walker;

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::digest::{Digest, ReadError, DEFAULT_BUFFER_SIZE, MAX_BUFFER_SIZE};

// Re-export main types
pub use indexer::{scan_directory, FileIndexer};
pub use walker::Walker;

/// A regular file found by the walker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredFile {
    /// Path to the file (absolute when the walk root is absolute)
    pub path: PathBuf,
    /// File size in bytes at discovery time
    pub size: u64,
}

impl DiscoveredFile {
    #[must_use]
    pub fn new(path: PathBuf, size: u64) -> Self {
        Self { path, size }
    }
}

/// Configuration for directory walking.
///
/// Controls filtering and symlink handling.
#[derive(Debug, Clone, Default)]
pub struct WalkerConfig {
    /// Follow symbolic links during traversal.
    /// Cycles are detected and reported as [`ScanError::Loop`].
    pub follow_symlinks: bool,

    /// Skip hidden files and directories (names starting with `.`).
    pub skip_hidden: bool,

    /// Maximum directory depth below the root, unlimited if `None`.
    pub max_depth: Option<usize>,

    /// Glob patterns to ignore (gitignore-style).
    /// These are applied in addition to a `.gitignore` at the root.
    pub ignore_patterns: Vec<String>,
}

impl WalkerConfig {
    #[must_use]
    pub fn with_follow_symlinks(mut self, follow: bool) -> Self {
        self.follow_symlinks = follow;
        self
    }

    #[must_use]
    pub fn with_skip_hidden(mut self, skip: bool) -> Self {
        self.skip_hidden = skip;
        self
    }

    #[must_use]
    pub fn with_max_depth(mut self, depth: Option<usize>) -> Self {
        self.max_depth = depth;
        self
    }

    #[must_use]
    pub fn with_ignore_patterns(mut self, patterns: Vec<String>) -> Self {
        self.ignore_patterns = patterns;
        self
    }
}

/// Configuration for a full indexing pass.
#[derive(Debug, Clone)]
pub struct ScanConfig {
    /// Traversal options
    pub walker: WalkerConfig,
    /// Number of worker threads computing digests.
    /// Default is 4 to prevent disk thrashing.
    pub io_threads: usize,
    /// Read chunk size for each file
    pub buffer_size: usize,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            walker: WalkerConfig::default(),
            io_threads: 4,
            buffer_size: DEFAULT_BUFFER_SIZE,
        }
    }
}

impl ScanConfig {
    #[must_use]
    pub fn with_walker(mut self, walker: WalkerConfig) -> Self {
        self.walker = walker;
        self
    }

    /// Set the worker count. Values below 1 are clamped to 1.
    #[must_use]
    pub fn with_io_threads(mut self, threads: usize) -> Self {
        self.io_threads = threads.max(1);
        self
    }

    #[must_use]
    pub fn with_buffer_size(mut self, size: usize) -> Self {
        self.buffer_size = size.clamp(1, MAX_BUFFER_SIZE);
        self
    }
}

/// Errors contained within a scan. None of these abort it.
#[derive(thiserror::Error, Debug)]
pub enum ScanError {
    /// A file could not be read while computing its digest.
    #[error(transparent)]
    Read(#[from] ReadError),

    /// A directory entry could not be enumerated.
    #[error("Walk error for {path}: {message}")]
    Walk {
        /// Path where the error occurred
        path: PathBuf,
        /// Description from the walker
        message: String,
    },

    /// A followed symbolic link points back at one of its ancestors.
    #[error("Symlink loop at {path} (ancestor {ancestor})")]
    Loop {
        /// The link that closes the cycle
        path: PathBuf,
        /// The ancestor directory it resolves to
        ancestor: PathBuf,
    },
}

impl ScanError {
    /// Path the error refers to.
    #[must_use]
    pub fn path(&self) -> &Path {
        match self {
            Self::Read(e) => e.path(),
            Self::Walk { path, .. } | Self::Loop { path, .. } => path,
        }
    }
}

/// The scan root is unusable. The service keeps running with corpus-only lookups.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigurationWarning {
    /// The configured root does not exist.
    #[error("Scan root not found: {0}")]
    RootNotFound(PathBuf),

    /// The configured root exists but is not a directory.
    #[error("Scan root is not a directory: {0}")]
    NotADirectory(PathBuf),

    /// The configured root could not be inspected.
    #[error("Scan root unreadable: {path}: {message}")]
    Unreadable {
        /// The configured root
        path: PathBuf,
        /// Description of the underlying error
        message: String,
    },
}

/// Digest → absolute path mapping produced by one scan.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileIndex {
    entries: HashMap<Digest, PathBuf>,
}

impl FileIndex {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a mapping, returning the path it replaced.
    pub fn insert(&mut self, digest: Digest, path: PathBuf) -> Option<PathBuf> {
        self.entries.insert(digest, path)
    }

    /// Path indexed under `digest`, if any.
    #[must_use]
    pub fn get(&self, digest: &Digest) -> Option<&Path> {
        self.entries.get(digest).map(PathBuf::as_path)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over `(digest, path)` pairs in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = (&Digest, &Path)> {
        self.entries.iter().map(|(d, p)| (d, p.as_path()))
    }
}

/// Statistics and contained errors from one scan.
#[derive(Debug, Default)]
pub struct ScanReport {
    /// Root as scanned (canonical when valid)
    pub root: PathBuf,
    /// Whether the root existed and was a directory
    pub root_valid: bool,
    /// Set when the root was unusable
    pub warning: Option<ConfigurationWarning>,
    /// Regular files discovered by the walker
    pub files_seen: usize,
    /// Files whose digest made it into the index
    pub files_indexed: usize,
    /// Bytes actually read from successfully digested files
    pub bytes_hashed: u64,
    /// Index entries overwritten by a later file with the same digest
    pub collisions: usize,
    /// Per-file and per-directory failures, in encounter order
    pub errors: Vec<ScanError>,
    /// Whether the scan stopped early on shutdown
    pub interrupted: bool,
    /// Wall-clock time of the scan
    pub duration: Duration,
}

impl ScanReport {
    /// Report for a scan of `root` that has not started yet.
    #[must_use]
    pub fn new(root: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
            ..Default::default()
        }
    }
}

/// Result of [`FileIndexer::scan`].
#[derive(Debug, Default)]
pub struct ScanOutcome {
    pub index: FileIndex,
    pub report: ScanReport,
}
