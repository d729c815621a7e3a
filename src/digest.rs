//! SHA-512 digest engine with streaming support.
//!
//! # Overview
//!
//! This module provides the [`Digest`] value type and the [`Hasher`] that
//! produces it. In-memory sources are hashed directly; files and other
//! readers are streamed through a single reused buffer, so memory use does
//! not depend on the size of the input.
//!
//! # Example
//!
//! ```
//! use revhash::digest::{Digest, Hasher};
//!
//! let hasher = Hasher::new();
//! let digest = hasher.digest_bytes(b"hello");
//! let parsed: Digest = digest.to_hex().to_uppercase().parse().unwrap();
//! assert_eq!(digest, parsed);
//! ```

use std::fmt;
use std::fs::File;
use std::io::{ErrorKind, Read};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use sha2::{Digest as _, Sha512};

use crate::error::ValidationError;

/// Length of a SHA-512 digest in bytes.
pub const DIGEST_LEN: usize = 64;

/// Length of a digest rendered as hex.
pub const DIGEST_HEX_LEN: usize = DIGEST_LEN * 2;

/// Default read chunk size for streamed sources (8 KiB).
pub const DEFAULT_BUFFER_SIZE: usize = 8 * 1024;

/// Largest accepted read chunk size (16 MiB). Larger requests are clamped.
pub const MAX_BUFFER_SIZE: usize = 16 * 1024 * 1024;

/// A SHA-512 content digest.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Digest([u8; DIGEST_LEN]);

impl Digest {
    /// Wrap raw digest bytes.
    #[must_use]
    pub const fn from_bytes(bytes: [u8; DIGEST_LEN]) -> Self {
        Self(bytes)
    }

    /// Raw digest bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8; DIGEST_LEN] {
        &self.0
    }

    /// Lowercase hex rendering (128 characters).
    #[must_use]
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Parse a hex digest as submitted by a caller.
    ///
    /// Surrounding whitespace is trimmed and hex digits are accepted in
    /// either case. The input must be exactly [`DIGEST_HEX_LEN`] characters
    /// of `[0-9a-fA-F]`.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidLength`] when the trimmed input has
    /// the wrong number of characters, and [`ValidationError::InvalidCharacter`]
    /// for the first non-hex character otherwise.
    pub fn from_hex(input: &str) -> Result<Self, ValidationError> {
        let normalized = input.trim().to_ascii_lowercase();

        let actual = normalized.chars().count();
        if actual != DIGEST_HEX_LEN {
            return Err(ValidationError::InvalidLength {
                expected: DIGEST_HEX_LEN,
                actual,
            });
        }

        let mut bytes = [0u8; DIGEST_LEN];
        for (position, character) in normalized.chars().enumerate() {
            let nibble = character
                .to_digit(16)
                .ok_or(ValidationError::InvalidCharacter {
                    character,
                    position,
                })?;
            let byte = &mut bytes[position / 2];
            *byte = (*byte << 4) | nibble as u8;
        }
        Ok(Self(bytes))
    }
}

impl FromStr for Digest {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Full 128-char digests drown test output; the prefix identifies them.
        write!(f, "Digest({}…)", &self.to_hex()[..16])
    }
}

/// A source that could not be read while computing its digest.
///
/// These never abort a scan; the indexer records them and skips the file.
#[derive(thiserror::Error, Debug)]
pub enum ReadError {
    /// The file vanished between discovery and read.
    #[error("File not found: {0}")]
    NotFound(PathBuf),

    /// Permission was denied when reading the file.
    #[error("Permission denied: {0}")]
    PermissionDenied(PathBuf),

    /// An I/O error occurred while reading the file.
    #[error("I/O error for {path}: {source}")]
    Io {
        /// Path where the error occurred
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Hashing was aborted because shutdown was requested.
    #[error("Interrupted while reading: {0}")]
    Interrupted(PathBuf),
}

impl ReadError {
    /// Classify an I/O error for `path`.
    #[must_use]
    pub fn from_io(path: &Path, error: std::io::Error) -> Self {
        match error.kind() {
            ErrorKind::NotFound => Self::NotFound(path.to_path_buf()),
            ErrorKind::PermissionDenied => Self::PermissionDenied(path.to_path_buf()),
            _ => Self::Io {
                path: path.to_path_buf(),
                source: error,
            },
        }
    }

    /// Path of the source that failed.
    #[must_use]
    pub fn path(&self) -> &Path {
        match self {
            Self::NotFound(path) | Self::PermissionDenied(path) | Self::Interrupted(path) => path,
            Self::Io { path, .. } => path,
        }
    }
}

/// Streaming SHA-512 hasher.
///
/// Cheap to clone and safe to share across worker threads; every call owns
/// its own hashing state and read buffer.
#[derive(Debug, Clone)]
pub struct Hasher {
    /// Bytes requested from the source per read
    buffer_size: usize,
    /// Optional shutdown flag checked between chunks
    shutdown_flag: Option<Arc<AtomicBool>>,
}

impl Default for Hasher {
    fn default() -> Self {
        Self::new()
    }
}

impl Hasher {
    /// Create a hasher with the default 8 KiB chunk size.
    #[must_use]
    pub fn new() -> Self {
        Self {
            buffer_size: DEFAULT_BUFFER_SIZE,
            shutdown_flag: None,
        }
    }

    /// Set the read chunk size, clamped to `1..=MAX_BUFFER_SIZE`.
    #[must_use]
    pub fn with_buffer_size(mut self, size: usize) -> Self {
        self.buffer_size = size.clamp(1, MAX_BUFFER_SIZE);
        self
    }

    /// Set the shutdown flag for graceful termination.
    ///
    /// A long digest checks the flag after every chunk and gives up with
    /// [`ReadError::Interrupted`] once it is set.
    #[must_use]
    pub fn with_shutdown_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.shutdown_flag = Some(flag);
        self
    }

    /// Configured read chunk size.
    #[must_use]
    pub fn buffer_size(&self) -> usize {
        self.buffer_size
    }

    fn is_shutdown_requested(&self) -> bool {
        self.shutdown_flag
            .as_ref()
            .is_some_and(|f| f.load(Ordering::SeqCst))
    }

    /// Digest an in-memory byte sequence.
    #[must_use]
    pub fn digest_bytes(&self, bytes: &[u8]) -> Digest {
        let mut out = [0u8; DIGEST_LEN];
        out.copy_from_slice(&Sha512::digest(bytes));
        Digest(out)
    }

    /// Digest a string over its UTF-8 encoding.
    #[must_use]
    pub fn digest_str(&self, s: &str) -> Digest {
        self.digest_bytes(s.as_bytes())
    }

    /// Stream `reader` through the hash in bounded chunks.
    ///
    /// `path` only labels errors.
    ///
    /// # Errors
    ///
    /// Returns a [`ReadError`] if a read fails or shutdown is requested.
    pub fn digest_reader<R: Read>(&self, path: &Path, reader: R) -> Result<Digest, ReadError> {
        self.stream(path, reader).map(|(digest, _)| digest)
    }

    /// Like [`digest_reader`](Self::digest_reader), also returning the
    /// number of bytes consumed.
    ///
    /// # Errors
    ///
    /// Returns a [`ReadError`] if a read fails or shutdown is requested.
    pub fn stream<R: Read>(&self, path: &Path, mut reader: R) -> Result<(Digest, u64), ReadError> {
        let mut state = Sha512::new();
        let mut buffer = vec![0u8; self.buffer_size];
        let mut total: u64 = 0;

        loop {
            if self.is_shutdown_requested() {
                return Err(ReadError::Interrupted(path.to_path_buf()));
            }
            match reader.read(&mut buffer) {
                Ok(0) => break,
                Ok(n) => {
                    state.update(&buffer[..n]);
                    total += n as u64;
                }
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(ReadError::from_io(path, e)),
            }
        }

        let mut out = [0u8; DIGEST_LEN];
        out.copy_from_slice(&state.finalize());
        Ok((Digest(out), total))
    }

    /// Open `path` and stream its contents through the hash.
    ///
    /// # Errors
    ///
    /// Returns a [`ReadError`] if the file cannot be opened or read.
    pub fn digest_file(&self, path: &Path) -> Result<Digest, ReadError> {
        self.stream_file(path).map(|(digest, _)| digest)
    }

    /// Digest a file and report how many bytes were actually read.
    ///
    /// # Errors
    ///
    /// Returns a [`ReadError`] if the file cannot be opened or read.
    pub fn stream_file(&self, path: &Path) -> Result<(Digest, u64), ReadError> {
        let file = File::open(path).map_err(|e| ReadError::from_io(path, e))?;
        self.stream(path, file)
    }
}
