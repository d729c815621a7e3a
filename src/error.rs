//! Structured error handling, input validation errors, and exit codes.

use serde::Serialize;

/// A digest string submitted by a caller was malformed.
///
/// Validation failures are a distinct outcome from "not found": the caller
/// asked a question that cannot have an answer.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// The trimmed input does not have the digest's hex length.
    #[error("Invalid digest length: expected {expected} hex characters, got {actual}")]
    InvalidLength {
        /// Required number of hex characters
        expected: usize,
        /// Number of characters received after trimming
        actual: usize,
    },

    /// The input contains a character that is not a hexadecimal digit.
    #[error("Invalid character {character:?} at position {position} in digest")]
    InvalidCharacter {
        /// The offending character
        character: char,
        /// Zero-based character position in the trimmed input
        position: usize,
    },
}

/// Exit codes for the revhash application.
///
/// - 0: Success (every requested digest resolved)
/// - 1: General error (unexpected failure)
/// - 2: Not found (completed normally, at least one digest had no match)
/// - 3: Invalid input (at least one digest was malformed)
/// - 130: Interrupted by user (Ctrl+C)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ExitCode {
    /// Success: every lookup produced an answer.
    Success = 0,
    /// General error: An unexpected error occurred.
    GeneralError = 1,
    /// Not found: lookups completed but at least one had no match.
    NotFound = 2,
    /// Invalid input: at least one submitted digest failed validation.
    InvalidInput = 3,
    /// Interrupted: operation was interrupted by user (Ctrl+C).
    Interrupted = 130,
}

impl ExitCode {
    /// Get the numeric exit code.
    #[must_use]
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    /// Get the machine-readable code prefix.
    #[must_use]
    pub fn code_prefix(self) -> &'static str {
        match self {
            Self::Success => "RH000",
            Self::GeneralError => "RH001",
            Self::NotFound => "RH002",
            Self::InvalidInput => "RH003",
            Self::Interrupted => "RH130",
        }
    }

    /// Combine two outcomes, keeping the more severe one.
    ///
    /// Invalid input outranks not-found, which outranks success.
    #[must_use]
    pub fn worst(self, other: Self) -> Self {
        fn rank(code: ExitCode) -> u8 {
            match code {
                ExitCode::Success => 0,
                ExitCode::NotFound => 1,
                ExitCode::InvalidInput => 2,
                ExitCode::GeneralError => 3,
                ExitCode::Interrupted => 4,
            }
        }
        if rank(other) > rank(self) {
            other
        } else {
            self
        }
    }
}

/// Structured error information for JSON output.
#[derive(Debug, Serialize)]
pub struct StructuredError {
    /// The error code (e.g., "RH001")
    pub code: String,
    /// The exit code number
    pub exit_code: i32,
    /// Human-readable error message
    pub message: String,
    /// Whether the operation was interrupted
    pub interrupted: bool,
}

impl StructuredError {
    /// Create a new structured error from an anyhow error and an exit code.
    #[must_use]
    pub fn new(err: &anyhow::Error, exit_code: ExitCode) -> Self {
        Self {
            code: exit_code.code_prefix().to_string(),
            exit_code: exit_code.as_i32(),
            message: err.to_string(),
            interrupted: exit_code == ExitCode::Interrupted,
        }
    }
}
