//! Command-line interface definitions for revhash.
//!
//! This module defines all CLI arguments, subcommands, and options using the clap derive API.
//! Scan options are global so they can follow any subcommand.
//!
//! # Example
//!
//! ```bash
//! # Resolve a digest against the default corpus and ./files_to_check
//! revhash lookup 9b71d224bd62f378...
//!
//! # Answer digests from stdin, one JSON object per line
//! cat hashes.txt | revhash --root ~/Documents query
//!
//! # Show index health as JSON
//! revhash status --output json
//!
//! # Compute the digest of a file
//! revhash digest ./files_to_check/a.txt
//! ```

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Reverse SHA-512 lookup over known strings and a scanned directory.
///
/// revhash indexes a small corpus of strings and every file under a root
/// directory by SHA-512 digest, then answers which string or file a given
/// digest belongs to.
#[derive(Debug, Parser)]
#[command(name = "revhash")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase verbosity level (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Configuration file (TOML). Defaults to the platform config directory.
    #[arg(short, long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Report errors as JSON on stderr
    #[arg(long, global = true)]
    pub json_errors: bool,

    /// Disable the scan progress bar
    #[arg(long, global = true)]
    pub no_progress: bool,

    #[command(flatten)]
    pub scan: ScanArgs,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Options controlling the directory scan. Each one overrides the config file.
#[derive(Debug, Default, Args)]
pub struct ScanArgs {
    /// Directory whose files are indexed
    #[arg(long, global = true, value_name = "DIR")]
    pub root: Option<PathBuf>,

    /// Number of I/O threads for hashing
    ///
    /// Lower values reduce disk thrashing on HDDs.
    #[arg(long, global = true, value_name = "N")]
    pub io_threads: Option<usize>,

    /// Read chunk size per file (e.g., 8KiB, 1MiB)
    #[arg(long, global = true, value_name = "SIZE", value_parser = parse_size)]
    pub buffer_size: Option<u64>,

    /// Follow symbolic links during scan (cycles are detected and skipped)
    #[arg(long, global = true)]
    pub follow_symlinks: bool,

    /// Skip hidden files and directories (starting with .)
    #[arg(long, global = true)]
    pub skip_hidden: bool,

    /// Maximum directory depth below the root
    #[arg(long, global = true, value_name = "N")]
    pub max_depth: Option<usize>,

    /// Glob patterns to ignore (can be specified multiple times)
    #[arg(short, long = "ignore", global = true, value_name = "PATTERN")]
    pub ignore_patterns: Vec<String>,
}

/// Available subcommands for revhash.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Resolve one or more hex digests
    Lookup(LookupArgs),
    /// Resolve digests read line by line from stdin, answering in JSON
    Query,
    /// Show index sizes and scan health
    Status(StatusArgs),
    /// Print the SHA-512 digest of a file or string
    Digest(DigestArgs),
}

/// Arguments for the lookup subcommand.
#[derive(Debug, Args)]
pub struct LookupArgs {
    /// Hex digests to resolve (128 hex characters, any case)
    #[arg(value_name = "HASH", required = true)]
    pub hashes: Vec<String>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    pub output: OutputFormat,
}

/// Arguments for the status subcommand.
#[derive(Debug, Args)]
pub struct StatusArgs {
    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    pub output: OutputFormat,
}

/// Arguments for the digest subcommand.
#[derive(Debug, Args)]
pub struct DigestArgs {
    /// File to digest
    #[arg(value_name = "FILE", required_unless_present = "string")]
    pub file: Option<PathBuf>,

    /// Digest this string instead of a file
    #[arg(short, long, value_name = "TEXT", conflicts_with = "file")]
    pub string: Option<String>,
}

/// Output format for results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable lines
    Text,
    /// JSON for scripting
    Json,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}

/// Parse a human-readable size string into bytes.
///
/// Supports suffixes: B, KB, KiB, MB, MiB, GB, GiB, TB, TiB
/// Case-insensitive. Numbers without suffix are treated as bytes.
///
/// # Examples
///
/// ```
/// use revhash::cli::parse_size;
///
/// assert_eq!(parse_size("8192").unwrap(), 8192);
/// assert_eq!(parse_size("8KiB").unwrap(), 8192);
/// assert_eq!(parse_size("1MB").unwrap(), 1_000_000);
/// ```
///
/// # Errors
///
/// Returns an error if the string is empty, contains an invalid number,
/// a negative number, or an unknown size suffix.
pub fn parse_size(s: &str) -> Result<u64, String> {
    let s = s.trim();
    if s.is_empty() {
        return Err("Size cannot be empty".to_string());
    }

    let (num_str, suffix) = match s.find(|c: char| !c.is_ascii_digit() && c != '.') {
        Some(idx) => (&s[..idx], s[idx..].trim().to_uppercase()),
        None => (s, String::new()),
    };

    let num: f64 = num_str
        .parse()
        .map_err(|_| format!("Invalid number: '{num_str}'"))?;

    let multiplier: u64 = match suffix.as_str() {
        "" | "B" => 1,
        "KB" | "K" => 1_000,
        "KIB" => 1_024,
        "MB" | "M" => 1_000_000,
        "MIB" => 1_048_576,
        "GB" | "G" => 1_000_000_000,
        "GIB" => 1_073_741_824,
        "TB" | "T" => 1_000_000_000_000,
        "TIB" => 1_099_511_627_776,
        _ => return Err(format!("Unknown size suffix: '{suffix}'")),
    };

    Ok((num * multiplier as f64) as u64)
}
