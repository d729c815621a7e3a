//! revhash - Reverse Digest Lookup
//!
//! Indexes a corpus of known strings and every file under a root directory
//! by SHA-512 digest, then answers which string or file a digest belongs to.
//! Corpus answers take precedence over file answers.

pub mod cli;
pub mod config;
pub mod corpus;
pub mod digest;
pub mod error;
pub mod logging;
pub mod lookup;
pub mod progress;
pub mod scanner;
pub mod signal;

use std::io::{BufRead, Write};
use std::sync::Arc;

use anyhow::{Context, Result};
use bytesize::ByteSize;

use crate::cli::{Cli, Commands, DigestArgs, LookupArgs, OutputFormat, StatusArgs};
use crate::config::Config;
use crate::corpus::CorpusIndex;
use crate::digest::Hasher;
use crate::error::ExitCode;
use crate::lookup::{LookupResponse, LookupResult, LookupService};
use crate::progress::Progress;
use crate::scanner::FileIndexer;
use crate::signal::ShutdownHandler;

/// Run the application for parsed CLI arguments.
///
/// # Errors
///
/// Returns an error if configuration cannot be loaded, a file passed to
/// `digest` cannot be read, or stdout/stdin fail.
pub fn run_app(cli: Cli) -> Result<ExitCode> {
    logging::init_logging(cli.verbose, cli.quiet);
    let handler = signal::install_handler()?;

    let config = Config::load(cli.config.as_deref())?.apply_cli(&cli.scan);
    log::debug!("Effective configuration: {:?}", config);

    let show_progress = !cli.quiet && !cli.no_progress;
    let stdout = std::io::stdout();

    match cli.command {
        Commands::Digest(args) => run_digest(&args, &config, &mut stdout.lock()),
        Commands::Lookup(args) => {
            let service = build_service(&config, &handler, show_progress);
            if handler.is_shutdown_requested() {
                return Ok(ExitCode::Interrupted);
            }
            run_lookup(&service, &args, &mut stdout.lock())
        }
        Commands::Status(args) => {
            let service = build_service(&config, &handler, show_progress);
            if handler.is_shutdown_requested() {
                return Ok(ExitCode::Interrupted);
            }
            run_status(&service, &args, &mut stdout.lock())
        }
        Commands::Query => {
            let service = build_service(&config, &handler, show_progress);
            let stdin = std::io::stdin();
            serve_queries(&service, stdin.lock(), &mut stdout.lock(), Some(&handler))?;
            if handler.is_shutdown_requested() {
                Ok(ExitCode::Interrupted)
            } else {
                Ok(ExitCode::Success)
            }
        }
    }
}

/// Build both indexes from configuration.
#[must_use]
pub fn build_service(config: &Config, handler: &ShutdownHandler, show_progress: bool) -> LookupService {
    let corpus = CorpusIndex::build(config.corpus.iter().cloned());
    log::info!("Corpus index: {} strings", corpus.len());

    let mut indexer = FileIndexer::new(config.scan_config()).with_shutdown_flag(handler.get_flag());
    if show_progress {
        indexer = indexer.with_progress_callback(Arc::new(Progress::new(false)));
    }

    LookupService::new(corpus, config.scan_root.clone(), indexer)
}

fn run_lookup<W: Write>(service: &LookupService, args: &LookupArgs, out: &mut W) -> Result<ExitCode> {
    let mut code = ExitCode::Success;

    for hash in &args.hashes {
        let outcome = service.lookup(hash);
        code = code.worst(match &outcome {
            Ok(LookupResult::NotFound) => ExitCode::NotFound,
            Ok(_) => ExitCode::Success,
            Err(_) => ExitCode::InvalidInput,
        });

        match args.output {
            OutputFormat::Json => {
                serde_json::to_writer(&mut *out, &LookupResponse::from(outcome))?;
                writeln!(out)?;
            }
            OutputFormat::Text => match outcome {
                Ok(LookupResult::FoundString(s)) => writeln!(out, "string: {}", s)?,
                Ok(LookupResult::FoundFile(path)) => writeln!(out, "file: {}", path.display())?,
                Ok(LookupResult::NotFound) => writeln!(out, "not found")?,
                Err(e) => writeln!(out, "invalid: {}", e)?,
            },
        }
    }

    Ok(code)
}

fn run_status<W: Write>(service: &LookupService, args: &StatusArgs, out: &mut W) -> Result<ExitCode> {
    let status = service.status();

    match args.output {
        OutputFormat::Json => {
            serde_json::to_writer_pretty(&mut *out, &status)?;
            writeln!(out)?;
        }
        OutputFormat::Text => {
            let snapshot = service.snapshot();
            writeln!(out, "Corpus entries:  {}", status.corpus_size)?;
            writeln!(out, "Indexed files:   {}", status.file_index_size)?;
            writeln!(
                out,
                "Scan root:       {} ({})",
                status.scan_root.display(),
                if status.scan_root_valid { "valid" } else { "unavailable" }
            )?;
            writeln!(
                out,
                "Bytes hashed:    {}",
                ByteSize::b(snapshot.report().bytes_hashed)
            )?;
            writeln!(out, "Scan errors:     {}", status.scan_errors)?;
            writeln!(out, "Last scan:       {}", status.last_scan.to_rfc3339())?;
            if !status.scan_root_valid {
                writeln!(out, "File hashing unavailable: only corpus lookups will match")?;
            }
        }
    }

    Ok(ExitCode::Success)
}

fn run_digest<W: Write>(args: &DigestArgs, config: &Config, out: &mut W) -> Result<ExitCode> {
    let hasher = Hasher::new().with_buffer_size(config.buffer_size);

    if let Some(ref s) = args.string {
        writeln!(out, "{}", hasher.digest_str(s))?;
    } else if let Some(ref path) = args.file {
        let digest = hasher
            .digest_file(path)
            .with_context(|| format!("Failed to digest {}", path.display()))?;
        writeln!(out, "{}  {}", digest, path.display())?;
    }

    Ok(ExitCode::Success)
}

/// Counters from a [`serve_queries`] session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QueryStats {
    pub answered: usize,
    pub found: usize,
    pub invalid: usize,
}

/// Answer one digest per input line with one `{"result": ...}` JSON line.
///
/// Blank lines are skipped. Stops at EOF or when shutdown is requested.
///
/// # Errors
///
/// Returns an error if reading input or writing output fails.
pub fn serve_queries<R: BufRead, W: Write>(
    service: &LookupService,
    input: R,
    out: &mut W,
    shutdown: Option<&ShutdownHandler>,
) -> Result<QueryStats> {
    let mut stats = QueryStats::default();

    for line in input.lines() {
        if shutdown.is_some_and(ShutdownHandler::is_shutdown_requested) {
            log::debug!("Query loop: shutdown requested");
            break;
        }

        let line = line.context("Failed to read query input")?;
        if line.trim().is_empty() {
            continue;
        }

        let outcome = service.lookup(&line);
        match &outcome {
            Ok(result) if result.is_found() => stats.found += 1,
            Ok(_) => {}
            Err(e) => {
                stats.invalid += 1;
                log::debug!("Rejected query {:?}: {}", line.trim(), e);
            }
        }
        stats.answered += 1;

        serde_json::to_writer(&mut *out, &LookupResponse::from(outcome))?;
        writeln!(out)?;
        out.flush()?;
    }

    Ok(stats)
}
