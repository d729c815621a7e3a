//! Application configuration management.
//!
//! Settings are layered with figment: built-in defaults, then a TOML file,
//! then `REVHASH_*` environment variables (`__` separates nested keys), and
//! finally command-line flags via [`Config::apply_cli`].

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use directories::ProjectDirs;
use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};

use crate::cli::ScanArgs;
use crate::corpus::DEFAULT_CORPUS;
use crate::digest::{DEFAULT_BUFFER_SIZE, MAX_BUFFER_SIZE};
use crate::scanner::{ScanConfig, WalkerConfig};

/// Environment variable prefix for configuration overrides.
pub const ENV_PREFIX: &str = "REVHASH_";

/// Application configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Directory whose files are indexed at startup.
    pub scan_root: PathBuf,
    /// Known strings indexed by digest.
    pub corpus: Vec<String>,
    /// Worker threads computing file digests.
    pub io_threads: usize,
    /// Read chunk size per file in bytes.
    pub buffer_size: usize,
    /// Follow symbolic links while scanning.
    pub follow_symlinks: bool,
    /// Skip dot-prefixed files and directories.
    pub skip_hidden: bool,
    /// Maximum directory depth below the root.
    pub max_depth: Option<usize>,
    /// Gitignore-style patterns excluded from the scan.
    pub ignore_patterns: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            scan_root: PathBuf::from("./files_to_check"),
            corpus: DEFAULT_CORPUS.iter().map(ToString::to_string).collect(),
            io_threads: 4,
            buffer_size: DEFAULT_BUFFER_SIZE,
            follow_symlinks: false,
            skip_hidden: false,
            max_depth: None,
            ignore_patterns: Vec::new(),
        }
    }
}

impl Config {
    /// Load defaults, then the config file, then the environment.
    ///
    /// `path` overrides the platform default location. A missing file is
    /// not an error; a malformed one is.
    ///
    /// # Errors
    ///
    /// Returns an error if the file or an environment value cannot be parsed.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let file = match path {
            Some(p) => Some(p.to_path_buf()),
            None => Self::default_path(),
        };

        let mut figment = Figment::from(Serialized::defaults(Config::default()));
        if let Some(ref file) = file {
            if file.exists() {
                log::debug!("Loading configuration from {}", file.display());
            } else {
                log::debug!("No configuration file at {}", file.display());
            }
            figment = figment.merge(Toml::file(file));
        }
        figment = figment.merge(Env::prefixed(ENV_PREFIX).split("__"));

        let config: Config = figment
            .extract()
            .context("Failed to load configuration")?;
        Ok(config.normalized())
    }

    /// Default platform-specific configuration path.
    #[must_use]
    pub fn default_path() -> Option<PathBuf> {
        ProjectDirs::from("com", "revhash", "revhash")
            .map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// Apply command-line overrides on top of the loaded configuration.
    #[must_use]
    pub fn apply_cli(mut self, args: &ScanArgs) -> Self {
        if let Some(ref root) = args.root {
            self.scan_root = root.clone();
        }
        if let Some(threads) = args.io_threads {
            self.io_threads = threads;
        }
        if let Some(size) = args.buffer_size {
            self.buffer_size = usize::try_from(size).unwrap_or(usize::MAX);
        }
        if args.follow_symlinks {
            self.follow_symlinks = true;
        }
        if args.skip_hidden {
            self.skip_hidden = true;
        }
        if args.max_depth.is_some() {
            self.max_depth = args.max_depth;
        }
        self.ignore_patterns
            .extend(args.ignore_patterns.iter().cloned());
        self.normalized()
    }

    fn normalized(mut self) -> Self {
        self.io_threads = self.io_threads.max(1);
        self.buffer_size = self.buffer_size.clamp(1, MAX_BUFFER_SIZE);
        self
    }

    /// Scanner settings derived from this configuration.
    #[must_use]
    pub fn scan_config(&self) -> ScanConfig {
        let walker = WalkerConfig::default()
            .with_follow_symlinks(self.follow_symlinks)
            .with_skip_hidden(self.skip_hidden)
            .with_max_depth(self.max_depth)
            .with_ignore_patterns(self.ignore_patterns.clone());

        ScanConfig::default()
            .with_walker(walker)
            .with_io_threads(self.io_threads)
            .with_buffer_size(self.buffer_size)
    }
}
