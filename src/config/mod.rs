//! Configuration management.
//!
//! The ledger core only ever sees a resolved database path. This module turns
//! command-line flags, environment variables and an optional TOML file into
//! that path plus a few presentation defaults.
//!
//! # Resolution Order
//!
//! Config file:
//! 1. `--config` flag or `PROMPTLEDGER_CONFIG`
//! 2. `<home>/config.toml`, where `<home>` is the flag/env home or `./.promptledger`
//! 3. Platform config dir (`~/.config/promptledger/config.toml` on Linux)
//!
//! Home directory:
//! 1. `--home` flag or `PROMPTLEDGER_HOME`
//! 2. `home` key of the config file (relative paths are taken from the file's directory)
//! 3. `./.promptledger`
//!
//! # Example File
//!
//! ```toml
//! home = "/var/lib/promptledger"
//! db_file = "ledger.db"
//! default_author = "ops"
//!
//! [logging]
//! level = "info"
//! format = "json"
//! file = "/var/log/promptledger.log"
//! ```

use crate::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Environment variable naming the ledger home directory.
pub const HOME_ENV: &str = "PROMPTLEDGER_HOME";

/// Environment variable naming the config file.
pub const CONFIG_ENV: &str = "PROMPTLEDGER_CONFIG";

/// Home directory used when nothing else is configured.
pub const DEFAULT_HOME_DIR: &str = ".promptledger";

/// Database file name inside the home directory.
pub const DEFAULT_DB_FILE: &str = "promptledger.db";

/// Config file name looked up inside the home and platform config directories.
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// Resolved ledger configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerConfig {
    /// Ledger home directory.
    pub home: PathBuf,
    /// Database file name, relative to `home`.
    pub db_file: String,
    /// Author recorded when `add` is called without one.
    pub default_author: Option<String>,
    /// Logging settings from the `[logging]` table.
    pub logging: LoggingSettings,
    /// The config file that was loaded, if any.
    pub source: Option<PathBuf>,
}

/// `[logging]` section of the config file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoggingSettings {
    /// Filter directive, e.g. `info` or `promptledger=debug`.
    pub level: Option<String>,
    /// `pretty` or `json`.
    pub format: Option<String>,
    /// Log file; stderr when unset.
    pub file: Option<PathBuf>,
}

/// Configuration file structure (for TOML parsing).
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    /// Home directory.
    pub home: Option<PathBuf>,
    /// Database file name.
    pub db_file: Option<String>,
    /// Default author.
    pub default_author: Option<String>,
    /// Logging section.
    pub logging: Option<LoggingSettings>,
}

impl ConfigFile {
    /// Reads and parses a config file.
    ///
    /// # Errors
    ///
    /// Returns [`Error::OperationFailed`] if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            Error::operation("read_config_file", format!("{}: {e}", path.display()))
        })?;
        toml::from_str(&contents).map_err(|e| {
            Error::operation("parse_config_file", format!("{}: {e}", path.display()))
        })
    }
}

/// Inputs to configuration resolution.
///
/// `home` and `config` carry the flag-or-environment value (the CLI reads
/// both through clap's `env` support). `platform_config` is the fallback
/// config file location.
#[derive(Debug, Clone, Default)]
pub struct ConfigSources {
    /// `--home` / `PROMPTLEDGER_HOME`.
    pub home: Option<PathBuf>,
    /// `--config` / `PROMPTLEDGER_CONFIG`.
    pub config: Option<PathBuf>,
    /// Platform config file candidate.
    pub platform_config: Option<PathBuf>,
}

impl ConfigSources {
    /// Creates sources with the platform config file filled in.
    #[must_use]
    pub fn new(home: Option<PathBuf>, config: Option<PathBuf>) -> Self {
        Self {
            home,
            config,
            platform_config: platform_config_file(),
        }
    }
}

/// Returns `<platform config dir>/promptledger/config.toml`.
#[must_use]
pub fn platform_config_file() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", "promptledger")
        .map(|dirs| dirs.config_dir().join(CONFIG_FILE_NAME))
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            home: PathBuf::from(DEFAULT_HOME_DIR),
            db_file: DEFAULT_DB_FILE.to_string(),
            default_author: None,
            logging: LoggingSettings::default(),
            source: None,
        }
    }
}

impl LedgerConfig {
    /// Creates a configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolves the configuration from flags, environment and config files.
    ///
    /// # Errors
    ///
    /// Returns [`Error::OperationFailed`] if an explicitly named config file
    /// is missing, or if any chosen config file fails to parse.
    pub fn resolve(sources: &ConfigSources) -> Result<Self> {
        let config_path = locate_config_file(sources);
        let file = match &config_path {
            Some(path) => ConfigFile::load(path)?,
            None => ConfigFile::default(),
        };

        let mut config = Self::from_config_file(file, config_path.as_deref());
        if let Some(home) = &sources.home {
            config.home.clone_from(home);
        }
        config.source = config_path;

        tracing::debug!(
            home = %config.home.display(),
            source = ?config.source,
            "resolved ledger configuration"
        );
        Ok(config)
    }

    /// Loads configuration from one file, ignoring every other source.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let file = ConfigFile::load(path)?;
        let mut config = Self::from_config_file(file, Some(path));
        config.source = Some(path.to_path_buf());
        Ok(config)
    }

    /// Converts a `ConfigFile` to `LedgerConfig`.
    fn from_config_file(file: ConfigFile, path: Option<&Path>) -> Self {
        let mut config = Self::default();

        if let Some(home) = file.home {
            config.home = match path.and_then(Path::parent) {
                Some(base) if home.is_relative() => base.join(home),
                _ => home,
            };
        }
        if let Some(db_file) = file.db_file {
            config.db_file = db_file;
        }
        config.default_author = file.default_author;
        if let Some(logging) = file.logging {
            config.logging = logging;
        }

        config
    }

    /// Sets the home directory.
    #[must_use]
    pub fn with_home(mut self, home: impl Into<PathBuf>) -> Self {
        self.home = home.into();
        self
    }

    /// Returns the full database path.
    #[must_use]
    pub fn db_path(&self) -> PathBuf {
        self.home.join(&self.db_file)
    }
}

/// Picks the config file to load, if any.
fn locate_config_file(sources: &ConfigSources) -> Option<PathBuf> {
    if let Some(explicit) = &sources.config {
        return Some(explicit.clone());
    }

    let home = sources
        .home
        .clone()
        .unwrap_or_else(|| PathBuf::from(DEFAULT_HOME_DIR));
    let home_config = home.join(CONFIG_FILE_NAME);
    if home_config.is_file() {
        return Some(home_config);
    }

    sources.platform_config.clone().filter(|p| p.is_file())
}
