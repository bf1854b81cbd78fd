//! core::config
//!
//! Configuration loading.
//!
//! # Precedence
//!
//! Values are resolved in this order (later overrides earlier):
//! 1. Default values
//! 2. Config file
//! 3. CLI flags (not handled here)
//!
//! # Locations
//!
//! An explicit path (`--config`) must exist. Otherwise the first existing
//! file of:
//! 1. `$FORGEPATCH_CONFIG`
//! 2. `$XDG_CONFIG_HOME/forgepatch/config.toml`
//! 3. `~/.forgepatch/config.toml`
//!
//! A missing file is not an error; defaults are used.
//!
//! # Example
//!
//! ```no_run
//! use forgepatch::core::config::Config;
//!
//! let config = Config::load(None).unwrap();
//! println!("API: {}", config.api_base());
//! println!("Message: {}", config.commit_message());
//! ```

pub mod schema;

pub use schema::{CommitSection, ConfigFile, SearchSection};

use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Default GitHub API base URL.
pub const DEFAULT_API_BASE: &str = "https://api.github.com";

/// Commit message used when none is configured.
pub const DEFAULT_COMMIT_MESSAGE: &str = "Apply automated replacements";

/// Author email used when the account has no public email and none is configured.
pub const DEFAULT_FALLBACK_EMAIL: &str = "noreply@forgepatch.invalid";

/// Errors from configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{path}'")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file '{path}': {message}")]
    ParseError { path: PathBuf, message: String },

    #[error("invalid config value: {0}")]
    InvalidValue(String),
}

/// Loaded configuration with defaults applied by the accessors.
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Parsed file contents (all defaults if no file was found)
    pub file: ConfigFile,
    /// Path the file was loaded from
    loaded_from: Option<PathBuf>,
}

impl Config {
    /// Load configuration.
    ///
    /// With `explicit` set, that file is read and must exist. Otherwise the
    /// standard locations are searched.
    ///
    /// # Errors
    ///
    /// Returns an error if a config file exists but cannot be read, parsed,
    /// or validated, or if an explicit path is missing.
    pub fn load(explicit: Option<&Path>) -> Result<Config, ConfigError> {
        let path = match explicit {
            Some(path) => Some(path.to_path_buf()),
            None => Self::discover(),
        };

        match path {
            Some(path) => Self::load_from(&path),
            None => Ok(Config::default()),
        }
    }

    /// Read, parse and validate a specific config file.
    pub fn load_from(path: &Path) -> Result<Config, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

        let file: ConfigFile = toml::from_str(&contents).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        file.validate()?;

        tracing::debug!(path = %path.display(), "loaded config");
        Ok(Config {
            file,
            loaded_from: Some(path.to_path_buf()),
        })
    }

    /// Find the first existing config file in the standard locations.
    fn discover() -> Option<PathBuf> {
        let candidates = [
            std::env::var_os("FORGEPATCH_CONFIG").map(PathBuf::from),
            std::env::var_os("XDG_CONFIG_HOME")
                .map(|xdg| PathBuf::from(xdg).join("forgepatch/config.toml")),
            dirs::home_dir().map(|home| home.join(".forgepatch/config.toml")),
        ];

        candidates.into_iter().flatten().find(|p| p.exists())
    }

    // =========================================================================
    // Accessor methods with defaults
    // =========================================================================

    /// GitHub API base URL, without a trailing slash.
    pub fn api_base(&self) -> &str {
        self.file
            .api_base
            .as_deref()
            .map(|s| s.trim_end_matches('/'))
            .unwrap_or(DEFAULT_API_BASE)
    }

    /// Branch to cut new branches from, if overridden.
    ///
    /// `None` means "ask the repository for its default branch".
    pub fn base_branch(&self) -> Option<&str> {
        self.file.base_branch.as_deref()
    }

    /// Commit message for published changes.
    pub fn commit_message(&self) -> &str {
        self.file
            .commit
            .as_ref()
            .and_then(|c| c.message.as_deref())
            .unwrap_or(DEFAULT_COMMIT_MESSAGE)
    }

    /// Author email used when the account has no public email.
    pub fn author_fallback_email(&self) -> &str {
        self.file
            .commit
            .as_ref()
            .and_then(|c| c.author_fallback_email.as_deref())
            .unwrap_or(DEFAULT_FALLBACK_EMAIL)
    }

    /// Language qualifier for code search, if any.
    pub fn search_language(&self) -> Option<&str> {
        self.file.search.as_ref().and_then(|s| s.language.as_deref())
    }

    /// Path the configuration was loaded from.
    pub fn loaded_from(&self) -> Option<&Path> {
        self.loaded_from.as_deref()
    }
}
