//! core::config::schema
//!
//! Configuration file schema.
//!
//! # Validation
//!
//! Values are validated after parsing: the API base must be an http(s) URL,
//! the base branch must be a valid branch name, and string settings that feed
//! into requests may not be blank.

use serde::{Deserialize, Serialize};

use super::ConfigError;
use crate::core::types::BranchName;

/// The forgepatch configuration file.
///
/// # Example
///
/// ```toml
/// api_base = "https://github.example.com/api/v3"
/// base_branch = "main"
///
/// [commit]
/// message = "Rename FooService to BarService"
/// author_fallback_email = "bot@example.com"
///
/// [search]
/// language = "go"
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct ConfigFile {
    /// GitHub REST API base URL (GitHub Enterprise installs differ)
    pub api_base: Option<String>,

    /// Branch new branches are cut from, overriding the repository default
    pub base_branch: Option<String>,

    /// Commit defaults
    pub commit: Option<CommitSection>,

    /// Code search defaults
    pub search: Option<SearchSection>,
}

impl ConfigFile {
    /// Validate the configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if any value is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(api_base) = &self.api_base {
            if !(api_base.starts_with("https://") || api_base.starts_with("http://")) {
                return Err(ConfigError::InvalidValue(format!(
                    "api_base '{}' must be an http(s) URL",
                    api_base
                )));
            }
        }

        if let Some(base) = &self.base_branch {
            BranchName::new(base).map_err(|e| {
                ConfigError::InvalidValue(format!("invalid base_branch: {}", e))
            })?;
        }

        if let Some(commit) = &self.commit {
            commit.validate()?;
        }
        if let Some(search) = &self.search {
            search.validate()?;
        }

        Ok(())
    }
}

/// Commit defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct CommitSection {
    /// Commit message for published changes
    pub message: Option<String>,

    /// Author email used when the account has no public email
    pub author_fallback_email: Option<String>,
}

impl CommitSection {
    fn validate(&self) -> Result<(), ConfigError> {
        if let Some(message) = &self.message {
            if message.trim().is_empty() {
                return Err(ConfigError::InvalidValue(
                    "commit.message cannot be empty".to_string(),
                ));
            }
        }
        if let Some(email) = &self.author_fallback_email {
            if !email.contains('@') {
                return Err(ConfigError::InvalidValue(format!(
                    "commit.author_fallback_email '{}' is not an email address",
                    email
                )));
            }
        }
        Ok(())
    }
}

/// Code search defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct SearchSection {
    /// Language qualifier added to every code search
    pub language: Option<String>,
}

impl SearchSection {
    fn validate(&self) -> Result<(), ConfigError> {
        match &self.language {
            Some(lang) if lang.trim().is_empty() || lang.contains(char::is_whitespace) => Err(
                ConfigError::InvalidValue(format!("search.language '{}' is not a language", lang)),
            ),
            _ => Ok(()),
        }
    }
}
