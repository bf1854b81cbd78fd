//! locate
//!
//! Resolves a change's target into concrete files.
//!
//! # Modes
//!
//! - **Direct path**: read one local file; its content is published under
//!   the remote path named by the target.
//! - **Search driven**: run a code search scoped to the bound repository,
//!   drop hits from any other repository, and fetch each remaining hit's
//!   blob in hit order.
//!
//! Blob fetches fail closed: one failed fetch aborts the whole batch rather
//! than committing a partial result.

use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::change::Target;
use crate::core::types::Oid;
use crate::forge::{Forge, ForgeError, SearchQuery};

/// Errors from resolving a target.
#[derive(Debug, Error)]
pub enum LocateError {
    /// The local file does not exist.
    #[error("local file not found: {}", .0.display())]
    NotFound(PathBuf),

    /// The local file exists but could not be read.
    #[error("failed to read {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The code search call failed.
    #[error("code search failed")]
    Search(#[source] ForgeError),

    /// A search hit's blob could not be fetched.
    #[error("failed to fetch {path} ({sha})")]
    Fetch {
        path: String,
        sha: Oid,
        #[source]
        source: ForgeError,
    },
}

/// One resolved file: where it goes and its current content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileMatch {
    /// Path relative to the repository root
    pub path: String,
    /// Raw file bytes
    pub content: Vec<u8>,
}

/// Resolves targets against a forge and the local filesystem.
pub struct FileLocator<'a> {
    forge: &'a dyn Forge,
    language: Option<&'a str>,
}

impl<'a> FileLocator<'a> {
    /// Create a locator. `language` restricts code search when set.
    pub fn new(forge: &'a dyn Forge, language: Option<&'a str>) -> Self {
        Self { forge, language }
    }

    /// Resolve `target` into zero or more files.
    ///
    /// A search with no hits is not an error.
    pub async fn resolve(&self, target: &Target) -> Result<Vec<FileMatch>, LocateError> {
        match target {
            Target::Path { local, remote } => Ok(vec![read_local(local, remote)?]),
            Target::Search { query } => self.search(query).await,
        }
    }

    async fn search(&self, text: &str) -> Result<Vec<FileMatch>, LocateError> {
        let coords = self.forge.coordinates();
        let query = SearchQuery::new(text, self.language, coords);
        let repo = coords.full_name();

        let hits = self
            .forge
            .search_code(&query)
            .await
            .map_err(LocateError::Search)?;
        let total = hits.len();

        let mut matches = Vec::new();
        for hit in hits.into_iter().filter(|h| h.repository == repo) {
            let content = self
                .forge
                .get_blob_raw(&hit.sha)
                .await
                .map_err(|source| LocateError::Fetch {
                    path: hit.path.clone(),
                    sha: hit.sha.clone(),
                    source,
                })?;
            matches.push(FileMatch {
                path: hit.path,
                content,
            });
        }

        tracing::debug!(
            %query,
            hits = total,
            kept = matches.len(),
            "code search resolved"
        );
        Ok(matches)
    }
}

fn read_local(local: &Path, remote: &str) -> Result<FileMatch, LocateError> {
    let content = std::fs::read(local).map_err(|source| match source.kind() {
        io::ErrorKind::NotFound => LocateError::NotFound(local.to_path_buf()),
        _ => LocateError::Io {
            path: local.to_path_buf(),
            source,
        },
    })?;
    tracing::debug!(local = %local.display(), remote, bytes = content.len(), "read local file");
    Ok(FileMatch {
        path: remote.to_string(),
        content,
    })
}
