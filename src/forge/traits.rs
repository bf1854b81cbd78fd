//! forge::traits
//!
//! Forge trait definition for the hosting service's git data API.
//!
//! # Design
//!
//! The `Forge` trait is async because every operation is a network call.
//! A forge is bound to one repository at construction, so no method takes
//! owner/repo coordinates. All methods return `Result` and never retry;
//! callers decide what a failure means.
//!
//! # Example
//!
//! ```ignore
//! use forgepatch::forge::{Forge, ForgeError};
//! use forgepatch::core::types::{BranchName, RefName};
//!
//! async fn tip(forge: &dyn Forge) -> Result<(), ForgeError> {
//!     let main = RefName::for_branch(&BranchName::new("main").unwrap());
//!     let reference = forge.get_ref(&main).await?;
//!     let commit = forge.get_commit(&reference.target).await?;
//!     println!("{} is at {} (tree {})", main, commit.sha, commit.tree);
//!     Ok(())
//! }
//! ```

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::core::types::{Oid, RefName, RepoCoordinates};

/// Errors from forge operations.
///
/// These error types map to common failure modes when interacting
/// with remote hosting services like GitHub.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ForgeError {
    /// No credential was available for the request.
    #[error("authentication required")]
    AuthRequired,

    /// Authentication failed (invalid token, expired, insufficient permissions).
    #[error("authentication failed: {0}")]
    AuthFailed(String),

    /// The requested resource was not found.
    #[error("not found: {0}")]
    NotFound(String),

    /// Rate limit exceeded.
    #[error("rate limited")]
    RateLimited,

    /// API returned an error.
    #[error("API error: {status} - {message}")]
    ApiError {
        /// HTTP status code
        status: u16,
        /// Error message from the API
        message: String,
    },

    /// Network or connection error.
    #[error("network error: {0}")]
    NetworkError(String),
}

impl ForgeError {
    /// Whether this error means the resource does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self, ForgeError::NotFound(_))
    }
}

/// A named pointer into the commit graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reference {
    /// Full ref name (`refs/heads/<branch>`)
    pub name: RefName,
    /// Commit the ref points at
    pub target: Oid,
}

/// Commit author or committer identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signature {
    pub name: String,
    pub email: String,
    pub date: DateTime<Utc>,
}

/// A commit as stored by the forge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Commit {
    /// Commit SHA
    pub sha: Oid,
    /// Root tree SHA
    pub tree: Oid,
    /// Parent commit SHAs
    pub parents: Vec<Oid>,
    /// Commit message
    pub message: String,
    /// Author
    pub author: Signature,
}

/// Request to create a commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCommit {
    pub message: String,
    pub tree: Oid,
    pub parents: Vec<Oid>,
    pub author: Signature,
}

/// File mode for a regular, non-executable blob.
pub const MODE_FILE: &str = "100644";

/// One file's content in a tree-create request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeEntry {
    /// Path relative to the repository root
    pub path: String,
    /// Git file mode
    pub mode: &'static str,
    /// Object type (always `blob` here)
    pub kind: &'static str,
    /// Full file content
    pub content: String,
}

impl TreeEntry {
    /// A regular file entry.
    pub fn file(path: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            mode: MODE_FILE,
            kind: "blob",
            content: content.into(),
        }
    }
}

/// A tree created by the forge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tree {
    pub sha: Oid,
}

/// The authenticated account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub login: String,
    /// Public email, if the account exposes one
    pub email: Option<String>,
}

/// A code search result that has been located but not fetched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchHit {
    /// Path of the file inside its repository
    pub path: String,
    /// Blob SHA of the matching file version
    pub sha: Oid,
    /// `owner/repo` of the repository that contains the file
    pub repository: String,
}

/// An in-file code search scoped to one repository.
///
/// Renders as `<text>+in:file[+language:<lang>]+repo:<owner>/<repo>`; the
/// `+` separators are spaces once URL-decoded by the search endpoint.
///
/// ```
/// use forgepatch::forge::SearchQuery;
///
/// let coords = "octocat/hello".parse().unwrap();
/// let q = SearchQuery::new("FooService", Some("go"), &coords);
/// assert_eq!(q.to_string(), "FooService+in:file+language:go+repo:octocat/hello");
/// assert_eq!(q.terms(), "FooService in:file language:go repo:octocat/hello");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    text: String,
    language: Option<String>,
    repo: String,
}

impl SearchQuery {
    /// Build a query for `text` inside `repo`.
    pub fn new(text: impl Into<String>, language: Option<&str>, repo: &RepoCoordinates) -> Self {
        Self {
            text: text.into(),
            language: language.map(str::to_string),
            repo: repo.full_name(),
        }
    }

    /// The searched-for fragment.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Language qualifier, if any.
    pub fn language(&self) -> Option<&str> {
        self.language.as_deref()
    }

    /// The `owner/repo` the search is scoped to.
    pub fn repo(&self) -> &str {
        &self.repo
    }

    fn parts(&self) -> Vec<String> {
        let mut parts = vec![self.text.clone(), "in:file".to_string()];
        if let Some(lang) = &self.language {
            parts.push(format!("language:{}", lang));
        }
        parts.push(format!("repo:{}", self.repo));
        parts
    }

    /// Space-separated terms, ready to be form-encoded as the `q` parameter.
    pub fn terms(&self) -> String {
        self.parts().join(" ")
    }
}

impl std::fmt::Display for SearchQuery {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.parts().join("+"))
    }
}

/// The Forge trait for a hosting service's git data and search APIs.
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync` so one handle can serve
/// independent publishes concurrently. Two publishes racing on the same
/// branch must be serialized by the caller.
///
/// # Error Handling
///
/// All methods return `Result<T, ForgeError>`. `NotFound` is an expected
/// outcome for `get_ref` on a branch that does not exist yet.
#[async_trait]
pub trait Forge: Send + Sync {
    /// Get the forge name (e.g., "github").
    fn name(&self) -> &'static str;

    /// The repository this forge is bound to.
    fn coordinates(&self) -> &RepoCoordinates;

    /// Name of the repository's default branch.
    async fn default_branch(&self) -> Result<String, ForgeError>;

    /// Read a reference.
    ///
    /// # Errors
    ///
    /// - `NotFound` if the ref does not exist
    async fn get_ref(&self, name: &RefName) -> Result<Reference, ForgeError>;

    /// Create a reference pointing at `target`.
    ///
    /// # Errors
    ///
    /// - `ApiError` with status 422 if the ref already exists
    async fn create_ref(&self, name: &RefName, target: &Oid) -> Result<Reference, ForgeError>;

    /// Move a reference to `reference.target`.
    ///
    /// With `force == false` the update must be a fast-forward.
    ///
    /// # Errors
    ///
    /// - `NotFound` if the ref does not exist
    /// - `ApiError` with status 422 if the update is not a fast-forward
    async fn update_ref(&self, reference: &Reference, force: bool)
        -> Result<Reference, ForgeError>;

    /// Create a tree from `base_tree` with `entries` added or replaced.
    async fn create_tree(&self, base_tree: &Oid, entries: &[TreeEntry])
        -> Result<Tree, ForgeError>;

    /// Read a commit.
    async fn get_commit(&self, sha: &Oid) -> Result<Commit, ForgeError>;

    /// Create a commit object. Does not move any ref.
    async fn create_commit(&self, commit: &NewCommit) -> Result<Commit, ForgeError>;

    /// Search file contents.
    async fn search_code(&self, query: &SearchQuery) -> Result<Vec<SearchHit>, ForgeError>;

    /// Fetch a blob's raw bytes.
    async fn get_blob_raw(&self, sha: &Oid) -> Result<Vec<u8>, ForgeError>;

    /// The authenticated account.
    async fn current_user(&self) -> Result<User, ForgeError>;
}
