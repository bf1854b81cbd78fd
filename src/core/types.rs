//! core::types
//!
//! Strong types for the values that cross the forge boundary.
//!
//! # Types
//!
//! - [`BranchName`] - Validated Git branch name
//! - [`RefName`] - Validated Git reference name (`refs/heads/...`)
//! - [`Oid`] - Git object identifier (SHA)
//! - [`RepoCoordinates`] - The `owner/repo` pair identifying a hosted repository
//!
//! # Validation
//!
//! These types enforce validity at construction time, so a request built
//! from them never reaches the hosting service with a malformed ref or SHA.
//!
//! # Examples
//!
//! ```
//! use forgepatch::core::types::{BranchName, Oid, RefName, RepoCoordinates};
//!
//! let branch = BranchName::new("feature/rename-foo").unwrap();
//! let refname = RefName::for_branch(&branch);
//! assert_eq!(refname.as_str(), "refs/heads/feature/rename-foo");
//!
//! let oid = Oid::new("abc123def4567890abc123def4567890abc12345").unwrap();
//! assert_eq!(oid.short(7), "abc123d");
//!
//! let coords: RepoCoordinates = "octocat/hello-world".parse().unwrap();
//! assert_eq!(coords.full_name(), "octocat/hello-world");
//!
//! assert!(BranchName::new("invalid..name").is_err());
//! assert!(Oid::new("not-a-sha").is_err());
//! ```

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;

/// Errors from type validation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid branch name: {0}")]
    InvalidBranchName(String),

    #[error("invalid object id: {0}")]
    InvalidOid(String),

    #[error("invalid ref name: {0}")]
    InvalidRefName(String),

    #[error("invalid repository '{0}': expected 'owner/repo'")]
    InvalidRepo(String),
}

/// Check a name against Git's refname rules (see `git check-ref-format`).
///
/// Returns a human-readable reason on failure; callers wrap it in the
/// error variant that matches what they were validating.
fn check_refname(name: &str) -> Result<(), String> {
    if name.is_empty() {
        return Err("cannot be empty".into());
    }
    if name == "@" {
        return Err("cannot be '@' (reserved)".into());
    }
    if name.starts_with('/') || name.starts_with('-') {
        return Err(format!("cannot start with '{}'", &name[..1]));
    }
    if name.ends_with('/') {
        return Err("cannot end with '/'".into());
    }
    for bad in ["..", "@{", "//"] {
        if name.contains(bad) {
            return Err(format!("cannot contain '{bad}'"));
        }
    }

    const INVALID_CHARS: [char; 8] = [' ', '~', '^', ':', '\\', '?', '*', '['];
    if let Some(c) = name.chars().find(|c| INVALID_CHARS.contains(c)) {
        return Err(format!("cannot contain '{c}'"));
    }
    if name.chars().any(|c| c.is_ascii_control()) {
        return Err("cannot contain control characters".into());
    }

    for component in name.split('/') {
        if component.starts_with('.') {
            return Err("path component cannot start with '.'".into());
        }
        if component.ends_with(".lock") {
            return Err("path component cannot end with '.lock'".into());
        }
    }

    Ok(())
}

/// A validated Git branch name.
///
/// # Example
///
/// ```
/// use forgepatch::core::types::BranchName;
///
/// let name = BranchName::new("feature/my-branch").unwrap();
/// assert_eq!(name.as_str(), "feature/my-branch");
///
/// assert!(BranchName::new("").is_err());
/// assert!(BranchName::new(".hidden").is_err());
/// assert!(BranchName::new("branch.lock").is_err());
/// assert!(BranchName::new("has space").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct BranchName(String);

impl BranchName {
    /// Create a new validated branch name.
    ///
    /// # Errors
    ///
    /// Returns `TypeError::InvalidBranchName` if the name violates Git's refname rules.
    pub fn new(name: impl Into<String>) -> Result<Self, TypeError> {
        let name = name.into();
        check_refname(&name)
            .map_err(|reason| TypeError::InvalidBranchName(format!("'{name}' {reason}")))?;
        Ok(Self(name))
    }

    /// Get the branch name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for BranchName {
    type Error = TypeError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<BranchName> for String {
    fn from(name: BranchName) -> Self {
        name.0
    }
}

impl std::fmt::Display for BranchName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A validated Git reference name.
///
/// # Example
///
/// ```
/// use forgepatch::core::types::{BranchName, RefName};
///
/// let branch = BranchName::new("main").unwrap();
/// let refname = RefName::for_branch(&branch);
/// assert_eq!(refname.as_str(), "refs/heads/main");
/// assert_eq!(refname.branch_name(), Some("main"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RefName(String);

impl RefName {
    const HEADS_PREFIX: &'static str = "refs/heads/";

    /// Create a new validated ref name.
    ///
    /// # Errors
    ///
    /// Returns `TypeError::InvalidRefName` if the name violates Git's refname
    /// rules or does not live under `refs/`.
    pub fn new(name: impl Into<String>) -> Result<Self, TypeError> {
        let name = name.into();
        check_refname(&name)
            .map_err(|reason| TypeError::InvalidRefName(format!("'{name}' {reason}")))?;
        if !name.starts_with("refs/") {
            return Err(TypeError::InvalidRefName(format!(
                "'{name}' must start with 'refs/'"
            )));
        }
        Ok(Self(name))
    }

    /// Create a ref name for a branch (`refs/heads/<branch>`).
    pub fn for_branch(branch: &BranchName) -> Self {
        Self(format!("{}{}", Self::HEADS_PREFIX, branch.as_str()))
    }

    /// The branch part of a `refs/heads/` ref, if this is one.
    pub fn branch_name(&self) -> Option<&str> {
        self.0.strip_prefix(Self::HEADS_PREFIX)
    }

    /// The ref without its leading `refs/`, as used in GitHub ref URLs.
    pub fn short_path(&self) -> &str {
        self.0.strip_prefix("refs/").unwrap_or(&self.0)
    }

    /// Get the ref name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for RefName {
    type Error = TypeError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<RefName> for String {
    fn from(name: RefName) -> Self {
        name.0
    }
}

impl std::fmt::Display for RefName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A Git object identifier (SHA-1 or SHA-256).
///
/// OIDs are normalized to lowercase for consistency.
///
/// # Example
///
/// ```
/// use forgepatch::core::types::Oid;
///
/// let oid = Oid::new("ABC123DEF4567890ABC123DEF4567890ABC12345").unwrap();
/// assert_eq!(oid.as_str(), "abc123def4567890abc123def4567890abc12345");
/// assert_eq!(oid.short(7), "abc123d");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Oid(String);

impl Oid {
    /// Create a new validated object id.
    ///
    /// # Errors
    ///
    /// Returns `TypeError::InvalidOid` if the string is not a 40 or 64
    /// character hex string.
    pub fn new(oid: impl Into<String>) -> Result<Self, TypeError> {
        let oid = oid.into().to_ascii_lowercase();
        if oid.len() != 40 && oid.len() != 64 {
            return Err(TypeError::InvalidOid(format!(
                "expected 40 or 64 hex characters, got {}",
                oid.len()
            )));
        }
        if !oid.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(TypeError::InvalidOid(
                "object id must be hexadecimal".into(),
            ));
        }
        Ok(Self(oid))
    }

    /// Content-address an object the way Git does (`<kind> <len>\0<body>`),
    /// using SHA-256.
    ///
    /// Used by the in-memory forge to give objects stable identities.
    ///
    /// ```
    /// use forgepatch::core::types::Oid;
    ///
    /// let a = Oid::hash_object("blob", b"hello");
    /// assert_eq!(a, Oid::hash_object("blob", b"hello"));
    /// assert_ne!(a, Oid::hash_object("tree", b"hello"));
    /// assert_eq!(a.as_str().len(), 64);
    /// ```
    pub fn hash_object(kind: &str, body: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(format!("{} {}\0", kind, body.len()).as_bytes());
        hasher.update(body);
        Self(hex::encode(hasher.finalize()))
    }

    /// Get an abbreviated form of the OID.
    pub fn short(&self, len: usize) -> &str {
        let end = len.min(self.0.len());
        &self.0[..end]
    }

    /// Get the object id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Oid {
    type Error = TypeError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<Oid> for String {
    fn from(oid: Oid) -> Self {
        oid.0
    }
}

impl std::fmt::Display for Oid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// The `owner/repo` pair identifying a hosted repository.
///
/// Parses the bare `owner/repo` form as well as GitHub SSH and HTTPS
/// remote URLs.
///
/// ```
/// use forgepatch::core::types::RepoCoordinates;
///
/// let c: RepoCoordinates = "git@github.com:octocat/hello-world.git".parse().unwrap();
/// assert_eq!(c.owner(), "octocat");
/// assert_eq!(c.repo(), "hello-world");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RepoCoordinates {
    owner: String,
    repo: String,
}

impl RepoCoordinates {
    /// Create coordinates from their parts.
    ///
    /// # Errors
    ///
    /// Returns `TypeError::InvalidRepo` if either part is empty or contains `/`.
    pub fn new(owner: impl Into<String>, repo: impl Into<String>) -> Result<Self, TypeError> {
        let owner = owner.into();
        let repo = repo.into();
        let valid = |s: &str| !s.is_empty() && !s.contains('/') && !s.contains(char::is_whitespace);
        if !valid(&owner) || !valid(&repo) {
            return Err(TypeError::InvalidRepo(format!("{owner}/{repo}")));
        }
        Ok(Self { owner, repo })
    }

    /// Repository owner (user or organization).
    pub fn owner(&self) -> &str {
        &self.owner
    }

    /// Repository name.
    pub fn repo(&self) -> &str {
        &self.repo
    }

    /// `owner/repo`, the form GitHub reports as `full_name`.
    pub fn full_name(&self) -> String {
        format!("{}/{}", self.owner, self.repo)
    }
}

impl FromStr for RepoCoordinates {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let rest = s
            .strip_prefix("git@github.com:")
            .or_else(|| s.strip_prefix("https://github.com/"))
            .or_else(|| s.strip_prefix("http://github.com/"))
            .unwrap_or(s);
        let rest = rest.strip_suffix(".git").unwrap_or(rest);

        match rest.split_once('/') {
            Some((owner, repo)) => {
                Self::new(owner, repo).map_err(|_| TypeError::InvalidRepo(s.to_string()))
            }
            None => Err(TypeError::InvalidRepo(s.to_string())),
        }
    }
}

impl std::fmt::Display for RepoCoordinates {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.owner, self.repo)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod branch_name {
        use super::*;

        #[test]
        fn accepts_common_names() {
            for name in ["main", "feature/x", "user@feature", "v1.2.3", "a_b-c"] {
                assert!(BranchName::new(name).is_ok(), "{name} should be valid");
            }
        }

        #[test]
        fn rejects_invalid_names() {
            for name in [
                "", "@", ".hidden", "-dash", "trail/", "a..b", "a@{b", "a//b", "has space",
                "col:on", "x.lock", "a/.b", "tab\there",
            ] {
                assert!(BranchName::new(name).is_err(), "{name:?} should be invalid");
            }
        }

        #[test]
        fn error_names_the_branch() {
            let err = BranchName::new("bad name").unwrap_err();
            assert!(err.to_string().contains("bad name"));
        }

        #[test]
        fn serde_roundtrip_validates() {
            let parsed: Result<BranchName, _> = serde_json::from_str("\"a..b\"");
            assert!(parsed.is_err());
            let ok: BranchName = serde_json::from_str("\"main\"").unwrap();
            assert_eq!(ok.as_str(), "main");
        }
    }

    mod ref_name {
        use super::*;

        #[test]
        fn for_branch_prefixes_heads() {
            let branch = BranchName::new("feature/foo").unwrap();
            let r = RefName::for_branch(&branch);
            assert_eq!(r.as_str(), "refs/heads/feature/foo");
            assert_eq!(r.branch_name(), Some("feature/foo"));
            assert_eq!(r.short_path(), "heads/feature/foo");
        }

        #[test]
        fn requires_refs_namespace() {
            assert!(RefName::new("heads/main").is_err());
            assert!(RefName::new("refs/tags/v1").is_ok());
        }

        #[test]
        fn branch_name_none_for_tags() {
            let r = RefName::new("refs/tags/v1").unwrap();
            assert_eq!(r.branch_name(), None);
        }
    }

    mod oid {
        use super::*;

        #[test]
        fn normalizes_case() {
            let oid = Oid::new("ABCDEF1234567890ABCDEF1234567890ABCDEF12").unwrap();
            assert_eq!(oid.as_str(), "abcdef1234567890abcdef1234567890abcdef12");
        }

        #[test]
        fn rejects_bad_length_and_chars() {
            assert!(Oid::new("abc").is_err());
            assert!(Oid::new("g".repeat(40)).is_err());
            assert!(Oid::new("a".repeat(64)).is_ok());
        }

        #[test]
        fn short_clamps() {
            let oid = Oid::new("a".repeat(40)).unwrap();
            assert_eq!(oid.short(100).len(), 40);
        }

        #[test]
        fn hash_object_is_valid_oid() {
            let oid = Oid::hash_object("commit", b"body");
            assert!(Oid::new(oid.as_str()).is_ok());
        }
    }

    mod repo_coordinates {
        use super::*;

        #[test]
        fn parses_bare_pair() {
            let c: RepoCoordinates = "octocat/hello-world".parse().unwrap();
            assert_eq!(c.owner(), "octocat");
            assert_eq!(c.repo(), "hello-world");
            assert_eq!(c.to_string(), "octocat/hello-world");
        }

        #[test]
        fn parses_remote_urls() {
            for url in [
                "git@github.com:octocat/hello-world.git",
                "git@github.com:octocat/hello-world",
                "https://github.com/octocat/hello-world.git",
                "http://github.com/octocat/hello-world",
            ] {
                let c: RepoCoordinates = url.parse().unwrap();
                assert_eq!(c.full_name(), "octocat/hello-world", "{url}");
            }
        }

        #[test]
        fn keeps_dots_in_repo_name() {
            let c: RepoCoordinates = "owner/repo.name".parse().unwrap();
            assert_eq!(c.repo(), "repo.name");
        }

        #[test]
        fn rejects_malformed() {
            for s in ["", "owner", "owner/", "/repo", "a/b/c", "https://github.com/owner"] {
                assert!(s.parse::<RepoCoordinates>().is_err(), "{s:?}");
            }
        }
    }
}
