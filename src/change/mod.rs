//! change
//!
//! A [`Change`] pairs a target (where to look) with a [`Replacement`]
//! (what to do with the content found there).
//!
//! # Targets
//!
//! - [`Target::Path`]: a local file, published under the same or a
//!   different path in the remote repository (`local` or `local:remote`).
//! - [`Target::Search`]: every file in the remote repository that code
//!   search finds for a text fragment.
//!
//! # Example
//!
//! ```
//! use forgepatch::change::{Change, LiteralReplace, Target};
//!
//! let change = Change::for_file("docs/old.md:docs/new.md", LiteralReplace::new("foo", "bar")).unwrap();
//! assert!(matches!(change.target(), Target::Path { remote, .. } if remote == "docs/new.md"));
//! assert_eq!(change.apply(b"foo foo baz"), "bar bar baz");
//!
//! let search = Change::searching(LiteralReplace::new("FooService", "BarService"));
//! assert!(matches!(search.target(), Target::Search { query } if query == "FooService"));
//! ```

mod replacement;

pub use replacement::{LiteralReplace, Replacement};

use std::path::PathBuf;
use std::sync::Arc;

use thiserror::Error;

/// Errors from constructing a change.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ChangeError {
    /// The target key cannot name a file.
    #[error("invalid target '{target}': {reason}")]
    InvalidTarget { target: String, reason: String },
}

/// Where a change finds its files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    /// A local file published under `remote` in the repository.
    Path { local: PathBuf, remote: String },
    /// Every file code search returns for `query`.
    Search { query: String },
}

impl Target {
    /// Parse a `local` or `local:remote` file argument.
    ///
    /// Without an explicit remote half the local path doubles as the remote
    /// path, minus any leading `./`.
    ///
    /// # Errors
    ///
    /// Returns `ChangeError::InvalidTarget` if either half is empty, the key
    /// has more than one `:` or the remote path would be absolute.
    pub fn parse_path(arg: &str) -> Result<Self, ChangeError> {
        let invalid = |reason: &str| ChangeError::InvalidTarget {
            target: arg.to_string(),
            reason: reason.to_string(),
        };

        let (local, remote) = match arg.split_once(':') {
            Some((_, remote)) if remote.contains(':') => {
                return Err(invalid("expected at most one ':' between local and remote"))
            }
            Some((local, remote)) => (local, remote),
            None => (arg, arg),
        };

        if local.is_empty() {
            return Err(invalid("local path is empty"));
        }

        let mut remote = remote;
        while let Some(rest) = remote.strip_prefix("./") {
            remote = rest;
        }
        if remote.is_empty() {
            return Err(invalid("remote path is empty"));
        }
        if remote.starts_with('/') {
            return Err(invalid(
                "remote path cannot be absolute; use 'local:remote' to name it",
            ));
        }

        Ok(Target::Path {
            local: PathBuf::from(local),
            remote: remote.to_string(),
        })
    }
}

impl std::fmt::Display for Target {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Target::Path { local, remote } if local.as_os_str() == remote.as_str() => {
                write!(f, "{}", remote)
            }
            Target::Path { local, remote } => write!(f, "{} -> {}", local.display(), remote),
            Target::Search { query } => write!(f, "search '{}'", query),
        }
    }
}

/// The result of applying a change to one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Applied {
    /// Transformed file content.
    pub content: String,
    /// Number of matches the replacement rewrote.
    pub matches: usize,
}

/// A target bound to a replacement. Immutable once built.
#[derive(Debug, Clone)]
pub struct Change {
    target: Target,
    replacement: Arc<dyn Replacement>,
}

impl Change {
    /// Bind a replacement to an explicit target.
    pub fn new(target: Target, replacement: impl Replacement + 'static) -> Self {
        Self {
            target,
            replacement: Arc::new(replacement),
        }
    }

    /// A change for a local file given as `local` or `local:remote`.
    pub fn for_file(
        arg: &str,
        replacement: impl Replacement + 'static,
    ) -> Result<Self, ChangeError> {
        Ok(Self::new(Target::parse_path(arg)?, replacement))
    }

    /// A search-driven change that looks for the replacement's own search text.
    pub fn searching(replacement: impl Replacement + 'static) -> Self {
        let query = replacement.search_text().to_string();
        Self::new(Target::Search { query }, replacement)
    }

    /// Where this change finds its files.
    pub fn target(&self) -> &Target {
        &self.target
    }

    /// The bound replacement.
    pub fn replacement(&self) -> &dyn Replacement {
        self.replacement.as_ref()
    }

    /// Transform raw file bytes and return the new text.
    ///
    /// Bytes are decoded as UTF-8; invalid sequences become U+FFFD.
    pub fn apply(&self, raw: &[u8]) -> String {
        self.apply_counted(raw).content
    }

    /// Like [`Change::apply`], keeping the match count.
    pub fn apply_counted(&self, raw: &[u8]) -> Applied {
        let text = String::from_utf8_lossy(raw);
        let (content, matches) = self.replacement.replace(&text);
        Applied { content, matches }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod parse_path {
        use super::*;

        #[test]
        fn single_path_is_both_halves() {
            let t = Target::parse_path("src/main.go").unwrap();
            assert_eq!(
                t,
                Target::Path {
                    local: PathBuf::from("src/main.go"),
                    remote: "src/main.go".to_string()
                }
            );
        }

        #[test]
        fn local_remote_pair() {
            let t = Target::parse_path("/tmp/new.txt:docs/readme.txt").unwrap();
            assert_eq!(
                t,
                Target::Path {
                    local: PathBuf::from("/tmp/new.txt"),
                    remote: "docs/readme.txt".to_string()
                }
            );
        }

        #[test]
        fn strips_leading_dot_slash_from_remote() {
            let t = Target::parse_path("./a/b.txt").unwrap();
            assert!(matches!(t, Target::Path { ref remote, .. } if remote == "a/b.txt"));
        }

        #[test]
        fn rejects_empty_halves() {
            assert!(Target::parse_path("").is_err());
            assert!(Target::parse_path(":remote").is_err());
            assert!(Target::parse_path("local:").is_err());
            assert!(Target::parse_path("local:./").is_err());
        }

        #[test]
        fn rejects_more_than_one_separator() {
            let err = Target::parse_path("a:b:c").unwrap_err();
            assert!(err.to_string().contains("at most one ':'"));
            assert!(Target::parse_path("a::b").is_err());
        }

        #[test]
        fn rejects_absolute_remote() {
            let err = Target::parse_path("/etc/hosts").unwrap_err();
            assert!(err.to_string().contains("absolute"));
        }
    }

    #[test]
    fn target_display() {
        assert_eq!(Target::parse_path("a.txt").unwrap().to_string(), "a.txt");
        assert_eq!(Target::parse_path("a.txt:b.txt").unwrap().to_string(), "a.txt -> b.txt");
        assert_eq!(
            Target::Search { query: "foo".into() }.to_string(),
            "search 'foo'"
        );
    }

    #[test]
    fn apply_transforms_bytes() {
        let change = Change::for_file("a.txt", LiteralReplace::new("foo", "bar")).unwrap();
        assert_eq!(change.apply(b"foo foo baz"), "bar bar baz");
    }

    #[test]
    fn apply_counted_reports_matches() {
        let change = Change::searching(LiteralReplace::new("x", "y"));
        let applied = change.apply_counted(b"x.x.x");
        assert_eq!(applied.content, "y.y.y");
        assert_eq!(applied.matches, 3);
    }

    #[test]
    fn apply_is_pure() {
        let change = Change::searching(LiteralReplace::new("a", "b"));
        let raw = b"aaa".to_vec();
        let first = change.apply(&raw);
        let second = change.apply(&raw);
        assert_eq!(first, second);
        assert_eq!(raw, b"aaa");
    }

    #[test]
    fn apply_decodes_invalid_utf8_lossily() {
        let change = Change::searching(LiteralReplace::new("ok", "fine"));
        let out = change.apply(&[b'o', b'k', 0xff]);
        assert_eq!(out, "fine\u{fffd}");
    }

    #[test]
    fn searching_uses_search_text() {
        let change = Change::searching(LiteralReplace::new("needle", "pin"));
        assert_eq!(
            change.target(),
            &Target::Search {
                query: "needle".to_string()
            }
        );
        assert_eq!(change.replacement().search_text(), "needle");
    }
}
