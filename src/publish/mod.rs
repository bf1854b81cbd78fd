//! publish
//!
//! The publish pipeline: resolve a branch, build a tree from a batch of
//! changes, commit it and advance the branch.
//!
//! # Lifecycle
//!
//! ```text
//! Resolved -> TreeBuilt -> CommitCreated -> RefUpdated
//! ```
//!
//! Each step runs once, in order. Nothing is retried and nothing is rolled
//! back: a failure after the tree or commit was created leaves those objects
//! unreferenced on the remote, and the error says which ones.
//!
//! # Example
//!
//! ```
//! use forgepatch::change::{Change, LiteralReplace};
//! use forgepatch::forge::mock::MockForge;
//! use forgepatch::publish::{PublishOptions, PublishSettings, Publisher};
//!
//! # tokio_test::block_on(async {
//! let forge = MockForge::with_files("o/r", "main", &[("a.txt", "foo foo baz")]);
//! let publisher = Publisher::new(&forge, PublishSettings::default(), PublishOptions::default());
//!
//! let change = Change::searching(LiteralReplace::new("foo", "bar"));
//! let report = publisher.publish("automation", &[change]).await.unwrap();
//!
//! assert!(report.created_branch);
//! assert_eq!(forge.file_at(&report.commit, "a.txt").as_deref(), Some("bar bar baz"));
//! # });
//! ```

mod branch;
mod commit;

pub use branch::BranchResolver;
pub use commit::{CommitBuilder, EntrySummary, ProposedTree};

use std::time::Duration;

use thiserror::Error;
use tokio::time::Instant;

use crate::change::Change;
use crate::core::config::{Config, DEFAULT_COMMIT_MESSAGE, DEFAULT_FALLBACK_EMAIL};
use crate::core::types::{Oid, TypeError};
use crate::forge::{Forge, ForgeError, Reference};
use crate::locate::LocateError;

/// Errors from building the tree for a batch.
#[derive(Debug, Error)]
pub enum TreeBuildError {
    /// A change's target could not be resolved.
    #[error("failed to resolve {target}")]
    Locate {
        target: String,
        #[source]
        source: LocateError,
    },

    /// The forge rejected the tree.
    #[error("failed to create tree on base {base}")]
    Create {
        base: Oid,
        #[source]
        source: ForgeError,
    },
}

/// Errors from the publish pipeline.
#[derive(Debug, Error)]
pub enum PublishError {
    /// The requested branch name is not a valid git ref component.
    #[error(transparent)]
    InvalidBranch(#[from] TypeError),

    /// A ref could not be read.
    #[error("failed to read {name}")]
    RefLookup {
        name: String,
        #[source]
        source: ForgeError,
    },

    /// The forge answered a ref lookup with a different ref.
    #[error("lookup of {requested} returned {returned}")]
    RefMismatch { requested: String, returned: String },

    /// A branch could not be created.
    #[error("failed to create {name} at {target}")]
    RefCreate {
        name: String,
        target: Oid,
        #[source]
        source: ForgeError,
    },

    /// The branch tip commit could not be read.
    #[error("failed to read tip commit {sha} of {branch}")]
    ParentLookup {
        branch: String,
        sha: Oid,
        #[source]
        source: ForgeError,
    },

    /// Tree construction failed.
    #[error(transparent)]
    TreeBuild(#[from] TreeBuildError),

    /// No change produced any file.
    #[error("no files matched; nothing to commit")]
    NoChanges,

    /// The authenticated user could not be resolved for the author.
    #[error("failed to resolve the authenticated user")]
    CurrentUser(#[source] ForgeError),

    /// The commit could not be created. The tree is left unreferenced.
    #[error("failed to create commit for tree {tree}")]
    CommitCreate {
        tree: Oid,
        #[source]
        source: ForgeError,
    },

    /// The branch could not be advanced. The commit is left unreferenced.
    #[error("failed to update {name} to {commit} (commit left unreferenced)")]
    RefUpdate {
        name: String,
        commit: Oid,
        #[source]
        source: ForgeError,
    },

    /// The deadline passed before a remote call.
    #[error("deadline exceeded before {step}")]
    Cancelled { step: &'static str },
}

/// Per-publish behavior that comes from configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishSettings {
    /// Commit message for the new commit
    pub message: String,
    /// Code search language qualifier
    pub language: Option<String>,
    /// Author email when the account has no public email
    pub author_fallback_email: String,
    /// Branch new branches start from, instead of the repository default
    pub base_branch: Option<String>,
}

impl Default for PublishSettings {
    fn default() -> Self {
        Self {
            message: DEFAULT_COMMIT_MESSAGE.to_string(),
            language: None,
            author_fallback_email: DEFAULT_FALLBACK_EMAIL.to_string(),
            base_branch: None,
        }
    }
}

impl PublishSettings {
    /// Settings from a loaded configuration.
    pub fn from_config(config: &Config) -> Self {
        Self {
            message: config.commit_message().to_string(),
            language: config.search_language().map(str::to_string),
            author_fallback_email: config.author_fallback_email().to_string(),
            base_branch: config.base_branch().map(str::to_string),
        }
    }
}

/// Options for one publish run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PublishOptions {
    /// No remote call starts after this instant.
    pub deadline: Option<Instant>,
}

impl PublishOptions {
    /// Options with a deadline `timeout` from now.
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            deadline: Some(Instant::now() + timeout),
        }
    }

    /// Fail with `Cancelled` if the deadline has passed.
    pub(crate) fn check(&self, step: &'static str) -> Result<(), PublishError> {
        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => {
                tracing::warn!(step, "deadline exceeded");
                Err(PublishError::Cancelled { step })
            }
            _ => Ok(()),
        }
    }
}

/// Outcome of a successful publish.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishReport {
    /// The advanced branch
    pub branch: Reference,
    /// Whether the branch was created by this run
    pub created_branch: bool,
    /// The new tree
    pub tree: Oid,
    /// The new commit
    pub commit: Oid,
    /// Files written, in order
    pub entries: Vec<EntrySummary>,
}

/// Runs the whole pipeline for one branch.
pub struct Publisher<'a> {
    forge: &'a dyn Forge,
    settings: PublishSettings,
    options: PublishOptions,
}

impl<'a> Publisher<'a> {
    pub fn new(forge: &'a dyn Forge, settings: PublishSettings, options: PublishOptions) -> Self {
        Self {
            forge,
            settings,
            options,
        }
    }

    /// Apply `changes` and commit the result on `branch`.
    ///
    /// The branch is created from the base branch if it does not exist.
    #[tracing::instrument(
        name = "publish",
        skip_all,
        fields(repo = %self.forge.coordinates(), branch = branch, changes = changes.len())
    )]
    pub async fn publish(
        &self,
        branch: &str,
        changes: &[Change],
    ) -> Result<PublishReport, PublishError> {
        let resolver = BranchResolver::new(
            self.forge,
            self.settings.base_branch.as_deref(),
            &self.options,
        );
        let (reference, created_branch) = resolver.get_or_create_branch(branch).await?;

        let builder = CommitBuilder::new(self.forge, &self.settings, &self.options);
        let proposed = builder.make_changes(&reference, changes).await?;
        let advanced = builder.push(&reference, &proposed.tree).await?;

        tracing::info!(
            commit = %advanced.target,
            files = proposed.entries.len(),
            created_branch,
            "published"
        );

        Ok(PublishReport {
            commit: advanced.target.clone(),
            branch: advanced,
            created_branch,
            tree: proposed.tree.sha,
            entries: proposed.entries,
        })
    }
}
