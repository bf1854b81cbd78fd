//! publish::commit
//!
//! Turns a batch of changes into a tree, then a commit on a branch.
//!
//! # Entry assembly
//!
//! Matches from every change are flattened in discovery order. When two
//! changes produce the same path, the later result replaces the earlier one
//! at the earlier position, so each path appears once per tree request.

use std::collections::HashMap;

use chrono::Utc;

use super::{PublishError, PublishOptions, PublishSettings, TreeBuildError};
use crate::change::Change;
use crate::forge::{Forge, NewCommit, Reference, Signature, Tree, TreeEntry};
use crate::locate::FileLocator;

/// One file in a proposed tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntrySummary {
    /// Path relative to the repository root
    pub path: String,
    /// Matches rewritten by the winning change
    pub matches: usize,
}

/// A tree created on the forge but not yet committed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProposedTree {
    pub tree: Tree,
    pub entries: Vec<EntrySummary>,
}

/// Builds trees and commits against one forge.
pub struct CommitBuilder<'a> {
    forge: &'a dyn Forge,
    settings: &'a PublishSettings,
    options: &'a PublishOptions,
}

impl<'a> CommitBuilder<'a> {
    pub fn new(
        forge: &'a dyn Forge,
        settings: &'a PublishSettings,
        options: &'a PublishOptions,
    ) -> Self {
        Self {
            forge,
            settings,
            options,
        }
    }

    /// Resolve and apply `changes`, then create a tree on top of the
    /// branch tip's tree.
    ///
    /// # Errors
    ///
    /// - `ParentLookup` if the tip commit cannot be read
    /// - `TreeBuild` if a target cannot be resolved or the tree is rejected
    /// - `NoChanges` if no change produced a file
    pub async fn make_changes(
        &self,
        branch: &Reference,
        changes: &[Change],
    ) -> Result<ProposedTree, PublishError> {
        self.options.check("tip commit lookup")?;
        let tip = self
            .forge
            .get_commit(&branch.target)
            .await
            .map_err(|source| PublishError::ParentLookup {
                branch: branch.name.to_string(),
                sha: branch.target.clone(),
                source,
            })?;

        let locator = FileLocator::new(self.forge, self.settings.language.as_deref());
        let mut entries: Vec<(TreeEntry, usize)> = Vec::new();
        let mut positions: HashMap<String, usize> = HashMap::new();

        for change in changes {
            self.options.check("target resolution")?;
            let found = locator
                .resolve(change.target())
                .await
                .map_err(|source| TreeBuildError::Locate {
                    target: change.target().to_string(),
                    source,
                })?;

            tracing::info!(change = %change.target(), files = found.len(), "resolved change");

            for file in found {
                let applied = change.apply_counted(&file.content);
                tracing::debug!(path = %file.path, matches = applied.matches, "applied replacement");

                let entry = (TreeEntry::file(file.path.clone(), applied.content), applied.matches);
                match positions.get(&file.path) {
                    Some(&at) => entries[at] = entry,
                    None => {
                        positions.insert(file.path, entries.len());
                        entries.push(entry);
                    }
                }
            }
        }

        if entries.is_empty() {
            return Err(PublishError::NoChanges);
        }

        let (tree_entries, summaries): (Vec<TreeEntry>, Vec<EntrySummary>) = entries
            .into_iter()
            .map(|(entry, matches)| {
                let summary = EntrySummary {
                    path: entry.path.clone(),
                    matches,
                };
                (entry, summary)
            })
            .unzip();

        self.options.check("tree creation")?;
        let tree = self
            .forge
            .create_tree(&tip.tree, &tree_entries)
            .await
            .map_err(|source| TreeBuildError::Create {
                base: tip.tree.clone(),
                source,
            })?;

        tracing::info!(tree = %tree.sha, base = %tip.tree, files = summaries.len(), "tree built");
        Ok(ProposedTree {
            tree,
            entries: summaries,
        })
    }

    /// Commit `tree` on top of the branch tip and fast-forward the branch.
    ///
    /// Returns the advanced reference.
    ///
    /// # Errors
    ///
    /// - `ParentLookup` if the tip commit cannot be read
    /// - `CurrentUser` if the author cannot be resolved
    /// - `CommitCreate` if the commit is rejected
    /// - `RefUpdate` if the branch cannot be advanced; the new commit is
    ///   left unreferenced
    pub async fn push(&self, branch: &Reference, tree: &Tree) -> Result<Reference, PublishError> {
        self.options.check("parent commit lookup")?;
        let parent = self
            .forge
            .get_commit(&branch.target)
            .await
            .map_err(|source| PublishError::ParentLookup {
                branch: branch.name.to_string(),
                sha: branch.target.clone(),
                source,
            })?;

        let author = self.author().await?;

        self.options.check("commit creation")?;
        let commit = self
            .forge
            .create_commit(&NewCommit {
                message: self.settings.message.clone(),
                tree: tree.sha.clone(),
                parents: vec![parent.sha],
                author,
            })
            .await
            .map_err(|source| PublishError::CommitCreate {
                tree: tree.sha.clone(),
                source,
            })?;
        tracing::info!(commit = %commit.sha, "commit created");

        self.options.check("branch update")?;
        let advanced = self
            .forge
            .update_ref(
                &Reference {
                    name: branch.name.clone(),
                    target: commit.sha.clone(),
                },
                false,
            )
            .await
            .map_err(|source| PublishError::RefUpdate {
                name: branch.name.to_string(),
                commit: commit.sha.clone(),
                source,
            })?;

        tracing::info!(branch = %advanced.name, tip = %advanced.target, "branch updated");
        Ok(advanced)
    }

    async fn author(&self) -> Result<Signature, PublishError> {
        self.options.check("user lookup")?;
        let user = self
            .forge
            .current_user()
            .await
            .map_err(PublishError::CurrentUser)?;

        Ok(Signature {
            email: user
                .email
                .unwrap_or_else(|| self.settings.author_fallback_email.clone()),
            name: user.login,
            date: Utc::now(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::change::LiteralReplace;
    use crate::core::types::RefName;
    use crate::forge::mock::{FailOn, MockForge};
    use crate::forge::ForgeError;

    fn main_ref(forge: &MockForge) -> Reference {
        Reference {
            name: RefName::new("refs/heads/main").unwrap(),
            target: forge.branch_tip("main").unwrap(),
        }
    }

    #[tokio::test]
    async fn later_change_wins_in_first_position() {
        let forge = MockForge::with_files(
            "o/r",
            "main",
            &[("a.txt", "foo"), ("b.txt", "foo")],
        );
        let settings = PublishSettings::default();
        let options = PublishOptions::default();
        let builder = CommitBuilder::new(&forge, &settings, &options);

        let changes = [
            Change::searching(LiteralReplace::new("foo", "one")),
            Change::searching(LiteralReplace::new("foo", "two")),
        ];
        let proposed = builder.make_changes(&main_ref(&forge), &changes).await.unwrap();

        let paths: Vec<_> = proposed.entries.iter().map(|e| e.path.as_str()).collect();
        assert_eq!(paths, vec!["a.txt", "b.txt"]);
        assert_eq!(
            forge.tree_paths(&proposed.tree.sha).unwrap(),
            vec!["a.txt", "b.txt"]
        );

        let advanced = builder.push(&main_ref(&forge), &proposed.tree).await.unwrap();
        assert_eq!(forge.file_at(&advanced.target, "a.txt").as_deref(), Some("two"));
        assert_eq!(forge.file_at(&advanced.target, "b.txt").as_deref(), Some("two"));
    }

    #[tokio::test]
    async fn empty_batch_is_no_changes() {
        let forge = MockForge::with_files("o/r", "main", &[("a.txt", "x")]);
        let settings = PublishSettings::default();
        let options = PublishOptions::default();
        let builder = CommitBuilder::new(&forge, &settings, &options);

        let changes = [Change::searching(LiteralReplace::new("absent", "y"))];
        let err = builder.make_changes(&main_ref(&forge), &changes).await.unwrap_err();
        assert!(matches!(err, PublishError::NoChanges));

        let err = builder.make_changes(&main_ref(&forge), &[]).await.unwrap_err();
        assert!(matches!(err, PublishError::NoChanges));
    }

    #[tokio::test]
    async fn tree_create_failure_is_tree_build() {
        let forge = MockForge::with_files("o/r", "main", &[("a.txt", "x")])
            .fail_on(FailOn::CreateTree(ForgeError::NetworkError("reset".into())));
        let settings = PublishSettings::default();
        let options = PublishOptions::default();
        let builder = CommitBuilder::new(&forge, &settings, &options);

        let changes = [Change::searching(LiteralReplace::new("x", "y"))];
        let err = builder.make_changes(&main_ref(&forge), &changes).await.unwrap_err();
        assert!(matches!(
            err,
            PublishError::TreeBuild(TreeBuildError::Create { .. })
        ));
    }

    #[tokio::test]
    async fn author_falls_back_to_configured_email() {
        let forge = MockForge::with_files("o/r", "main", &[("a.txt", "x")])
            .with_user("octocat", None);
        let settings = PublishSettings {
            author_fallback_email: "bot@example.com".into(),
            message: "Automated".into(),
            ..PublishSettings::default()
        };
        let options = PublishOptions::default();
        let builder = CommitBuilder::new(&forge, &settings, &options);
        let branch = main_ref(&forge);

        let changes = [Change::searching(LiteralReplace::new("x", "y"))];
        let proposed = builder.make_changes(&branch, &changes).await.unwrap();
        let advanced = builder.push(&branch, &proposed.tree).await.unwrap();

        let commit = forge.commit(&advanced.target).unwrap();
        assert_eq!(commit.author.name, "octocat");
        assert_eq!(commit.author.email, "bot@example.com");
        assert_eq!(commit.message, "Automated");
        assert_eq!(commit.parents, vec![branch.target]);
    }

    #[tokio::test]
    async fn user_lookup_failure_is_current_user() {
        let forge = MockForge::with_files("o/r", "main", &[("a.txt", "x")])
            .fail_on(FailOn::CurrentUser(ForgeError::AuthFailed("expired".into())));
        let settings = PublishSettings::default();
        let options = PublishOptions::default();
        let builder = CommitBuilder::new(&forge, &settings, &options);
        let branch = main_ref(&forge);

        let proposed = builder
            .make_changes(&branch, &[Change::searching(LiteralReplace::new("x", "y"))])
            .await
            .unwrap();
        let err = builder.push(&branch, &proposed.tree).await.unwrap_err();
        assert!(matches!(err, PublishError::CurrentUser(_)));
        assert_eq!(forge.branch_tip("main"), Some(branch.target));
    }
}
