//! publish::branch
//!
//! Get-or-create for the branch a publish targets.

use super::{PublishError, PublishOptions};
use crate::core::types::{BranchName, RefName};
use crate::forge::{Forge, Reference};

/// Resolves a branch name to a reference, creating the branch when missing.
pub struct BranchResolver<'a> {
    forge: &'a dyn Forge,
    base_branch: Option<&'a str>,
    options: &'a PublishOptions,
}

impl<'a> BranchResolver<'a> {
    /// `base_branch` overrides the repository's default branch as the
    /// starting point for new branches.
    pub fn new(
        forge: &'a dyn Forge,
        base_branch: Option<&'a str>,
        options: &'a PublishOptions,
    ) -> Self {
        Self {
            forge,
            base_branch,
            options,
        }
    }

    /// Read `refs/heads/<name>`, creating it at the base branch tip if it
    /// does not exist.
    ///
    /// Returns the reference and whether it was created. Calling this
    /// twice is idempotent: the second call returns the first call's ref.
    ///
    /// # Errors
    ///
    /// - `InvalidBranch` if `name` is not a valid branch name
    /// - `RefLookup` if the branch or the base branch cannot be read
    /// - `RefMismatch` if the forge answers with a ref other than the one asked for
    /// - `RefCreate` if the branch cannot be created
    pub async fn get_or_create_branch(
        &self,
        name: &str,
    ) -> Result<(Reference, bool), PublishError> {
        let branch = RefName::for_branch(&BranchName::new(name)?);

        self.options.check("branch lookup")?;
        match self.forge.get_ref(&branch).await {
            Ok(reference) => {
                let reference = same_ref(&branch, reference)?;
                tracing::debug!(branch = %branch, tip = %reference.target, "branch exists");
                return Ok((reference, false));
            }
            Err(e) if e.is_not_found() => {}
            Err(source) => {
                return Err(PublishError::RefLookup {
                    name: branch.to_string(),
                    source,
                })
            }
        }

        let base = self.base_ref().await?;

        self.options.check("base branch lookup")?;
        let base_tip = self
            .forge
            .get_ref(&base)
            .await
            .map_err(|source| PublishError::RefLookup {
                name: base.to_string(),
                source,
            })
            .and_then(|reference| same_ref(&base, reference))?;

        self.options.check("branch creation")?;
        let created = self
            .forge
            .create_ref(&branch, &base_tip.target)
            .await
            .map_err(|source| PublishError::RefCreate {
                name: branch.to_string(),
                target: base_tip.target.clone(),
                source,
            })
            .and_then(|reference| same_ref(&branch, reference))?;

        tracing::info!(
            branch = %branch,
            base = %base,
            tip = %created.target,
            "created branch"
        );
        Ok((created, true))
    }

    async fn base_ref(&self) -> Result<RefName, PublishError> {
        let name = match self.base_branch {
            Some(name) => name.to_string(),
            None => {
                self.options.check("default branch lookup")?;
                self.forge
                    .default_branch()
                    .await
                    .map_err(|source| PublishError::RefLookup {
                        name: format!("default branch of {}", self.forge.coordinates()),
                        source,
                    })?
            }
        };
        Ok(RefName::for_branch(&BranchName::new(name)?))
    }
}

/// Reject a reference whose name differs from the one requested.
fn same_ref(requested: &RefName, reference: Reference) -> Result<Reference, PublishError> {
    if reference.name == *requested {
        Ok(reference)
    } else {
        Err(PublishError::RefMismatch {
            requested: requested.to_string(),
            returned: reference.name.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forge::mock::{FailOn, MockForge, MockOperation};
    use crate::forge::ForgeError;

    #[tokio::test]
    async fn existing_branch_is_returned_unchanged() {
        let forge = MockForge::with_files("o/r", "main", &[("a", "a")]);
        let options = PublishOptions::default();
        let resolver = BranchResolver::new(&forge, None, &options);

        let (reference, created) = resolver.get_or_create_branch("main").await.unwrap();
        assert!(!created);
        assert_eq!(Some(reference.target), forge.branch_tip("main"));
        assert!(!forge
            .operations()
            .iter()
            .any(|op| matches!(op, MockOperation::CreateRef { .. })));
    }

    #[tokio::test]
    async fn missing_branch_is_created_at_default_tip() {
        let forge = MockForge::with_files("o/r", "trunk", &[("a", "a")]);
        let tip = forge.branch_tip("trunk").unwrap();
        let options = PublishOptions::default();
        let resolver = BranchResolver::new(&forge, None, &options);

        let (reference, created) = resolver.get_or_create_branch("auto/rename").await.unwrap();
        assert!(created);
        assert_eq!(reference.name.as_str(), "refs/heads/auto/rename");
        assert_eq!(reference.target, tip);

        let (again, created_again) = resolver.get_or_create_branch("auto/rename").await.unwrap();
        assert!(!created_again);
        assert_eq!(again, reference);
    }

    #[tokio::test]
    async fn base_override_is_used() {
        let forge = MockForge::with_files("o/r", "main", &[("a", "a")]);
        let dev_tip = forge.seed_commit("develop", &[("b", "b")], "dev");
        let options = PublishOptions::default();
        let resolver = BranchResolver::new(&forge, Some("develop"), &options);

        let (reference, _) = resolver.get_or_create_branch("feature").await.unwrap();
        assert_eq!(reference.target, dev_tip);
        assert!(!forge.operations().contains(&MockOperation::DefaultBranch));
    }

    #[tokio::test]
    async fn invalid_name_is_rejected_before_any_call() {
        let forge = MockForge::with_files("o/r", "main", &[]);
        let options = PublishOptions::default();
        let resolver = BranchResolver::new(&forge, None, &options);

        let err = resolver.get_or_create_branch("bad..name").await.unwrap_err();
        assert!(matches!(err, PublishError::InvalidBranch(_)));
        assert!(forge.operations().is_empty());
    }

    #[tokio::test]
    async fn missing_base_is_ref_lookup() {
        let forge = MockForge::with_files("o/r", "main", &[]);
        let options = PublishOptions::default();
        let resolver = BranchResolver::new(&forge, Some("gone"), &options);

        let err = resolver.get_or_create_branch("feature").await.unwrap_err();
        assert!(matches!(err, PublishError::RefLookup { ref name, .. } if name == "refs/heads/gone"));
    }

    #[tokio::test]
    async fn lookup_error_other_than_not_found_is_fatal() {
        let forge = MockForge::with_files("o/r", "main", &[])
            .fail_on(FailOn::GetRef(ForgeError::RateLimited));
        let options = PublishOptions::default();
        let resolver = BranchResolver::new(&forge, None, &options);

        let err = resolver.get_or_create_branch("feature").await.unwrap_err();
        assert!(matches!(
            err,
            PublishError::RefLookup {
                source: ForgeError::RateLimited,
                ..
            }
        ));
        assert_eq!(forge.operations().len(), 1);
    }

    #[test]
    fn returned_ref_must_match_request() {
        let requested = RefName::new("refs/heads/fix#1").unwrap();
        let target = crate::core::types::Oid::hash_object("commit", b"x");

        let same = Reference {
            name: requested.clone(),
            target: target.clone(),
        };
        assert_eq!(same_ref(&requested, same.clone()).unwrap(), same);

        let other = Reference {
            name: RefName::new("refs/heads/fix").unwrap(),
            target,
        };
        assert!(matches!(
            same_ref(&requested, other),
            Err(PublishError::RefMismatch { .. })
        ));
    }

    #[tokio::test]
    async fn branch_with_hash_is_created_under_its_own_name() {
        let forge = MockForge::with_files("o/r", "main", &[("a", "a")]);
        let options = PublishOptions::default();
        let resolver = BranchResolver::new(&forge, None, &options);

        let (reference, created) = resolver.get_or_create_branch("fix#1").await.unwrap();
        assert!(created);
        assert_eq!(reference.name.as_str(), "refs/heads/fix#1");
        assert!(forge.branch_tip("fix").is_none());
    }

    #[tokio::test]
    async fn create_failure_is_ref_create() {
        let forge = MockForge::with_files("o/r", "main", &[("a", "a")])
            .fail_on(FailOn::CreateRef(ForgeError::AuthFailed("read-only".into())));
        let options = PublishOptions::default();
        let resolver = BranchResolver::new(&forge, None, &options);

        let err = resolver.get_or_create_branch("feature").await.unwrap_err();
        assert!(matches!(err, PublishError::RefCreate { .. }));
    }
}
