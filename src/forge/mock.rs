//! forge::mock
//!
//! Mock forge implementation for deterministic testing.
//!
//! # Design
//!
//! The mock forge keeps a small git object store in memory: blobs, trees,
//! commits and refs, all addressed by content hash. Tree creation layers
//! entries over a base tree, non-forced ref updates must be fast-forwards,
//! and code search scans the default branch's files. Failure scenarios can
//! be injected per operation, and every call is recorded.
//!
//! # Example
//!
//! ```
//! use forgepatch::forge::mock::MockForge;
//! use forgepatch::forge::Forge;
//!
//! # tokio_test::block_on(async {
//! let forge = MockForge::with_files("octocat/hello", "main", &[("a.txt", "foo foo baz")]);
//!
//! let tip = forge.branch_tip("main").unwrap();
//! assert_eq!(forge.file_at(&tip, "a.txt").as_deref(), Some("foo foo baz"));
//! assert_eq!(forge.default_branch().await.unwrap(), "main");
//! # });
//! ```

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard};

use super::traits::{
    Commit, Forge, ForgeError, NewCommit, Reference, SearchHit, SearchQuery, Signature, Tree,
    TreeEntry, User, MODE_FILE,
};
use crate::core::types::{BranchName, Oid, RefName, RepoCoordinates};

/// Mock forge for testing.
///
/// Thread-safe via internal `Arc<Mutex<...>>` wrapping; clones share state.
#[derive(Debug, Clone)]
pub struct MockForge {
    coords: RepoCoordinates,
    /// Internal state shared across clones.
    inner: Arc<Mutex<MockForgeInner>>,
}

/// Internal mutable state.
#[derive(Debug)]
struct MockForgeInner {
    default_branch: String,
    refs: BTreeMap<RefName, Oid>,
    commits: HashMap<Oid, Commit>,
    /// Tree SHA -> (path -> blob SHA)
    trees: HashMap<Oid, BTreeMap<String, Oid>>,
    blobs: HashMap<Oid, Vec<u8>>,
    /// Hits returned by search in addition to the default branch's files
    extra_hits: Vec<SearchHit>,
    user: User,
    /// Method to fail on (for testing error paths).
    fail_on: Option<FailOn>,
    /// Recorded operations for verification.
    operations: Vec<MockOperation>,
}

/// Configuration for which operation should fail.
#[derive(Debug, Clone)]
pub enum FailOn {
    DefaultBranch(ForgeError),
    GetRef(ForgeError),
    CreateRef(ForgeError),
    UpdateRef(ForgeError),
    CreateTree(ForgeError),
    GetCommit(ForgeError),
    CreateCommit(ForgeError),
    SearchCode(ForgeError),
    GetBlobRaw(ForgeError),
    CurrentUser(ForgeError),
}

impl FailOn {
    fn matches(&self, operation: &str) -> Option<ForgeError> {
        let (name, err) = match self {
            FailOn::DefaultBranch(e) => ("default_branch", e),
            FailOn::GetRef(e) => ("get_ref", e),
            FailOn::CreateRef(e) => ("create_ref", e),
            FailOn::UpdateRef(e) => ("update_ref", e),
            FailOn::CreateTree(e) => ("create_tree", e),
            FailOn::GetCommit(e) => ("get_commit", e),
            FailOn::CreateCommit(e) => ("create_commit", e),
            FailOn::SearchCode(e) => ("search_code", e),
            FailOn::GetBlobRaw(e) => ("get_blob_raw", e),
            FailOn::CurrentUser(e) => ("current_user", e),
        };
        (name == operation).then(|| err.clone())
    }
}

/// Recorded operation for test verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockOperation {
    DefaultBranch,
    GetRef { name: String },
    CreateRef { name: String, target: Oid },
    UpdateRef { name: String, target: Oid, force: bool },
    CreateTree { base_tree: Oid, paths: Vec<String> },
    GetCommit { sha: Oid },
    CreateCommit { tree: Oid, parents: Vec<Oid> },
    SearchCode { query: String },
    GetBlobRaw { sha: Oid },
    CurrentUser,
}

impl MockForgeInner {
    fn store_blob(&mut self, content: &[u8]) -> Oid {
        let sha = Oid::hash_object("blob", content);
        self.blobs.entry(sha.clone()).or_insert_with(|| content.to_vec());
        sha
    }

    fn store_tree(&mut self, files: BTreeMap<String, Oid>) -> Oid {
        let body: String = files
            .iter()
            .map(|(path, blob)| format!("{} {}\0{}\n", MODE_FILE, path, blob))
            .collect();
        let sha = Oid::hash_object("tree", body.as_bytes());
        self.trees.entry(sha.clone()).or_insert(files);
        sha
    }

    fn store_commit(&mut self, commit: &NewCommit) -> Commit {
        let parents: Vec<&str> = commit.parents.iter().map(Oid::as_str).collect();
        let body = format!(
            "tree {}\nparents {}\nauthor {} <{}> {}\n\n{}",
            commit.tree,
            parents.join(" "),
            commit.author.name,
            commit.author.email,
            commit.author.date.timestamp(),
            commit.message
        );
        let sha = Oid::hash_object("commit", body.as_bytes());
        let stored = Commit {
            sha: sha.clone(),
            tree: commit.tree.clone(),
            parents: commit.parents.clone(),
            message: commit.message.clone(),
            author: commit.author.clone(),
        };
        self.commits.insert(sha, stored.clone());
        stored
    }

    /// Whether `ancestor` is reachable from `descendant` through parents.
    fn is_ancestor(&self, ancestor: &Oid, descendant: &Oid) -> bool {
        let mut stack = vec![descendant.clone()];
        while let Some(sha) = stack.pop() {
            if &sha == ancestor {
                return true;
            }
            if let Some(commit) = self.commits.get(&sha) {
                stack.extend(commit.parents.iter().cloned());
            }
        }
        false
    }

    fn tree_of_branch(&self, branch: &str) -> Option<&BTreeMap<String, Oid>> {
        let name = RefName::new(format!("refs/heads/{}", branch)).ok()?;
        let tip = self.refs.get(&name)?;
        let commit = self.commits.get(tip)?;
        self.trees.get(&commit.tree)
    }
}

fn unprocessable(message: impl Into<String>) -> ForgeError {
    ForgeError::ApiError {
        status: 422,
        message: message.into(),
    }
}

impl MockForge {
    /// Create a mock forge for an empty repository.
    ///
    /// The default branch is `main` but has no commits until one is seeded.
    ///
    /// # Panics
    ///
    /// Panics if `coords` is not a valid `owner/repo` pair.
    pub fn new(coords: &str) -> Self {
        Self {
            coords: coords.parse().expect("valid owner/repo"),
            inner: Arc::new(Mutex::new(MockForgeInner {
                default_branch: "main".to_string(),
                refs: BTreeMap::new(),
                commits: HashMap::new(),
                trees: HashMap::new(),
                blobs: HashMap::new(),
                extra_hits: Vec::new(),
                user: User {
                    login: "mock-user".to_string(),
                    email: Some("mock-user@example.com".to_string()),
                },
                fail_on: None,
                operations: Vec::new(),
            })),
        }
    }

    /// Create a mock forge whose default branch holds one root commit with `files`.
    ///
    /// # Example
    ///
    /// ```
    /// use forgepatch::forge::mock::MockForge;
    ///
    /// let forge = MockForge::with_files("o/r", "master", &[("README.md", "hello")]);
    /// assert!(forge.branch_tip("master").is_some());
    /// assert!(forge.branch_tip("main").is_none());
    /// ```
    pub fn with_files(coords: &str, default_branch: &str, files: &[(&str, &str)]) -> Self {
        let forge = Self::new(coords);
        forge.lock().default_branch = default_branch.to_string();
        forge.seed_commit(default_branch, files, "Initial commit");
        forge
    }

    /// Add a commit on `branch` that sets `files`, creating the branch if needed.
    ///
    /// Simulates pushes made outside the code under test. Returns the new
    /// commit SHA.
    ///
    /// # Panics
    ///
    /// Panics if `branch` is not a valid branch name.
    pub fn seed_commit(&self, branch: &str, files: &[(&str, &str)], message: &str) -> Oid {
        let name = RefName::for_branch(&BranchName::new(branch).expect("valid branch name"));
        let mut inner = self.lock();

        let parent = inner.refs.get(&name).cloned();
        let mut tree = parent
            .as_ref()
            .and_then(|p| inner.commits.get(p))
            .and_then(|c| inner.trees.get(&c.tree))
            .cloned()
            .unwrap_or_default();
        for (path, content) in files {
            let blob = inner.store_blob(content.as_bytes());
            tree.insert(path.to_string(), blob);
        }
        let tree = inner.store_tree(tree);

        let commit = inner.store_commit(&NewCommit {
            message: message.to_string(),
            tree,
            parents: parent.into_iter().collect(),
            author: Signature {
                name: "seed".to_string(),
                email: "seed@example.com".to_string(),
                date: Utc.timestamp_opt(1_700_000_000, 0).single().unwrap_or_else(Utc::now),
            },
        });
        inner.refs.insert(name, commit.sha.clone());
        commit.sha
    }

    /// Set the authenticated user.
    pub fn with_user(self, login: &str, email: Option<&str>) -> Self {
        self.lock().user = User {
            login: login.to_string(),
            email: email.map(str::to_string),
        };
        self
    }

    /// Add a search hit that search returns verbatim, backed by `content`.
    ///
    /// Use this for hits the real search can produce but the default branch
    /// scan would not, such as files from other repositories.
    pub fn with_search_hit(self, repository: &str, path: &str, content: &str) -> Self {
        {
            let mut inner = self.lock();
            let sha = inner.store_blob(content.as_bytes());
            inner.extra_hits.push(SearchHit {
                path: path.to_string(),
                sha,
                repository: repository.to_string(),
            });
        }
        self
    }

    /// Configure the mock to fail on a specific operation.
    ///
    /// # Example
    ///
    /// ```
    /// use forgepatch::forge::mock::{MockForge, FailOn};
    /// use forgepatch::forge::ForgeError;
    ///
    /// let forge = MockForge::new("o/r")
    ///     .fail_on(FailOn::SearchCode(ForgeError::RateLimited));
    /// ```
    pub fn fail_on(self, fail_on: FailOn) -> Self {
        self.lock().fail_on = Some(fail_on);
        self
    }

    /// Clear the failure configuration.
    pub fn clear_fail_on(&self) {
        self.lock().fail_on = None;
    }

    /// Get all recorded operations.
    pub fn operations(&self) -> Vec<MockOperation> {
        self.lock().operations.clone()
    }

    /// The commit a branch points at.
    pub fn branch_tip(&self, branch: &str) -> Option<Oid> {
        let name = RefName::new(format!("refs/heads/{}", branch)).ok()?;
        self.lock().refs.get(&name).cloned()
    }

    /// A stored commit.
    pub fn commit(&self, sha: &Oid) -> Option<Commit> {
        self.lock().commits.get(sha).cloned()
    }

    /// Number of stored commits, including unreferenced ones.
    pub fn commit_count(&self) -> usize {
        self.lock().commits.len()
    }

    /// A file's content at a commit.
    pub fn file_at(&self, commit: &Oid, path: &str) -> Option<String> {
        let inner = self.lock();
        let commit = inner.commits.get(commit)?;
        let blob = inner.trees.get(&commit.tree)?.get(path)?;
        inner
            .blobs
            .get(blob)
            .map(|b| String::from_utf8_lossy(b).into_owned())
    }

    /// All file paths in a tree.
    pub fn tree_paths(&self, tree: &Oid) -> Option<Vec<String>> {
        self.lock()
            .trees
            .get(tree)
            .map(|files| files.keys().cloned().collect())
    }

    fn lock(&self) -> MutexGuard<'_, MockForgeInner> {
        self.inner.lock().expect("mock forge state poisoned")
    }

    /// Record an operation and return the configured failure for it, if any.
    fn enter(&self, operation: &str, op: MockOperation) -> Result<(), ForgeError> {
        let mut inner = self.lock();
        inner.operations.push(op);
        match inner.fail_on.as_ref().and_then(|f| f.matches(operation)) {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl Forge for MockForge {
    fn name(&self) -> &'static str {
        "mock"
    }

    fn coordinates(&self) -> &RepoCoordinates {
        &self.coords
    }

    async fn default_branch(&self) -> Result<String, ForgeError> {
        self.enter("default_branch", MockOperation::DefaultBranch)?;
        Ok(self.lock().default_branch.clone())
    }

    async fn get_ref(&self, name: &RefName) -> Result<Reference, ForgeError> {
        self.enter(
            "get_ref",
            MockOperation::GetRef {
                name: name.to_string(),
            },
        )?;

        let inner = self.lock();
        inner
            .refs
            .get(name)
            .map(|target| Reference {
                name: name.clone(),
                target: target.clone(),
            })
            .ok_or_else(|| ForgeError::NotFound(format!("ref {}", name)))
    }

    async fn create_ref(&self, name: &RefName, target: &Oid) -> Result<Reference, ForgeError> {
        self.enter(
            "create_ref",
            MockOperation::CreateRef {
                name: name.to_string(),
                target: target.clone(),
            },
        )?;

        let mut inner = self.lock();
        if inner.refs.contains_key(name) {
            return Err(unprocessable("Reference already exists"));
        }
        if !inner.commits.contains_key(target) {
            return Err(unprocessable("Object does not exist"));
        }
        inner.refs.insert(name.clone(), target.clone());
        Ok(Reference {
            name: name.clone(),
            target: target.clone(),
        })
    }

    async fn update_ref(
        &self,
        reference: &Reference,
        force: bool,
    ) -> Result<Reference, ForgeError> {
        self.enter(
            "update_ref",
            MockOperation::UpdateRef {
                name: reference.name.to_string(),
                target: reference.target.clone(),
                force,
            },
        )?;

        let mut inner = self.lock();
        let current = inner
            .refs
            .get(&reference.name)
            .cloned()
            .ok_or_else(|| ForgeError::NotFound(format!("ref {}", reference.name)))?;
        if !inner.commits.contains_key(&reference.target) {
            return Err(unprocessable("Object does not exist"));
        }
        if !force && !inner.is_ancestor(&current, &reference.target) {
            return Err(unprocessable("Update is not a fast forward"));
        }

        inner
            .refs
            .insert(reference.name.clone(), reference.target.clone());
        Ok(reference.clone())
    }

    async fn create_tree(
        &self,
        base_tree: &Oid,
        entries: &[TreeEntry],
    ) -> Result<Tree, ForgeError> {
        self.enter(
            "create_tree",
            MockOperation::CreateTree {
                base_tree: base_tree.clone(),
                paths: entries.iter().map(|e| e.path.clone()).collect(),
            },
        )?;

        let mut inner = self.lock();
        let mut files = inner
            .trees
            .get(base_tree)
            .cloned()
            .ok_or_else(|| unprocessable("base_tree is not a valid tree"))?;

        for entry in entries {
            if entry.path.is_empty() || entry.path.starts_with('/') || entry.path.ends_with('/') {
                return Err(unprocessable(format!("invalid tree path '{}'", entry.path)));
            }
            let blob = inner.store_blob(entry.content.as_bytes());
            files.insert(entry.path.clone(), blob);
        }

        let sha = inner.store_tree(files);
        Ok(Tree { sha })
    }

    async fn get_commit(&self, sha: &Oid) -> Result<Commit, ForgeError> {
        self.enter("get_commit", MockOperation::GetCommit { sha: sha.clone() })?;

        self.lock()
            .commits
            .get(sha)
            .cloned()
            .ok_or_else(|| ForgeError::NotFound(format!("commit {}", sha)))
    }

    async fn create_commit(&self, commit: &NewCommit) -> Result<Commit, ForgeError> {
        self.enter(
            "create_commit",
            MockOperation::CreateCommit {
                tree: commit.tree.clone(),
                parents: commit.parents.clone(),
            },
        )?;

        let mut inner = self.lock();
        if !inner.trees.contains_key(&commit.tree) {
            return Err(unprocessable("Tree SHA does not exist"));
        }
        if let Some(missing) = commit.parents.iter().find(|p| !inner.commits.contains_key(*p)) {
            return Err(unprocessable(format!("Parent SHA {} does not exist", missing)));
        }
        Ok(inner.store_commit(commit))
    }

    async fn search_code(&self, query: &SearchQuery) -> Result<Vec<SearchHit>, ForgeError> {
        self.enter(
            "search_code",
            MockOperation::SearchCode {
                query: query.to_string(),
            },
        )?;

        let inner = self.lock();
        let mut hits: Vec<SearchHit> = Vec::new();

        // The language qualifier is not modelled; every file is a candidate.
        if query.repo() == self.coords.full_name() && !query.text().is_empty() {
            if let Some(files) = inner.tree_of_branch(&inner.default_branch) {
                for (path, blob) in files {
                    let content = inner.blobs.get(blob).map(|b| String::from_utf8_lossy(b));
                    if content.is_some_and(|c| c.contains(query.text())) {
                        hits.push(SearchHit {
                            path: path.clone(),
                            sha: blob.clone(),
                            repository: self.coords.full_name(),
                        });
                    }
                }
            }
        }

        hits.extend(inner.extra_hits.iter().cloned());
        Ok(hits)
    }

    async fn get_blob_raw(&self, sha: &Oid) -> Result<Vec<u8>, ForgeError> {
        self.enter("get_blob_raw", MockOperation::GetBlobRaw { sha: sha.clone() })?;

        self.lock()
            .blobs
            .get(sha)
            .cloned()
            .ok_or_else(|| ForgeError::NotFound(format!("blob {}", sha)))
    }

    async fn current_user(&self) -> Result<User, ForgeError> {
        self.enter("current_user", MockOperation::CurrentUser)?;
        Ok(self.lock().user.clone())
    }
}
