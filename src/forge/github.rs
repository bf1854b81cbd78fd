//! forge::github
//!
//! GitHub forge implementation over the REST v3 API.
//!
//! # Design
//!
//! This module implements the `Forge` trait for GitHub using the git data
//! endpoints (`/git/refs`, `/git/trees`, `/git/commits`, `/git/blobs`),
//! code search (`/search/code`) and the authenticated user endpoint.
//!
//! # Authentication
//!
//! A [`TokenProvider`] is injected at construction. The provider is asked
//! for a bearer token on every request; it is never read from the
//! environment here.
//!
//! # Rate Limiting
//!
//! GitHub has rate limits (code search in particular). This implementation
//! returns `ForgeError::RateLimited` and does not retry.
//!
//! # Example
//!
//! ```ignore
//! use forgepatch::auth::StaticToken;
//! use forgepatch::forge::github::GitHubForge;
//! use std::sync::Arc;
//!
//! let token = Arc::new(StaticToken::new("ghp_xxxxxxxxxxxx")?);
//! let forge = GitHubForge::new(token, "octocat/hello-world".parse()?);
//! let main = forge.default_branch().await?;
//! ```
//!
//! [`TokenProvider`]: crate::auth::TokenProvider

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, USER_AGENT};
use reqwest::{Client, RequestBuilder, Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use super::traits::{
    Commit, Forge, ForgeError, NewCommit, Reference, SearchHit, SearchQuery, Signature, Tree,
    TreeEntry, User,
};
use crate::auth::{AuthError, TokenProvider};
use crate::core::config::DEFAULT_API_BASE;
use crate::core::types::{Oid, RefName, RepoCoordinates};

/// User-Agent header value for API requests.
const USER_AGENT_VALUE: &str = "forgepatch";

/// Media type for JSON responses.
const MEDIA_JSON: &str = "application/vnd.github+json";

/// Media type that makes the blob endpoint return raw bytes.
const MEDIA_RAW: &str = "application/vnd.github.raw";

/// Largest page the search endpoint serves.
const SEARCH_PER_PAGE: usize = 100;

/// GitHub never returns more than this many search results.
const SEARCH_RESULT_CAP: usize = 1000;

/// GitHub forge implementation.
pub struct GitHubForge {
    /// HTTP client for making requests
    client: Client,
    /// Source of bearer tokens
    token_provider: Arc<dyn TokenProvider>,
    /// Repository this forge is bound to
    coords: RepoCoordinates,
    /// API base URL (configurable for GitHub Enterprise)
    api_base: String,
}

// Custom Debug to avoid exposing anything the provider holds
impl std::fmt::Debug for GitHubForge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GitHubForge")
            .field("coords", &self.coords)
            .field("api_base", &self.api_base)
            .finish_non_exhaustive()
    }
}

impl GitHubForge {
    /// Create a GitHub forge against `api.github.com`.
    pub fn new(provider: Arc<dyn TokenProvider>, coords: RepoCoordinates) -> Self {
        Self::with_api_base(provider, coords, DEFAULT_API_BASE)
    }

    /// Create a GitHub forge with a custom API base URL.
    ///
    /// Use this for GitHub Enterprise (e.g., `https://github.example.com/api/v3`)
    /// and for pointing tests at a local mock server.
    pub fn with_api_base(
        provider: Arc<dyn TokenProvider>,
        coords: RepoCoordinates,
        api_base: impl Into<String>,
    ) -> Self {
        let api_base = api_base.into().trim_end_matches('/').to_string();
        Self {
            client: Client::new(),
            token_provider: provider,
            coords,
            api_base,
        }
    }

    /// The configured API base URL.
    pub fn api_base(&self) -> &str {
        &self.api_base
    }

    /// Build headers for a request, asking the provider for a fresh token.
    async fn headers(&self, accept: &'static str) -> Result<HeaderMap, ForgeError> {
        let token = self
            .token_provider
            .bearer_token()
            .await
            .map_err(|e| match e {
                AuthError::MissingToken => ForgeError::AuthRequired,
                AuthError::InvalidToken(_) => ForgeError::AuthFailed(e.to_string()),
            })?;

        let mut headers = HeaderMap::new();
        let auth = HeaderValue::from_str(&format!("Bearer {}", token))
            .map_err(|_| ForgeError::AuthFailed("token is not a valid header value".into()))?;
        headers.insert(AUTHORIZATION, auth);
        headers.insert(ACCEPT, HeaderValue::from_static(accept));
        headers.insert(USER_AGENT, HeaderValue::from_static(USER_AGENT_VALUE));
        headers.insert(
            "X-GitHub-Api-Version",
            HeaderValue::from_static("2022-11-28"),
        );
        Ok(headers)
    }

    /// Build URL for a repository endpoint.
    fn repo_url(&self, path: &str) -> String {
        format!(
            "{}/repos/{}/{}/{}",
            self.api_base,
            self.coords.owner(),
            self.coords.repo(),
            path
        )
    }

    /// Build URL for a ref endpoint.
    ///
    /// Each component of the ref name is percent-encoded; `#` and `%` are
    /// legal in ref names but would otherwise change the request path.
    fn ref_url(&self, endpoint: &str, name: &RefName) -> Result<Url, ForgeError> {
        let mut url = Url::parse(&self.repo_url(endpoint))
            .map_err(|e| ForgeError::NetworkError(format!("invalid API URL: {}", e)))?;
        url.path_segments_mut()
            .map_err(|_| {
                ForgeError::NetworkError(format!("API base cannot have a path: {}", self.api_base))
            })?
            .extend(name.short_path().split('/'));
        Ok(url)
    }

    /// Send a request with JSON headers and decode a JSON response.
    async fn send_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ForgeError> {
        let response = request
            .headers(self.headers(MEDIA_JSON).await?)
            .send()
            .await
            .map_err(|e| ForgeError::NetworkError(e.to_string()))?;
        self.handle_response(response).await
    }

    /// Handle API response, mapping errors appropriately.
    async fn handle_response<T: DeserializeOwned>(&self, response: Response) -> Result<T, ForgeError> {
        let status = response.status();

        if status.is_success() {
            response.json().await.map_err(|e| ForgeError::ApiError {
                status: status.as_u16(),
                message: format!("Failed to parse response: {}", e),
            })
        } else {
            Err(Self::error_from_response(response, status).await)
        }
    }

    /// Map an error response to a `ForgeError`.
    async fn error_from_response(response: Response, status: StatusCode) -> ForgeError {
        // Fine-grained tokens report missing permissions in a header.
        let required_permissions = response
            .headers()
            .get("X-Accepted-GitHub-Permissions")
            .and_then(|v| v.to_str().ok())
            .filter(|s| !s.is_empty())
            .map(|s| s.to_string());
        let rate_limited = response
            .headers()
            .get("X-RateLimit-Remaining")
            .and_then(|v| v.to_str().ok())
            == Some("0");

        let message = match response.json::<GitHubErrorResponse>().await {
            Ok(err) => err.message,
            Err(_) => "Unknown error".to_string(),
        };

        match status {
            StatusCode::UNAUTHORIZED => ForgeError::AuthFailed("Invalid or expired token".into()),
            StatusCode::FORBIDDEN if rate_limited => ForgeError::RateLimited,
            StatusCode::FORBIDDEN => {
                let mut err_msg = format!("Permission denied: {}", message);
                if let Some(perms) = required_permissions {
                    err_msg.push_str(&format!(" [required: {}]", perms));
                }
                ForgeError::AuthFailed(err_msg)
            }
            StatusCode::NOT_FOUND => ForgeError::NotFound(message),
            StatusCode::TOO_MANY_REQUESTS => ForgeError::RateLimited,
            _ if status.is_server_error() => ForgeError::ApiError {
                status: status.as_u16(),
                message: format!("GitHub server error: {}", message),
            },
            _ => ForgeError::ApiError {
                status: status.as_u16(),
                message,
            },
        }
    }
}

#[async_trait]
impl Forge for GitHubForge {
    fn name(&self) -> &'static str {
        "github"
    }

    fn coordinates(&self) -> &RepoCoordinates {
        &self.coords
    }

    async fn default_branch(&self) -> Result<String, ForgeError> {
        let url = format!(
            "{}/repos/{}/{}",
            self.api_base,
            self.coords.owner(),
            self.coords.repo()
        );
        let repo: GitHubRepository = self.send_json(self.client.get(&url)).await?;
        Ok(repo.default_branch)
    }

    async fn get_ref(&self, name: &RefName) -> Result<Reference, ForgeError> {
        let url = self.ref_url("git/ref", name)?;
        let r: GitHubRef = self.send_json(self.client.get(url)).await?;
        Ok(r.into())
    }

    async fn create_ref(&self, name: &RefName, target: &Oid) -> Result<Reference, ForgeError> {
        let url = self.repo_url("git/refs");
        let body = CreateRefBody {
            ref_name: name.as_str(),
            sha: target.as_str(),
        };
        let r: GitHubRef = self.send_json(self.client.post(&url).json(&body)).await?;
        Ok(r.into())
    }

    async fn update_ref(
        &self,
        reference: &Reference,
        force: bool,
    ) -> Result<Reference, ForgeError> {
        let url = self.ref_url("git/refs", &reference.name)?;
        let body = UpdateRefBody {
            sha: reference.target.as_str(),
            force,
        };
        let r: GitHubRef = self.send_json(self.client.patch(url).json(&body)).await?;
        Ok(r.into())
    }

    async fn create_tree(
        &self,
        base_tree: &Oid,
        entries: &[TreeEntry],
    ) -> Result<Tree, ForgeError> {
        let url = self.repo_url("git/trees");
        let body = CreateTreeBody {
            base_tree: base_tree.as_str(),
            tree: entries
                .iter()
                .map(|e| TreeEntryBody {
                    path: &e.path,
                    mode: e.mode,
                    kind: e.kind,
                    content: &e.content,
                })
                .collect(),
        };
        let tree: GitHubSha = self.send_json(self.client.post(&url).json(&body)).await?;
        Ok(Tree { sha: tree.sha })
    }

    async fn get_commit(&self, sha: &Oid) -> Result<Commit, ForgeError> {
        let url = self.repo_url(&format!("git/commits/{}", sha));
        let commit: GitHubCommit = self.send_json(self.client.get(&url)).await?;
        Ok(commit.into())
    }

    async fn create_commit(&self, commit: &NewCommit) -> Result<Commit, ForgeError> {
        let url = self.repo_url("git/commits");
        let body = CreateCommitBody {
            message: &commit.message,
            tree: commit.tree.as_str(),
            parents: commit.parents.iter().map(Oid::as_str).collect(),
            author: SignatureBody {
                name: &commit.author.name,
                email: &commit.author.email,
                date: commit.author.date,
            },
        };
        let created: GitHubCommit = self.send_json(self.client.post(&url).json(&body)).await?;
        Ok(created.into())
    }

    async fn search_code(&self, query: &SearchQuery) -> Result<Vec<SearchHit>, ForgeError> {
        let url = format!("{}/search/code", self.api_base);
        let terms = query.terms();

        let mut hits: Vec<SearchHit> = Vec::new();
        let mut page: usize = 1;

        loop {
            let per_page = SEARCH_PER_PAGE.to_string();
            let page_param = page.to_string();
            let request = self.client.get(&url).query(&[
                ("q", terms.as_str()),
                ("per_page", per_page.as_str()),
                ("page", page_param.as_str()),
            ]);
            let result: GitHubSearchResult = self.send_json(request).await?;

            let page_count = result.items.len();
            hits.extend(result.items.into_iter().map(Into::into));

            // Stop on a short page, when everything reported has arrived, or
            // at the point GitHub stops serving results.
            if page_count < SEARCH_PER_PAGE
                || hits.len() >= result.total_count
                || hits.len() >= SEARCH_RESULT_CAP
            {
                break;
            }
            page += 1;
        }

        Ok(hits)
    }

    async fn get_blob_raw(&self, sha: &Oid) -> Result<Vec<u8>, ForgeError> {
        let url = self.repo_url(&format!("git/blobs/{}", sha));
        let response = self
            .client
            .get(&url)
            .headers(self.headers(MEDIA_RAW).await?)
            .send()
            .await
            .map_err(|e| ForgeError::NetworkError(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Self::error_from_response(response, status).await);
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| ForgeError::NetworkError(e.to_string()))?;
        Ok(bytes.to_vec())
    }

    async fn current_user(&self) -> Result<User, ForgeError> {
        let url = format!("{}/user", self.api_base);
        let user: GitHubUser = self.send_json(self.client.get(&url)).await?;
        Ok(User {
            login: user.login,
            email: user.email.filter(|e| !e.is_empty()),
        })
    }
}

// --------------------------------------------------------------------------
// API Request/Response Types
// --------------------------------------------------------------------------

/// Request body for creating a ref.
#[derive(Serialize)]
struct CreateRefBody<'a> {
    #[serde(rename = "ref")]
    ref_name: &'a str,
    sha: &'a str,
}

/// Request body for moving a ref.
#[derive(Serialize)]
struct UpdateRefBody<'a> {
    sha: &'a str,
    force: bool,
}

/// Request body for creating a tree.
#[derive(Serialize)]
struct CreateTreeBody<'a> {
    base_tree: &'a str,
    tree: Vec<TreeEntryBody<'a>>,
}

/// One entry of a tree-create request.
#[derive(Serialize)]
struct TreeEntryBody<'a> {
    path: &'a str,
    mode: &'a str,
    #[serde(rename = "type")]
    kind: &'a str,
    content: &'a str,
}

/// Request body for creating a commit.
#[derive(Serialize)]
struct CreateCommitBody<'a> {
    message: &'a str,
    tree: &'a str,
    parents: Vec<&'a str>,
    author: SignatureBody<'a>,
}

/// Commit author in a request.
#[derive(Serialize)]
struct SignatureBody<'a> {
    name: &'a str,
    email: &'a str,
    date: DateTime<Utc>,
}

/// GitHub error response format.
#[derive(Deserialize)]
struct GitHubErrorResponse {
    message: String,
}

/// Repository response (only the fields we read).
#[derive(Deserialize)]
struct GitHubRepository {
    default_branch: String,
}

/// Git ref response format.
#[derive(Deserialize)]
struct GitHubRef {
    #[serde(rename = "ref")]
    ref_name: RefName,
    object: GitHubSha,
}

impl From<GitHubRef> for Reference {
    fn from(r: GitHubRef) -> Self {
        Reference {
            name: r.ref_name,
            target: r.object.sha,
        }
    }
}

/// Any object reference carrying just a SHA.
#[derive(Deserialize)]
struct GitHubSha {
    sha: Oid,
}

/// Git commit response format.
#[derive(Deserialize)]
struct GitHubCommit {
    sha: Oid,
    tree: GitHubSha,
    parents: Vec<GitHubSha>,
    message: String,
    author: GitHubSignature,
}

/// Commit author response format.
#[derive(Deserialize)]
struct GitHubSignature {
    name: String,
    email: String,
    date: DateTime<Utc>,
}

impl From<GitHubCommit> for Commit {
    fn from(c: GitHubCommit) -> Self {
        Commit {
            sha: c.sha,
            tree: c.tree.sha,
            parents: c.parents.into_iter().map(|p| p.sha).collect(),
            message: c.message,
            author: Signature {
                name: c.author.name,
                email: c.author.email,
                date: c.author.date,
            },
        }
    }
}

/// Code search response format.
#[derive(Deserialize)]
struct GitHubSearchResult {
    total_count: usize,
    items: Vec<GitHubSearchItem>,
}

/// One code search hit.
#[derive(Deserialize)]
struct GitHubSearchItem {
    path: String,
    sha: Oid,
    repository: GitHubRepoName,
}

/// Minimal repository info on a search hit.
#[derive(Deserialize)]
struct GitHubRepoName {
    full_name: String,
}

impl From<GitHubSearchItem> for SearchHit {
    fn from(item: GitHubSearchItem) -> Self {
        SearchHit {
            path: item.path,
            sha: item.sha,
            repository: item.repository.full_name,
        }
    }
}

/// Authenticated user response format.
#[derive(Deserialize)]
struct GitHubUser {
    login: String,
    email: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::StaticToken;

    fn forge() -> GitHubForge {
        let token = Arc::new(StaticToken::new("secret_token_abc123").unwrap());
        GitHubForge::new(token, "octocat/hello-world".parse().unwrap())
    }

    #[test]
    fn new_uses_public_api() {
        let forge = forge();
        assert_eq!(forge.name(), "github");
        assert_eq!(forge.api_base(), "https://api.github.com");
        assert_eq!(forge.coordinates().full_name(), "octocat/hello-world");
    }

    #[test]
    fn with_api_base_trims_slash() {
        let token = Arc::new(StaticToken::new("secret_token_abc123").unwrap());
        let forge = GitHubForge::with_api_base(
            token,
            "o/r".parse().unwrap(),
            "https://github.example.com/api/v3/",
        );
        assert_eq!(forge.api_base(), "https://github.example.com/api/v3");
    }

    #[test]
    fn repo_url_format() {
        let forge = forge();
        assert_eq!(
            forge.repo_url("git/refs"),
            "https://api.github.com/repos/octocat/hello-world/git/refs"
        );
    }

    #[test]
    fn debug_redacts_token() {
        let debug_output = format!("{:?}", forge());
        assert!(!debug_output.contains("secret_token_abc123"));
        assert!(debug_output.contains("octocat"));
    }

    #[test]
    fn commit_response_converts() {
        let json = serde_json::json!({
            "sha": "a".repeat(40),
            "tree": { "sha": "b".repeat(40) },
            "parents": [{ "sha": "c".repeat(40) }],
            "message": "msg",
            "author": { "name": "octocat", "email": "o@example.com", "date": "2024-01-02T03:04:05Z" }
        });
        let gh: GitHubCommit = serde_json::from_value(json).unwrap();
        let commit: Commit = gh.into();
        assert_eq!(commit.tree.as_str(), "b".repeat(40));
        assert_eq!(commit.parents.len(), 1);
        assert_eq!(commit.author.name, "octocat");
    }

    #[test]
    fn ref_response_rejects_bad_sha() {
        let json = serde_json::json!({
            "ref": "refs/heads/main",
            "object": { "sha": "not-a-sha" }
        });
        assert!(serde_json::from_value::<GitHubRef>(json).is_err());
    }

    #[test]
    fn tree_body_serializes_type_field() {
        let entry = TreeEntry::file("a.txt", "hi");
        let body = TreeEntryBody {
            path: &entry.path,
            mode: entry.mode,
            kind: entry.kind,
            content: &entry.content,
        };
        let value = serde_json::to_value(&body).unwrap();
        assert_eq!(value["type"], "blob");
        assert_eq!(value["mode"], "100644");
    }
}
