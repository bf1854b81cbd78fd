//! forge::factory
//!
//! Forge creation.
//!
//! # Design
//!
//! Commands use [`create_forge`] instead of constructing a concrete forge,
//! so the pipeline only ever sees `dyn Forge`. Credentials are resolved
//! here, once, and a missing or malformed token fails before any request is
//! sent.
//!
//! # Example
//!
//! ```
//! use forgepatch::forge::create_forge;
//!
//! let coords = "octocat/hello".parse().unwrap();
//! let forge = create_forge(coords, Some("ghp_0123456789abcdef"), "https://api.github.com").unwrap();
//! assert_eq!(forge.name(), "github");
//! assert_eq!(forge.coordinates().full_name(), "octocat/hello");
//! ```

use std::sync::Arc;

use super::github::GitHubForge;
use super::traits::Forge;
use crate::auth::{token_from_env, AuthError};
use crate::core::types::RepoCoordinates;

/// Create a GitHub forge bound to `coords`.
///
/// The token is `token` if given, otherwise the first of
/// [`TOKEN_ENV_VARS`](crate::auth::TOKEN_ENV_VARS) that is set.
///
/// # Errors
///
/// - `AuthError::MissingToken` if no token is available
/// - `AuthError::InvalidToken` if the token is malformed
pub fn create_forge(
    coords: RepoCoordinates,
    token: Option<&str>,
    api_base: &str,
) -> Result<Box<dyn Forge>, AuthError> {
    let provider = Arc::new(token_from_env(token)?);
    tracing::debug!(repo = %coords, api_base, "creating GitHub forge");
    Ok(Box::new(GitHubForge::with_api_base(
        provider, coords, api_base,
    )))
}
