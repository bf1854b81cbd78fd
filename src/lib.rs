//! forgepatch - Automated literal-replacement commits on GitHub
//!
//! forgepatch edits files in a GitHub repository without a local clone. It
//! finds files through code search or reads them from disk, applies a
//! literal replacement, and publishes the result as one commit on a branch
//! using the git data API.
//!
//! # Architecture
//!
//! - [`cli`] - Command-line interface layer (parses args, delegates to publish)
//! - [`publish`] - Branch resolution, tree and commit construction, ref update
//! - [`locate`] - Resolves change targets to files (local or code search)
//! - [`change`] - Targets and replacement strategies
//! - [`forge`] - Abstraction over the hosting service (GitHub, mock)
//! - [`auth`] - Credential injection
//! - [`core`] - Domain types and configuration
//! - [`ui`] - User output and logging
//!
//! # Guarantees
//!
//! 1. One publish produces at most one commit, with the branch tip as its
//!    only parent
//! 2. Branches are only ever fast-forwarded
//! 3. Nothing is retried or rolled back; objects left unreferenced by a
//!    failure are named in the error

pub mod auth;
pub mod change;
pub mod cli;
pub mod core;
pub mod forge;
pub mod locate;
pub mod publish;
pub mod ui;
