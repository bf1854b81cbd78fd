//! forge
//!
//! Abstraction over the hosting service's git data and code search APIs.
//!
//! # Architecture
//!
//! The `Forge` trait defines every remote operation the publish pipeline
//! needs: refs, trees, commits, blobs, code search and the authenticated
//! user. Commands use the [`create_forge`] factory function rather than
//! importing specific forge implementations directly.
//!
//! # Modules
//!
//! - `traits`: Core `Forge` trait and request/response types
//! - [`github`]: GitHub implementation using the REST API
//! - [`mock`]: In-memory implementation for deterministic testing
//! - `factory`: Forge creation with credential resolution

mod factory;
pub mod github;
pub mod mock;
mod traits;

pub use factory::create_forge;
pub use traits::*;
