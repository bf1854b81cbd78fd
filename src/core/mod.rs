//! core
//!
//! Core domain types and configuration for forgepatch.
//!
//! # Modules
//!
//! - [`types`] - Strong types: BranchName, RefName, Oid, RepoCoordinates
//! - [`config`] - Configuration schema and loading
//!
//! # Design Principles
//!
//! - Strong typing prevents malformed refs and SHAs from reaching the forge
//! - Schemas are strict and reject unknown fields

pub mod config;
pub mod types;
