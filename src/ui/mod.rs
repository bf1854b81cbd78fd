//! ui
//!
//! User-facing output and diagnostics.
//!
//! # Modules
//!
//! - [`output`] - Output formatting and display
//! - [`logging`] - `tracing` subscriber setup
//!
//! # Design
//!
//! Everything the CLI prints for the user goes through [`output`], which
//! honors `--quiet` and `--debug`. Diagnostics go through `tracing` and are
//! filtered separately.

pub mod logging;
pub mod output;
