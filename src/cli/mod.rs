//! cli
//!
//! Command-line interface layer for fpatch.
//!
//! # Responsibilities
//!
//! - Parse command-line arguments and global flags
//! - Load configuration and build the forge
//! - Delegate to the publish pipeline and format its results
//!
//! # Architecture
//!
//! The CLI layer is thin. It parses arguments via clap, turns them into
//! [`crate::change::Change`] values and settings, and hands those to
//! [`crate::publish`]. Library errors are typed; here they are wrapped in
//! `anyhow` with context for display.

pub mod args;
pub mod commands;

pub use args::{Cli, Shell};

use std::path::PathBuf;

use anyhow::Result;

use crate::ui::output::Verbosity;

/// State shared by all command handlers.
#[derive(Debug, Clone)]
pub struct Context {
    /// Output verbosity from `--quiet` / `--debug`
    pub verbosity: Verbosity,
    /// Explicit `--config` path
    pub config_path: Option<PathBuf>,
}

/// Run the CLI application with already-parsed arguments.
///
/// This is the main entry point called from `main.rs`.
pub fn run(cli: Cli) -> Result<()> {
    let ctx = Context {
        verbosity: Verbosity::from_flags(cli.quiet, cli.debug),
        config_path: cli.config.clone(),
    };

    commands::dispatch(cli.command, &ctx)
}
