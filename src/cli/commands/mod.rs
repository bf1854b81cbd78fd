//! cli::commands
//!
//! Command dispatch and handlers.
//!
//! # Async Commands
//!
//! Commands that talk to GitHub are async because they involve network
//! I/O. Each one creates a tokio runtime and blocks on its async body, so
//! dispatch itself stays synchronous.

mod branch;
mod completion;
mod replace;

pub use branch::branch;
pub use completion::completion;
pub use replace::replace;

use anyhow::{Context as _, Result};

use super::args::{Command, RemoteArgs};
use super::Context;
use crate::core::config::Config;
use crate::core::types::RepoCoordinates;
use crate::forge::{create_forge, Forge};

/// Dispatch a command to its handler.
pub fn dispatch(command: Command, ctx: &Context) -> Result<()> {
    match command {
        Command::Replace(args) => replace(ctx, args),
        Command::Branch(args) => branch(ctx, args),
        Command::Completion { shell } => completion(shell),
    }
}

/// Load configuration from `--config` or the default search path.
fn load_config(ctx: &Context) -> Result<Config> {
    Config::load(ctx.config_path.as_deref()).context("failed to load configuration")
}

/// Build the forge for `repo`, with flags taking precedence over config.
fn connect(repo: &str, remote: &RemoteArgs, config: &Config) -> Result<Box<dyn Forge>> {
    let coords: RepoCoordinates = repo
        .parse()
        .with_context(|| format!("invalid repository '{}'", repo))?;
    let api_base = remote
        .api_base
        .as_deref()
        .map(|s| s.trim_end_matches('/'))
        .unwrap_or_else(|| config.api_base());
    Ok(create_forge(coords, remote.token.as_deref(), api_base)?)
}
