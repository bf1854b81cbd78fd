//! cli::args
//!
//! Command-line argument definitions using clap derive.
//!
//! # Global Flags
//!
//! These flags are available on all commands:
//! - `--help` / `-h`: Show help
//! - `--version`: Show version
//! - `--debug`: Enable debug logging
//! - `--quiet` / `-q`: Minimal output
//! - `--config <path>`: Use this configuration file

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// fpatch - Commit literal search-and-replace edits to a GitHub repository
#[derive(Parser, Debug)]
#[command(name = "fpatch")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    /// Minimal output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Configuration file to use instead of the default search path
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Parser::parse()
    }
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Replace text in repository files and commit the result to a branch
    #[command(
        name = "replace",
        long_about = "Replace every literal occurrence of FIND with REPLACE and commit the \
            result to BRANCH in one commit.\n\n\
            Without --file, the repository's code search finds the files to edit. \
            With --file, local files are read, transformed and published under their \
            remote paths. BRANCH is created from the base branch if it does not exist, \
            and is only ever fast-forwarded.",
        after_help = "\
EXAMPLES:
    # Rename a type everywhere code search finds it
    fpatch replace octocat/hello automation/rename FooService BarService

    # Restrict the search to Go files
    fpatch replace octocat/hello automation/rename FooService BarService --language go

    # Publish a local file under a different remote path
    fpatch replace octocat/hello docs-update v1 v2 --file ./README.md:docs/README.md"
    )]
    Replace(ReplaceArgs),

    /// Get or create a branch
    #[command(
        name = "branch",
        long_about = "Print the tip of BRANCH, creating it at the tip of the base branch \
            if it does not exist. Running it twice is harmless."
    )]
    Branch(BranchArgs),

    /// Generate shell completion scripts
    #[command(
        name = "completion",
        after_help = "\
EXAMPLES:
    # Bash
    fpatch completion bash > ~/.local/share/bash-completion/completions/fpatch

    # Zsh
    fpatch completion zsh > ~/.zfunc/_fpatch

    # Fish
    fpatch completion fish > ~/.config/fish/completions/fpatch.fish"
    )]
    Completion {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Connection flags shared by commands that talk to GitHub.
#[derive(Args, Debug, Clone, Default)]
pub struct RemoteArgs {
    /// Access token (defaults to $FORGEPATCH_TOKEN, then $GITHUB_TOKEN)
    #[arg(long, value_name = "TOKEN")]
    pub token: Option<String>,

    /// GitHub API base URL (for GitHub Enterprise)
    #[arg(long, value_name = "URL")]
    pub api_base: Option<String>,
}

/// Arguments for `replace`.
#[derive(Args, Debug, Clone)]
pub struct ReplaceArgs {
    /// Repository as owner/repo or a GitHub URL
    pub repo: String,

    /// Branch to commit to
    pub branch: String,

    /// Literal text to find
    pub find: String,

    /// Replacement text
    pub replace: String,

    /// Local file to publish, as LOCAL or LOCAL:REMOTE (repeatable)
    #[arg(short, long = "file", value_name = "LOCAL[:REMOTE]")]
    pub files: Vec<String>,

    /// Also search the repository when --file is given
    #[arg(long)]
    pub search: bool,

    /// Commit message
    #[arg(short, long)]
    pub message: Option<String>,

    /// Restrict code search to a language
    #[arg(long)]
    pub language: Option<String>,

    /// Abort if the publish has not finished after this many seconds
    #[arg(long, value_name = "SECONDS")]
    pub timeout: Option<u64>,

    #[command(flatten)]
    pub remote: RemoteArgs,
}

/// Arguments for `branch`.
#[derive(Args, Debug, Clone)]
pub struct BranchArgs {
    /// Repository as owner/repo or a GitHub URL
    pub repo: String,

    /// Branch name
    pub name: String,

    #[command(flatten)]
    pub remote: RemoteArgs,
}

/// Shell types for completion generation.
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    #[value(name = "powershell")]
    PowerShell,
}
