//! ui::output
//!
//! Output formatting and display.
//!
//! # Design
//!
//! Results go to stdout and respect the quiet flag. Errors and debug
//! messages go to stderr.

use std::fmt::Display;

use crate::core::types::Oid;
use crate::publish::{EntrySummary, PublishReport};

/// Output verbosity level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verbosity {
    /// Quiet mode - minimal output
    Quiet,
    /// Normal mode - standard output
    Normal,
    /// Debug mode - verbose output
    Debug,
}

impl Verbosity {
    /// Create verbosity from flags.
    pub fn from_flags(quiet: bool, debug: bool) -> Self {
        if quiet {
            Verbosity::Quiet
        } else if debug {
            Verbosity::Debug
        } else {
            Verbosity::Normal
        }
    }

    /// Default `tracing` filter when `RUST_LOG` is unset.
    pub fn log_filter(&self) -> &'static str {
        match self {
            Verbosity::Quiet => "error",
            Verbosity::Normal => "warn",
            Verbosity::Debug => "forgepatch=debug,info",
        }
    }
}

/// Print a message (respects quiet mode).
pub fn print(message: impl Display, verbosity: Verbosity) {
    if verbosity != Verbosity::Quiet {
        println!("{}", message);
    }
}

/// Print a debug message (only in debug mode).
pub fn debug(message: impl Display, verbosity: Verbosity) {
    if verbosity == Verbosity::Debug {
        eprintln!("[debug] {}", message);
    }
}

/// Print an error message (always shown).
pub fn error(message: impl Display) {
    eprintln!("error: {}", message);
}

/// Format a commit SHA for display.
pub fn format_oid(oid: &Oid) -> &str {
    oid.short(7)
}

/// Format a list of items.
pub fn format_list<T: Display>(items: &[T], prefix: &str) -> String {
    items
        .iter()
        .map(|item| format!("{}{}", prefix, item))
        .collect::<Vec<_>>()
        .join("\n")
}

fn format_entry(entry: &EntrySummary) -> String {
    match entry.matches {
        1 => format!("{} (1 match)", entry.path),
        n => format!("{} ({} matches)", entry.path, n),
    }
}

/// Format a publish report.
///
/// ```
/// use forgepatch::core::types::{Oid, RefName};
/// use forgepatch::forge::Reference;
/// use forgepatch::publish::{EntrySummary, PublishReport};
/// use forgepatch::ui::output::format_report;
///
/// let commit = Oid::new("a".repeat(40)).unwrap();
/// let report = PublishReport {
///     branch: Reference { name: RefName::new("refs/heads/auto").unwrap(), target: commit.clone() },
///     created_branch: true,
///     tree: Oid::new("b".repeat(40)).unwrap(),
///     commit,
///     entries: vec![EntrySummary { path: "a.txt".into(), matches: 2 }],
/// };
/// let text = format_report(&report);
/// assert!(text.starts_with("Created branch auto"));
/// assert!(text.contains("  a.txt (2 matches)"));
/// ```
pub fn format_report(report: &PublishReport) -> String {
    let name = &report.branch.name;
    let branch = name.branch_name().unwrap_or(name.as_str());
    let verb = if report.created_branch {
        "Created branch"
    } else {
        "Updated branch"
    };
    let files: Vec<String> = report.entries.iter().map(format_entry).collect();
    format!(
        "{} {} at {} ({} file{})\n{}",
        verb,
        branch,
        format_oid(&report.commit),
        files.len(),
        if files.len() == 1 { "" } else { "s" },
        format_list(&files, "  ")
    )
}
