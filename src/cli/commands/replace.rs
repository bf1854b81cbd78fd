//! cli::commands::replace
//!
//! Replace literal text in repository files and commit the result.
//!
//! # Algorithm
//!
//! 1. Load configuration and connect to GitHub
//! 2. Build one change per `--file`, plus a search change when no file is
//!    given or `--search` is set
//! 3. Publish: get or create the branch, build the tree, commit, fast-forward

use std::time::Duration;

use anyhow::{Context as _, Result};

use super::{connect, load_config};
use crate::change::{Change, LiteralReplace};
use crate::cli::args::ReplaceArgs;
use crate::cli::Context;
use crate::publish::{PublishOptions, PublishSettings, Publisher};
use crate::ui::output;

/// Run the replace command.
pub fn replace(ctx: &Context, args: ReplaceArgs) -> Result<()> {
    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(replace_async(ctx, args))
}

async fn replace_async(ctx: &Context, args: ReplaceArgs) -> Result<()> {
    let config = load_config(ctx)?;
    let changes = build_changes(&args)?;
    let forge = connect(&args.repo, &args.remote, &config)?;

    let mut settings = PublishSettings::from_config(&config);
    if let Some(message) = args.message {
        settings.message = message;
    }
    if let Some(language) = args.language {
        settings.language = Some(language);
    }

    let options = args
        .timeout
        .map(|secs| PublishOptions::with_timeout(Duration::from_secs(secs)))
        .unwrap_or_default();

    for change in &changes {
        output::debug(format!("change: {}", change.target()), ctx.verbosity);
    }

    let report = Publisher::new(forge.as_ref(), settings, options)
        .publish(&args.branch, &changes)
        .await
        .with_context(|| format!("failed to publish to {} on {}", args.branch, args.repo))?;

    output::print(output::format_report(&report), ctx.verbosity);
    Ok(())
}

/// Turn the command-line arguments into a batch of changes.
fn build_changes(args: &ReplaceArgs) -> Result<Vec<Change>> {
    let replacement = LiteralReplace::new(args.find.as_str(), args.replace.as_str());

    let mut changes = args
        .files
        .iter()
        .map(|file| Change::for_file(file, replacement.clone()))
        .collect::<Result<Vec<_>, _>>()?;

    if changes.is_empty() || args.search {
        changes.push(Change::searching(replacement));
    }
    Ok(changes)
}
