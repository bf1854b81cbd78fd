//! cli::commands::branch
//!
//! Get or create a branch without committing anything.

use anyhow::{Context as _, Result};

use super::{connect, load_config};
use crate::cli::args::BranchArgs;
use crate::cli::Context;
use crate::publish::{BranchResolver, PublishOptions, PublishSettings};
use crate::ui::output;

/// Run the branch command.
pub fn branch(ctx: &Context, args: BranchArgs) -> Result<()> {
    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(branch_async(ctx, args))
}

async fn branch_async(ctx: &Context, args: BranchArgs) -> Result<()> {
    let config = load_config(ctx)?;
    let forge = connect(&args.repo, &args.remote, &config)?;
    let settings = PublishSettings::from_config(&config);
    let options = PublishOptions::default();

    let resolver = BranchResolver::new(forge.as_ref(), settings.base_branch.as_deref(), &options);
    let (reference, created) = resolver
        .get_or_create_branch(&args.name)
        .await
        .with_context(|| format!("failed to resolve branch '{}'", args.name))?;

    let verb = if created { "Created" } else { "Found" };
    output::print(
        format!("{} {} at {}", verb, args.name, reference.target),
        ctx.verbosity,
    );
    Ok(())
}
