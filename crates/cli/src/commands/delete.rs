//! delete command - Delete matching objects
//!
//! Lists every object matching a pattern and deletes them concurrently,
//! reporting one outcome per key.

use clap::Args;
use isd_core::{KeyPattern, ListRequest, TransferEngine};

use super::{Context, fail, render_batch};
use crate::exit_code::ExitCode;
use crate::output::ProgressBar;

/// Delete every object matching a pattern concurrently
#[derive(Args, Debug)]
pub struct DeleteArgs {
    /// Bucket name
    pub bucket: String,

    /// Regular expression keys must match, anchored at the start
    #[arg(long)]
    pub regex: String,

    /// Only consider keys under this prefix
    #[arg(long, default_value = "")]
    pub prefix: String,

    /// Report what would be deleted without touching the store
    #[arg(long)]
    pub dry_run: bool,

    /// Number of concurrent workers; defaults to the configured value
    #[arg(short, long)]
    pub workers: Option<usize>,
}

/// Execute the delete command
pub async fn execute(args: DeleteArgs, ctx: &Context) -> ExitCode {
    let formatter = &ctx.formatter;

    let pattern = match KeyPattern::new(&args.regex) {
        Ok(p) => p,
        Err(e) => return fail(formatter, "Invalid pattern", &e),
    };
    let request = ListRequest::new(args.prefix).with_pattern(Some(pattern));

    let mut transfer = ctx.config.defaults.transfer_config();
    if let Some(workers) = args.workers {
        transfer = transfer.with_workers(workers);
    }

    let spinner = ProgressBar::spinner(
        formatter.config(),
        &format!("Deleting from {}", args.bucket),
    );
    let result = TransferEngine::new(ctx.store(), transfer)
        .delete_matching(&args.bucket, &request, args.dry_run)
        .await;
    spinner.finish_and_clear();

    match result {
        Ok(result) => render_batch(formatter, &result),
        Err(e) => fail(formatter, "Delete failed", &e),
    }
}
