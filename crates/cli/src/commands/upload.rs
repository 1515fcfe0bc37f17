//! upload command - Upload a local tree
//!
//! Walks a local directory and uploads every file concurrently. Each file
//! gets its own outcome; one failure does not stop the rest.

use std::path::PathBuf;

use clap::Args;
use isd_core::{MetadataSpec, TransferEngine, UploadRequest};

use super::{Context, fail, render_batch};
use crate::exit_code::ExitCode;
use crate::output::ProgressBar;

/// Upload a local directory tree concurrently
#[derive(Args, Debug)]
pub struct UploadArgs {
    /// Local directory to upload
    pub dir: PathBuf,

    /// Destination bucket
    pub bucket: String,

    /// Prepended to each local path to form the key
    #[arg(long, default_value = "")]
    pub key_prefix: String,

    /// Descend into subdirectories
    #[arg(short, long)]
    pub recursive: bool,

    /// Skip files whose path contains this text (repeatable)
    #[arg(long)]
    pub ignore: Vec<String>,

    /// Inline JSON object, or the path of a script printing one per file
    #[arg(long)]
    pub metadata: Option<String>,

    /// Report what would be uploaded without touching the store
    #[arg(long)]
    pub dry_run: bool,

    /// Number of concurrent workers; defaults to the configured value
    #[arg(short, long)]
    pub workers: Option<usize>,
}

/// Execute the upload command
pub async fn execute(args: UploadArgs, ctx: &Context) -> ExitCode {
    let formatter = &ctx.formatter;

    let metadata = match args.metadata.as_deref().map(MetadataSpec::parse).transpose() {
        Ok(m) => m,
        Err(e) => return fail(formatter, "Invalid metadata", &e),
    };

    let mut transfer = ctx.config.defaults.transfer_config();
    if let Some(workers) = args.workers {
        transfer = transfer.with_workers(workers);
    }

    let request = UploadRequest {
        bucket: args.bucket,
        local_dir: args.dir,
        key_prefix: args.key_prefix,
        recursive: args.recursive,
        ignore: args.ignore,
        metadata,
        dry_run: args.dry_run,
    };

    let spinner = ProgressBar::spinner(
        formatter.config(),
        &format!("Uploading {}", request.local_dir.display()),
    );
    let result = TransferEngine::new(ctx.store(), transfer)
        .upload_tree(&request)
        .await;
    spinner.finish_and_clear();

    match result {
        Ok(result) => render_batch(formatter, &result),
        Err(e) => fail(formatter, "Upload failed", &e),
    }
}
