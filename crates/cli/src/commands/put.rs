//! put command - Upload one file

use std::path::PathBuf;

use clap::Args;
use isd_core::{MetadataSpec, object};

use super::{Context, fail};
use crate::exit_code::ExitCode;

/// Upload one file
#[derive(Args, Debug)]
pub struct PutArgs {
    /// Local file to upload
    pub file: PathBuf,

    /// Destination bucket
    pub bucket: String,

    /// Destination key; defaults to the local path
    pub key: Option<String>,

    /// Inline JSON object, or the path of a script printing one
    #[arg(long)]
    pub metadata: Option<String>,
}

/// Execute the put command
pub async fn execute(args: PutArgs, ctx: &Context) -> ExitCode {
    let formatter = &ctx.formatter;

    let metadata = match args.metadata.as_deref().map(MetadataSpec::parse).transpose() {
        Ok(m) => m,
        Err(e) => return fail(formatter, "Invalid metadata", &e),
    };
    let key = args
        .key
        .unwrap_or_else(|| args.file.to_string_lossy().into_owned());

    if let Err(e) =
        object::upload_object(ctx.store(), &args.bucket, &args.file, &key, metadata).await
    {
        return fail(formatter, "Upload failed", &e);
    }

    if formatter.is_json() {
        formatter.json(&serde_json::json!({
            "status": "success",
            "bucket": args.bucket,
            "key": key,
            "local_path": args.file,
        }));
    } else {
        formatter.success(&format!(
            "{} -> {}/{key}",
            args.file.display(),
            args.bucket
        ));
    }
    ExitCode::Success
}
