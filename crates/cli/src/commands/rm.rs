//! rm command - Remove one object

use clap::Args;
use isd_core::object;

use super::{Context, fail};
use crate::exit_code::ExitCode;

/// Remove one object
#[derive(Args, Debug)]
pub struct RmArgs {
    /// Bucket name
    pub bucket: String,

    /// Object key
    pub key: String,
}

/// Execute the rm command
pub async fn execute(args: RmArgs, ctx: &Context) -> ExitCode {
    let formatter = &ctx.formatter;

    if let Err(e) = object::delete_object(ctx.store(), &args.bucket, &args.key).await {
        return fail(formatter, "Failed to remove object", &e);
    }

    if formatter.is_json() {
        formatter.json(&serde_json::json!({
            "status": "success",
            "bucket": args.bucket,
            "key": args.key,
        }));
    } else {
        formatter.success(&format!("Removed: {}/{}", args.bucket, args.key));
    }
    ExitCode::Success
}
