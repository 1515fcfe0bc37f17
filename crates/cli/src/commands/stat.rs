//! meta command - Show object metadata
//!
//! Displays the user metadata attached to one object.

use clap::Args;
use isd_core::object;
use serde::Serialize;

use super::{Context, fail};
use crate::exit_code::ExitCode;

/// Show the user metadata of an object
#[derive(Args, Debug)]
pub struct StatArgs {
    /// Bucket name
    pub bucket: String,

    /// Object key
    pub key: String,
}

#[derive(Debug, Serialize)]
struct StatOutput<'a> {
    bucket: &'a str,
    key: &'a str,
    metadata: &'a isd_core::Metadata,
}

/// Execute the meta command
pub async fn execute(args: StatArgs, ctx: &Context) -> ExitCode {
    let formatter = &ctx.formatter;

    let metadata = match object::get_metadata(ctx.store(), &args.bucket, &args.key).await {
        Ok(m) => m,
        Err(e) => return fail(formatter, "Failed to get object metadata", &e),
    };

    if formatter.is_json() {
        formatter.json(&StatOutput {
            bucket: &args.bucket,
            key: &args.key,
            metadata: &metadata,
        });
    } else {
        formatter.println(&format!("Name      : {}/{}", args.bucket, args.key));
        if metadata.is_empty() {
            formatter.println("Metadata  : (none)");
        }
        for (name, value) in &metadata {
            formatter.println(&format!("  {name:<8}: {value}"));
        }
    }

    ExitCode::Success
}
