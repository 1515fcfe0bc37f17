//! buckets command - List buckets
//!
//! Lists every bucket visible to the configured credentials.

use clap::Args;
use isd_core::object;
use serde::Serialize;

use super::{Context, fail};
use crate::exit_code::ExitCode;

/// List buckets
#[derive(Args, Debug)]
pub struct BucketsArgs {
    /// Print bucket names only
    #[arg(long)]
    pub names_only: bool,
}

#[derive(Debug, Serialize)]
struct BucketsOutput {
    buckets: Vec<String>,
}

/// Execute the buckets command
pub async fn execute(args: BucketsArgs, ctx: &Context) -> ExitCode {
    let formatter = &ctx.formatter;

    let buckets = match object::list_buckets(ctx.store()).await {
        Ok(buckets) => buckets,
        Err(e) => return fail(formatter, "Failed to list buckets", &e),
    };

    if formatter.is_json() {
        if args.names_only {
            formatter.json(&BucketsOutput {
                buckets: buckets.into_iter().map(|b| b.key).collect(),
            });
        } else {
            formatter.json(&buckets);
        }
    } else {
        for bucket in &buckets {
            match (&bucket.last_modified, args.names_only) {
                (Some(created), false) => formatter.println(&format!(
                    "[{}] {}/",
                    created.strftime("%Y-%m-%d %H:%M:%S"),
                    bucket.key
                )),
                _ => formatter.println(&format!("{}/", bucket.key)),
            }
        }
    }

    ExitCode::Success
}
