//! search command - Find objects by metadata key
//!
//! Lists the matching objects and fetches the metadata of each one in turn.
//! The first fetch failure aborts the whole search.

use clap::Args;
use isd_core::{KeyPattern, ListRequest, search_metadata};
use serde::Serialize;

use super::{Context, fail};
use crate::exit_code::ExitCode;

/// Find objects carrying a metadata key
#[derive(Args, Debug)]
pub struct SearchArgs {
    /// Bucket name
    pub bucket: String,

    /// Metadata key that must be present
    pub metadata_key: String,

    /// Key prefix to search under
    #[arg(long, default_value = "")]
    pub prefix: String,

    /// Keep only keys matching this regular expression
    #[arg(long)]
    pub regex: Option<String>,
}

#[derive(Debug, Serialize)]
struct SearchOutput<'a> {
    metadata_key: &'a str,
    keys: &'a [String],
}

/// Execute the search command
pub async fn execute(args: SearchArgs, ctx: &Context) -> ExitCode {
    let formatter = &ctx.formatter;

    let pattern = match KeyPattern::optional(args.regex.as_deref()) {
        Ok(p) => p,
        Err(e) => return fail(formatter, "Invalid pattern", &e),
    };
    let request = ListRequest::new(args.prefix).with_pattern(pattern);

    let keys =
        match search_metadata(ctx.store(), &args.bucket, &request, &args.metadata_key).await {
            Ok(keys) => keys,
            Err(e) => return fail(formatter, "Metadata search failed", &e),
        };

    if formatter.is_json() {
        formatter.json(&SearchOutput {
            metadata_key: &args.metadata_key,
            keys: &keys,
        });
    } else {
        for key in &keys {
            formatter.println(key);
        }
    }

    ExitCode::Success
}
