//! ls command - List objects
//!
//! Lists every object under a prefix, following pagination to the end.
//! With `--dir`, lists one level of common prefixes instead.

use clap::Args;
use isd_core::{KeyPattern, ListRequest, Lister};
use serde::Serialize;

use super::{Context, fail};
use crate::exit_code::ExitCode;

/// List objects in a bucket
#[derive(Args, Debug)]
pub struct LsArgs {
    /// Bucket name
    pub bucket: String,

    /// Key prefix to list under
    #[arg(default_value = "")]
    pub prefix: String,

    /// Keep only keys matching this regular expression, anchored at the start
    #[arg(long)]
    pub regex: Option<String>,

    /// List one level of sub-prefixes
    #[arg(long)]
    pub dir: bool,

    /// Print keys only
    #[arg(long)]
    pub keys_only: bool,

    /// Keys requested per listing page
    #[arg(long, value_parser = clap::value_parser!(i32).range(1..=1000))]
    pub page_size: Option<i32>,
}

#[derive(Debug, Serialize)]
struct KeysOutput<'a> {
    bucket: &'a str,
    keys: Vec<&'a str>,
}

/// Execute the ls command
pub async fn execute(args: LsArgs, ctx: &Context) -> ExitCode {
    let formatter = &ctx.formatter;

    let pattern = match KeyPattern::optional(args.regex.as_deref()) {
        Ok(p) => p,
        Err(e) => return fail(formatter, "Invalid pattern", &e),
    };
    let request = ListRequest::new(args.prefix)
        .with_pattern(pattern)
        .with_directory(args.dir);

    let mut lister = Lister::new(ctx.store());
    if let Some(size) = args.page_size {
        lister = lister.with_page_size(size);
    }

    let records = match lister.list(&args.bucket, &request).await {
        Ok(records) => records,
        Err(e) => return fail(formatter, "Failed to list objects", &e),
    };

    if formatter.is_json() {
        if args.keys_only {
            formatter.json(&KeysOutput {
                bucket: &args.bucket,
                keys: records.iter().map(|r| r.key.as_str()).collect(),
            });
        } else {
            formatter.json(&records);
        }
        return ExitCode::Success;
    }

    for record in &records {
        if args.keys_only || record.is_dir {
            formatter.println(&record.key);
            continue;
        }
        let date = record
            .last_modified
            .map(|t| t.strftime("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_default();
        let size = record.size_human.as_deref().unwrap_or("0 B");
        formatter.println(&format!("[{date:>19}] {size:>10} {}", record.key));
    }

    ExitCode::Success
}
