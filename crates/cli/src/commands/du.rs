//! du command - Summarize disk usage
//!
//! Totals the size of every matching object, scaled to a block size.

use clap::Args;
use isd_core::{KeyPattern, ListRequest, disk_usage};

use super::{Context, fail};
use crate::exit_code::ExitCode;

/// Show the total size of matching objects
#[derive(Args, Debug)]
pub struct DuArgs {
    /// Bucket name
    pub bucket: String,

    /// Key prefix to measure under
    #[arg(default_value = "")]
    pub prefix: String,

    /// Keep only keys matching this regular expression
    #[arg(long)]
    pub regex: Option<String>,

    /// Block size such as 1KB, 10MB or 2GB; defaults to the configured value
    #[arg(short = 'B', long)]
    pub block_size: Option<String>,
}

/// Execute the du command
pub async fn execute(args: DuArgs, ctx: &Context) -> ExitCode {
    let formatter = &ctx.formatter;

    let pattern = match KeyPattern::optional(args.regex.as_deref()) {
        Ok(p) => p,
        Err(e) => return fail(formatter, "Invalid pattern", &e),
    };
    let request = ListRequest::new(args.prefix).with_pattern(pattern);
    let block_size = args
        .block_size
        .as_deref()
        .unwrap_or(&ctx.config.defaults.block_size);

    let usage = match disk_usage(ctx.store(), &args.bucket, &request, block_size).await {
        Ok(usage) => usage,
        Err(e) => return fail(formatter, "Failed to compute disk usage", &e),
    };

    if formatter.is_json() {
        formatter.json(&usage);
        return ExitCode::Success;
    }

    if let Some(warning) = &usage.warning {
        formatter.warning(&format!("{warning}; using {}", usage.unit));
    }
    formatter.println(&format!(
        "{} {} ({} objects, {} bytes)",
        usage.total, usage.unit, usage.objects, usage.bytes
    ));

    ExitCode::Success
}

#[cfg(test)]
mod tests {
    use super::super::{Cli, Commands};
    use clap::Parser;

    #[test]
    fn test_parse_block_size() {
        let cli = Cli::try_parse_from(["isd", "du", "logs", "-B", "10MB"]).unwrap();
        let Commands::Du(args) = cli.command else {
            panic!("expected du");
        };
        assert_eq!(args.block_size.as_deref(), Some("10MB"));
    }

    #[test]
    fn test_block_size_optional() {
        let cli = Cli::try_parse_from(["isd", "du", "logs", "2024/"]).unwrap();
        let Commands::Du(args) = cli.command else {
            panic!("expected du");
        };
        assert!(args.block_size.is_none());
        assert_eq!(args.prefix, "2024/");
    }
}
