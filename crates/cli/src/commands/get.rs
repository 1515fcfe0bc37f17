//! get command - Download one object
//!
//! Writes the object into a local directory, named after the last key segment.

use std::path::PathBuf;

use clap::Args;
use isd_core::object;

use super::{Context, fail};
use crate::exit_code::ExitCode;

/// Download one object
#[derive(Args, Debug)]
pub struct GetArgs {
    /// Bucket name
    pub bucket: String,

    /// Object key
    pub key: String,

    /// Directory to write into
    #[arg(short, long, default_value = ".")]
    pub dir: PathBuf,
}

/// Execute the get command
pub async fn execute(args: GetArgs, ctx: &Context) -> ExitCode {
    let formatter = &ctx.formatter;

    let path = match object::get_object(ctx.store(), &args.bucket, &args.key, &args.dir).await {
        Ok(path) => path,
        Err(e) => return fail(formatter, "Download failed", &e),
    };

    if formatter.is_json() {
        formatter.json(&serde_json::json!({
            "status": "success",
            "bucket": args.bucket,
            "key": args.key,
            "local_path": path,
        }));
    } else {
        formatter.success(&format!(
            "{}/{} -> {}",
            args.bucket,
            args.key,
            path.display()
        ));
    }
    ExitCode::Success
}

#[cfg(test)]
mod tests {
    use super::super::{Cli, Commands};
    use clap::Parser;
    use std::path::Path;

    #[test]
    fn test_parse_get_default_dir() {
        let cli = Cli::try_parse_from(["isd", "get", "b", "a/b.txt"]).unwrap();
        let Commands::Get(args) = cli.command else {
            panic!("expected get");
        };
        assert_eq!(args.dir, Path::new("."));
    }
}
