//! CLI command definitions and execution
//!
//! This module contains all CLI commands and their implementations.
//! Every command except `completions` runs against one store client built
//! from the loaded configuration.

use std::path::PathBuf;

use anyhow::Context as _;
use clap::{Parser, Subcommand, ValueEnum};
use isd_core::{Config, ConfigManager, ObjectStore};
use isd_s3::S3Client;

use crate::exit_code::ExitCode;
use crate::output::{Formatter, OutputConfig, batch_table};

mod buckets;
mod completions;
mod delete;
mod du;
mod get;
mod ls;
mod put;
mod rm;
mod search;
mod stat;
mod upload;

/// isd - batch sync for S3-compatible object storage
///
/// Lists, measures, searches, uploads and deletes objects in bulk.
#[derive(Parser, Debug)]
#[command(name = "isd")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output format; overrides the configured default
    #[arg(long, global = true, value_enum)]
    pub output: Option<OutputFormat>,

    /// Shorthand for --output json
    #[arg(long, global = true, default_value = "false", conflicts_with = "output")]
    pub json: bool,

    /// Print JSON on a single line
    #[arg(long, global = true, default_value = "false")]
    pub compact: bool,

    /// Disable colored output
    #[arg(long, global = true, default_value = "false")]
    pub no_color: bool,

    /// Disable progress spinner
    #[arg(long, global = true, default_value = "false")]
    pub no_progress: bool,

    /// Suppress non-error output
    #[arg(short, long, global = true, default_value = "false")]
    pub quiet: bool,

    /// Enable debug logging
    #[arg(long, global = true, default_value = "false")]
    pub debug: bool,

    /// Store endpoint; overrides the configured one
    #[arg(long, global = true)]
    pub endpoint_url: Option<String>,

    /// Path to the configuration file
    #[arg(long, global = true, env = "ISD_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Output format
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Json,
    Human,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List buckets
    Buckets(buckets::BucketsArgs),

    /// List objects in a bucket
    Ls(ls::LsArgs),

    /// Show the total size of matching objects
    Du(du::DuArgs),

    /// Show the user metadata of an object
    Meta(stat::StatArgs),

    /// Find objects carrying a metadata key
    Search(search::SearchArgs),

    /// Upload one file
    Put(put::PutArgs),

    /// Download one object
    Get(get::GetArgs),

    /// Remove one object
    Rm(rm::RmArgs),

    /// Upload a local directory tree concurrently
    Upload(upload::UploadArgs),

    /// Delete every object matching a pattern concurrently
    Delete(delete::DeleteArgs),

    /// Generate shell completion scripts
    Completions(completions::CompletionsArgs),
}

/// Shared state handed to each command
pub struct Context {
    pub config: Config,
    pub formatter: Formatter,
    client: S3Client,
}

impl Context {
    /// The store every command runs against
    pub fn store(&self) -> &dyn ObjectStore {
        &self.client
    }
}

impl Cli {
    /// Resolve output settings from flags, falling back to the configured default
    pub fn output_config(&self, config: &Config) -> OutputConfig {
        let json = match (self.json, self.output) {
            (true, _) => true,
            (false, Some(format)) => format == OutputFormat::Json,
            (false, None) => config.defaults.output.eq_ignore_ascii_case("json"),
        };
        OutputConfig {
            json,
            compact: self.compact,
            no_color: self.no_color,
            no_progress: self.no_progress,
            quiet: self.quiet,
        }
    }

    fn load_config(&self) -> anyhow::Result<Config> {
        let manager = match &self.config {
            Some(path) => ConfigManager::with_path(path.clone()),
            None => ConfigManager::new().context("Failed to locate config directory")?,
        };
        let mut config = manager.load().with_context(|| {
            format!(
                "Failed to load config from {}",
                manager.config_path().display()
            )
        })?;
        if let Some(endpoint) = &self.endpoint_url {
            config.store.endpoint_url = Some(endpoint.clone());
        }
        Ok(config)
    }
}

async fn build_context(cli: &Cli) -> anyhow::Result<Context> {
    let config = cli.load_config()?;
    let formatter = Formatter::new(cli.output_config(&config));
    let client = S3Client::new(&config.store)
        .await
        .context("Failed to create S3 client")?;
    Ok(Context {
        config,
        formatter,
        client,
    })
}

/// Execute the CLI command and return an exit code
pub async fn execute(cli: Cli) -> ExitCode {
    if let Commands::Completions(args) = cli.command {
        return completions::execute(args);
    }

    let ctx = match build_context(&cli).await {
        Ok(ctx) => {
            tracing::debug!(
                endpoint = ctx.config.store.endpoint_url.as_deref().unwrap_or("default"),
                json = ctx.formatter.is_json(),
                "connected"
            );
            ctx
        }
        Err(e) => {
            let formatter = Formatter::new(cli.output_config(&Config::default()));
            formatter.error(&format!("{e:#}"));
            return ExitCode::from_anyhow(&e);
        }
    };

    match cli.command {
        Commands::Buckets(args) => buckets::execute(args, &ctx).await,
        Commands::Ls(args) => ls::execute(args, &ctx).await,
        Commands::Du(args) => du::execute(args, &ctx).await,
        Commands::Meta(args) => stat::execute(args, &ctx).await,
        Commands::Search(args) => search::execute(args, &ctx).await,
        Commands::Put(args) => put::execute(args, &ctx).await,
        Commands::Get(args) => get::execute(args, &ctx).await,
        Commands::Rm(args) => rm::execute(args, &ctx).await,
        Commands::Upload(args) => upload::execute(args, &ctx).await,
        Commands::Delete(args) => delete::execute(args, &ctx).await,
        Commands::Completions(_) => unreachable!("handled before connecting"),
    }
}

/// Report a core error and map it to an exit code
pub(crate) fn fail(formatter: &Formatter, context: &str, error: &isd_core::Error) -> ExitCode {
    formatter.error(&format!("{context}: {error}"));
    ExitCode::from_error(error)
}

/// Print a batch outcome and pick the exit code
///
/// Any failed task makes the whole command exit with `PartialFailure`.
pub(crate) fn render_batch(formatter: &Formatter, result: &isd_core::BatchResult) -> ExitCode {
    tracing::debug!(
        tasks = result.len(),
        failed = result.failed(),
        dry_run = result.dry_run,
        "batch finished"
    );
    if formatter.is_json() {
        formatter.json(result);
    } else if !result.is_empty() {
        formatter.println(&batch_table(result, formatter.colors_enabled()).to_string());
    }

    let summary = format!(
        "{} tasks: {} succeeded, {} failed, {} skipped",
        result.len(),
        result.succeeded(),
        result.failed(),
        result.skipped()
    );
    if result.has_failures() {
        formatter.warning(&summary);
        ExitCode::PartialFailure
    } else {
        formatter.success(&summary);
        ExitCode::Success
    }
}
