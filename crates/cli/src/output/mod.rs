//! Output formatting utilities
//!
//! This module provides formatters for CLI output in both JSON and
//! human-readable formats. It also handles progress spinners and the
//! per-task outcome table of batch commands.

mod formatter;
mod progress;
mod table;

pub use formatter::Formatter;
pub use progress::ProgressBar;
pub use table::batch_table;

/// Output configuration derived from CLI flags and config defaults
#[derive(Debug, Clone, Default)]
pub struct OutputConfig {
    /// Use JSON output format
    pub json: bool,
    /// Single-line JSON instead of pretty-printed
    pub compact: bool,
    /// Disable colored output
    pub no_color: bool,
    /// Disable progress spinner
    pub no_progress: bool,
    /// Suppress non-error output
    pub quiet: bool,
}
