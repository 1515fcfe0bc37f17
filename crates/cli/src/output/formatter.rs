//! Output formatter for JSON and human-readable output
//!
//! Ensures consistent output formatting across all commands.

use serde::Serialize;

use super::OutputConfig;

/// Formatter for CLI output
///
/// Handles both human-readable and JSON output formats based on configuration.
/// When JSON mode is enabled, all output is strict JSON without colors or progress.
#[derive(Debug, Clone)]
pub struct Formatter {
    config: OutputConfig,
}

impl Formatter {
    /// Create a new formatter with the given configuration
    pub fn new(config: OutputConfig) -> Self {
        Self { config }
    }

    /// The configuration this formatter was built with
    pub fn config(&self) -> &OutputConfig {
        &self.config
    }

    /// Check if JSON output mode is enabled
    pub fn is_json(&self) -> bool {
        self.config.json
    }

    /// Check if colors are enabled
    pub fn colors_enabled(&self) -> bool {
        !self.config.no_color && !self.config.json
    }

    /// Render a value as JSON, pretty unless compact output was requested
    pub fn to_json<T: Serialize>(&self, value: &T) -> serde_json::Result<String> {
        if self.config.compact {
            serde_json::to_string(value)
        } else {
            serde_json::to_string_pretty(value)
        }
    }

    /// Print a value as JSON on stdout (respects quiet mode)
    pub fn json<T: Serialize>(&self, value: &T) {
        if self.config.quiet {
            return;
        }
        match self.to_json(value) {
            Ok(json) => println!("{json}"),
            Err(e) => eprintln!("Error serializing output: {e}"),
        }
    }

    /// Report a completed action on stdout; silent in JSON and quiet mode
    pub fn success(&self, message: &str) {
        if let Some(line) = self.status_line(Status::Ok, message) {
            println!("{line}");
        }
    }

    /// Report a non-fatal problem on stderr; silent in JSON and quiet mode
    pub fn warning(&self, message: &str) {
        if let Some(line) = self.status_line(Status::Warn, message) {
            eprintln!("{line}");
        }
    }

    /// Report a failure on stderr, even in quiet mode
    ///
    /// In JSON mode the message is wrapped as `{"error": ...}`.
    pub fn error(&self, message: &str) {
        if self.config.json {
            let body = serde_json::json!({ "error": message });
            match self.to_json(&body) {
                Ok(json) => eprintln!("{json}"),
                Err(_) => eprintln!("{message}"),
            }
            return;
        }
        eprintln!("{}", self.decorate(Status::Fail, message));
    }

    /// Print a line of text (respects quiet mode)
    pub fn println(&self, message: &str) {
        if !self.config.quiet {
            println!("{message}");
        }
    }

    fn status_line(&self, status: Status, message: &str) -> Option<String> {
        if self.config.quiet || self.config.json {
            None
        } else {
            Some(self.decorate(status, message))
        }
    }

    fn decorate(&self, status: Status, message: &str) -> String {
        let (symbol, color) = match status {
            Status::Ok => ("✓", console::Color::Green),
            Status::Warn => ("⚠", console::Color::Yellow),
            Status::Fail => ("✗", console::Color::Red),
        };
        if self.colors_enabled() {
            format!("{} {message}", console::style(symbol).fg(color))
        } else {
            format!("{symbol} {message}")
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Status {
    Ok,
    Warn,
    Fail,
}

impl Default for Formatter {
    fn default() -> Self {
        Self::new(OutputConfig::default())
    }
}
