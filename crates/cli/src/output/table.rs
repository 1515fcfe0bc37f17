//! Per-task outcome table for batch commands

use comfy_table::presets::UTF8_FULL_CONDENSED;
use comfy_table::{Cell, Color, ContentArrangement, Table};
use isd_core::{BatchResult, TaskOutcome};

/// Render the outcome of every task of a batch
pub fn batch_table(result: &BatchResult, colors: bool) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["#", "Target", "Status", "Detail"]);

    for report in &result.reports {
        let (status, color, detail) = match &report.outcome {
            TaskOutcome::Succeeded => ("succeeded", Color::Green, String::new()),
            TaskOutcome::Failed(reason) => ("failed", Color::Red, reason.clone()),
            TaskOutcome::Skipped => ("skipped", Color::Yellow, report.action.clone()),
        };
        let mut status = Cell::new(status);
        if colors {
            status = status.fg(color);
        }
        table.add_row(vec![
            Cell::new(report.index + 1),
            Cell::new(format!("{}/{}", report.bucket, report.key)),
            status,
            Cell::new(detail),
        ]);
    }

    table
}
