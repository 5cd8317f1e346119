mod cli;
mod markdown;

use crate::{
    types::{DeltaFormat, DiffByMetric},
    units::format_bytes,
};

pub use cli::render_cli_table;
pub use markdown::render_markdown;

#[derive(Debug, Clone, Default)]
pub struct ReportOptions {
    /// Commit the baseline was measured at; empty when there is no baseline.
    pub commit_sha: String,
    pub repository: Option<String>,
    pub show_unchanged: bool,
    pub delta_format: DeltaFormat,
}

fn delta_value(diff: &DiffByMetric, format: DeltaFormat) -> String {
    match format {
        DeltaFormat::Delta => format_bytes(diff.delta),
        DeltaFormat::Percent => diff.percent.clone(),
    }
}

/// Signed change with a direction arrow, e.g. `+500 B↑` or `-5%↓`.
fn format_change(diff: &DiffByMetric, format: DeltaFormat) -> String {
    let sign = if diff.delta > 0 { "+" } else { "" };
    let arrow = match diff.delta.signum() {
        1 => "↑",
        -1 => "↓",
        _ => "",
    };
    format!("{sign}{}{arrow}", delta_value(diff, format))
}
