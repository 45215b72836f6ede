//! Report rendering for each output format.

use anyhow::Result;
use owo_colors::OwoColorize;
use tablesync_reconcile::ReconcileReport;
use tabled::{Table, Tabled};

use crate::OutputFormat;

#[derive(Tabled)]
struct ReportRow {
    #[tabled(rename = "Code")]
    code: u16,
    #[tabled(rename = "Result")]
    label: &'static str,
    #[tabled(rename = "Table")]
    table: String,
    #[tabled(rename = "Warnings")]
    warnings: usize,
    #[tabled(rename = "Message")]
    message: String,
}

/// Renders reports in the requested format.
///
/// # Errors
///
/// Returns an error if JSON serialization fails.
pub fn render_reports(reports: &[ReconcileReport], format: &OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(reports)?),
        OutputFormat::Text => Ok(reports
            .iter()
            .map(render_line)
            .collect::<Vec<_>>()
            .join("\n")),
        OutputFormat::Table => {
            let rows: Vec<_> = reports
                .iter()
                .map(|report| ReportRow {
                    code: report.code(),
                    label: report.label(),
                    table: report.ident.to_string(),
                    warnings: report.warnings.len(),
                    message: report.to_string(),
                })
                .collect();
            Ok(Table::new(rows).to_string())
        }
    }
}

fn render_line(report: &ReconcileReport) -> String {
    let line = report.to_string();
    let mut rendered = match report.code() {
        200 | 201 => line.green().to_string(),
        207 => line.yellow().to_string(),
        _ => line.red().to_string(),
    };
    for warning in &report.warnings {
        rendered.push_str(&format!("\n  {} {warning}", "warning:".yellow()));
    }
    rendered
}

/// Summary line for a batch of reports.
#[must_use]
pub fn summary(reports: &[ReconcileReport]) -> String {
    let failed = reports.iter().filter(|r| !r.is_success()).count();
    format!(
        "{} table(s): {} succeeded, {failed} failed",
        reports.len(),
        reports.len() - failed
    )
}
