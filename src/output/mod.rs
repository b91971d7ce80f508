mod cli;
mod html;
mod json;
mod markdown;

pub use cli::{print_cli_table, render_table};
pub use html::{generate_html_string, print_html};
pub use json::{generate_json_string, print_json};
pub use markdown::{generate_markdown_string, print_markdown};

use crate::error::Result;
use crate::model::{ScanReport, Severity};

/// Output format for scan reports
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable table format
    Table,
    /// JSON format for programmatic use
    Json,
    /// Markdown, e.g. for pull request comments
    Markdown,
    /// HTML report format
    Html,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "table" => Ok(OutputFormat::Table),
            "json" => Ok(OutputFormat::Json),
            "md" | "markdown" => Ok(OutputFormat::Markdown),
            "html" => Ok(OutputFormat::Html),
            _ => Err(format!(
                "Invalid format '{}'. Must be: table, json, md, html",
                s
            )),
        }
    }
}

pub fn print_result(report: &ScanReport, format: OutputFormat, quiet: bool) -> Result<()> {
    match format {
        OutputFormat::Table => print_cli_table(report, quiet),
        OutputFormat::Json => print_json(report),
        OutputFormat::Markdown => print_markdown(report),
        OutputFormat::Html => print_html(report),
    }
}

/// Format report to string for file output
pub fn format_result_to_string(report: &ScanReport, format: OutputFormat, quiet: bool) -> Result<String> {
    match format {
        OutputFormat::Table => Ok(render_table(report, quiet, false)),
        OutputFormat::Json => generate_json_string(report),
        OutputFormat::Markdown => Ok(generate_markdown_string(report)),
        OutputFormat::Html => Ok(generate_html_string(report)),
    }
}

/// Advisories across all findings, most severe first.
fn advisories_by_severity(report: &ScanReport) -> Vec<(&str, &crate::model::AdvisoryRecord)> {
    let mut rows: Vec<_> = report
        .findings
        .iter()
        .flat_map(|f| f.advisories.iter().map(move |a| (f.package.name.as_str(), a)))
        .collect();
    rows.sort_by(|a, b| b.1.severity.cmp(&a.1.severity));
    rows
}

fn severity_breakdown(report: &ScanReport) -> String {
    Severity::KNOWN
        .iter()
        .rev()
        .map(|s| format!("{} {}", report.count_severity(*s), s))
        .collect::<Vec<_>>()
        .join(", ")
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let head: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", head)
    }
}
