use super::{advisories_by_severity, severity_breakdown, truncate};
use crate::error::Result;
use crate::model::{ScanReport, Severity};
use std::fmt::Write;
use tabled::{settings::Style, Table, Tabled};

#[derive(Tabled)]
struct FindingRow {
    #[tabled(rename = "Package")]
    name: String,
    #[tabled(rename = "Installed")]
    installed: String,
    #[tabled(rename = "Latest")]
    latest: String,
    #[tabled(rename = "License")]
    license: String,
    #[tabled(rename = "Issues")]
    issues: String,
}

#[derive(Tabled)]
struct AdvisoryRow {
    #[tabled(rename = "Severity")]
    severity: String,
    #[tabled(rename = "Package")]
    package: String,
    #[tabled(rename = "CVE")]
    cve: String,
    #[tabled(rename = "Title")]
    title: String,
    #[tabled(rename = "Affected")]
    affected: String,
}

pub fn print_cli_table(report: &ScanReport, quiet: bool) -> Result<()> {
    print!("{}", render_table(report, quiet, true));
    Ok(())
}

/// Renders the findings as tables.
///
/// `quiet` drops the header and summary. `color` adds ANSI colors to
/// severity labels and should be off when writing to a file.
pub fn render_table(report: &ScanReport, quiet: bool, color: bool) -> String {
    let mut out = String::new();

    if !quiet {
        let _ = writeln!(out);
        let _ = writeln!(out, "depcop: Dependency Patrol");
        if let Some(project) = &report.project {
            let _ = writeln!(out, "Project: {}", project.label);
        }
        let _ = writeln!(
            out,
            "Scan completed at: {}",
            report.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
        );
        let _ = writeln!(out);
    }

    if report.findings.is_empty() {
        let _ = writeln!(
            out,
            "No issues found in {} packages.",
            report.packages_scanned
        );
    } else {
        if !quiet {
            let _ = writeln!(out, "Found {} packages with issues:", report.findings.len());
            let _ = writeln!(out);
        }

        let rows: Vec<FindingRow> = report
            .findings
            .iter()
            .map(|f| FindingRow {
                name: truncate(&f.package.name, 40),
                installed: f.package.version.clone(),
                latest: f.metadata.latest_display().unwrap_or("-").to_string(),
                license: f.metadata.license_label().unwrap_or_else(|| "-".to_string()),
                issues: f.badges().join(", "),
            })
            .collect();

        let table = Table::new(rows).with(Style::rounded()).to_string();
        let _ = writeln!(out, "{}", table);
    }

    let advisories = advisories_by_severity(report);
    if !advisories.is_empty() {
        let _ = writeln!(out);
        if !quiet {
            let _ = writeln!(out, "Found {} advisories:", advisories.len());
            let _ = writeln!(out);
        }

        let rows: Vec<AdvisoryRow> = advisories
            .iter()
            .map(|(package, a)| AdvisoryRow {
                severity: format_severity(a.severity, color),
                package: package.to_string(),
                cve: a.cve.clone().unwrap_or_else(|| "-".to_string()),
                title: truncate(&a.title, 50),
                affected: a.affected_versions.clone().unwrap_or_else(|| "-".to_string()),
            })
            .collect();

        let table = Table::new(rows).with(Style::rounded()).to_string();
        let _ = writeln!(out, "{}", table);
    }

    if !quiet {
        if let Some(project) = &report.project {
            if !project.recommendations.is_empty() {
                let _ = writeln!(out);
                let _ = writeln!(out, "Recommendations:");
                for recommendation in &project.recommendations {
                    let _ = writeln!(out, "  - {}", recommendation);
                }
            }

            if !project.package_notes.is_empty() {
                let _ = writeln!(out);
                let _ = writeln!(out, "Security notes:");
                for note in &project.package_notes {
                    let _ = writeln!(out, "  - {}: {}", note.package, note.note);
                }
            }

            if !project.ecosystem_packages.is_empty() {
                let _ = writeln!(out);
                let _ = writeln!(
                    out,
                    "Ecosystem packages ({}): {}",
                    project.ecosystem_packages.len(),
                    project.ecosystem_packages.join(", ")
                );
            }
        }

        let _ = writeln!(out);
        write_summary(&mut out, report);
    }

    out
}

fn format_severity(severity: Severity, color: bool) -> String {
    let label = severity.as_str().to_uppercase();
    if !color {
        return label;
    }
    match severity {
        Severity::Critical => format!("\x1b[31m{}\x1b[0m", label),
        Severity::High => format!("\x1b[91m{}\x1b[0m", label),
        Severity::Moderate => format!("\x1b[33m{}\x1b[0m", label),
        Severity::Low => format!("\x1b[32m{}\x1b[0m", label),
        Severity::Unknown => label,
    }
}

fn write_summary(out: &mut String, report: &ScanReport) {
    let _ = writeln!(out, "Summary:");
    let _ = writeln!(out, "  Packages scanned: {}", report.packages_scanned);
    if report.advisory_count() > 0 {
        let _ = writeln!(
            out,
            "  Advisories: {} ({})",
            report.advisory_count(),
            severity_breakdown(report)
        );
    }
    let _ = writeln!(
        out,
        "  Outdated: {}  Abandoned: {}  Stale: {}",
        report.outdated_count(),
        report.abandoned_count(),
        report.stale_count()
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::fixtures;

    #[test]
    fn test_render_table_contents() {
        let out = render_table(&fixtures::report(), false, false);

        assert!(out.contains("Project: Laravel 10.48.4"));
        assert!(out.contains("monolog/monolog"));
        assert!(out.contains("Outdated -> 3.7.0"));
        assert!(out.contains("Abandoned (use symfony/mailer)"));
        assert!(out.contains("CVE-2025-1234"));
        assert!(out.contains("Advisories: 2 (1 critical, 0 high, 1 moderate, 0 low)"));
        assert!(out.contains("Outdated: 1  Abandoned: 1  Stale: 1"));
        assert!(out.contains("Security notes:"));
        assert!(out.contains("  - livewire/livewire: Check for the Livewire v3 RCE"));
        assert!(out.contains("Ecosystem packages (2): laravel/framework, livewire/livewire"));
        assert!(!out.contains('\x1b'));
    }

    #[test]
    fn test_quiet_drops_header_and_summary() {
        let out = render_table(&fixtures::report(), true, false);
        assert!(!out.contains("Dependency Patrol"));
        assert!(!out.contains("Summary:"));
        assert!(!out.contains("Recommendations:"));
        assert!(!out.contains("Security notes:"));
        assert!(out.contains("monolog/monolog"));
    }

    #[test]
    fn test_empty_report() {
        let report = ScanReport::new(7, Vec::new());
        let out = render_table(&report, true, false);
        assert_eq!(out.trim(), "No issues found in 7 packages.");
    }

    #[test]
    fn test_colored_severity() {
        assert_eq!(format_severity(Severity::High, false), "HIGH");
        assert!(format_severity(Severity::Critical, true).starts_with("\x1b[31m"));
    }
}
