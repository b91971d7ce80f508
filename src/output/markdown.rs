use super::{advisories_by_severity, severity_breakdown};
use crate::error::Result;
use crate::model::ScanReport;

pub fn print_markdown(report: &ScanReport) -> Result<()> {
    print!("{}", generate_markdown_string(report));
    Ok(())
}

/// Pipes would break table cells.
fn cell(s: &str) -> String {
    s.replace('|', "\\|")
}

pub fn generate_markdown_string(report: &ScanReport) -> String {
    let mut md = String::new();

    md.push_str("# depcop Dependency Report\n\n");
    if let Some(project) = &report.project {
        md.push_str(&format!("**Project:** {}\n\n", project.label));
    }
    md.push_str(&format!(
        "**Generated:** {}\n\n",
        report.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));

    md.push_str("## Summary\n\n");
    md.push_str(&format!("- Packages scanned: {}\n", report.packages_scanned));
    md.push_str(&format!("- Packages with issues: {}\n", report.findings.len()));
    md.push_str(&format!(
        "- Advisories: {} ({})\n",
        report.advisory_count(),
        severity_breakdown(report)
    ));
    md.push_str(&format!("- Outdated: {}\n", report.outdated_count()));
    md.push_str(&format!("- Abandoned: {}\n", report.abandoned_count()));
    md.push_str(&format!("- Stale: {}\n\n", report.stale_count()));

    md.push_str("## Findings\n\n");
    if report.findings.is_empty() {
        md.push_str("No issues found.\n");
    } else {
        md.push_str("| Package | Installed | Latest | License | Issues |\n");
        md.push_str("|---------|-----------|--------|---------|--------|\n");

        for finding in &report.findings {
            md.push_str(&format!(
                "| {} | {} | {} | {} | {} |\n",
                cell(&finding.package.name),
                cell(&finding.package.version),
                finding.metadata.latest_display().map(cell).unwrap_or_else(|| "-".to_string()),
                finding
                    .metadata
                    .license_label()
                    .map(|l| cell(&l))
                    .unwrap_or_else(|| "Unknown".to_string()),
                cell(&finding.badges().join(", "))
            ));
        }
    }

    let advisories = advisories_by_severity(report);
    if !advisories.is_empty() {
        md.push_str("\n## Advisories\n\n");
        md.push_str("| Severity | Package | CVE | Title |\n");
        md.push_str("|----------|---------|-----|-------|\n");

        for (package, advisory) in advisories {
            let title = match &advisory.link {
                Some(link) => format!("[{}]({})", cell(&advisory.title), link),
                None => cell(&advisory.title),
            };
            md.push_str(&format!(
                "| {} | {} | {} | {} |\n",
                advisory.severity.as_str().to_uppercase(),
                package,
                advisory.cve.as_deref().unwrap_or("-"),
                title
            ));
        }
    }

    if let Some(project) = &report.project {
        if !project.recommendations.is_empty() {
            md.push_str("\n## Recommendations\n\n");
            for recommendation in &project.recommendations {
                md.push_str(&format!("- {}\n", recommendation));
            }
        }

        if !project.package_notes.is_empty() {
            md.push_str("\n## Security Notes\n\n");
            for note in &project.package_notes {
                md.push_str(&format!("- `{}`: {}\n", note.package, note.note));
            }
        }

        if !project.ecosystem_packages.is_empty() {
            md.push_str(&format!(
                "\n**Ecosystem packages ({}):** {}\n",
                project.ecosystem_packages.len(),
                project.ecosystem_packages.join(", ")
            ));
        }
    }

    md
}
