//! HTML report output format.
//!
//! Generates a self-contained HTML report with styling for easy viewing and sharing.

use super::{advisories_by_severity, severity_breakdown};
use crate::error::Result;
use crate::model::{ScanReport, Severity};

/// Generate and print HTML report output
pub fn print_html(report: &ScanReport) -> Result<()> {
    let html = generate_html_string(report);
    println!("{}", html);
    Ok(())
}

/// Generate HTML as a string (for file output)
pub fn generate_html_string(report: &ScanReport) -> String {
    let project_label = report
        .project
        .as_ref()
        .map(|p| p.label.as_str())
        .unwrap_or("PHP Project");

    let mut html = String::new();

    html.push_str(&format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>depcop Report - {}</title>
    <style>
        :root {{
            --bg-color: #1a1a2e;
            --card-bg: #16213e;
            --text-color: #eee;
            --text-muted: #888;
            --border-color: #0f3460;
            --critical: #dc3545;
            --high: #fd7e14;
            --moderate: #ffc107;
            --low: #28a745;
            --accent: #0f3460;
        }}
        * {{ box-sizing: border-box; margin: 0; padding: 0; }}
        body {{
            font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif;
            background: var(--bg-color);
            color: var(--text-color);
            line-height: 1.6;
            padding: 2rem;
        }}
        .container {{ max-width: 1200px; margin: 0 auto; }}
        header {{
            display: flex;
            justify-content: space-between;
            align-items: center;
            margin-bottom: 2rem;
            padding-bottom: 1rem;
            border-bottom: 1px solid var(--border-color);
        }}
        h1 {{ font-size: 1.75rem; font-weight: 600; }}
        .project {{ color: var(--text-muted); font-size: 1rem; }}
        .timestamp {{ color: var(--text-muted); font-size: 0.9rem; }}
        .stats {{
            display: grid;
            grid-template-columns: repeat(auto-fit, minmax(180px, 1fr));
            gap: 1rem;
            margin-bottom: 2rem;
        }}
        .stat-card {{
            background: var(--card-bg);
            padding: 1.25rem;
            border-radius: 8px;
            border: 1px solid var(--border-color);
        }}
        .stat-value {{ font-size: 2rem; font-weight: 700; }}
        .stat-label {{ color: var(--text-muted); font-size: 0.85rem; }}
        section {{ margin-bottom: 2rem; }}
        h2 {{
            font-size: 1.25rem;
            margin-bottom: 1rem;
            padding-bottom: 0.5rem;
            border-bottom: 1px solid var(--border-color);
        }}
        table {{
            width: 100%;
            border-collapse: collapse;
            background: var(--card-bg);
            border-radius: 8px;
            overflow: hidden;
        }}
        th, td {{
            padding: 0.75rem 1rem;
            text-align: left;
            border-bottom: 1px solid var(--border-color);
        }}
        th {{ background: var(--accent); font-weight: 600; }}
        tr:hover {{ background: rgba(255,255,255,0.02); }}
        a {{ color: #6ea8fe; }}
        .severity {{ padding: 0.25rem 0.5rem; border-radius: 4px; font-size: 0.75rem; font-weight: 600; }}
        .severity-critical {{ background: var(--critical); color: white; }}
        .severity-high {{ background: var(--high); color: white; }}
        .severity-moderate {{ background: var(--moderate); color: black; }}
        .severity-low {{ background: var(--low); color: white; }}
        .badge {{ margin-right: 0.5rem; }}
        .empty {{ text-align: center; padding: 2rem; color: var(--text-muted); }}
        footer {{ text-align: center; color: var(--text-muted); font-size: 0.8rem; margin-top: 2rem; padding-top: 1rem; border-top: 1px solid var(--border-color); }}
    </style>
</head>
<body>
    <div class="container">
        <header>
            <div>
                <h1>depcop Report</h1>
                <span class="project">{}</span>
            </div>
            <span class="timestamp">{}</span>
        </header>
"#,
        report.generated_at.format("%Y-%m-%d"),
        html_escape(project_label),
        report.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));

    // Stats cards
    html.push_str(&format!(
        r#"        <div class="stats">
            <div class="stat-card">
                <div class="stat-value">{}</div>
                <div class="stat-label">Packages</div>
            </div>
            <div class="stat-card">
                <div class="stat-value">{}</div>
                <div class="stat-label">Advisories</div>
            </div>
            <div class="stat-card">
                <div class="stat-value">{}</div>
                <div class="stat-label">Outdated</div>
            </div>
            <div class="stat-card">
                <div class="stat-value">{}</div>
                <div class="stat-label">Abandoned</div>
            </div>
            <div class="stat-card">
                <div class="stat-value">{}</div>
                <div class="stat-label">Stale</div>
            </div>
        </div>
"#,
        report.packages_scanned,
        report.advisory_count(),
        report.outdated_count(),
        report.abandoned_count(),
        report.stale_count()
    ));

    // Findings section
    html.push_str(
        r#"        <section>
            <h2>Findings</h2>
"#,
    );

    if report.findings.is_empty() {
        html.push_str(
            r#"            <div class="empty">No issues found</div>
"#,
        );
    } else {
        html.push_str(
            r#"            <table>
                <thead>
                    <tr>
                        <th>Package</th>
                        <th>Installed</th>
                        <th>Latest</th>
                        <th>License</th>
                        <th>Issues</th>
                    </tr>
                </thead>
                <tbody>
"#,
        );

        for finding in &report.findings {
            let badges: String = finding
                .badges()
                .iter()
                .map(|b| format!(r#"<span class="badge">{}</span>"#, html_escape(b)))
                .collect();

            html.push_str(&format!(
                r#"                    <tr>
                        <td>{}</td>
                        <td>{}</td>
                        <td>{}</td>
                        <td>{}</td>
                        <td>{}</td>
                    </tr>
"#,
                html_escape(&finding.package.name),
                html_escape(&finding.package.version),
                finding
                    .metadata
                    .latest_display()
                    .map(html_escape)
                    .unwrap_or_else(|| "-".to_string()),
                finding
                    .metadata
                    .license_label()
                    .map(|l| html_escape(&l))
                    .unwrap_or_else(|| "-".to_string()),
                badges
            ));
        }

        html.push_str(
            r#"                </tbody>
            </table>
"#,
        );
    }

    html.push_str("        </section>\n");

    // Advisories section
    let advisories = advisories_by_severity(report);
    html.push_str(
        r#"        <section>
            <h2>Advisories</h2>
"#,
    );

    if advisories.is_empty() {
        html.push_str(
            r#"            <div class="empty">No advisories reported</div>
"#,
        );
    } else {
        html.push_str(
            r#"            <table>
                <thead>
                    <tr>
                        <th>Severity</th>
                        <th>Package</th>
                        <th>CVE</th>
                        <th>Title</th>
                        <th>Affected</th>
                    </tr>
                </thead>
                <tbody>
"#,
        );

        for (package, advisory) in &advisories {
            let severity_class = match advisory.severity {
                Severity::Critical => "severity-critical",
                Severity::High => "severity-high",
                Severity::Moderate => "severity-moderate",
                Severity::Low => "severity-low",
                Severity::Unknown => "",
            };

            let title = match &advisory.link {
                Some(link) => format!(
                    r#"<a href="{}">{}</a>"#,
                    html_escape(link),
                    html_escape(&advisory.title)
                ),
                None => html_escape(&advisory.title),
            };

            html.push_str(&format!(
                r#"                    <tr>
                        <td><span class="severity {}">{}</span></td>
                        <td>{}</td>
                        <td>{}</td>
                        <td>{}</td>
                        <td>{}</td>
                    </tr>
"#,
                severity_class,
                advisory.severity.as_str().to_uppercase(),
                html_escape(package),
                advisory
                    .cve
                    .as_deref()
                    .map(html_escape)
                    .unwrap_or_else(|| "-".to_string()),
                title,
                advisory
                    .affected_versions
                    .as_deref()
                    .map(html_escape)
                    .unwrap_or_else(|| "-".to_string())
            ));
        }

        html.push_str(
            r#"                </tbody>
            </table>
"#,
        );
    }

    html.push_str("        </section>\n");

    if let Some(project) = &report.project {
        if !project.recommendations.is_empty() {
            html.push_str(
                r#"        <section>
            <h2>Recommendations</h2>
            <div class="stat-card">
"#,
            );
            for recommendation in &project.recommendations {
                html.push_str(&format!(
                    "                <p>{}</p>\n",
                    html_escape(recommendation)
                ));
            }
            html.push_str("            </div>\n        </section>\n");
        }

        if !project.package_notes.is_empty() || !project.ecosystem_packages.is_empty() {
            html.push_str(
                r#"        <section>
            <h2>Security Notes</h2>
            <div class="stat-card">
"#,
            );
            for note in &project.package_notes {
                html.push_str(&format!(
                    "                <p><strong>{}</strong>: {}</p>\n",
                    html_escape(&note.package),
                    html_escape(&note.note)
                ));
            }
            if !project.ecosystem_packages.is_empty() {
                html.push_str(&format!(
                    "                <p>Ecosystem packages ({}): {}</p>\n",
                    project.ecosystem_packages.len(),
                    html_escape(&project.ecosystem_packages.join(", "))
                ));
            }
            html.push_str("            </div>\n        </section>\n");
        }
    }

    // Summary
    html.push_str(&format!(
        r#"        <section>
            <h2>Summary</h2>
            <div class="stat-card">
                <p>Scanned {} packages, {} with issues.</p>
                <p>Found {} advisories ({}).</p>
            </div>
        </section>
"#,
        report.packages_scanned,
        report.findings.len(),
        report.advisory_count(),
        severity_breakdown(report)
    ));

    // Footer
    html.push_str(
        r#"        <footer>
            Generated by depcop
        </footer>
    </div>
</body>
</html>
"#,
    );

    html
}

fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
