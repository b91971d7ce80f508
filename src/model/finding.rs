use super::{AdvisoryRecord, PackageRecord, RegistryMetadata, Severity};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// A package that tripped at least one risk condition.
///
/// The flags are computed once by the classifier and never recomputed.
#[derive(Debug, Clone, Serialize)]
pub struct Finding {
    pub package: PackageRecord,
    pub metadata: RegistryMetadata,
    pub advisories: Vec<AdvisoryRecord>,
    pub outdated: bool,
    pub abandoned: bool,
    pub stale: bool,
}

impl Finding {
    pub fn has_advisories(&self) -> bool {
        !self.advisories.is_empty()
    }

    /// Highest advisory severity carried by this finding.
    pub fn max_severity(&self) -> Option<Severity> {
        self.advisories.iter().map(|a| a.severity).max()
    }

    pub fn has_severity(&self, severity: Severity) -> bool {
        self.advisories.iter().any(|a| a.severity == severity)
    }

    /// Short labels for the conditions that hold, in display order.
    pub fn badges(&self) -> Vec<String> {
        let mut badges = Vec::new();
        if self.has_advisories() {
            badges.push("Vulns".to_string());
        }
        if self.abandoned {
            match &self.metadata.replacement {
                Some(replacement) => badges.push(format!("Abandoned (use {})", replacement)),
                None => badges.push("Abandoned".to_string()),
            }
        }
        if self.outdated {
            match self.metadata.latest_display() {
                Some(latest) => badges.push(format!("Outdated -> {}", latest)),
                None => badges.push("Outdated".to_string()),
            }
        }
        if self.stale {
            badges.push("Stale".to_string());
        }
        badges
    }
}

/// Project-level context shown alongside the findings.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ProjectInfo {
    pub label: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub recommendations: Vec<String>,
    /// Locked packages from the framework's ecosystem.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub ecosystem_packages: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub package_notes: Vec<PackageNote>,
}

/// A known security concern attached to a locked package.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PackageNote {
    pub package: String,
    pub note: String,
}

/// Output of one scan run, consumed by the renderers.
#[derive(Debug, Clone, Serialize)]
pub struct ScanReport {
    pub generated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project: Option<ProjectInfo>,
    pub packages_scanned: usize,
    pub findings: Vec<Finding>,
}

impl ScanReport {
    pub fn new(packages_scanned: usize, findings: Vec<Finding>) -> Self {
        Self {
            generated_at: Utc::now(),
            project: None,
            packages_scanned,
            findings,
        }
    }

    pub fn with_project(mut self, project: ProjectInfo) -> Self {
        self.project = Some(project);
        self
    }

    pub fn advisory_count(&self) -> usize {
        self.findings.iter().map(|f| f.advisories.len()).sum()
    }

    /// Counts advisories of a given severity across all findings.
    pub fn count_severity(&self, severity: Severity) -> usize {
        self.findings
            .iter()
            .flat_map(|f| &f.advisories)
            .filter(|a| a.severity == severity)
            .count()
    }

    pub fn outdated_count(&self) -> usize {
        self.findings.iter().filter(|f| f.outdated).count()
    }

    pub fn abandoned_count(&self) -> usize {
        self.findings.iter().filter(|f| f.abandoned).count()
    }

    pub fn stale_count(&self) -> usize {
        self.findings.iter().filter(|f| f.stale).count()
    }
}
