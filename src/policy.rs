//! The resolved policy for one scan.
//!
//! A [`Policy`] is built once per invocation by [`Config::policy`](crate::Config::policy)
//! and passed to the engine by reference. Nothing in the engine mutates it.

use crate::model::{PackageRecord, Severity};
use serde::{Deserialize, Serialize};

/// Which locked dependencies take part in a scan.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DependencyScope {
    #[default]
    All,
    OnlyDev,
    ExcludeDev,
}

impl DependencyScope {
    pub fn includes(&self, package: &PackageRecord) -> bool {
        match self {
            DependencyScope::All => true,
            DependencyScope::OnlyDev => package.dev,
            DependencyScope::ExcludeDev => !package.dev,
        }
    }
}

impl std::str::FromStr for DependencyScope {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "all" => Ok(DependencyScope::All),
            "only-dev" => Ok(DependencyScope::OnlyDev),
            "exclude-dev" => Ok(DependencyScope::ExcludeDev),
            _ => Err(format!(
                "Invalid dependency type '{}'. Must be: all, only-dev, exclude-dev",
                s
            )),
        }
    }
}

/// How findings are mapped onto a process exit code.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExitCodeScheme {
    /// 0 or 1, driven only by advisory severity.
    Legacy,
    /// 0 to 3, also reflecting abandonment, staleness and outdated packages.
    #[default]
    Enhanced,
}

impl std::str::FromStr for ExitCodeScheme {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "legacy" => Ok(ExitCodeScheme::Legacy),
            "enhanced" => Ok(ExitCodeScheme::Enhanced),
            _ => Err(format!("Invalid exit code scheme '{}'. Must be: legacy, enhanced", s)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Policy {
    /// A latest release older than this many months marks a package stale.
    pub stale_months: u32,
    /// Advisories below this level are dropped. `None` keeps everything.
    pub min_severity: Option<Severity>,
    pub license_allowlist: Vec<String>,
    pub license_denylist: Vec<String>,
    /// Exact names or `*` patterns, e.g. `laravel/*`.
    pub ignore_packages: Vec<String>,
    pub dependency_type: DependencyScope,
    pub fail_on: Severity,
    pub exit_code: ExitCodeScheme,
}

impl Default for Policy {
    fn default() -> Self {
        Self {
            stale_months: 18,
            min_severity: Some(Severity::Low),
            license_allowlist: Vec::new(),
            license_denylist: Vec::new(),
            ignore_packages: Vec::new(),
            dependency_type: DependencyScope::All,
            fail_on: Severity::High,
            exit_code: ExitCodeScheme::Enhanced,
        }
    }
}

impl Policy {
    /// Check if a package should be ignored.
    pub fn is_ignored(&self, name: &str) -> bool {
        self.ignore_packages.iter().any(|pattern| {
            if pattern.contains('*') {
                glob_match(pattern, name)
            } else {
                pattern == name
            }
        })
    }

    pub fn in_scope(&self, package: &PackageRecord) -> bool {
        self.dependency_type.includes(package)
    }

    /// Whether the license set passes both lists.
    ///
    /// An empty list is not a filter. With an allow-list, a package with no
    /// known license is rejected since nothing can intersect.
    pub fn license_permitted(&self, licenses: &[String]) -> bool {
        if !self.license_allowlist.is_empty() && !intersects(licenses, &self.license_allowlist) {
            return false;
        }
        if !self.license_denylist.is_empty() && intersects(licenses, &self.license_denylist) {
            return false;
        }
        true
    }
}

fn intersects(licenses: &[String], list: &[String]) -> bool {
    licenses
        .iter()
        .any(|license| list.iter().any(|entry| entry.eq_ignore_ascii_case(license)))
}

/// Simple glob matching (supports * as wildcard).
fn glob_match(pattern: &str, text: &str) -> bool {
    let parts: Vec<&str> = pattern.split('*').collect();

    if parts.len() == 1 {
        return pattern == text;
    }

    let mut remaining = text;

    if !parts[0].is_empty() {
        if !remaining.starts_with(parts[0]) {
            return false;
        }
        remaining = &remaining[parts[0].len()..];
    }

    let last_part = parts[parts.len() - 1];
    if !last_part.is_empty() {
        if !remaining.ends_with(last_part) {
            return false;
        }
        remaining = &remaining[..remaining.len() - last_part.len()];
    }

    for part in &parts[1..parts.len() - 1] {
        if part.is_empty() {
            continue;
        }
        if let Some(pos) = remaining.find(part) {
            remaining = &remaining[pos + part.len()..];
        } else {
            return false;
        }
    }

    true
}
