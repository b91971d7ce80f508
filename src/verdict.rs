//! Reduction of findings to a process exit code.
//!
//! The legacy scheme is binary. The enhanced scheme walks [`ENHANCED_RULES`]
//! in order and returns the code of the first rule that holds.

use crate::model::{Finding, Severity};
use crate::policy::ExitCodeScheme;

pub const SUCCESS: u8 = 0;
pub const LEGACY_FAILURE: u8 = 1;

/// A rule of the enhanced cascade: a predicate over the whole finding set.
pub struct Rule {
    pub name: &'static str,
    pub code: u8,
    pub applies: fn(&[Finding], Severity) -> bool,
}

fn advisories(findings: &[Finding]) -> impl Iterator<Item = Severity> + '_ {
    findings.iter().flat_map(|f| f.advisories.iter().map(|a| a.severity))
}

fn severe_vulnerability_over_threshold(findings: &[Finding], fail_on: Severity) -> bool {
    advisories(findings).any(|s| s.is_high_or_critical() && s >= fail_on)
}

fn moderate_vulnerability_over_threshold(findings: &[Finding], fail_on: Severity) -> bool {
    advisories(findings).any(|s| s == Severity::Moderate && s >= fail_on)
}

fn any_severe_vulnerability(findings: &[Finding], _: Severity) -> bool {
    advisories(findings).any(|s| s.is_high_or_critical())
}

fn maintenance_risk(findings: &[Finding], _: Severity) -> bool {
    findings
        .iter()
        .any(|f| f.abandoned || f.outdated || f.has_severity(Severity::Moderate))
}

fn minor_risk(findings: &[Finding], _: Severity) -> bool {
    findings.iter().any(|f| f.stale || f.has_advisories())
}

/// The enhanced cascade, highest priority first.
pub const ENHANCED_RULES: [Rule; 5] = [
    Rule {
        name: "high or critical advisory at fail-on threshold",
        code: 3,
        applies: severe_vulnerability_over_threshold,
    },
    Rule {
        name: "moderate advisory at fail-on threshold",
        code: 2,
        applies: moderate_vulnerability_over_threshold,
    },
    Rule {
        name: "high or critical advisory",
        code: 3,
        applies: any_severe_vulnerability,
    },
    Rule {
        name: "abandoned, outdated or moderate advisory",
        code: 2,
        applies: maintenance_risk,
    },
    Rule {
        name: "stale or any advisory",
        code: 1,
        applies: minor_risk,
    },
];

/// Returns the first enhanced rule that holds, if any.
pub fn matching_rule(findings: &[Finding], fail_on: Severity) -> Option<&'static Rule> {
    ENHANCED_RULES.iter().find(|rule| (rule.applies)(findings, fail_on))
}

/// Maps findings to an exit code under `scheme`.
///
/// An empty finding list is always [`SUCCESS`].
pub fn reduce(findings: &[Finding], fail_on: Severity, scheme: ExitCodeScheme) -> u8 {
    if findings.is_empty() {
        return SUCCESS;
    }

    match scheme {
        ExitCodeScheme::Legacy => match findings.iter().filter_map(Finding::max_severity).max() {
            Some(max) if max >= fail_on => LEGACY_FAILURE,
            _ => SUCCESS,
        },
        ExitCodeScheme::Enhanced => matching_rule(findings, fail_on)
            .map(|rule| rule.code)
            .unwrap_or(SUCCESS),
    }
}
