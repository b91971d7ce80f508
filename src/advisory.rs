//! Normalization of `composer audit --format=json` output.
//!
//! Two payload shapes are recognized:
//!
//! ```json
//! {"advisories": {"packages": {"vendor/pkg": [ ... ]}}}
//! {"advisories": {"vendor/pkg": [ ... ]}}
//! ```
//!
//! The nested `packages` form is tried first. Per package, Composer emits
//! either a list or an object keyed by index; both are accepted.

use crate::model::{AdvisoryRecord, Severity};
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::debug;

const FALLBACK_TITLE: &str = "Advisory";

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawAdvisory {
    title: Option<String>,
    cve: Option<String>,
    link: Option<String>,
    severity: Option<String>,
    affected_versions: Option<String>,
}

impl RawAdvisory {
    fn into_record(self) -> AdvisoryRecord {
        let cve = non_empty(self.cve);
        let title = non_empty(self.title)
            .or_else(|| cve.clone())
            .unwrap_or_else(|| FALLBACK_TITLE.to_string());

        AdvisoryRecord {
            title,
            cve,
            link: non_empty(self.link),
            severity: self
                .severity
                .as_deref()
                .map(Severity::normalize)
                .unwrap_or(Severity::Unknown),
            affected_versions: non_empty(self.affected_versions),
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}

/// Locates the `package name -> advisories` object in either payload shape.
fn advisory_map(raw: &Value) -> Option<&serde_json::Map<String, Value>> {
    let advisories = raw.get("advisories")?;
    advisories
        .get("packages")
        .and_then(Value::as_object)
        .or_else(|| advisories.as_object())
}

fn entries(value: &Value) -> Vec<&Value> {
    match value {
        Value::Array(items) => items.iter().collect(),
        Value::Object(items) => items.values().collect(),
        _ => Vec::new(),
    }
}

/// Groups advisories by package name, dropping those below `min_severity`.
///
/// With no minimum every advisory is kept, including ones whose severity
/// was not recognized. Packages left with nothing are omitted.
pub fn normalize(raw: &Value, min_severity: Option<Severity>) -> BTreeMap<String, Vec<AdvisoryRecord>> {
    let mut grouped = BTreeMap::new();

    let Some(packages) = advisory_map(raw) else {
        return grouped;
    };

    for (name, advisories) in packages {
        let records: Vec<AdvisoryRecord> = entries(advisories)
            .into_iter()
            .filter_map(|entry| match RawAdvisory::deserialize(entry) {
                Ok(advisory) => Some(advisory.into_record()),
                Err(e) => {
                    debug!("Skipping malformed advisory for {}: {}", name, e);
                    None
                }
            })
            .filter(|record| min_severity.map_or(true, |min| record.severity >= min))
            .collect();

        if !records.is_empty() {
            grouped.insert(name.clone(), records);
        }
    }

    grouped
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn current_shape() -> Value {
        json!({
            "advisories": {
                "guzzlehttp/psr7": [
                    {
                        "advisoryId": "PKSA-1",
                        "packageName": "guzzlehttp/psr7",
                        "affectedVersions": ">=2,<2.4.5",
                        "title": "Improper header validation",
                        "cve": "CVE-2023-29197",
                        "link": "https://github.com/advisories/GHSA-wxmh-65f7-jcvw",
                        "severity": "High"
                    },
                    {
                        "title": "",
                        "cve": "CVE-2022-24775",
                        "severity": "moderate"
                    }
                ],
                "symfony/http-kernel": {
                    "0": {"cve": null, "severity": "low"}
                }
            }
        })
    }

    #[test]
    fn test_current_shape() {
        let grouped = normalize(&current_shape(), None);
        assert_eq!(grouped.len(), 2);

        let psr7 = &grouped["guzzlehttp/psr7"];
        assert_eq!(psr7[0].title, "Improper header validation");
        assert_eq!(psr7[0].severity, Severity::High);
        assert_eq!(psr7[0].affected_versions.as_deref(), Some(">=2,<2.4.5"));
        assert_eq!(psr7[1].title, "CVE-2022-24775");
        assert_eq!(psr7[1].severity, Severity::Moderate);
    }

    #[test]
    fn test_indexed_object_and_generic_title() {
        let grouped = normalize(&current_shape(), None);
        let kernel = &grouped["symfony/http-kernel"];
        assert_eq!(kernel.len(), 1);
        assert_eq!(kernel[0].title, "Advisory");
        assert!(kernel[0].cve.is_none());
    }

    #[test]
    fn test_nested_packages_shape_preferred() {
        let raw = json!({
            "advisories": {
                "packages": {
                    "monolog/monolog": [{"title": "Log injection", "severity": "critical"}]
                }
            }
        });

        let grouped = normalize(&raw, None);
        assert_eq!(grouped.len(), 1);
        assert_eq!(grouped["monolog/monolog"][0].severity, Severity::Critical);
    }

    #[test]
    fn test_min_severity_filters() {
        let grouped = normalize(&current_shape(), Some(Severity::Moderate));
        assert_eq!(grouped["guzzlehttp/psr7"].len(), 2);
        assert!(!grouped.contains_key("symfony/http-kernel"));

        let grouped = normalize(&current_shape(), Some(Severity::High));
        assert_eq!(grouped["guzzlehttp/psr7"].len(), 1);
        assert_eq!(grouped["guzzlehttp/psr7"][0].cve.as_deref(), Some("CVE-2023-29197"));
    }

    #[test]
    fn test_unknown_severity_kept_only_without_minimum() {
        let raw = json!({"advisories": {"acme/lib": [{"title": "Odd", "severity": "severe"}]}});

        let kept = normalize(&raw, None);
        assert_eq!(kept["acme/lib"][0].severity, Severity::Unknown);

        let filtered = normalize(&raw, Some(Severity::Low));
        assert!(filtered.is_empty());
    }

    #[test]
    fn test_empty_and_malformed_payloads() {
        assert!(normalize(&json!({}), None).is_empty());
        assert!(normalize(&json!({"advisories": []}), None).is_empty());

        let raw = json!({"advisories": {"acme/lib": [42, {"title": "Real", "severity": "low"}]}});
        let grouped = normalize(&raw, None);
        assert_eq!(grouped["acme/lib"].len(), 1);
        assert_eq!(grouped["acme/lib"][0].title, "Real");
    }
}
