//! One end-to-end evaluation of a locked dependency set.

use crate::advisory;
use crate::classify::classify;
use crate::model::{Finding, PackageRecord, ScanReport};
use crate::policy::Policy;
use crate::registry::RegistryClient;
use chrono::{DateTime, Utc};
use serde_json::Value;
use tracing::info;

/// Evaluates `packages` and returns the report.
///
/// Packages outside the dependency scope are dropped first. Registry
/// metadata is then resolved in one batch for every package that is not
/// ignored, and each package is classified. Findings keep the order of
/// `packages`.
pub async fn evaluate(
    packages: &[PackageRecord],
    raw_advisories: &Value,
    registry: &RegistryClient,
    policy: &Policy,
    now: DateTime<Utc>,
) -> ScanReport {
    let in_scope: Vec<&PackageRecord> = packages.iter().filter(|p| policy.in_scope(p)).collect();

    let mut advisories = advisory::normalize(raw_advisories, policy.min_severity);

    let lookups: Vec<&str> = in_scope
        .iter()
        .filter(|p| !policy.is_ignored(&p.name))
        .map(|p| p.name.as_str())
        .collect();
    let metadata = registry.fetch_many(lookups).await;

    let findings: Vec<Finding> = in_scope
        .iter()
        .filter_map(|package| {
            let meta = metadata.get(&package.name).cloned().unwrap_or_default();
            let package_advisories = advisories.remove(&package.name).unwrap_or_default();
            classify(package, &meta, package_advisories, policy, now)
        })
        .collect();

    info!(
        "Evaluated {} packages, {} with findings",
        in_scope.len(),
        findings.len()
    );

    ScanReport::new(in_scope.len(), findings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{Error, Result};
    use crate::model::Severity;
    use crate::policy::DependencyScope;
    use crate::registry::{PackageRegistry, Release};
    use async_trait::async_trait;
    use chrono::TimeZone;
    use serde_json::json;
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    #[derive(Default)]
    struct StaticRegistry {
        releases: HashMap<String, Release>,
        requested: Mutex<Vec<String>>,
    }

    impl StaticRegistry {
        fn with(mut self, name: &str, release: Release) -> Self {
            self.releases.insert(name.to_string(), release);
            self
        }
    }

    #[async_trait]
    impl PackageRegistry for StaticRegistry {
        fn name(&self) -> &'static str {
            "static"
        }

        async fn fetch_releases(&self, package: &str) -> Result<Vec<Release>> {
            self.requested.lock().unwrap().push(package.to_string());
            self.releases
                .get(package)
                .cloned()
                .map(|r| vec![r])
                .ok_or_else(|| Error::registry(package, "not found"))
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap()
    }

    fn recent(version: &str) -> Release {
        Release {
            version_normalized: Some(format!("{}.0", version)),
            licenses: vec!["MIT".to_string()],
            time: Some(Utc.with_ymd_and_hms(2025, 1, 10, 0, 0, 0).unwrap()),
            ..Release::new(version)
        }
    }

    fn packages() -> Vec<PackageRecord> {
        vec![
            PackageRecord::new("laravel/framework", "10.0.0", false),
            PackageRecord::new("monolog/monolog", "3.5.0", false),
            PackageRecord::new("phpunit/phpunit", "10.5.0", true),
            PackageRecord::new("swiftmailer/swiftmailer", "6.3.0", false),
        ]
    }

    fn registry() -> Arc<StaticRegistry> {
        Arc::new(
            StaticRegistry::default()
                .with("laravel/framework", recent("11.9.0"))
                .with("monolog/monolog", recent("3.5.0"))
                .with("phpunit/phpunit", recent("11.0.0"))
                .with(
                    "swiftmailer/swiftmailer",
                    Release {
                        abandoned: true,
                        replacement: Some("symfony/mailer".to_string()),
                        time: Some(Utc.with_ymd_and_hms(2021, 11, 5, 0, 0, 0).unwrap()),
                        ..recent("6.3.0")
                    },
                ),
        )
    }

    fn audit() -> Value {
        json!({
            "advisories": {
                "monolog/monolog": [{"title": "Log forging", "severity": "low"}],
                "not-installed/pkg": [{"title": "Irrelevant", "severity": "critical"}]
            }
        })
    }

    #[tokio::test]
    async fn test_evaluate_orders_findings_by_input() {
        let registry = registry();
        let client = RegistryClient::new(registry.clone());

        let report = evaluate(&packages(), &audit(), &client, &Policy::default(), now()).await;

        let names: Vec<&str> = report.findings.iter().map(|f| f.package.name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "laravel/framework",
                "monolog/monolog",
                "phpunit/phpunit",
                "swiftmailer/swiftmailer"
            ]
        );
        assert_eq!(report.packages_scanned, 4);

        let swift = &report.findings[3];
        assert!(swift.abandoned && swift.stale && !swift.outdated);
        assert_eq!(report.findings[1].advisories[0].severity, Severity::Low);
    }

    #[tokio::test]
    async fn test_evaluate_scope_and_ignore_skip_lookups() {
        let registry = registry();
        let client = RegistryClient::new(registry.clone());
        let policy = Policy {
            dependency_type: DependencyScope::ExcludeDev,
            ignore_packages: vec!["swiftmailer/*".to_string()],
            ..Policy::default()
        };

        let report = evaluate(&packages(), &audit(), &client, &policy, now()).await;

        assert_eq!(report.packages_scanned, 3);
        assert_eq!(report.findings.len(), 2);

        let mut requested = registry.requested.lock().unwrap().clone();
        requested.sort();
        assert_eq!(requested, vec!["laravel/framework", "monolog/monolog"]);
    }

    #[tokio::test]
    async fn test_evaluate_min_severity_drops_advisory_only_finding() {
        let client = RegistryClient::new(registry());
        let policy = Policy {
            min_severity: Some(Severity::Moderate),
            ..Policy::default()
        };

        let report = evaluate(&packages(), &audit(), &client, &policy, now()).await;
        assert!(report
            .findings
            .iter()
            .all(|f| f.package.name != "monolog/monolog"));
    }

    #[tokio::test]
    async fn test_evaluate_default_policy_drops_unrated_advisories() {
        let client = RegistryClient::new(registry());
        let audit = json!({
            "advisories": {
                "monolog/monolog": [{"title": "Unrated", "severity": "severe"}]
            }
        });

        let report = evaluate(&packages(), &audit, &client, &Policy::default(), now()).await;
        assert_eq!(report.advisory_count(), 0);
        assert!(report
            .findings
            .iter()
            .all(|f| f.package.name != "monolog/monolog"));
    }

    #[tokio::test]
    async fn test_evaluate_empty_lock() {
        let client = RegistryClient::new(registry());
        let report = evaluate(&[], &json!({}), &client, &Policy::default(), now()).await;
        assert!(report.findings.is_empty());
        assert_eq!(report.packages_scanned, 0);
    }
}
