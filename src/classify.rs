//! Per-package classification against the active [`Policy`].

use crate::model::{AdvisoryRecord, Finding, PackageRecord, RegistryMetadata};
use crate::policy::Policy;
use crate::registry::version::is_newer;
use chrono::{DateTime, Months, Utc};
use tracing::warn;

/// Decides whether `package` produces a [`Finding`].
///
/// Ignore and license rules are exclusions: they suppress the package
/// outright, whatever else is wrong with it. The allow-list only applies
/// when registry metadata resolved, since a failed fetch says nothing about
/// the license. Past those, a finding is
/// emitted when the package is outdated, abandoned, stale or has at least
/// one advisory. `advisories` must already be filtered to the minimum
/// severity.
pub fn classify(
    package: &PackageRecord,
    metadata: &RegistryMetadata,
    advisories: Vec<AdvisoryRecord>,
    policy: &Policy,
    now: DateTime<Utc>,
) -> Option<Finding> {
    if policy.is_ignored(&package.name) {
        return None;
    }

    if metadata.is_resolved() {
        if !policy.license_permitted(&metadata.licenses) {
            return None;
        }
    } else if !policy.license_allowlist.is_empty() {
        warn!(
            "License of {} is unknown, skipping the allow-list",
            package.name
        );
    }

    let outdated = metadata
        .latest
        .as_ref()
        .map(|latest| is_newer(&latest.normalized, &package.version))
        .unwrap_or(false);

    let abandoned = metadata.abandoned;

    let stale = metadata
        .published_at
        .map(|published| is_stale(published, policy.stale_months, now))
        .unwrap_or(false);

    if !(outdated || abandoned || stale || !advisories.is_empty()) {
        return None;
    }

    Some(Finding {
        package: package.clone(),
        metadata: metadata.clone(),
        advisories,
        outdated,
        abandoned,
        stale,
    })
}

/// True when `published` falls before `now - months`.
pub fn is_stale(published: DateTime<Utc>, months: u32, now: DateTime<Utc>) -> bool {
    match now.checked_sub_months(Months::new(months)) {
        Some(cutoff) => published < cutoff,
        None => false,
    }
}
