//! Registry metadata resolution.
//!
//! [`RegistryClient`] answers "what is the latest release of this package,
//! is it abandoned, how is it licensed and when was it published". It asks
//! the cache first, then fans out to a [`PackageRegistry`] for the rest.
//! A package that cannot be fetched resolves to
//! [`RegistryMetadata::unknown`] instead of an error.
//!
//! # Example
//!
//! ```no_run
//! use depcop::cache::TieredCache;
//! use depcop::registry::{PackagistRegistry, RegistryClient};
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> depcop::Result<()> {
//!     let packagist = PackagistRegistry::new(
//!         "https://repo.packagist.org",
//!         Duration::from_secs(10),
//!         Duration::from_secs(5),
//!     )?;
//!     let client = RegistryClient::new(Arc::new(packagist))
//!         .with_cache(Arc::new(TieredCache::in_memory()));
//!
//!     let metadata = client.fetch_many(["monolog/monolog", "psr/log"]).await;
//!     for (name, meta) in &metadata {
//!         println!("{}: {:?}", name, meta.latest_display());
//!     }
//!     Ok(())
//! }
//! ```

mod packagist;
pub mod version;

pub use packagist::{expand_minified, PackagistRegistry, DEFAULT_REGISTRY_URL};

use crate::cache::MetadataCache;
use crate::error::Result;
use crate::model::{RegistryMetadata, ReleaseVersion};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::future::join_all;
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use tracing::{debug, info};

/// One published release of a package, as reported by a registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Release {
    pub version: String,
    pub version_normalized: Option<String>,
    pub licenses: Vec<String>,
    pub time: Option<DateTime<Utc>>,
    pub abandoned: bool,
    pub replacement: Option<String>,
}

impl Release {
    pub fn new(version: impl Into<String>) -> Self {
        Self {
            version: version.into(),
            version_normalized: None,
            licenses: Vec::new(),
            time: None,
            abandoned: false,
            replacement: None,
        }
    }

    /// The form used for ordering and stability checks.
    pub fn sort_key(&self) -> &str {
        self.version_normalized.as_deref().unwrap_or(&self.version)
    }
}

/// Source of release lists for packages.
#[async_trait]
pub trait PackageRegistry: Send + Sync {
    fn name(&self) -> &'static str;

    /// Returns every known release of `package`.
    ///
    /// # Errors
    ///
    /// Any network, status or decoding problem. The client turns these into
    /// unknown metadata.
    async fn fetch_releases(&self, package: &str) -> Result<Vec<Release>>;
}

/// Picks the release that counts as "latest".
///
/// Stable releases win when there is at least one; otherwise every release
/// is a candidate. Candidates are ordered by dotted numeric comparison.
pub fn select_latest(releases: &[Release]) -> Option<&Release> {
    let stable: Vec<&Release> = releases
        .iter()
        .filter(|r| version::is_stable(r.sort_key()))
        .collect();

    let candidates: Vec<&Release> = if stable.is_empty() {
        releases.iter().collect()
    } else {
        stable
    };

    candidates
        .into_iter()
        .max_by(|a, b| version::compare_versions(a.sort_key(), b.sort_key()))
}

fn metadata_from(release: &Release) -> RegistryMetadata {
    RegistryMetadata {
        latest: Some(ReleaseVersion {
            version: release.version.clone(),
            normalized: release.sort_key().to_string(),
        }),
        abandoned: release.abandoned,
        replacement: release.replacement.clone(),
        licenses: release.licenses.clone(),
        published_at: release.time,
    }
}

/// Cache-backed, failure-tolerant metadata lookups.
pub struct RegistryClient {
    registry: Arc<dyn PackageRegistry>,
    cache: Option<Arc<dyn MetadataCache>>,
}

impl RegistryClient {
    /// Creates an uncached client.
    pub fn new(registry: Arc<dyn PackageRegistry>) -> Self {
        Self {
            registry,
            cache: None,
        }
    }

    pub fn with_cache(mut self, cache: Arc<dyn MetadataCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    fn cached(&self, name: &str) -> Option<RegistryMetadata> {
        self.cache.as_ref()?.get(name)
    }

    /// Resolves metadata for one package.
    pub async fn fetch_one(&self, name: &str) -> RegistryMetadata {
        if let Some(hit) = self.cached(name) {
            return hit;
        }
        self.fetch_remote(name).await
    }

    /// Resolves metadata for many packages.
    ///
    /// Names are deduplicated and split into cache hits and misses up front.
    /// Misses are fetched concurrently; the call returns once each of them
    /// has either succeeded or failed.
    pub async fn fetch_many<I, S>(&self, names: I) -> HashMap<String, RegistryMetadata>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let names: BTreeSet<String> = names.into_iter().map(|n| n.as_ref().to_string()).collect();

        let mut resolved = HashMap::with_capacity(names.len());
        let mut misses = Vec::new();
        for name in names {
            match self.cached(&name) {
                Some(hit) => {
                    resolved.insert(name, hit);
                }
                None => misses.push(name),
            }
        }

        info!(
            "Resolving registry metadata: {} cached, {} to fetch from {}",
            resolved.len(),
            misses.len(),
            self.registry.name()
        );

        let fetches = misses.into_iter().map(|name| async move {
            let metadata = self.fetch_remote(&name).await;
            (name, metadata)
        });

        resolved.extend(join_all(fetches).await);
        resolved
    }

    async fn fetch_remote(&self, name: &str) -> RegistryMetadata {
        let releases = match self.registry.fetch_releases(name).await {
            Ok(releases) => releases,
            Err(e) => {
                debug!("Registry lookup failed for {}: {}", name, e);
                return RegistryMetadata::unknown();
            }
        };

        let Some(latest) = select_latest(&releases) else {
            debug!("Registry returned no releases for {}", name);
            return RegistryMetadata::unknown();
        };

        let metadata = metadata_from(latest);
        if let Some(cache) = &self.cache {
            cache.put(name, &metadata);
        }
        metadata
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::TieredCache;
    use crate::error::Error;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;

    /// In-memory registry that records every request.
    #[derive(Default)]
    struct FakeRegistry {
        releases: HashMap<String, Vec<Release>>,
        calls: AtomicUsize,
        requested: Mutex<Vec<String>>,
    }

    impl FakeRegistry {
        fn with(mut self, name: &str, versions: &[&str]) -> Self {
            let releases = versions
                .iter()
                .map(|v| Release {
                    version_normalized: Some(v.to_string()),
                    licenses: vec!["MIT".to_string()],
                    ..Release::new(*v)
                })
                .collect();
            self.releases.insert(name.to_string(), releases);
            self
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl PackageRegistry for FakeRegistry {
        fn name(&self) -> &'static str {
            "fake"
        }

        async fn fetch_releases(&self, package: &str) -> Result<Vec<Release>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.requested.lock().unwrap().push(package.to_string());
            if package == "slow/pkg" {
                tokio::time::sleep(Duration::from_millis(50)).await;
            }
            self.releases
                .get(package)
                .cloned()
                .ok_or_else(|| Error::registry(package, "HTTP 404 Not Found"))
        }
    }

    fn release(version: &str) -> Release {
        Release {
            version_normalized: Some(version.to_string()),
            ..Release::new(version)
        }
    }

    #[test]
    fn test_select_latest_numeric_order() {
        let releases = vec![release("1.9.0"), release("1.10.0"), release("1.2.0")];
        assert_eq!(select_latest(&releases).unwrap().version, "1.10.0");
    }

    #[test]
    fn test_select_latest_prefers_stable() {
        let releases = vec![release("2.0.0-beta"), release("1.9.0")];
        assert_eq!(select_latest(&releases).unwrap().version, "1.9.0");
    }

    #[test]
    fn test_select_latest_falls_back_to_prerelease() {
        let releases = vec![release("2.0.0-beta")];
        assert_eq!(select_latest(&releases).unwrap().version, "2.0.0-beta");

        let releases = vec![release("2.0.0-beta"), release("2.0.0-RC1")];
        assert_eq!(select_latest(&releases).unwrap().version, "2.0.0-RC1");
    }

    #[test]
    fn test_select_latest_skips_dev_branches() {
        let releases = vec![
            Release::new("dev-master"),
            release("9999999-dev"),
            release("3.1.0.0"),
        ];
        assert_eq!(select_latest(&releases).unwrap().version, "3.1.0.0");
        assert!(select_latest(&[]).is_none());
    }

    #[tokio::test]
    async fn test_fetch_one_populates_metadata() {
        let registry = Arc::new(FakeRegistry::default().with("acme/lib", &["1.0.0", "1.1.0"]));
        let client = RegistryClient::new(registry.clone());

        let meta = client.fetch_one("acme/lib").await;
        assert_eq!(meta.latest_display(), Some("1.1.0"));
        assert_eq!(meta.licenses, vec!["MIT".to_string()]);
        assert!(!meta.abandoned);
    }

    #[tokio::test]
    async fn test_failure_resolves_to_unknown() {
        let registry = Arc::new(FakeRegistry::default().with("acme/lib", &["1.0.0"]));
        let client = RegistryClient::new(registry.clone());

        let results = client.fetch_many(["acme/lib", "missing/pkg"]).await;
        assert_eq!(results.len(), 2);
        assert!(results["acme/lib"].is_resolved());
        assert_eq!(results["missing/pkg"], RegistryMetadata::unknown());
    }

    #[tokio::test]
    async fn test_slow_package_does_not_drop_siblings() {
        let registry = Arc::new(
            FakeRegistry::default()
                .with("slow/pkg", &["1.0.0"])
                .with("fast/pkg", &["2.0.0"]),
        );
        let client = RegistryClient::new(registry.clone());

        let results = client.fetch_many(["slow/pkg", "fast/pkg", "gone/pkg"]).await;
        assert_eq!(results["slow/pkg"].latest_display(), Some("1.0.0"));
        assert_eq!(results["fast/pkg"].latest_display(), Some("2.0.0"));
        assert!(!results["gone/pkg"].is_resolved());
    }

    #[tokio::test]
    async fn test_fetch_many_deduplicates() {
        let registry = Arc::new(FakeRegistry::default().with("acme/lib", &["1.0.0"]));
        let client = RegistryClient::new(registry.clone());

        let results = client.fetch_many(["acme/lib", "acme/lib", "acme/lib"]).await;
        assert_eq!(results.len(), 1);
        assert_eq!(registry.calls(), 1);
    }

    #[tokio::test]
    async fn test_fully_cached_batch_makes_no_requests() {
        let registry = Arc::new(
            FakeRegistry::default()
                .with("a/a", &["1.0.0"])
                .with("b/b", &["2.0.0"]),
        );
        let cache = Arc::new(TieredCache::in_memory());
        let client = RegistryClient::new(registry.clone()).with_cache(cache.clone());

        client.fetch_many(["a/a", "b/b"]).await;
        assert_eq!(registry.calls(), 2);

        let again = client.fetch_many(["a/a", "b/b"]).await;
        assert_eq!(registry.calls(), 2);
        assert_eq!(again["b/b"].latest_display(), Some("2.0.0"));
    }

    #[tokio::test]
    async fn test_only_misses_are_fetched() {
        let registry = Arc::new(
            FakeRegistry::default()
                .with("a/a", &["1.0.0"])
                .with("b/b", &["2.0.0"]),
        );
        let cache = Arc::new(TieredCache::in_memory());
        let cached = RegistryMetadata {
            licenses: vec!["BSD-3-Clause".to_string()],
            ..RegistryMetadata::unknown()
        };
        cache.put("a/a", &cached);

        let client = RegistryClient::new(registry.clone()).with_cache(cache);
        let results = client.fetch_many(["a/a", "b/b"]).await;

        assert_eq!(registry.calls(), 1);
        assert_eq!(*registry.requested.lock().unwrap(), vec!["b/b".to_string()]);
        assert_eq!(results["a/a"], cached);
    }

    #[tokio::test]
    async fn test_failures_are_not_cached() {
        let registry = Arc::new(FakeRegistry::default());
        let cache = Arc::new(TieredCache::in_memory());
        let client = RegistryClient::new(registry.clone()).with_cache(cache.clone());

        client.fetch_one("missing/pkg").await;
        assert!(cache.get("missing/pkg").is_none());

        client.fetch_one("missing/pkg").await;
        assert_eq!(registry.calls(), 2);
    }

    #[tokio::test]
    async fn test_expired_disk_entry_is_refetched_and_overwritten() {
        use crate::cache::DiskCache;

        let tmp = tempfile::TempDir::new().unwrap();
        let stale_copy = RegistryMetadata {
            licenses: vec!["stale".to_string()],
            ..RegistryMetadata::unknown()
        };
        DiskCache::new(tmp.path(), Duration::from_secs(3600))
            .set("acme/lib", &stale_copy)
            .unwrap();

        let registry = Arc::new(FakeRegistry::default().with("acme/lib", &["4.0.0"]));
        let cache = Arc::new(TieredCache::new(DiskCache::new(tmp.path(), Duration::ZERO)));
        let client = RegistryClient::new(registry.clone()).with_cache(cache);

        let meta = client.fetch_one("acme/lib").await;
        assert_eq!(registry.calls(), 1);
        assert_eq!(meta.latest_display(), Some("4.0.0"));

        let fresh: Option<RegistryMetadata> =
            DiskCache::new(tmp.path(), Duration::from_secs(3600)).get("acme/lib");
        assert_eq!(fresh.unwrap().latest_display(), Some("4.0.0"));
    }
}
