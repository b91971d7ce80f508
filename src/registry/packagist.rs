use super::{PackageRegistry, Release};
use crate::error::{Error, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::time::Duration;

pub const DEFAULT_REGISTRY_URL: &str = "https://repo.packagist.org";

const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// Marker Composer puts on fields removed relative to the previous entry.
const UNSET: &str = "__unset";

/// Packagist (Composer v2 metadata) client.
pub struct PackagistRegistry {
    client: reqwest::Client,
    base_url: String,
}

impl PackagistRegistry {
    /// Builds a client with per-request and connect timeouts.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new(base_url: impl Into<String>, timeout: Duration, connect_timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .connect_timeout(connect_timeout)
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    fn metadata_url(&self, package: &str) -> String {
        format!("{}/p2/{}.json", self.base_url, package)
    }
}

#[derive(Deserialize)]
struct P2Response {
    packages: HashMap<String, Vec<Map<String, Value>>>,
    minified: Option<String>,
}

#[derive(Deserialize)]
struct PackagistVersion {
    version: String,
    version_normalized: Option<String>,
    license: Option<LicenseField>,
    time: Option<String>,
    abandoned: Option<AbandonedField>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum LicenseField {
    Many(Vec<String>),
    One(String),
}

/// `true`, `false`, or the name of a suggested replacement package.
#[derive(Deserialize)]
#[serde(untagged)]
enum AbandonedField {
    Flag(bool),
    Replacement(String),
}

impl From<PackagistVersion> for Release {
    fn from(raw: PackagistVersion) -> Self {
        let licenses = match raw.license {
            Some(LicenseField::Many(list)) => list,
            Some(LicenseField::One(single)) => vec![single],
            None => Vec::new(),
        };

        let (abandoned, replacement) = match raw.abandoned {
            Some(AbandonedField::Flag(flag)) => (flag, None),
            Some(AbandonedField::Replacement(name)) if name.is_empty() => (true, None),
            Some(AbandonedField::Replacement(name)) => (true, Some(name)),
            None => (false, None),
        };

        Release {
            version: raw.version,
            version_normalized: raw.version_normalized,
            licenses,
            time: raw.time.as_deref().and_then(parse_time),
            abandoned,
            replacement,
        }
    }
}

fn parse_time(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Expands a Composer 2 minified version list.
///
/// Each entry only lists the fields that changed since the previous one;
/// a value of `"__unset"` removes the field.
pub fn expand_minified(versions: Vec<Map<String, Value>>) -> Vec<Map<String, Value>> {
    let mut expanded = Vec::with_capacity(versions.len());
    let mut current = Map::new();

    for entry in versions {
        for (key, value) in entry {
            if value.as_str() == Some(UNSET) {
                current.remove(&key);
            } else {
                current.insert(key, value);
            }
        }
        expanded.push(current.clone());
    }

    expanded
}

fn parse_releases(package: &str, body: P2Response) -> Result<Vec<Release>> {
    let P2Response {
        mut packages,
        minified,
    } = body;

    let versions = packages
        .remove(package)
        .ok_or_else(|| Error::registry(package, "package missing from response"))?;

    let versions = match minified.as_deref() {
        Some(_) => expand_minified(versions),
        None => versions,
    };

    Ok(versions
        .into_iter()
        .filter_map(|entry| serde_json::from_value::<PackagistVersion>(Value::Object(entry)).ok())
        .map(Release::from)
        .collect())
}

#[async_trait]
impl PackageRegistry for PackagistRegistry {
    fn name(&self) -> &'static str {
        "Packagist"
    }

    async fn fetch_releases(&self, package: &str) -> Result<Vec<Release>> {
        let response = self
            .client
            .get(self.metadata_url(package))
            .header("Accept", "application/json")
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Error::registry(package, format!("HTTP {}", response.status())));
        }

        let body: P2Response = response.json().await?;
        parse_releases(package, body)
    }
}
