use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A release as shown to users and as compared by the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReleaseVersion {
    /// Display form, e.g. `v5.4.2`.
    pub version: String,
    /// Normalized dotted form, e.g. `5.4.2.0`.
    pub normalized: String,
}

/// Registry facts about one package.
///
/// Replaced wholesale on refresh. A fetch failure yields
/// [`RegistryMetadata::unknown`], where every field is absent or false.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryMetadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latest: Option<ReleaseVersion>,
    #[serde(default)]
    pub abandoned: bool,
    /// Package the maintainers point to instead, when abandoned.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replacement: Option<String>,
    #[serde(default)]
    pub licenses: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published_at: Option<DateTime<Utc>>,
}

impl RegistryMetadata {
    pub fn unknown() -> Self {
        Self::default()
    }

    /// True when a latest release could be determined.
    pub fn is_resolved(&self) -> bool {
        self.latest.is_some()
    }

    pub fn latest_display(&self) -> Option<&str> {
        self.latest.as_ref().map(|l| l.version.as_str())
    }

    /// Licenses joined for display, or `None` when the registry listed none.
    pub fn license_label(&self) -> Option<String> {
        if self.licenses.is_empty() {
            None
        } else {
            Some(self.licenses.join(", "))
        }
    }
}
