use serde::{Deserialize, Serialize};

/// Advisory severity, ordered from least to most severe.
///
/// `Unknown` is the sentinel for unrecognized input and sorts below every
/// known level, so it never satisfies a threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    #[serde(skip_deserializing)]
    Unknown,
    Low,
    #[serde(alias = "medium")]
    Moderate,
    High,
    Critical,
}

impl Severity {
    /// All levels a user may configure as a threshold.
    pub const KNOWN: [Severity; 4] = [
        Severity::Low,
        Severity::Moderate,
        Severity::High,
        Severity::Critical,
    ];

    /// Maps a raw severity string from the audit tool onto a level.
    ///
    /// Never fails: anything unrecognized becomes [`Severity::Unknown`].
    pub fn normalize(raw: &str) -> Self {
        raw.parse().unwrap_or(Severity::Unknown)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Unknown => "unknown",
            Severity::Low => "low",
            Severity::Moderate => "moderate",
            Severity::High => "high",
            Severity::Critical => "critical",
        }
    }

    /// High and critical advisories share the top verdict tier.
    pub fn is_high_or_critical(&self) -> bool {
        *self >= Severity::High
    }
}

impl std::str::FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "low" => Ok(Severity::Low),
            "moderate" | "medium" => Ok(Severity::Moderate),
            "high" => Ok(Severity::High),
            "critical" => Ok(Severity::Critical),
            _ => Err(format!(
                "Invalid severity '{}'. Must be: low, moderate, high, critical",
                s
            )),
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One vulnerability report tied to a package.
///
/// `affected_versions` is carried for display only; the audit tool has
/// already decided the advisory applies to the locked version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AdvisoryRecord {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cve: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
    pub severity: Severity,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub affected_versions: Option<String>,
}

impl AdvisoryRecord {
    pub fn new(title: impl Into<String>, severity: Severity) -> Self {
        Self {
            title: title.into(),
            cve: None,
            link: None,
            severity,
            affected_versions: None,
        }
    }

    pub fn with_cve(mut self, cve: impl Into<String>) -> Self {
        self.cve = Some(cve.into());
        self
    }
}
