use serde::{Deserialize, Serialize};

/// One locked dependency as read from `composer.lock`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageRecord {
    pub name: String,
    pub version: String,
    pub dev: bool,
}

impl PackageRecord {
    pub fn new(name: impl Into<String>, version: impl Into<String>, dev: bool) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            dev,
        }
    }
}
