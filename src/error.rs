//! Error types for depcop.
//!
//! Only input problems surface as errors. Registry and cache failures are
//! recovered where they happen and never reach the caller.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for depcop operations.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Missing {}", .0.display())]
    MissingLockfile(PathBuf),

    #[error("Invalid lockfile {}: {source}", path.display())]
    InvalidLockfile {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid config file {}: {source}", path.display())]
    InvalidConfigFile {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Registry error for {package}: {message}")]
    Registry { package: String, message: String },

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML serialization error: {0}")]
    TomlSer(#[from] toml::ser::Error),
}

impl Error {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn registry(package: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Registry {
            package: package.into(),
            message: message.into(),
        }
    }
}
