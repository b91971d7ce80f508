//! Configuration file handling.
//!
//! Settings come from three places, highest precedence first: command-line
//! flags ([`Overrides`]), a `depcop.toml` file, and built-in defaults.
//!
//! # Configuration Location
//!
//! `depcop.toml` in the project directory, or any path given with
//! `--config`.
//!
//! # Example Configuration
//!
//! ```toml
//! format = "table"
//! stale-months = 18
//! fail-on = "high"
//! min-severity = "moderate"
//! ignore-packages = ["laravel/*", "psr/log"]
//! dependency-type = "exclude-dev"
//! license-denylist = ["GPL-3.0-only"]
//! cache-ttl = 3600
//! exit-code = "enhanced"
//! ```

use crate::cache::DEFAULT_TTL_SECS;
use crate::error::{Error, Result};
use crate::model::Severity;
use crate::output::OutputFormat;
use crate::policy::{DependencyScope, ExitCodeScheme, Policy};
use crate::registry::DEFAULT_REGISTRY_URL;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

pub const CONFIG_FILE_NAME: &str = "depcop.toml";

/// Application configuration.
///
/// # Example
///
/// ```no_run
/// use depcop::Config;
/// use std::path::Path;
///
/// let config = Config::load(&Config::config_path(Path::new(".")))?;
/// println!("Stale after {} months", config.stale_months);
/// # Ok::<(), depcop::Error>(())
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct Config {
    /// Output format: "table", "json", "md" or "html".
    pub format: String,

    /// Months without a release before a package is stale.
    pub stale_months: u32,

    /// Severity that fails the build.
    pub fail_on: Severity,

    /// Advisories below this severity are dropped, including unrated ones.
    /// Unset keeps all of them.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_severity: Option<Severity>,

    /// Composer executable used for `composer audit`.
    pub composer_bin: String,

    /// Hide progress output and table decorations.
    pub quiet: bool,

    /// Package names to skip. Supports `*` wildcards.
    pub ignore_packages: Vec<String>,

    pub dependency_type: DependencyScope,

    pub license_allowlist: Vec<String>,

    pub license_denylist: Vec<String>,

    pub cache_enabled: bool,

    /// Disk cache lifetime, in seconds.
    pub cache_ttl: u64,

    /// Overrides the platform cache directory.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache_dir: Option<PathBuf>,

    pub exit_code: ExitCodeScheme,

    /// Composer v2 metadata repository.
    pub registry_url: String,

    /// Per-request HTTP timeout, in seconds.
    pub timeout_secs: u64,

    pub connect_timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            format: "table".to_string(),
            stale_months: 18,
            fail_on: Severity::High,
            min_severity: Some(Severity::Low),
            composer_bin: "composer".to_string(),
            quiet: false,
            ignore_packages: Vec::new(),
            dependency_type: DependencyScope::All,
            license_allowlist: Vec::new(),
            license_denylist: Vec::new(),
            cache_enabled: true,
            cache_ttl: DEFAULT_TTL_SECS,
            cache_dir: None,
            exit_code: ExitCodeScheme::Enhanced,
            registry_url: DEFAULT_REGISTRY_URL.to_string(),
            timeout_secs: 10,
            connect_timeout_secs: 5,
        }
    }
}

/// Values given on the command line. `None` and empty lists defer to the
/// file or the default.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub format: Option<String>,
    pub stale_months: Option<u32>,
    pub fail_on: Option<Severity>,
    pub min_severity: Option<Severity>,
    pub composer_bin: Option<String>,
    pub quiet: bool,
    pub ignore_packages: Vec<String>,
    pub dependency_type: Option<DependencyScope>,
    pub license_allowlist: Vec<String>,
    pub license_denylist: Vec<String>,
    pub no_cache: bool,
    pub cache_ttl: Option<u64>,
    pub exit_code: Option<ExitCodeScheme>,
}

fn replace_if_set(target: &mut Vec<String>, value: Vec<String>) {
    if !value.is_empty() {
        *target = value;
    }
}

impl Config {
    /// Loads configuration from `path`.
    ///
    /// If the file doesn't exist, returns the default configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|source| Error::InvalidConfigFile {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Layers command-line values on top of this configuration.
    pub fn apply(&mut self, overrides: Overrides) {
        if let Some(format) = overrides.format {
            self.format = format;
        }
        if let Some(months) = overrides.stale_months {
            self.stale_months = months;
        }
        if let Some(fail_on) = overrides.fail_on {
            self.fail_on = fail_on;
        }
        if overrides.min_severity.is_some() {
            self.min_severity = overrides.min_severity;
        }
        if let Some(bin) = overrides.composer_bin {
            self.composer_bin = bin;
        }
        self.quiet |= overrides.quiet;
        replace_if_set(&mut self.ignore_packages, overrides.ignore_packages);
        if let Some(scope) = overrides.dependency_type {
            self.dependency_type = scope;
        }
        replace_if_set(&mut self.license_allowlist, overrides.license_allowlist);
        replace_if_set(&mut self.license_denylist, overrides.license_denylist);
        if overrides.no_cache {
            self.cache_enabled = false;
        }
        if let Some(ttl) = overrides.cache_ttl {
            self.cache_ttl = ttl;
        }
        if let Some(scheme) = overrides.exit_code {
            self.exit_code = scheme;
        }
    }

    /// Rejects values no scan can run with.
    ///
    /// # Errors
    ///
    /// [`Error::Config`] naming the offending option.
    pub fn validate(&self) -> Result<()> {
        self.output_format()?;

        if self.stale_months < 1 {
            return Err(Error::config("stale-months must be a positive integer"));
        }
        if self.timeout_secs == 0 || self.connect_timeout_secs == 0 {
            return Err(Error::config("timeouts must be greater than zero"));
        }
        if self.composer_bin.trim().is_empty() {
            return Err(Error::config("composer-bin must not be empty"));
        }
        Ok(())
    }

    pub fn output_format(&self) -> Result<OutputFormat> {
        OutputFormat::from_str(&self.format).map_err(Error::config)
    }

    /// The policy the engine evaluates against.
    pub fn policy(&self) -> Policy {
        Policy {
            stale_months: self.stale_months,
            min_severity: self.min_severity,
            license_allowlist: self.license_allowlist.clone(),
            license_denylist: self.license_denylist.clone(),
            ignore_packages: self.ignore_packages.clone(),
            dependency_type: self.dependency_type,
            fail_on: self.fail_on,
            exit_code: self.exit_code,
        }
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    /// Saves the configuration to `path`, creating parent directories.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }

        let content = toml::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Returns the path of the configuration file for a project.
    ///
    /// # Example
    ///
    /// ```
    /// use depcop::Config;
    /// use std::path::Path;
    ///
    /// let path = Config::config_path(Path::new("/srv/app"));
    /// assert!(path.ends_with("depcop.toml"));
    /// ```
    pub fn config_path(project_dir: &Path) -> PathBuf {
        project_dir.join(CONFIG_FILE_NAME)
    }

    /// Generates a string containing the default configuration.
    pub fn generate_default_config() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}
