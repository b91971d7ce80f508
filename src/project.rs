//! Project type detection.
//!
//! Laravel applications are recognized by an `artisan` script or a
//! `laravel/framework` requirement in `composer.json`. For those, the
//! report also lists locked ecosystem packages and attaches known security
//! notes to them.

use crate::model::{PackageNote, PackageRecord, ProjectInfo};
use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use tracing::debug;

const FRAMEWORK_PACKAGE: &str = "laravel/framework";

/// Oldest Laravel major release still receiving security fixes.
const OLDEST_SUPPORTED_MAJOR: u64 = 11;

/// Well-known Laravel ecosystem packages outside the `laravel/` vendor.
const ECOSYSTEM_PACKAGES: &[&str] = &[
    "livewire/livewire",
    "inertiajs/inertia-laravel",
    "spatie/laravel-permission",
    "spatie/laravel-backup",
    "spatie/laravel-medialibrary",
    "barryvdh/laravel-debugbar",
];

/// Packages with a known security concern worth surfacing, and what to check.
const VULNERABILITY_CONTEXT: &[(&str, &str)] = &[
    (
        "livewire/livewire",
        "Critical: check for the Livewire v3 RCE vulnerability (CVE-2025-54068)",
    ),
    (
        "laravel/framework",
        "Check for environment variable manipulation (CVE-2024-52301)",
    ),
    (
        "laravel/sanctum",
        "Ensure proper token validation and security settings",
    ),
    ("laravel/passport", "Verify the OAuth2 implementation security"),
];

#[derive(Deserialize, Default)]
struct ComposerJson {
    #[serde(default)]
    require: HashMap<String, String>,
    #[serde(default, rename = "require-dev")]
    require_dev: HashMap<String, String>,
}

/// Describes the project at `project_dir` given its locked packages.
pub fn detect(project_dir: &Path, packages: &[PackageRecord]) -> ProjectInfo {
    if !is_laravel(project_dir) {
        return ProjectInfo {
            label: "PHP Project".to_string(),
            ..ProjectInfo::default()
        };
    }

    let version = packages
        .iter()
        .find(|p| p.name == FRAMEWORK_PACKAGE)
        .map(|p| p.version.trim_start_matches('v').to_string());

    let ecosystem_packages = packages
        .iter()
        .filter(|p| is_laravel_package(&p.name))
        .map(|p| p.name.clone())
        .collect();

    let package_notes = packages
        .iter()
        .filter_map(|p| {
            vulnerability_context(&p.name).map(|note| PackageNote {
                package: p.name.clone(),
                note: note.to_string(),
            })
        })
        .collect();

    let mut recommendations = Vec::new();

    let gitignore = project_dir.join(".gitignore");
    if let Ok(content) = fs::read_to_string(&gitignore) {
        if !content.contains(".env") {
            recommendations.push("Add .env to .gitignore to prevent leaking APP_KEY".to_string());
        }
    }

    if let Some(version) = &version {
        if major_version(version).is_some_and(|major| major < OLDEST_SUPPORTED_MAJOR) {
            recommendations.push(format!(
                "Laravel {} is end-of-life, upgrade to Laravel {}+",
                version, OLDEST_SUPPORTED_MAJOR
            ));
        }
    }

    let label = match version {
        Some(version) => format!("Laravel {}", version),
        None => "Laravel Project".to_string(),
    };

    ProjectInfo {
        label,
        recommendations,
        ecosystem_packages,
        package_notes,
    }
}

/// True for `laravel/*` packages and the well-known third-party ones.
pub fn is_laravel_package(name: &str) -> bool {
    name.starts_with("laravel/") || ECOSYSTEM_PACKAGES.contains(&name)
}

/// Security guidance for a package, if it has a known concern.
pub fn vulnerability_context(name: &str) -> Option<&'static str> {
    VULNERABILITY_CONTEXT
        .iter()
        .find(|(package, _)| *package == name)
        .map(|(_, note)| *note)
}

fn is_laravel(project_dir: &Path) -> bool {
    if project_dir.join("artisan").is_file() {
        return true;
    }

    let manifest = project_dir.join("composer.json");
    let Ok(content) = fs::read_to_string(&manifest) else {
        return false;
    };

    match serde_json::from_str::<ComposerJson>(&content) {
        Ok(composer) => {
            composer.require.contains_key(FRAMEWORK_PACKAGE)
                || composer.require_dev.contains_key(FRAMEWORK_PACKAGE)
        }
        Err(e) => {
            debug!("Ignoring unreadable {}: {}", manifest.display(), e);
            false
        }
    }
}

/// Leading numeric component of `version`, e.g. `11` for `11.35.1`.
fn major_version(version: &str) -> Option<u64> {
    let (major, _) = version.split_once('.')?;
    major.parse().ok()
}
