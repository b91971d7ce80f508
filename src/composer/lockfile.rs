use crate::error::{Error, Result};
use crate::model::PackageRecord;
use serde::Deserialize;
use std::fs;
use std::path::Path;

pub const LOCKFILE_NAME: &str = "composer.lock";

#[derive(Deserialize)]
struct Lockfile {
    #[serde(default)]
    packages: Vec<LockedPackage>,
    #[serde(default, rename = "packages-dev")]
    packages_dev: Vec<LockedPackage>,
}

#[derive(Deserialize)]
struct LockedPackage {
    name: String,
    version: String,
}

/// Reads every locked package, runtime dependencies first.
///
/// # Errors
///
/// [`Error::MissingLockfile`] if `path` does not exist and
/// [`Error::InvalidLockfile`] if it is not a valid lockfile.
pub fn read_lock(path: &Path) -> Result<Vec<PackageRecord>> {
    if !path.is_file() {
        return Err(Error::MissingLockfile(path.to_path_buf()));
    }

    let content = fs::read_to_string(path)?;
    let lock: Lockfile = serde_json::from_str(&content).map_err(|source| Error::InvalidLockfile {
        path: path.to_path_buf(),
        source,
    })?;

    let runtime = lock
        .packages
        .into_iter()
        .map(|p| PackageRecord::new(p.name, p.version, false));
    let dev = lock
        .packages_dev
        .into_iter()
        .map(|p| PackageRecord::new(p.name, p.version, true));

    Ok(runtime.chain(dev).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_lock(dir: &TempDir, content: &str) -> std::path::PathBuf {
        let path = dir.path().join(LOCKFILE_NAME);
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_read_lock_marks_dev_packages() {
        let dir = TempDir::new().unwrap();
        let path = write_lock(
            &dir,
            r#"{
                "_readme": ["This file locks the dependencies of your project"],
                "content-hash": "abc",
                "packages": [
                    {"name": "monolog/monolog", "version": "3.5.0", "type": "library"},
                    {"name": "psr/log", "version": "3.0.0"}
                ],
                "packages-dev": [
                    {"name": "phpunit/phpunit", "version": "10.5.9"}
                ]
            }"#,
        );

        let packages = read_lock(&path).unwrap();
        assert_eq!(packages.len(), 3);
        assert_eq!(packages[0], PackageRecord::new("monolog/monolog", "3.5.0", false));
        assert!(!packages[1].dev);
        assert_eq!(packages[2], PackageRecord::new("phpunit/phpunit", "10.5.9", true));
    }

    #[test]
    fn test_read_lock_without_sections() {
        let dir = TempDir::new().unwrap();
        let path = write_lock(&dir, r#"{"content-hash": "abc"}"#);
        assert!(read_lock(&path).unwrap().is_empty());
    }

    #[test]
    fn test_missing_lockfile() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(LOCKFILE_NAME);

        let err = read_lock(&path).unwrap_err();
        assert!(matches!(err, Error::MissingLockfile(_)));
        assert!(err.to_string().starts_with("Missing "));
    }

    #[test]
    fn test_invalid_lockfile() {
        let dir = TempDir::new().unwrap();
        let path = write_lock(&dir, "{ not json");
        assert!(matches!(read_lock(&path), Err(Error::InvalidLockfile { .. })));
    }
}
