use crate::error::Result;
use serde_json::Value;
use std::fs;
use std::path::Path;
use std::process::Command;
use tracing::{debug, warn};

/// Runs `composer audit` and hands back its JSON payload.
pub struct AuditRunner {
    composer_bin: String,
}

impl AuditRunner {
    pub fn new(composer_bin: impl Into<String>) -> Self {
        Self {
            composer_bin: composer_bin.into(),
        }
    }

    /// Audits the lockfile in `project_dir`.
    ///
    /// Composer exits non-zero when it finds advisories, so the exit status
    /// is not treated as failure. If the tool cannot be started or prints
    /// something that is not JSON, the result is an empty object and the
    /// scan carries on without advisories.
    pub fn run(&self, project_dir: &Path) -> Value {
        let output = match Command::new(&self.composer_bin)
            .args(["audit", "--format=json", "--locked"])
            .current_dir(project_dir)
            .output()
        {
            Ok(output) => output,
            Err(e) => {
                warn!(
                    "Failed to execute {}: {}. Continuing without advisories",
                    self.composer_bin, e
                );
                return empty_payload();
            }
        };

        debug!("{} audit exited with {}", self.composer_bin, output.status);
        parse_payload(&output.stdout)
    }
}

fn empty_payload() -> Value {
    Value::Object(Default::default())
}

fn parse_payload(stdout: &[u8]) -> Value {
    let stdout = String::from_utf8_lossy(stdout);
    if stdout.trim().is_empty() {
        warn!("composer audit produced no output. Continuing without advisories");
        return empty_payload();
    }

    match serde_json::from_str::<Value>(&stdout) {
        Ok(value @ Value::Object(_)) => value,
        Ok(_) | Err(_) => {
            warn!("composer audit output is not a JSON object. Continuing without advisories");
            empty_payload()
        }
    }
}

/// Reads a payload previously saved from `composer audit --format=json`.
///
/// # Errors
///
/// Returns an error if the file cannot be read or is not JSON.
pub fn read_advisories_file(path: &Path) -> Result<Value> {
    let content = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn test_parse_payload() {
        let payload = parse_payload(br#"{"advisories": {"a/b": []}, "abandoned": {}}"#);
        assert_eq!(payload["advisories"], json!({"a/b": []}));
    }

    #[test]
    fn test_parse_payload_garbage_is_empty() {
        assert_eq!(parse_payload(b""), json!({}));
        assert_eq!(parse_payload(b"Composer could not find a composer.json"), json!({}));
        assert_eq!(parse_payload(b"[1, 2]"), json!({}));
    }

    #[test]
    fn test_missing_binary_is_empty() {
        let dir = TempDir::new().unwrap();
        let runner = AuditRunner::new("depcop-no-such-composer-binary");
        assert_eq!(runner.run(dir.path()), json!({}));
    }

    #[test]
    fn test_read_advisories_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("audit.json");
        fs::write(&path, r#"{"advisories": {}}"#).unwrap();

        assert_eq!(read_advisories_file(&path).unwrap(), json!({"advisories": {}}));
        assert!(read_advisories_file(&dir.path().join("nope.json")).is_err());
    }
}
