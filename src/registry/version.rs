//! Dotted version parsing and ordering.
//!
//! Composer versions are compared component by component as numbers, so
//! `1.10.0` is newer than `1.9.0`. A trailing stability suffix orders
//! `dev < alpha < beta < RC < stable < patch`, with the suffix number as a
//! tie-breaker (`beta2 < beta10`).

use std::cmp::Ordering;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Stability {
    Dev,
    Alpha,
    Beta,
    ReleaseCandidate,
    Stable,
    Patch,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct DottedVersion {
    numbers: Vec<u64>,
    stability: Stability,
    suffix_number: u64,
}

impl DottedVersion {
    fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        let raw = raw
            .strip_prefix('v')
            .or_else(|| raw.strip_prefix('V'))
            .unwrap_or(raw);
        let raw = raw.split('+').next().unwrap_or(raw);

        if raw.to_lowercase().starts_with("dev-") {
            return None;
        }

        let (numeric, suffix) = match raw.find('-') {
            Some(pos) => (&raw[..pos], Some(&raw[pos + 1..])),
            None => (raw, None),
        };

        let numbers = numeric
            .split('.')
            .map(|part| part.parse::<u64>().ok())
            .collect::<Option<Vec<_>>>()?;

        let (stability, suffix_number) = match suffix {
            Some(suffix) => parse_suffix(suffix),
            None => (Stability::Stable, 0),
        };

        Some(Self {
            numbers,
            stability,
            suffix_number,
        })
    }

    fn cmp_numbers(&self, other: &Self) -> Ordering {
        let len = self.numbers.len().max(other.numbers.len());
        for i in 0..len {
            let a = self.numbers.get(i).copied().unwrap_or(0);
            let b = other.numbers.get(i).copied().unwrap_or(0);
            match a.cmp(&b) {
                Ordering::Equal => continue,
                ord => return ord,
            }
        }
        Ordering::Equal
    }
}

impl Ord for DottedVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        self.cmp_numbers(other)
            .then(self.stability.cmp(&other.stability))
            .then(self.suffix_number.cmp(&other.suffix_number))
    }
}

impl PartialOrd for DottedVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

fn parse_suffix(suffix: &str) -> (Stability, u64) {
    let suffix = suffix.to_lowercase();
    let label: String = suffix.chars().take_while(|c| c.is_ascii_alphabetic()).collect();
    let digits: String = suffix[label.len()..]
        .chars()
        .skip_while(|c| !c.is_ascii_digit())
        .take_while(|c| c.is_ascii_digit())
        .collect();
    let number = digits.parse().unwrap_or(0);

    let stability = match label.as_str() {
        "alpha" | "a" => Stability::Alpha,
        "beta" | "b" => Stability::Beta,
        "rc" => Stability::ReleaseCandidate,
        "patch" | "pl" | "p" => Stability::Patch,
        _ => Stability::Dev,
    };

    (stability, number)
}

/// Compares two versions numerically, or `None` when either side is not a
/// dotted numeric version (e.g. `dev-main`).
pub fn compare_dotted(a: &str, b: &str) -> Option<Ordering> {
    Some(DottedVersion::parse(a)?.cmp(&DottedVersion::parse(b)?))
}

/// Total order over arbitrary version strings.
///
/// Parsable versions sort above unparsable ones; two unparsable versions
/// compare lexically.
pub fn compare_versions(a: &str, b: &str) -> Ordering {
    match (DottedVersion::parse(a), DottedVersion::parse(b)) {
        (Some(a), Some(b)) => a.cmp(&b),
        (Some(_), None) => Ordering::Greater,
        (None, Some(_)) => Ordering::Less,
        (None, None) => a.cmp(b),
    }
}

/// True for releases without a dev/alpha/beta/RC stability tag.
pub fn is_stable(version: &str) -> bool {
    match DottedVersion::parse(version) {
        Some(parsed) => parsed.stability >= Stability::Stable,
        None => {
            let lower = version.to_lowercase();
            if lower.starts_with("dev-") {
                return false;
            }
            !lower
                .split(|c: char| !c.is_ascii_alphanumeric())
                .any(|token| {
                    token.starts_with("dev")
                        || token.starts_with("alpha")
                        || token.starts_with("beta")
                        || token.starts_with("rc")
                })
        }
    }
}

/// Whether `latest` is strictly newer than `current`.
///
/// Falls back to plain inequality when the versions are not comparable.
pub fn is_newer(latest: &str, current: &str) -> bool {
    match compare_dotted(latest, current) {
        Some(ordering) => ordering == Ordering::Greater,
        None => latest.trim_start_matches('v') != current.trim_start_matches('v'),
    }
}
