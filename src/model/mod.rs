//! Core data types shared by the engine and the renderers.
//!
//! - [`PackageRecord`] - One locked dependency
//! - [`RegistryMetadata`] - Registry facts about a package
//! - [`Severity`] / [`AdvisoryRecord`] - Normalized vulnerability advisories
//! - [`Finding`] - A package that tripped at least one risk condition
//! - [`ScanReport`] - Everything a renderer needs
//!
//! # Example
//!
//! ```
//! use depcop::{PackageRecord, RegistryMetadata, ScanReport};
//!
//! let package = PackageRecord::new("monolog/monolog", "3.5.0", false);
//! let metadata = RegistryMetadata::unknown();
//! assert!(!metadata.is_resolved());
//!
//! let report = ScanReport::new(1, Vec::new());
//! println!("{} scanned, {} findings", report.packages_scanned, report.findings.len());
//! # let _ = package;
//! ```

mod advisory;
mod finding;
mod metadata;
mod package;

pub use advisory::*;
pub use finding::*;
pub use metadata::*;
pub use package::*;
