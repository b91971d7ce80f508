pub mod advisory;
pub mod cache;
pub mod classify;
pub mod composer;
pub mod config;
pub mod error;
pub mod model;
pub mod output;
pub mod policy;
pub mod project;
pub mod registry;
pub mod scan;
pub mod verdict;

pub use cache::{DiskCache, MetadataCache, TieredCache};
pub use config::{Config, Overrides};
pub use error::{Error, Result};
pub use model::{
    AdvisoryRecord, Finding, PackageNote, PackageRecord, ProjectInfo, RegistryMetadata,
    ReleaseVersion, ScanReport, Severity,
};
pub use policy::{DependencyScope, ExitCodeScheme, Policy};
pub use registry::{PackageRegistry, PackagistRegistry, RegistryClient};
