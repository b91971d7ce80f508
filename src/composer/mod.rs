//! Adapters for the Composer side of a project: the lockfile and
//! `composer audit`.

mod audit;
mod lockfile;

pub use audit::{read_advisories_file, AuditRunner};
pub use lockfile::{read_lock, LOCKFILE_NAME};
