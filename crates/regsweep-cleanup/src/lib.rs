//! Cleanup orchestration for regsweep
//!
//! Drives a full run: probe the registry, enumerate repositories, collect a
//! snapshot of tag metadata per repository, apply the retention engine and
//! delete what it rejects.

pub mod error;
pub mod runner;
pub mod stats;

pub use error::CleanupError;
pub use runner::Cleanup;
pub use stats::{DigestTags, RepositoryReport, RunStatistics};
