//! # regsweep-core
//!
//! Core library for the regsweep registry cleaner providing:
//! - The tag model (tag records, content digests, digest groups)
//! - Validated cleanup configuration
//! - The retention engine that partitions digests into keep and delete sets

pub mod config;
pub mod error;
pub mod retention;
pub mod types;

pub use config::{CleanupConfig, RegistryCredentials};
pub use error::{Error, Result};
pub use retention::{decide, is_semver_tag, RetentionDecision};
pub use types::{ContentDigest, DigestGroups, TagRecord};
