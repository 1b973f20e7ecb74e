//! Registry access for regsweep
//!
//! This crate provides:
//! - A client for the registry v2 HTTP API (catalog, tags, manifests, blobs,
//!   referrers, deletes) that turns every failure into "data unavailable"
//! - Creation timestamp resolution for tags through an ordered fallback over
//!   the image config, its labels, legacy history and build attestations
//!
//! # Example
//!
//! ```no_run
//! use regsweep_image::{RegistryClient, TimestampResolver};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = RegistryClient::new("http://localhost:5000")?.with_dry_run(true);
//!
//!     if let Some(digest) = client.head_digest("app", "latest").await {
//!         let created = TimestampResolver::new(&client)
//!             .resolve("app", "latest", &digest)
//!             .await;
//!         println!("{} created at {:?}", digest, created);
//!     }
//!
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod registry;
pub mod timestamp;
pub mod types;

pub use error::RegistryError;
pub use registry::RegistryClient;
pub use timestamp::TimestampResolver;
pub use types::{ConfigDoc, Descriptor, ManifestDoc, ReferrersDoc};
