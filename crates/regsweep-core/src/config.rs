//! Cleanup run configuration
//!
//! Values arrive from the environment or command line (see the `regsweep`
//! binary); this module only holds the validated result.

use crate::error::{Error, Result};
use std::fmt;
use std::num::NonZeroUsize;

/// Default registry API root
pub const DEFAULT_REGISTRY_URL: &str = "http://localhost:5000";

/// Default number of digests kept per repository
pub const DEFAULT_RETENTION_COUNT: usize = 5;

/// Default number of tags resolved concurrently
pub const DEFAULT_CONCURRENCY: usize = 4;

/// Basic-auth credentials for the registry
#[derive(Clone, PartialEq, Eq)]
pub struct RegistryCredentials {
    pub username: String,
    pub password: String,
}

impl RegistryCredentials {
    /// Credentials are only usable when both parts are present
    pub fn from_parts(username: Option<String>, password: Option<String>) -> Option<Self> {
        match (username, password) {
            (Some(username), Some(password)) if !username.is_empty() && !password.is_empty() => {
                Some(Self { username, password })
            }
            _ => None,
        }
    }
}

impl fmt::Debug for RegistryCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "RegistryCredentials(username={}, password=[REDACTED])",
            self.username
        )
    }
}

/// Validated configuration for one cleanup run
#[derive(Debug, Clone)]
pub struct CleanupConfig {
    /// Root of the registry v2 API, without trailing slash
    pub registry_url: String,
    pub credentials: Option<RegistryCredentials>,
    /// Simulate deletions instead of issuing them
    pub dry_run: bool,
    /// Explicit repositories; `None` means discover through the catalog
    pub repositories: Option<Vec<String>>,
    /// Reserved, not acted on yet
    pub delete_untagged: bool,
    pub retention_count: NonZeroUsize,
    /// Tags resolved in parallel within one repository
    pub concurrency: NonZeroUsize,
}

impl Default for CleanupConfig {
    fn default() -> Self {
        Self {
            registry_url: DEFAULT_REGISTRY_URL.to_string(),
            credentials: None,
            dry_run: true,
            repositories: None,
            delete_untagged: false,
            retention_count: NonZeroUsize::new(DEFAULT_RETENTION_COUNT)
                .unwrap_or(NonZeroUsize::MIN),
            concurrency: NonZeroUsize::new(DEFAULT_CONCURRENCY).unwrap_or(NonZeroUsize::MIN),
        }
    }
}

impl CleanupConfig {
    /// Set the registry URL, validating its scheme and stripping trailing slashes
    pub fn with_registry_url(mut self, url: &str) -> Result<Self> {
        self.registry_url = normalize_registry_url(url)?;
        Ok(self)
    }

    /// Set the repository allow-list from a comma-separated string
    pub fn with_repository_list(mut self, list: &str) -> Self {
        self.repositories = parse_repository_list(list);
        self
    }

    /// Set the retention count; zero is rejected
    pub fn with_retention_count(mut self, count: usize) -> Result<Self> {
        self.retention_count = NonZeroUsize::new(count)
            .ok_or_else(|| Error::invalid_config("retention count must be at least 1"))?;
        Ok(self)
    }

    /// Set the metadata worker count; zero is rejected
    pub fn with_concurrency(mut self, workers: usize) -> Result<Self> {
        self.concurrency = NonZeroUsize::new(workers)
            .ok_or_else(|| Error::invalid_config("concurrency must be at least 1"))?;
        Ok(self)
    }
}

fn normalize_registry_url(url: &str) -> Result<String> {
    let url = url.trim().trim_end_matches('/');
    match url.split_once("://") {
        Some(("http" | "https", host)) if !host.is_empty() => Ok(url.to_string()),
        _ => Err(Error::invalid_config(format!(
            "registry URL must be http:// or https:// with a host, got '{}'",
            url
        ))),
    }
}

/// Parse a comma-separated repository list
///
/// Entries are trimmed and empty entries dropped. A list with nothing left
/// means "discover all" and yields `None`.
pub fn parse_repository_list(list: &str) -> Option<Vec<String>> {
    let repos: Vec<String> = list
        .split(',')
        .map(str::trim)
        .filter(|r| !r.is_empty())
        .map(String::from)
        .collect();

    if repos.is_empty() {
        None
    } else {
        Some(repos)
    }
}
