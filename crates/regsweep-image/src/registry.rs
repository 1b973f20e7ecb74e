use crate::error::{RegistryError, Result};
use crate::types::{ConfigDoc, ManifestDoc, ReferrersDoc, MANIFEST_ACCEPT, MEDIA_TYPE_OCI_INDEX};
use base64::Engine;
use regsweep_core::{CleanupConfig, ContentDigest, RegistryCredentials};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, LINK};
use reqwest::{Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::collections::HashSet;
use tracing::{debug, error, info, trace, warn};

/// Page size requested from the catalog and tag list endpoints
const PAGE_SIZE: usize = 1000;

/// Response header carrying a manifest's canonical digest
const DIGEST_HEADER: &str = "docker-content-digest";

/// Client for a registry's v2 HTTP API
///
/// Holds only immutable configuration. Read calls never fail outward: errors
/// are logged and reported as missing data.
pub struct RegistryClient {
    client: reqwest::Client,
    base_url: String,
    /// Precomputed `Basic ...` header
    auth_header: Option<HeaderValue>,
    dry_run: bool,
    /// Explicit repositories; bypasses catalog discovery
    repositories: Option<Vec<String>>,
}

impl RegistryClient {
    /// Create a new registry client for the given API root (e.g., "http://localhost:5000")
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("regsweep/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(RegistryError::Client)?;

        let base_url = base_url.into().trim_end_matches('/').to_string();

        Ok(Self {
            client,
            base_url,
            auth_header: None,
            dry_run: false,
            repositories: None,
        })
    }

    /// Build a client from a validated cleanup configuration
    pub fn from_config(config: &CleanupConfig) -> Result<Self> {
        let mut client = Self::new(&config.registry_url)?
            .with_dry_run(config.dry_run)
            .with_repositories(config.repositories.clone());
        if let Some(credentials) = &config.credentials {
            client = client.with_basic_auth(credentials)?;
        }
        Ok(client)
    }

    /// Authenticate every request with `Basic base64(user:pass)`
    pub fn with_basic_auth(mut self, credentials: &RegistryCredentials) -> Result<Self> {
        let encoded = base64::engine::general_purpose::STANDARD.encode(format!(
            "{}:{}",
            credentials.username, credentials.password
        ));
        let mut value = HeaderValue::from_str(&format!("Basic {}", encoded))?;
        value.set_sensitive(true);
        self.auth_header = Some(value);
        Ok(self)
    }

    /// Simulate deletions instead of sending them
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Use a fixed repository list instead of the catalog
    pub fn with_repositories(mut self, repositories: Option<Vec<String>>) -> Self {
        self.repositories = repositories;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    /// Check that the v2 API root answers successfully
    pub async fn probe(&self) -> bool {
        let url = format!("{}/v2/", self.base_url);
        debug!("Probing registry API at {}", url);

        match self.send_get(&url, None).await {
            Ok(_) => {
                info!("Registry API reachable at {}", self.base_url);
                true
            }
            Err(e) => {
                error!("Registry API check failed: {}", e);
                false
            }
        }
    }

    /// Repositories to process: the configured list, or everything in the catalog
    pub async fn list_repositories(&self) -> Vec<String> {
        if let Some(repositories) = &self.repositories {
            debug!(
                "Using configured repository list ({} entries)",
                repositories.len()
            );
            return repositories.clone();
        }

        let url = format!("{}/v2/_catalog?n={}", self.base_url, PAGE_SIZE);
        match self
            .fetch_paginated::<CatalogResponse>(url, |page| page.repositories.unwrap_or_default())
            .await
        {
            Ok(repositories) => {
                debug!("Catalog lists {} repositories", repositories.len());
                repositories
            }
            Err(e) => {
                warn!("Failed to list repositories: {}", e);
                Vec::new()
            }
        }
    }

    /// List all tags for a repository (handles pagination)
    pub async fn list_tags(&self, repository: &str) -> Vec<String> {
        let url = format!(
            "{}/v2/{}/tags/list?n={}",
            self.base_url, repository, PAGE_SIZE
        );
        match self
            .fetch_paginated::<TagsResponse>(url, |page| page.tags.unwrap_or_default())
            .await
        {
            Ok(tags) => {
                trace!("Found {} tags in {}", tags.len(), repository);
                tags
            }
            Err(e) => {
                warn!("Failed to list tags for {}: {}", repository, e);
                Vec::new()
            }
        }
    }

    /// Resolve a tag or digest to the manifest digest the registry deletes by
    pub async fn head_digest(&self, repository: &str, reference: &str) -> Option<ContentDigest> {
        match self.try_head_digest(repository, reference).await {
            Ok(digest) => {
                trace!("{}:{} -> {}", repository, reference, digest);
                Some(digest)
            }
            Err(e) => {
                warn!("Failed to resolve digest for {}:{}: {}", repository, reference, e);
                None
            }
        }
    }

    async fn try_head_digest(&self, repository: &str, reference: &str) -> Result<ContentDigest> {
        let url = format!(
            "{}/v2/{}/manifests/{}",
            self.base_url, repository, reference
        );
        let mut headers = self.headers();
        headers.insert(ACCEPT, manifest_accept());

        let response = self
            .client
            .head(&url)
            .headers(headers)
            .send()
            .await
            .map_err(|e| RegistryError::transport(&url, e))?;

        if !response.status().is_success() {
            return Err(RegistryError::status(response.status(), url));
        }

        response
            .headers()
            .get(DIGEST_HEADER)
            .and_then(|h| h.to_str().ok())
            .and_then(|d| ContentDigest::parse(d).ok())
            .ok_or_else(|| RegistryError::missing_digest(url))
    }

    /// Get manifest for a specific image tag or digest
    pub async fn get_manifest(&self, repository: &str, reference: &str) -> Option<ManifestDoc> {
        let url = format!(
            "{}/v2/{}/manifests/{}",
            self.base_url, repository, reference
        );
        debug!("Fetching manifest from: {}", url);

        self.get_json(&url, Some(manifest_accept()))
            .await
            .map_err(|e| warn!("Failed to get manifest {}:{}: {}", repository, reference, e))
            .ok()
    }

    /// Fetch and parse an image config blob
    pub async fn get_config_blob(&self, repository: &str, digest: &str) -> Option<ConfigDoc> {
        let url = format!("{}/v2/{}/blobs/{}", self.base_url, repository, digest);
        debug!("Fetching config blob from: {}", url);

        self.get_json(&url, None)
            .await
            .map_err(|e| warn!("Failed to get config blob {}@{}: {}", repository, digest, e))
            .ok()
    }

    /// Fetch any blob as untyped JSON (attestation statements, envelopes)
    pub async fn get_blob_json(
        &self,
        repository: &str,
        digest: &str,
    ) -> Option<serde_json::Value> {
        let url = format!("{}/v2/{}/blobs/{}", self.base_url, repository, digest);
        debug!("Fetching blob from: {}", url);

        self.get_json(&url, None)
            .await
            .map_err(|e| warn!("Failed to get blob {}@{}: {}", repository, digest, e))
            .ok()
    }

    /// List artifacts attached to a manifest through the referrers API
    ///
    /// Many registries do not implement this endpoint; that is reported at
    /// debug level only.
    pub async fn get_referrers(
        &self,
        repository: &str,
        digest: &ContentDigest,
    ) -> Option<ReferrersDoc> {
        let url = format!("{}/v2/{}/referrers/{}", self.base_url, repository, digest);
        debug!("Fetching referrers from: {}", url);

        let accept = HeaderValue::from_static(MEDIA_TYPE_OCI_INDEX);
        match self.get_json(&url, Some(accept)).await {
            Ok(referrers) => Some(referrers),
            Err(RegistryError::Status { status, .. }) if status == StatusCode::NOT_FOUND => {
                debug!("Referrers not available for {}@{}", repository, digest);
                None
            }
            Err(e) => {
                warn!("Failed to get referrers for {}@{}: {}", repository, digest, e);
                None
            }
        }
    }

    /// Delete a manifest by digest
    ///
    /// Only `202 Accepted` counts as success. In dry-run mode nothing is sent
    /// and the deletion is reported as successful.
    pub async fn delete_manifest(&self, repository: &str, digest: &ContentDigest) -> bool {
        if self.dry_run {
            info!("[dry-run] Would delete {}@{}", repository, digest);
            return true;
        }

        let url = format!("{}/v2/{}/manifests/{}", self.base_url, repository, digest);
        debug!("Deleting manifest: {}", url);

        let response = match self
            .client
            .delete(&url)
            .headers(self.headers())
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                error!("Failed to delete {}@{}: {}", repository, digest, e);
                return false;
            }
        };

        let status = response.status();
        if status == StatusCode::ACCEPTED {
            info!("Deleted {}@{}", repository, digest);
            true
        } else {
            let body = response.text().await.unwrap_or_default();
            error!(
                "Failed to delete {}@{}: registry returned {}{}",
                repository,
                digest,
                status,
                if body.is_empty() {
                    String::new()
                } else {
                    format!(": {}", body.trim())
                }
            );
            false
        }
    }

    fn headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        if let Some(auth) = &self.auth_header {
            headers.insert(AUTHORIZATION, auth.clone());
        }
        headers
    }

    /// GET a URL, failing on transport errors and non-success statuses
    async fn send_get(&self, url: &str, accept: Option<HeaderValue>) -> Result<Response> {
        let mut headers = self.headers();
        if let Some(accept) = accept {
            headers.insert(ACCEPT, accept);
        }

        let response = self
            .client
            .get(url)
            .headers(headers)
            .send()
            .await
            .map_err(|e| RegistryError::transport(url, e))?;

        if !response.status().is_success() {
            return Err(RegistryError::status(response.status(), url));
        }
        Ok(response)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        accept: Option<HeaderValue>,
    ) -> Result<T> {
        self.send_get(url, accept)
            .await?
            .json()
            .await
            .map_err(|e| RegistryError::decode(url, e))
    }

    /// Follow `Link: <...>; rel="next"` pages, collecting items from each
    async fn fetch_paginated<P: DeserializeOwned>(
        &self,
        first_url: String,
        items: impl Fn(P) -> Vec<String>,
    ) -> Result<Vec<String>> {
        let mut all = Vec::new();
        let mut visited = HashSet::new();
        let mut url = first_url;

        loop {
            visited.insert(url.clone());
            debug!("Listing from: {}", url);
            let response = self.send_get(&url, None).await?;

            let next_url = response
                .headers()
                .get(LINK)
                .and_then(|h| h.to_str().ok())
                .and_then(|link| parse_link_header(link, &self.base_url));

            let page: P = response
                .json()
                .await
                .map_err(|e| RegistryError::decode(&url, e))?;
            all.extend(items(page));

            match next_url {
                Some(next) if visited.contains(&next) => {
                    warn!("Pagination loops back to {}, stopping", next);
                    break;
                }
                Some(next) => url = next,
                None => break,
            }
        }

        Ok(all)
    }
}

fn manifest_accept() -> HeaderValue {
    HeaderValue::from_static(MANIFEST_ACCEPT)
}

/// Parse Link header for pagination
/// Format: </v2/_catalog?n=1000&last=app>; rel="next"
fn parse_link_header(link: &str, base_url: &str) -> Option<String> {
    for part in link.split(',') {
        let part = part.trim();
        if part.contains("rel=\"next\"") {
            let target = part
                .find('<')
                .and_then(|start| part[start + 1..].split_once('>'))
                .map(|(url, _)| url);
            if let Some(url) = target {
                // Registries usually send a path relative to the host
                if url.starts_with('/') {
                    return Some(format!("{}{}", base_url, url));
                }
                return Some(url.to_string());
            }
        }
    }
    None
}

#[derive(Debug, Deserialize)]
struct CatalogResponse {
    #[serde(default)]
    repositories: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
struct TagsResponse {
    #[serde(default)]
    tags: Option<Vec<String>>,
}
