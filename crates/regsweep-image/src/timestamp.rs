//! Creation timestamp resolution
//!
//! A tag's creation time is taken from the first source that yields a
//! parseable timestamp, in this order:
//!
//! 1. the image config blob's `created` field
//! 2. the `org.opencontainers.image.created` label on the image config
//! 3. the first legacy (schema 1) history entry's `created` field
//! 4. the build start time of an attached SLSA provenance attestation
//!
//! Fetch failures and missing or malformed fields all mean "try the next
//! source". The extraction helpers are pure functions of the fetched
//! documents.

use crate::registry::RegistryClient;
use crate::types::{ConfigDoc, Descriptor, ManifestDoc, ReferrersDoc};
use base64::Engine;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use regsweep_core::ContentDigest;
use serde_json::Value;
use tracing::{debug, trace};

/// OCI annotation / label carrying the image creation time
pub const CREATED_LABEL: &str = "org.opencontainers.image.created";

/// Substrings identifying attestation artifacts among referrers, matched
/// case-insensitively with hyphens ignored ("in-toto" matches "intoto")
const ATTESTATION_MARKERS: [&str; 3] = ["intoto", "provenance", "attestation"];

/// Resolves creation timestamps for tags through a registry client
pub struct TimestampResolver<'a> {
    client: &'a RegistryClient,
}

impl<'a> TimestampResolver<'a> {
    pub fn new(client: &'a RegistryClient) -> Self {
        Self { client }
    }

    /// Resolve the creation time of `repository:tag`
    ///
    /// `digest` is the tag's manifest digest, used to look up attestations.
    /// Returns `None` when no source is available.
    pub async fn resolve(
        &self,
        repository: &str,
        tag: &str,
        digest: &ContentDigest,
    ) -> Option<DateTime<Utc>> {
        if let Some(created) = self.from_image(repository, tag).await {
            trace!("{}:{} created {} (image metadata)", repository, tag, created);
            return Some(created);
        }

        if let Some(started) = self.from_attestation(repository, digest).await {
            debug!("{}:{} created {} (attestation)", repository, tag, started);
            return Some(started);
        }

        debug!("No creation time found for {}:{}", repository, tag);
        None
    }

    /// Sources 1 to 3: config blob, config label, legacy history
    async fn from_image(&self, repository: &str, tag: &str) -> Option<DateTime<Utc>> {
        let mut manifest = self.client.get_manifest(repository, tag).await?;

        if manifest.is_index() {
            let child = manifest.manifests.first()?.digest.clone();
            trace!("{}:{} is an index, following {}", repository, tag, child);
            manifest = self.client.get_manifest(repository, &child).await?;
        }

        let config = match manifest.config_digest() {
            Some(config_digest) => self.client.get_config_blob(repository, config_digest).await,
            None => None,
        };

        created_from_documents(&manifest, config.as_ref())
    }

    /// Source 4: build start time from an attached provenance attestation
    async fn from_attestation(
        &self,
        repository: &str,
        digest: &ContentDigest,
    ) -> Option<DateTime<Utc>> {
        let referrers = self.client.get_referrers(repository, digest).await?;
        let attestation = find_attestation(&referrers)?;
        let blob = self
            .client
            .get_blob_json(repository, &attestation.digest)
            .await?;

        let statement = match unwrap_statement(&blob) {
            Some(statement) => statement,
            None => {
                // Artifact manifest: the statement sits in the first layer
                let layer = first_layer_digest(&blob)?;
                let layer_blob = self.client.get_blob_json(repository, layer).await?;
                unwrap_statement(&layer_blob)?
            }
        };

        build_started_on(&statement)
    }
}

/// Creation time from a manifest and its (optional) config blob
pub fn created_from_documents(
    manifest: &ManifestDoc,
    config: Option<&ConfigDoc>,
) -> Option<DateTime<Utc>> {
    config
        .and_then(|c| c.created.as_deref())
        .and_then(parse_timestamp)
        .or_else(|| {
            config
                .and_then(|c| c.label(CREATED_LABEL))
                .and_then(parse_timestamp)
        })
        .or_else(|| created_from_history(manifest))
}

/// Creation time from the first schema 1 history entry
pub fn created_from_history(manifest: &ManifestDoc) -> Option<DateTime<Utc>> {
    let raw = manifest.history.first()?.v1_compatibility.as_deref()?;
    let compat: Value = serde_json::from_str(raw).ok()?;
    compat.get("created")?.as_str().and_then(parse_timestamp)
}

/// First referrer that looks like an attestation
pub fn find_attestation(referrers: &ReferrersDoc) -> Option<&Descriptor> {
    referrers.manifests.iter().find(|d| {
        [d.artifact_type.as_deref(), d.media_type.as_deref()]
            .into_iter()
            .flatten()
            .any(|kind| {
                let kind = kind.to_ascii_lowercase().replace('-', "");
                ATTESTATION_MARKERS.iter().any(|m| kind.contains(m))
            })
    })
}

/// Extract the in-toto statement from a bare statement or a DSSE envelope
///
/// Sigstore bundles wrap the envelope in a `dsseEnvelope` field.
pub fn unwrap_statement(blob: &Value) -> Option<Value> {
    if blob.get("predicate").is_some() {
        return Some(blob.clone());
    }

    let envelope = blob.get("dsseEnvelope").unwrap_or(blob);
    let payload = envelope.get("payload")?.as_str()?;
    let decoded = base64::engine::general_purpose::STANDARD
        .decode(payload.trim())
        .ok()?;
    let statement: Value = serde_json::from_slice(&decoded).ok()?;
    statement.get("predicate").is_some().then_some(statement)
}

fn first_layer_digest(manifest: &Value) -> Option<&str> {
    manifest
        .get("layers")?
        .as_array()?
        .first()?
        .get("digest")?
        .as_str()
}

/// Build start time from SLSA v1.0, falling back to the v0.2 layout
pub fn build_started_on(statement: &Value) -> Option<DateTime<Utc>> {
    [
        "/predicate/runDetails/metadata/startedOn",
        "/predicate/metadata/buildStartedOn",
    ]
    .into_iter()
    .find_map(|pointer| {
        statement
            .pointer(pointer)
            .and_then(Value::as_str)
            .and_then(parse_timestamp)
    })
}

/// Parse an RFC 3339 timestamp; zone-less times and bare dates are taken as UTC
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(t) = DateTime::parse_from_rfc3339(raw) {
        return Some(t.with_timezone(&Utc));
    }
    if let Ok(t) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(t.and_utc());
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|t| t.and_utc())
}
