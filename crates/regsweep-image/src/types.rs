use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// OCI image manifest
pub const MEDIA_TYPE_OCI_MANIFEST: &str = "application/vnd.oci.image.manifest.v1+json";
/// OCI image index
pub const MEDIA_TYPE_OCI_INDEX: &str = "application/vnd.oci.image.index.v1+json";
/// Docker schema 2 manifest
pub const MEDIA_TYPE_DOCKER_MANIFEST: &str = "application/vnd.docker.distribution.manifest.v2+json";
/// Docker manifest list
pub const MEDIA_TYPE_DOCKER_LIST: &str =
    "application/vnd.docker.distribution.manifest.list.v2+json";
/// Docker schema 1 manifest (signed and unsigned)
pub const MEDIA_TYPE_DOCKER_V1_SIGNED: &str =
    "application/vnd.docker.distribution.manifest.v1+prettyjws";
pub const MEDIA_TYPE_DOCKER_V1: &str = "application/vnd.docker.distribution.manifest.v1+json";

/// `Accept` value for manifest requests, every media type above
pub const MANIFEST_ACCEPT: &str = "application/vnd.oci.image.manifest.v1+json, \
    application/vnd.oci.image.index.v1+json, \
    application/vnd.docker.distribution.manifest.v2+json, \
    application/vnd.docker.distribution.manifest.list.v2+json, \
    application/vnd.docker.distribution.manifest.v1+prettyjws, \
    application/vnd.docker.distribution.manifest.v1+json";

/// Image manifest as returned by `GET /v2/{repo}/manifests/{ref}`
///
/// One struct covers the shapes a registry may answer with: a single-platform
/// manifest (`config` + `layers`), a legacy schema 1 manifest (`history`),
/// or an index / manifest list (`manifests`).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManifestDoc {
    #[serde(default)]
    pub schema_version: Option<i32>,
    #[serde(default)]
    pub media_type: Option<String>,
    #[serde(default)]
    pub config: Option<Descriptor>,
    #[serde(default)]
    pub layers: Vec<Descriptor>,
    #[serde(default)]
    pub manifests: Vec<Descriptor>,
    #[serde(default)]
    pub history: Vec<HistoryEntry>,
}

impl ManifestDoc {
    /// Digest of the image config blob, if this manifest references one
    pub fn config_digest(&self) -> Option<&str> {
        self.config
            .as_ref()
            .map(|c| c.digest.as_str())
            .filter(|d| !d.is_empty())
    }

    /// Whether this is an index pointing at per-platform manifests
    pub fn is_index(&self) -> bool {
        self.config.is_none() && !self.manifests.is_empty()
    }
}

/// Schema 1 history entry
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// JSON-encoded legacy image config
    #[serde(rename = "v1Compatibility", default)]
    pub v1_compatibility: Option<String>,
}

/// Content descriptor (config, layer, child manifest or referrer)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Descriptor {
    #[serde(default)]
    pub media_type: Option<String>,
    #[serde(default)]
    pub digest: String,
    #[serde(default)]
    pub size: Option<u64>,
    #[serde(default)]
    pub artifact_type: Option<String>,
    #[serde(default)]
    pub annotations: HashMap<String, String>,
}

/// Image config blob
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConfigDoc {
    #[serde(default)]
    pub created: Option<String>,
    #[serde(default)]
    pub os: Option<String>,
    #[serde(default)]
    pub architecture: Option<String>,
    #[serde(default)]
    pub config: Option<ConfigDetail>,
}

impl ConfigDoc {
    /// Look up an image label
    pub fn label(&self, key: &str) -> Option<&str> {
        self.config
            .as_ref()
            .and_then(|c| c.labels.as_ref())
            .and_then(|labels| labels.get(key))
            .map(String::as_str)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConfigDetail {
    #[serde(default)]
    #[serde(rename = "Labels")]
    pub labels: Option<HashMap<String, String>>,
}

/// Response of `GET /v2/{repo}/referrers/{digest}`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReferrersDoc {
    #[serde(default)]
    pub manifests: Vec<Descriptor>,
}
