//! Mock registry helpers for regsweep-image tests
//!
//! Wiremock setup for the registry v2 endpoints the client talks to.

#![allow(dead_code)]

use serde_json::{json, Value};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const REPO: &str = "app";
pub const DIGEST_A: &str = "sha256:aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa";
pub const DIGEST_B: &str = "sha256:bbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbb";
pub const CONFIG_DIGEST: &str =
    "sha256:cccccccccccccccccccccccccccccccccccccccccccccccccccccccccccccccc";
pub const ATTESTATION_DIGEST: &str =
    "sha256:dddddddddddddddddddddddddddddddddddddddddddddddddddddddddddddddd";

/// `GET /v2/` answering 200
pub async fn mock_api_root(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/v2/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .mount(server)
        .await;
}

/// `HEAD /v2/{repo}/manifests/{reference}` returning a digest header
pub async fn mock_digest(server: &MockServer, repo: &str, reference: &str, digest: &str) {
    Mock::given(method("HEAD"))
        .and(path(format!("/v2/{}/manifests/{}", repo, reference)))
        .respond_with(ResponseTemplate::new(200).insert_header("Docker-Content-Digest", digest))
        .mount(server)
        .await;
}

/// `GET /v2/{repo}/manifests/{reference}` returning a JSON body
pub async fn mock_manifest(server: &MockServer, repo: &str, reference: &str, body: Value) {
    Mock::given(method("GET"))
        .and(path(format!("/v2/{}/manifests/{}", repo, reference)))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

/// `GET /v2/{repo}/blobs/{digest}` returning a JSON body
pub async fn mock_blob(server: &MockServer, repo: &str, digest: &str, body: Value) {
    Mock::given(method("GET"))
        .and(path(format!("/v2/{}/blobs/{}", repo, digest)))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

/// `GET /v2/{repo}/referrers/{digest}` returning a JSON body
pub async fn mock_referrers(server: &MockServer, repo: &str, digest: &str, body: Value) {
    Mock::given(method("GET"))
        .and(path(format!("/v2/{}/referrers/{}", repo, digest)))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

/// Any request to `path` answering with a bare status
pub async fn mock_status(server: &MockServer, verb: &str, url_path: &str, status: u16) {
    Mock::given(method(verb))
        .and(path(url_path.to_string()))
        .respond_with(ResponseTemplate::new(status))
        .mount(server)
        .await;
}

/// Single-platform OCI manifest referencing `CONFIG_DIGEST`
pub fn oci_manifest() -> Value {
    json!({
        "schemaVersion": 2,
        "mediaType": "application/vnd.oci.image.manifest.v1+json",
        "config": {
            "mediaType": "application/vnd.oci.image.config.v1+json",
            "digest": CONFIG_DIGEST,
            "size": 512
        },
        "layers": []
    })
}

/// Referrers index listing one in-toto attestation
pub fn attestation_referrers() -> Value {
    json!({
        "schemaVersion": 2,
        "mediaType": "application/vnd.oci.image.index.v1+json",
        "manifests": [
            {
                "mediaType": "application/vnd.oci.image.manifest.v1+json",
                "digest": ATTESTATION_DIGEST,
                "size": 700,
                "artifactType": "application/vnd.in-toto+json"
            }
        ]
    })
}
