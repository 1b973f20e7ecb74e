//! Mock registry fixtures for cleanup runs
//!
//! `MockRegistry` mounts the endpoints a full run walks through: API root,
//! catalog, tag lists, digest lookups, manifests and config blobs.

#![allow(dead_code)]

use regsweep_core::CleanupConfig;
use regsweep_image::RegistryClient;
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const D1: &str = "sha256:d1d1d1d1d1d1d1d1d1d1d1d1d1d1d1d1d1d1d1d1d1d1d1d1d1d1d1d1d1d1d1d1";
pub const D2: &str = "sha256:d2d2d2d2d2d2d2d2d2d2d2d2d2d2d2d2d2d2d2d2d2d2d2d2d2d2d2d2d2d2d2d2";
pub const D3: &str = "sha256:d3d3d3d3d3d3d3d3d3d3d3d3d3d3d3d3d3d3d3d3d3d3d3d3d3d3d3d3d3d3d3d3";
pub const D4: &str = "sha256:d4d4d4d4d4d4d4d4d4d4d4d4d4d4d4d4d4d4d4d4d4d4d4d4d4d4d4d4d4d4d4d4";

pub struct MockRegistry {
    pub server: MockServer,
}

impl MockRegistry {
    /// Start a registry whose API root answers
    pub async fn start() -> Self {
        let server = MockServer::builder().start().await;
        Mock::given(method("GET"))
            .and(path("/v2/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .mount(&server)
            .await;
        Self { server }
    }

    /// Serve a catalog listing `repositories`
    pub async fn catalog(&self, repositories: &[&str]) {
        Mock::given(method("GET"))
            .and(path("/v2/_catalog"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"repositories": repositories})),
            )
            .mount(&self.server)
            .await;
    }

    /// Serve the tag list of `repo`
    pub async fn tags(&self, repo: &str, tags: &[&str]) {
        Mock::given(method("GET"))
            .and(path(format!("/v2/{}/tags/list", repo)))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"name": repo, "tags": tags})),
            )
            .mount(&self.server)
            .await;
    }

    /// Serve `repo:tag` as an image with manifest `digest`, created at `created`
    ///
    /// The config blob digest is derived from the manifest digest, so aliases
    /// of one digest share a config.
    pub async fn image(&self, repo: &str, tag: &str, digest: &str, created: Option<&str>) {
        let config_digest = config_digest_for(digest);

        Mock::given(method("HEAD"))
            .and(path(format!("/v2/{}/manifests/{}", repo, tag)))
            .respond_with(ResponseTemplate::new(200).insert_header("Docker-Content-Digest", digest))
            .mount(&self.server)
            .await;

        Mock::given(method("GET"))
            .and(path(format!("/v2/{}/manifests/{}", repo, tag)))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "schemaVersion": 2,
                "mediaType": "application/vnd.oci.image.manifest.v1+json",
                "config": {
                    "mediaType": "application/vnd.oci.image.config.v1+json",
                    "digest": config_digest,
                    "size": 256
                },
                "layers": []
            })))
            .mount(&self.server)
            .await;

        let config = match created {
            Some(created) => json!({"created": created, "os": "linux"}),
            None => json!({"os": "linux"}),
        };
        Mock::given(method("GET"))
            .and(path(format!("/v2/{}/blobs/{}", repo, config_digest)))
            .respond_with(ResponseTemplate::new(200).set_body_json(config))
            .mount(&self.server)
            .await;
    }

    /// Accept (or reject, with `status`) deletion of `digest`, expecting `times` calls
    pub async fn delete(&self, repo: &str, digest: &str, status: u16, times: u64) {
        Mock::given(method("DELETE"))
            .and(path(format!("/v2/{}/manifests/{}", repo, digest)))
            .respond_with(ResponseTemplate::new(status))
            .expect(times)
            .named(format!("DELETE {}@{}", repo, digest))
            .mount(&self.server)
            .await;
    }

    /// Fail the test if any DELETE arrives
    pub async fn forbid_deletes(&self) {
        Mock::given(method("DELETE"))
            .respond_with(ResponseTemplate::new(202))
            .expect(0)
            .named("no deletes")
            .mount(&self.server)
            .await;
    }

    pub fn config(&self) -> CleanupConfig {
        CleanupConfig::default()
            .with_registry_url(&self.server.uri())
            .unwrap()
    }

    pub fn client(&self, config: &CleanupConfig) -> RegistryClient {
        RegistryClient::from_config(config).unwrap()
    }
}

fn config_digest_for(digest: &str) -> String {
    let hex = digest.trim_start_matches("sha256:");
    format!("sha256:c{}", &hex[1..])
}
