//! End-to-end cleanup runs against a wiremock registry
//!
//! Tests cover:
//! - The reference scenario (aliases, semver tag inside the window)
//! - Dry-run issuing no DELETE
//! - Fatal probe failure
//! - Skipped tags, empty repositories and rejected deletes
//! - Identical outcomes for sequential and concurrent metadata collection

mod common;

use common::*;
use regsweep_cleanup::{Cleanup, CleanupError, RunStatistics};
use regsweep_core::{CleanupConfig, ContentDigest};
use wiremock::matchers::{method, path};
use wiremock::{Mock, ResponseTemplate};

/// `app`: v1.0.0 -> D1, v1.1.0 + latest -> D2, nightly -> D3
async fn mount_reference_app(registry: &MockRegistry) {
    registry
        .tags("app", &["v1.0.0", "v1.1.0", "latest", "nightly"])
        .await;
    registry
        .image("app", "v1.0.0", D1, Some("2024-01-01T00:00:00Z"))
        .await;
    registry
        .image("app", "v1.1.0", D2, Some("2024-06-01T00:00:00Z"))
        .await;
    registry
        .image("app", "latest", D2, Some("2024-06-01T00:00:00Z"))
        .await;
    registry
        .image("app", "nightly", D3, Some("2024-09-01T00:00:00Z"))
        .await;
}

fn live(config: CleanupConfig, retention: usize) -> CleanupConfig {
    CleanupConfig {
        dry_run: false,
        repositories: Some(vec!["app".to_string()]),
        ..config
    }
    .with_retention_count(retention)
    .unwrap()
}

fn digest(s: &str) -> ContentDigest {
    ContentDigest::parse(s).unwrap()
}

#[tokio::test]
async fn test_reference_scenario_deletes_oldest_digest() {
    let registry = MockRegistry::start().await;
    mount_reference_app(&registry).await;
    registry.delete("app", D1, 202, 1).await;
    registry.forbid_deletes().await;

    let config = live(registry.config(), 2);
    let cleanup = Cleanup::new(registry.client(&config), &config);

    let report = cleanup.process_repository("app").await;
    assert_eq!(report.deleted.len(), 1);
    assert_eq!(report.deleted[0].digest, digest(D1));
    assert_eq!(report.deleted[0].tags, vec!["v1.0.0".to_string()]);

    let mut surviving: Vec<String> = report
        .kept
        .iter()
        .flat_map(|k| k.tags.iter().cloned())
        .collect();
    surviving.sort();
    assert_eq!(surviving, vec!["latest", "nightly", "v1.1.0"]);
    assert!(report.failed.is_empty());
}

#[tokio::test]
async fn test_full_run_statistics() {
    let registry = MockRegistry::start().await;
    mount_reference_app(&registry).await;
    registry.delete("app", D1, 202, 1).await;
    registry.forbid_deletes().await;

    let config = live(registry.config(), 2);
    let stats = Cleanup::new(registry.client(&config), &config)
        .run()
        .await
        .unwrap();

    assert_eq!(
        stats,
        RunStatistics {
            deleted: 1,
            kept: 2,
            failed: 0,
            skipped_tags: 0,
            repositories: 1,
            dry_run: false,
        }
    );
}

#[tokio::test]
async fn test_dry_run_sends_no_deletes() {
    let registry = MockRegistry::start().await;
    mount_reference_app(&registry).await;
    registry.forbid_deletes().await;

    let config = CleanupConfig {
        dry_run: true,
        ..live(registry.config(), 2)
    };
    let stats = Cleanup::new(registry.client(&config), &config)
        .run()
        .await
        .unwrap();

    assert!(stats.dry_run);
    assert_eq!(stats.deleted, 1);
    assert_eq!(stats.kept, 2);
}

#[tokio::test]
async fn test_unreachable_registry_is_fatal() {
    let registry = MockRegistry::start().await;
    let config = live(registry.config(), 2);
    let client = registry.client(&config);
    drop(registry);

    let result = Cleanup::new(client, &config).run().await;
    assert!(matches!(
        result,
        Err(CleanupError::RegistryUnreachable { .. })
    ));
}

#[tokio::test]
async fn test_failed_probe_touches_no_repository() {
    let server = wiremock::MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v2/"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v2/_catalog"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let config = CleanupConfig::default()
        .with_registry_url(&server.uri())
        .unwrap();
    let result = Cleanup::from_config(&config).unwrap().run().await;
    assert!(result.is_err());
}

#[tokio::test]
async fn test_unresolvable_tags_are_skipped() {
    let registry = MockRegistry::start().await;
    registry.tags("app", &["v1.0.0", "ghost", "nightly"]).await;
    registry
        .image("app", "v1.0.0", D1, Some("2024-01-01T00:00:00Z"))
        .await;
    registry
        .image("app", "nightly", D3, Some("2024-09-01T00:00:00Z"))
        .await;
    // "ghost" has no manifest: HEAD answers 404
    registry.forbid_deletes().await;

    let config = live(registry.config(), 2);
    let stats = Cleanup::new(registry.client(&config), &config)
        .run()
        .await
        .unwrap();

    assert_eq!(stats.skipped_tags, 1);
    assert_eq!(stats.kept, 2);
    assert_eq!(stats.deleted, 0);
}

#[tokio::test]
async fn test_empty_repositories_contribute_nothing() {
    let registry = MockRegistry::start().await;
    registry.catalog(&["empty", "ghosts"]).await;
    registry.tags("empty", &[]).await;
    registry.tags("ghosts", &["a", "b"]).await;
    registry.forbid_deletes().await;

    let config = CleanupConfig {
        dry_run: false,
        ..registry.config()
    };
    let stats = Cleanup::new(registry.client(&config), &config)
        .run()
        .await
        .unwrap();

    assert_eq!(stats.repositories, 2);
    assert_eq!(stats.deleted, 0);
    assert_eq!(stats.kept, 0);
    assert_eq!(stats.skipped_tags, 2);
}

#[tokio::test]
async fn test_rejected_delete_is_counted_and_run_continues() {
    let registry = MockRegistry::start().await;
    registry.catalog(&["app", "web"]).await;
    mount_reference_app(&registry).await;
    registry.delete("app", D1, 500, 1).await;

    registry.tags("web", &["old", "new"]).await;
    registry
        .image("web", "old", D4, Some("2023-01-01T00:00:00Z"))
        .await;
    registry
        .image("web", "new", D3, Some("2024-01-01T00:00:00Z"))
        .await;
    registry.delete("web", D4, 202, 1).await;
    registry.forbid_deletes().await;

    let config = CleanupConfig {
        dry_run: false,
        ..registry.config()
    }
    .with_retention_count(1)
    .unwrap();
    let stats = Cleanup::new(registry.client(&config), &config)
        .run()
        .await
        .unwrap();

    // app: window keeps nightly (D3), top-up keeps v1.1.0 (D2), D1 rejected
    // web: no semver tags, keeps D3, deletes D4
    assert_eq!(stats.repositories, 2);
    assert_eq!(stats.failed, 1);
    assert_eq!(stats.deleted, 1);
    assert_eq!(stats.kept, 3);
}

#[tokio::test]
async fn test_untimed_tags_are_deleted_first() {
    let registry = MockRegistry::start().await;
    registry.tags("app", &["dated", "mystery"]).await;
    registry
        .image("app", "dated", D1, Some("2020-01-01T00:00:00Z"))
        .await;
    registry.image("app", "mystery", D2, None).await;
    registry.delete("app", D2, 202, 1).await;
    registry.forbid_deletes().await;

    let config = live(registry.config(), 1);
    let report = Cleanup::new(registry.client(&config), &config)
        .process_repository("app")
        .await;

    assert_eq!(report.kept[0].digest, digest(D1));
    assert_eq!(report.deleted[0].digest, digest(D2));
}

#[tokio::test]
async fn test_concurrency_does_not_change_outcome() {
    let registry = MockRegistry::start().await;
    mount_reference_app(&registry).await;

    let mut outcomes = Vec::new();
    for workers in [1, 8] {
        let config = CleanupConfig {
            dry_run: true,
            ..live(registry.config(), 2)
        }
        .with_concurrency(workers)
        .unwrap();

        let report = Cleanup::new(registry.client(&config), &config)
            .process_repository("app")
            .await;
        outcomes.push((report.kept, report.deleted));
    }

    assert_eq!(outcomes[0], outcomes[1]);
}
