use crate::error::CleanupError;
use crate::stats::{RepositoryReport, RunStatistics};
use futures::stream::{FuturesUnordered, StreamExt};
use regsweep_core::{decide, CleanupConfig, TagRecord};
use regsweep_image::{RegistryClient, TimestampResolver};
use std::collections::BTreeSet;
use std::num::NonZeroUsize;
use tokio::sync::Semaphore;
use tracing::{debug, info, warn};

/// One cleanup run over a registry
pub struct Cleanup {
    client: RegistryClient,
    retention_count: NonZeroUsize,
    /// Tags whose metadata is fetched concurrently
    concurrency: NonZeroUsize,
    delete_untagged: bool,
}

impl Cleanup {
    /// Create a run around an existing client
    pub fn new(client: RegistryClient, config: &CleanupConfig) -> Self {
        Self {
            client,
            retention_count: config.retention_count,
            concurrency: config.concurrency,
            delete_untagged: config.delete_untagged,
        }
    }

    /// Build the registry client from configuration and wrap it
    pub fn from_config(config: &CleanupConfig) -> Result<Self, CleanupError> {
        let client = RegistryClient::from_config(config)?;
        Ok(Self::new(client, config))
    }

    pub fn client(&self) -> &RegistryClient {
        &self.client
    }

    /// Run the cleanup over every repository
    ///
    /// Fails only when the registry API is unreachable at the start; every
    /// later failure is logged and absorbed into the statistics.
    pub async fn run(&self) -> Result<RunStatistics, CleanupError> {
        if !self.client.probe().await {
            return Err(CleanupError::registry_unreachable(self.client.base_url()));
        }

        if self.client.is_dry_run() {
            info!("Dry run: no manifests will be deleted");
        }
        if self.delete_untagged {
            info!("delete-untagged is set but not supported yet, ignoring");
        }

        let repositories = self.client.list_repositories().await;
        info!("Processing {} repositories", repositories.len());

        let mut stats = RunStatistics::new(self.client.is_dry_run());
        for repository in &repositories {
            let report = self.process_repository(repository).await;
            stats.record(&report);
        }

        info!(
            "Cleanup finished: {} deleted, {} kept, {} failed",
            stats.deleted, stats.kept, stats.failed
        );
        Ok(stats)
    }

    /// Decide on and clean one repository
    ///
    /// All tag metadata is collected before the decision is made, and no
    /// deletion starts before the decision.
    pub async fn process_repository(&self, repository: &str) -> RepositoryReport {
        info!("Processing repository {}", repository);

        let tags = self.client.list_tags(repository).await;
        if tags.is_empty() {
            info!("{}: no tags", repository);
            return RepositoryReport::empty(repository, Vec::new());
        }

        let (records, skipped) = self.collect_records(repository, tags).await;
        if records.is_empty() {
            info!("{}: no resolvable tags", repository);
            return RepositoryReport::empty(repository, skipped);
        }

        let decision = decide(&records, self.retention_count);
        info!(
            "{}: keeping {} digests, deleting {}",
            repository,
            decision.keep.len(),
            decision.delete.len()
        );
        for digest in &decision.keep {
            debug!(
                "{}: keep {} ({})",
                repository,
                digest,
                join_tags(decision.groups.tags(digest))
            );
        }

        let mut report = RepositoryReport::from_decision(repository, &decision, skipped);
        for digest in &decision.delete {
            // Every alias of the digest goes with it
            info!(
                "{}: deleting {} ({})",
                repository,
                digest,
                join_tags(decision.groups.tags(digest))
            );
            let deleted = self.client.delete_manifest(repository, digest).await;
            report.record_deletion(&decision, digest, deleted);
        }

        report
    }

    /// Resolve digest and creation time for every tag, `concurrency` at a time
    ///
    /// Returns the records in tag-name order, plus the tags that were skipped
    /// because their digest could not be resolved.
    async fn collect_records(
        &self,
        repository: &str,
        tags: Vec<String>,
    ) -> (Vec<TagRecord>, Vec<String>) {
        let semaphore = Semaphore::new(self.concurrency.get());
        let resolver = TimestampResolver::new(&self.client);

        let semaphore = &semaphore;
        let resolver = &resolver;
        let client = &self.client;

        let mut futures = FuturesUnordered::new();
        for tag in tags {
            futures.push(async move {
                let _permit = semaphore.acquire().await.ok();

                match client.head_digest(repository, &tag).await {
                    Some(digest) => {
                        let created = resolver.resolve(repository, &tag, &digest).await;
                        Ok(TagRecord::new(tag, digest, created))
                    }
                    None => Err(tag),
                }
            });
        }

        let mut records = Vec::new();
        let mut skipped = Vec::new();
        while let Some(result) = futures.next().await {
            match result {
                Ok(record) => records.push(record),
                Err(tag) => {
                    warn!("{}:{} has no resolvable digest, skipping", repository, tag);
                    skipped.push(tag);
                }
            }
        }

        records.sort_by(|a, b| a.name.cmp(&b.name));
        skipped.sort();
        (records, skipped)
    }
}

fn join_tags(tags: Option<&BTreeSet<String>>) -> String {
    tags.map(|t| t.iter().map(String::as_str).collect::<Vec<_>>().join(", "))
        .unwrap_or_default()
}
