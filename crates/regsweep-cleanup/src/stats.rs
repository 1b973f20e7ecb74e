use regsweep_core::{ContentDigest, RetentionDecision};
use serde::Serialize;

/// A digest together with the tag names that pointed at it
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DigestTags {
    pub digest: ContentDigest,
    pub tags: Vec<String>,
}

impl DigestTags {
    fn from_decision(decision: &RetentionDecision, digest: &ContentDigest) -> Self {
        Self {
            digest: digest.clone(),
            tags: decision
                .groups
                .tags(digest)
                .map(|tags| tags.iter().cloned().collect())
                .unwrap_or_default(),
        }
    }
}

/// Outcome of processing one repository
#[derive(Debug, Clone, Default, Serialize)]
pub struct RepositoryReport {
    pub repository: String,
    pub kept: Vec<DigestTags>,
    pub deleted: Vec<DigestTags>,
    /// Digests the registry refused to delete
    pub failed: Vec<DigestTags>,
    /// Tags whose digest could not be resolved
    pub skipped_tags: Vec<String>,
}

impl RepositoryReport {
    /// Report for a repository with nothing to decide on
    pub fn empty(repository: impl Into<String>, skipped_tags: Vec<String>) -> Self {
        Self {
            repository: repository.into(),
            skipped_tags,
            ..Self::default()
        }
    }

    /// Start a report from a decision, with every kept digest filled in
    pub fn from_decision(
        repository: impl Into<String>,
        decision: &RetentionDecision,
        skipped_tags: Vec<String>,
    ) -> Self {
        Self {
            repository: repository.into(),
            kept: decision
                .keep
                .iter()
                .map(|d| DigestTags::from_decision(decision, d))
                .collect(),
            skipped_tags,
            ..Self::default()
        }
    }

    /// Record the result of one delete call
    pub fn record_deletion(
        &mut self,
        decision: &RetentionDecision,
        digest: &ContentDigest,
        deleted: bool,
    ) {
        let entry = DigestTags::from_decision(decision, digest);
        if deleted {
            self.deleted.push(entry);
        } else {
            self.failed.push(entry);
        }
    }
}

/// Totals across every repository of a run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunStatistics {
    /// Digests deleted (or that would be, in dry-run)
    pub deleted: usize,
    /// Digests retained
    pub kept: usize,
    /// Digests whose deletion the registry rejected
    pub failed: usize,
    pub skipped_tags: usize,
    pub repositories: usize,
    pub dry_run: bool,
}

impl RunStatistics {
    pub fn new(dry_run: bool) -> Self {
        Self {
            dry_run,
            ..Self::default()
        }
    }

    /// Fold one repository's outcome into the totals
    pub fn record(&mut self, report: &RepositoryReport) {
        self.repositories += 1;
        self.deleted += report.deleted.len();
        self.kept += report.kept.len();
        self.failed += report.failed.len();
        self.skipped_tags += report.skipped_tags.len();
    }
}
