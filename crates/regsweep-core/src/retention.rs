//! Retention engine
//!
//! Decides, for one repository, which manifest digests survive a cleanup run.
//! The decision is a pure function of the tag records: no I/O happens here.
//!
//! Deletion in a registry is by digest, so a digest is either kept with all of
//! its alias tags or deleted with all of them. A tag can never be removed
//! independently of the other tags sharing its digest.

use crate::types::{ContentDigest, DigestGroups, TagRecord};
use regex::Regex;
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::num::NonZeroUsize;
use std::sync::LazyLock;
use tracing::{debug, trace};

/// `v?MAJOR.MINOR.PATCH(-prerelease)?(+build)?`
static SEMVER_TAG_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^v?\d+\.\d+\.\d+(?:-[0-9A-Za-z_.-]+)?(?:\+[0-9A-Za-z_.-]+)?$")
        .expect("semver tag regex is valid")
});

/// Whether a tag name looks like a semantic version (e.g., "v1.2.3", "2.0.0-rc.1")
pub fn is_semver_tag(tag: &str) -> bool {
    SEMVER_TAG_RE.is_match(tag)
}

/// Keep/delete partition of a repository's digests
#[derive(Debug, Clone, Default, Serialize)]
pub struct RetentionDecision {
    pub keep: BTreeSet<ContentDigest>,
    pub delete: BTreeSet<ContentDigest>,
    /// Tag names per digest, for reporting what dies with each deletion
    pub groups: DigestGroups,
}

impl RetentionDecision {
    /// Tags that survive the run
    pub fn kept_tags(&self) -> BTreeSet<&str> {
        self.tags_of(&self.keep)
    }

    /// Tags lost when the delete set is executed
    pub fn deleted_tags(&self) -> BTreeSet<&str> {
        self.tags_of(&self.delete)
    }

    fn tags_of<'a>(&'a self, digests: &BTreeSet<ContentDigest>) -> BTreeSet<&'a str> {
        digests
            .iter()
            .filter_map(|d| self.groups.tags(d))
            .flat_map(|tags| tags.iter().map(String::as_str))
            .collect()
    }
}

/// Newest first; unknown timestamps last; ties by tag name
fn by_recency(a: &TagRecord, b: &TagRecord) -> Ordering {
    let time = match (&a.created_at, &b.created_at) {
        (Some(x), Some(y)) => y.cmp(x),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    };
    time.then_with(|| a.name.cmp(&b.name))
}

/// Partition the digests referenced by `records` into keep and delete sets
///
/// # Arguments
/// * `records` - Every resolvable tag of one repository
/// * `retention_count` - Number of distinct digests kept by recency
///
/// The newest `retention_count` digests are kept. If none of them carries a
/// semver tag, the newest semver-tagged digest outside that window is kept as
/// well, so a repository with any release tag always retains one.
pub fn decide(records: &[TagRecord], retention_count: NonZeroUsize) -> RetentionDecision {
    let groups = DigestGroups::from_records(records);

    let mut sorted: Vec<&TagRecord> = records.iter().collect();
    sorted.sort_by(|a, b| by_recency(a, b));

    let mut keep: BTreeSet<ContentDigest> = BTreeSet::new();
    for record in &sorted {
        if keep.len() >= retention_count.get() {
            break;
        }
        if keep.insert(record.digest.clone()) {
            trace!("Keeping {} ({}) by recency", record.name, record.digest);
        }
    }

    let semver_kept = records
        .iter()
        .any(|r| r.is_semver && keep.contains(&r.digest));

    if !semver_kept {
        match sorted
            .iter()
            .find(|r| r.is_semver && !keep.contains(&r.digest))
        {
            Some(record) => {
                debug!(
                    "No semver tag in retention window, also keeping {} ({})",
                    record.name, record.digest
                );
                keep.insert(record.digest.clone());
            }
            None => trace!("No semver tags present, nothing to top up"),
        }
    }

    let delete = groups
        .digests()
        .filter(|d| !keep.contains(*d))
        .cloned()
        .collect();

    RetentionDecision {
        keep,
        delete,
        groups,
    }
}
