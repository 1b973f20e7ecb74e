use crate::error::{Error, Result};
use crate::retention::is_semver_tag;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

/// Content-addressed identifier of a manifest or blob (e.g., "sha256:abc123...")
///
/// The registry deletes by digest, so this is the unit every retention
/// decision is made over.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContentDigest(String);

impl ContentDigest {
    /// Parse a digest string of the form `algorithm:encoded`
    pub fn parse(s: &str) -> Result<Self> {
        let s = s.trim();
        match s.split_once(':') {
            Some((algorithm, encoded))
                if !algorithm.is_empty()
                    && !encoded.is_empty()
                    && !encoded.contains(':')
                    && !s.contains(char::is_whitespace) =>
            {
                Ok(Self(s.to_string()))
            }
            _ => Err(Error::invalid_digest(s)),
        }
    }

    /// Algorithm part (e.g., "sha256")
    pub fn algorithm(&self) -> &str {
        self.0.split_once(':').map(|(a, _)| a).unwrap_or_default()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for ContentDigest {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for ContentDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Everything known about one tag of a repository at decision time
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagRecord {
    /// Tag name (e.g., "v1.2.0", "latest")
    pub name: String,
    /// Manifest digest the tag currently points at
    pub digest: ContentDigest,
    /// Authoritative creation time, if any source could provide one
    pub created_at: Option<DateTime<Utc>>,
    /// Whether the tag name is a semantic version
    pub is_semver: bool,
}

impl TagRecord {
    /// Create a record, classifying the tag name as semver or not
    pub fn new(
        name: impl Into<String>,
        digest: ContentDigest,
        created_at: Option<DateTime<Utc>>,
    ) -> Self {
        let name = name.into();
        let is_semver = is_semver_tag(&name);
        Self {
            name,
            digest,
            created_at,
            is_semver,
        }
    }
}

/// Mapping from digest to the tag names pointing at it
///
/// Every record handed to [`DigestGroups::from_records`] lands in exactly
/// one group.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DigestGroups(BTreeMap<ContentDigest, BTreeSet<String>>);

impl DigestGroups {
    pub fn from_records(records: &[TagRecord]) -> Self {
        let mut groups: BTreeMap<ContentDigest, BTreeSet<String>> = BTreeMap::new();
        for record in records {
            groups
                .entry(record.digest.clone())
                .or_default()
                .insert(record.name.clone());
        }
        Self(groups)
    }

    /// Tag names aliasing the given digest
    pub fn tags(&self, digest: &ContentDigest) -> Option<&BTreeSet<String>> {
        self.0.get(digest)
    }

    pub fn digests(&self) -> impl Iterator<Item = &ContentDigest> {
        self.0.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ContentDigest, &BTreeSet<String>)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
