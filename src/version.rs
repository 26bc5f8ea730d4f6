//! Registry version identifiers
//!
//! The registry reports versions either as JSON numbers or as strings. They are
//! treated as opaque tokens: no semver parsing, no coercion between the two
//! representations.
//!
//! Ordering:
//! - numbers compare numerically
//! - strings compare lexicographically (`"10" < "9"`)
//! - numbers sort before strings when a registry mixes both

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// A version token as returned by the "list versions" endpoint
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum VersionId {
    Number(i64),
    Text(String),
}

impl VersionId {
    /// Pick the greatest version, or `None` for an empty list
    pub fn max_of<I>(versions: I) -> Option<Self>
    where
        I: IntoIterator<Item = VersionId>,
    {
        versions.into_iter().max()
    }
}

impl fmt::Display for VersionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VersionId::Number(n) => write!(f, "{}", n),
            VersionId::Text(s) => write!(f, "{}", s),
        }
    }
}

impl From<&str> for VersionId {
    fn from(s: &str) -> Self {
        VersionId::Text(s.to_string())
    }
}

impl From<i64> for VersionId {
    fn from(n: i64) -> Self {
        VersionId::Number(n)
    }
}

impl PartialOrd for VersionId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for VersionId {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (VersionId::Number(a), VersionId::Number(b)) => a.cmp(b),
            (VersionId::Text(a), VersionId::Text(b)) => a.cmp(b),
            (VersionId::Number(_), VersionId::Text(_)) => Ordering::Less,
            (VersionId::Text(_), VersionId::Number(_)) => Ordering::Greater,
        }
    }
}

/// A subject paired with the version selected for it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubjectVersion {
    pub subject: String,
    pub version: VersionId,
}

impl fmt::Display for SubjectVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.subject, self.version)
    }
}
