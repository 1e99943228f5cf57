//! BGP (large) community labels.
//!
//! A [CommunitySet] maps community tuples such as `65535:666` or
//! `9033:65666:1` to human readable labels. Sets start either empty or from
//! the well-known community table, and are extended with `tuple = label`
//! lines from configuration section bodies.
use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};

use lazy_static::lazy_static;
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use tracing::warn;

/// A community tuple, stored as its colon separated tokens.
///
/// Tokens are kept as strings: configuration may contain wildcards (`*`)
/// and ranges (`5-9`) in place of numbers.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Community(Vec<String>);

impl Community {
    pub fn new<S: AsRef<str>>(tokens: &[S]) -> Self {
        Community(tokens.iter().map(|t| t.as_ref().to_string()).collect())
    }

    pub fn tokens(&self) -> &[String] {
        &self.0
    }

    /// Check whether `values` matches this tuple, treating `*` tokens as wildcards.
    pub fn matches(&self, values: &[u32]) -> bool {
        self.0.len() == values.len()
            && self
                .0
                .iter()
                .zip(values)
                .all(|(token, value)| token == "*" || token.parse::<u32>() == Ok(*value))
    }
}

impl From<&str> for Community {
    fn from(value: &str) -> Self {
        Community(value.split(':').map(|t| t.trim().to_string()).collect())
    }
}

impl Display for Community {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.join(":"))
    }
}

/// Mapping from community tuples to labels.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommunitySet {
    labels: BTreeMap<Community, String>,
}

lazy_static! {
    static ref WELL_KNOWN_COMMUNITIES: Vec<(&'static str, &'static str)> = vec![
        ("65535:0", "graceful shutdown"),
        ("65535:1", "accept own"),
        ("65535:666", "blackhole"),
        ("65535:65281", "no export"),
        ("65535:65282", "no advertise"),
        ("65535:65283", "no export subconfed"),
        ("65535:65284", "no peer"),
    ];
}

impl CommunitySet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a set pre-populated with the well-known communities
    /// (RFC 1997, RFC 7999, RFC 8326 and friends).
    pub fn well_known() -> Self {
        let mut set = CommunitySet::new();
        for (community, label) in WELL_KNOWN_COMMUNITIES.iter() {
            set.set(*community, *label);
        }
        set
    }

    /// Insert or replace the label of a community.
    pub fn set<C: Into<Community>, S: ToString>(&mut self, community: C, label: S) {
        self.labels.insert(community.into(), label.to_string());
    }

    /// Exact lookup of a community tuple.
    pub fn get(&self, community: &Community) -> Option<&str> {
        self.labels.get(community).map(|l| l.as_str())
    }

    /// Find the label for a numeric community, trying an exact match before
    /// wildcard entries.
    pub fn lookup(&self, values: &[u32]) -> Option<&str> {
        let exact = Community(values.iter().map(|v| v.to_string()).collect());
        if let Some(label) = self.get(&exact) {
            return Some(label);
        }
        self.labels
            .iter()
            .find(|(community, _)| community.matches(values))
            .map(|(_, label)| label.as_str())
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Community, &str)> {
        self.labels.iter().map(|(c, l)| (c, l.as_str()))
    }

    /// Merge `tuple = label` lines from a raw section body into this set.
    ///
    /// Existing entries are only ever replaced or extended. Lines without a
    /// `=` are skipped with a warning.
    pub fn merge_from_body(mut self, body: &str) -> Self {
        for line in body.lines() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            match line.split_once('=') {
                Some((community, label)) => {
                    self.set(community.trim(), label.trim());
                }
                None => {
                    warn!("skipping malformed BGP community: {}", line);
                }
            }
        }
        self
    }
}

impl Serialize for CommunitySet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.labels.len()))?;
        for (community, label) in &self.labels {
            map.serialize_entry(&community.to_string(), label)?;
        }
        map.end()
    }
}
