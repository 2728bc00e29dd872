use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Opaque identifier of a business rule (e.g. "EU customers", "wholesale").
///
/// Rule identifiers are UUID tokens. They are stored on entities inside
/// blacklist columns and carried by the request [`Context`](crate::Context)
/// when the rule is active.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RuleId(Uuid);

impl RuleId {
    /// Wrap an existing UUID.
    #[inline]
    #[must_use]
    pub const fn new(id: Uuid) -> Self {
        Self(id)
    }

    /// Generate a fresh random rule identifier.
    #[must_use]
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }

    /// The underlying UUID.
    #[inline]
    #[must_use]
    pub const fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl fmt::Display for RuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.hyphenated())
    }
}

impl From<Uuid> for RuleId {
    #[inline]
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

impl From<RuleId> for Uuid {
    #[inline]
    fn from(id: RuleId) -> Self {
        id.0
    }
}

/// Error returned when a string is not a valid rule identifier.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid rule identifier '{input}'")]
pub struct RuleIdParseError {
    input: String,
}

impl RuleIdParseError {
    /// The rejected input.
    #[must_use]
    pub fn input(&self) -> &str {
        &self.input
    }
}

impl FromStr for RuleId {
    type Err = RuleIdParseError;

    /// Accepts both the hyphenated and the simple (32 hex digits) form.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s.trim()).map(Self).map_err(|_| RuleIdParseError {
            input: s.to_owned(),
        })
    }
}

/// Unordered, duplicate-free set of rule identifiers.
///
/// An empty set means "no restriction": visibility filtering is skipped
/// entirely for contexts carrying it.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RuleSet {
    rules: BTreeSet<RuleId>,
}

impl RuleSet {
    /// Create an empty rule set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a rule; returns `false` if it was already present.
    pub fn insert(&mut self, rule: RuleId) -> bool {
        self.rules.insert(rule)
    }

    #[inline]
    #[must_use]
    pub fn contains(&self, rule: &RuleId) -> bool {
        self.rules.contains(rule)
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Iterate the rules in a stable (sorted) order.
    pub fn iter(&self) -> impl Iterator<Item = &RuleId> {
        self.rules.iter()
    }

    /// Returns `true` if at least one of `others` is a member of this set.
    ///
    /// This is the "any match" primitive used for blacklist evaluation: a
    /// single shared identifier is enough, regardless of how many differ.
    #[must_use]
    pub fn intersects<'a, I>(&self, others: I) -> bool
    where
        I: IntoIterator<Item = &'a RuleId>,
    {
        if self.rules.is_empty() {
            return false;
        }
        others.into_iter().any(|rule| self.rules.contains(rule))
    }
}

impl FromIterator<RuleId> for RuleSet {
    fn from_iter<T: IntoIterator<Item = RuleId>>(iter: T) -> Self {
        Self {
            rules: iter.into_iter().collect(),
        }
    }
}

impl Extend<RuleId> for RuleSet {
    fn extend<T: IntoIterator<Item = RuleId>>(&mut self, iter: T) {
        self.rules.extend(iter);
    }
}

impl<'a> IntoIterator for &'a RuleSet {
    type Item = &'a RuleId;
    type IntoIter = std::collections::btree_set::Iter<'a, RuleId>;

    fn into_iter(self) -> Self::IntoIter {
        self.rules.iter()
    }
}

impl IntoIterator for RuleSet {
    type Item = RuleId;
    type IntoIter = std::collections::btree_set::IntoIter<RuleId>;

    fn into_iter(self) -> Self::IntoIter {
        self.rules.into_iter()
    }
}
