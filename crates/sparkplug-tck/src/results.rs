//! Requirement outcomes and the insertion-ordered map that holds them.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Verdict {
    Pass,
    Fail,
    NotExecuted,
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Verdict::Pass => f.write_str("PASS"),
            Verdict::Fail => f.write_str("FAIL"),
            Verdict::NotExecuted => f.write_str("NOT EXECUTED"),
        }
    }
}

/// Verdict for one requirement plus an optional explanation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Outcome {
    pub verdict: Verdict,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl Outcome {
    #[must_use]
    pub fn pass() -> Self {
        Self {
            verdict: Verdict::Pass,
            detail: None,
        }
    }

    #[must_use]
    pub fn fail(detail: impl Into<String>) -> Self {
        Self {
            verdict: Verdict::Fail,
            detail: Some(detail.into()),
        }
    }

    #[must_use]
    pub fn not_executed() -> Self {
        Self {
            verdict: Verdict::NotExecuted,
            detail: None,
        }
    }

    /// `PASS` when `passed`, otherwise `FAIL` carrying the requirement text.
    #[must_use]
    pub fn check(passed: bool, requirement: &str) -> Self {
        if passed {
            Self::pass()
        } else {
            Self::fail(requirement)
        }
    }

    #[must_use]
    pub fn is_pass(&self) -> bool {
        self.verdict == Verdict::Pass
    }

    #[must_use]
    pub fn is_fail(&self) -> bool {
        self.verdict == Verdict::Fail
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.detail {
            Some(detail) => write!(f, "{} {detail}", self.verdict),
            None => write!(f, "{}", self.verdict),
        }
    }
}

/// Requirement id to outcome, kept in insertion order for readable reports.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResultSet {
    entries: IndexMap<String, Outcome>,
}

impl ResultSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records an outcome. A later write for the same id replaces the earlier
    /// one and the previous value is returned.
    pub fn record(&mut self, id: impl Into<String>, outcome: Outcome) -> Option<Outcome> {
        let id = id.into();
        let previous = self.entries.insert(id.clone(), outcome);
        if let Some(prev) = &previous {
            if prev.is_fail() && self.entries.get(&id).is_some_and(Outcome::is_pass) {
                warn!(requirement = %id, "FAIL outcome overwritten by PASS within one run");
            }
        }
        previous
    }

    /// Records `outcome` unless it would turn an existing `FAIL` into
    /// something else.
    pub fn record_sticky_fail(&mut self, id: &str, outcome: Outcome) {
        match self.entries.get(id) {
            Some(existing) if existing.is_fail() => {}
            _ => {
                self.entries.insert(id.to_string(), outcome);
            }
        }
    }

    #[must_use]
    pub fn get(&self, id: &str) -> Option<&Outcome> {
        self.entries.get(id)
    }

    #[must_use]
    pub fn verdict(&self, id: &str) -> Option<Verdict> {
        self.entries.get(id).map(|o| o.verdict)
    }

    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Outcome)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Copies every entry of `other` whose id is not yet present.
    pub fn merge_missing(&mut self, other: &ResultSet) {
        for (id, outcome) in &other.entries {
            if !self.entries.contains_key(id) {
                self.entries.insert(id.clone(), outcome.clone());
            }
        }
    }

    /// Adds `NOT EXECUTED` for every id in `ids` that was never recorded.
    pub fn fill_not_executed<I, S>(&mut self, ids: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for id in ids {
            let id = id.as_ref();
            if !self.entries.contains_key(id) {
                self.entries.insert(id.to_string(), Outcome::not_executed());
            }
        }
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

impl<'a> IntoIterator for &'a ResultSet {
    type Item = (&'a String, &'a Outcome);
    type IntoIter = indexmap::map::Iter<'a, String, Outcome>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

impl FromIterator<(String, Outcome)> for ResultSet {
    fn from_iter<T: IntoIterator<Item = (String, Outcome)>>(iter: T) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}
