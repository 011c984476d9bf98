//! Summary report generation.
//!
//! Turns a scenario's final [`ResultSet`] into the timestamped text published
//! on the results channel, and into JSON for machine consumers.

use crate::results::{ResultSet, Verdict};
use serde::Serialize;
use std::fmt::{self, Write};
use time::macros::format_description;
use time::OffsetDateTime;

/// Published when a scenario could not be loaded, so a waiting operator
/// still gets a completion record.
pub const NOT_EXECUTED_SUMMARY: &str = "OVERALL: NOT EXECUTED";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Overall {
    Pass,
    Fail,
    NotExecuted,
}

impl Overall {
    /// Any `FAIL` fails the run. Otherwise the run passes only when every
    /// entry passed; a single `NOT EXECUTED` entry, or an empty set, leaves
    /// the run `NOT EXECUTED`.
    #[must_use]
    pub fn of(results: &ResultSet) -> Self {
        let mut overall = if results.is_empty() {
            Overall::NotExecuted
        } else {
            Overall::Pass
        };
        for (_, outcome) in results.iter() {
            match outcome.verdict {
                Verdict::Fail => return Overall::Fail,
                Verdict::NotExecuted => overall = Overall::NotExecuted,
                Verdict::Pass => {}
            }
        }
        overall
    }
}

impl fmt::Display for Overall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Overall::Pass => f.write_str("PASS"),
            Overall::Fail => f.write_str("FAIL"),
            Overall::NotExecuted => f.write_str("NOT EXECUTED"),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SummaryReport {
    scenario: String,
    timestamp: String,
    overall: Overall,
    results: ResultSet,
}

impl SummaryReport {
    #[must_use]
    pub fn new(scenario: impl Into<String>, results: ResultSet) -> Self {
        Self::with_timestamp(scenario, results, OffsetDateTime::now_utc())
    }

    #[must_use]
    pub fn with_timestamp(
        scenario: impl Into<String>,
        results: ResultSet,
        timestamp: OffsetDateTime,
    ) -> Self {
        let format =
            format_description!("[year]-[month]-[day] [hour]:[minute]:[second].[subsecond digits:3]");
        let timestamp = timestamp
            .format(format)
            .unwrap_or_else(|_| timestamp.unix_timestamp().to_string());
        Self {
            scenario: scenario.into(),
            overall: Overall::of(&results),
            timestamp,
            results,
        }
    }

    #[must_use]
    pub fn overall(&self) -> Overall {
        self.overall
    }

    #[must_use]
    pub fn results(&self) -> &ResultSet {
        &self.results
    }

    /// One line per requirement, followed by the overall verdict.
    #[must_use]
    pub fn generate_text(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(
            out,
            "{} Summary Test Results for {}",
            self.timestamp, self.scenario
        );
        for (id, outcome) in self.results.iter() {
            let _ = writeln!(out, "{id}: {outcome};");
        }
        let _ = writeln!(out, "OVERALL: {};", self.overall);
        out
    }

    pub fn generate_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
