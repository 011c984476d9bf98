//! Result aggregation across observers and across runs.

use crate::report::Overall;
use crate::results::{ResultSet, Verdict};
use parking_lot::Mutex;
use tracing::info;
use ulid::Ulid;

/// A completed run, kept for cross-run comparison.
#[derive(Debug, Clone)]
pub struct RunRecord {
    pub run_id: Ulid,
    pub scenario: String,
    pub overall: Overall,
    pub results: ResultSet,
}

#[derive(Debug, Default)]
struct AggregatorState {
    started: bool,
    history: Vec<RunRecord>,
}

#[derive(Debug, Default)]
pub struct ResultsAggregator {
    state: Mutex<AggregatorState>,
}

impl ResultsAggregator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Merges result sets given in precedence order: for a duplicate id the
    /// first set that defines it wins. Sources are only read.
    #[must_use]
    pub fn merge(sets: &[&ResultSet]) -> ResultSet {
        let mut merged = ResultSet::new();
        for set in sets {
            merged.merge_missing(set);
        }
        merged
    }

    /// Returns `false` if it was already running.
    pub fn start(&self) -> bool {
        let mut state = self.state.lock();
        if state.started {
            return false;
        }
        state.started = true;
        info!("results aggregator started");
        true
    }

    #[must_use]
    pub fn is_started(&self) -> bool {
        self.state.lock().started
    }

    /// Stores a copy of a finished run's final results.
    pub fn record_run(&self, scenario: &str, results: &ResultSet) -> RunRecord {
        let record = RunRecord {
            run_id: Ulid::new(),
            scenario: scenario.to_string(),
            overall: Overall::of(results),
            results: results.clone(),
        };
        info!(run_id = %record.run_id, scenario, overall = %record.overall, "run recorded");
        self.state.lock().history.push(record.clone());
        record
    }

    #[must_use]
    pub fn history(&self) -> Vec<RunRecord> {
        self.state.lock().history.clone()
    }

    #[must_use]
    pub fn last_run(&self) -> Option<RunRecord> {
        self.state.lock().history.last().cloned()
    }

    /// Verdicts recorded for `requirement_id` in every run that reported it,
    /// oldest first.
    #[must_use]
    pub fn verdict_history(&self, requirement_id: &str) -> Vec<(Ulid, Verdict)> {
        self.state
            .lock()
            .history
            .iter()
            .filter_map(|run| {
                run.results
                    .verdict(requirement_id)
                    .map(|verdict| (run.run_id, verdict))
            })
            .collect()
    }
}
