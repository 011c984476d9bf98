//! The pluggable unit of conformance logic.
//!
//! A [`TestScenario`] receives the broker events the controller routes to
//! it, records outcomes for the requirements it owns, and tells the
//! controller when its run is over by returning [`ScenarioAction::EndTest`].
//! Scenarios are built by name through the [`ScenarioRegistry`].

pub mod host;
mod registry;

pub use registry::{ScenarioFactory, ScenarioRegistry};

use crate::config::TckConfig;
use crate::events::{
    ClientConnectEvent, ClientDisconnectEvent, ClientPublishEvent, ClientSubscribeEvent,
};
use crate::results::ResultSet;
use crate::sink::Reporter;
use std::sync::Arc;

/// What the controller should do after a scenario handled an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScenarioAction {
    #[default]
    Continue,
    /// Finalize and report the run now.
    EndTest,
}

/// Selects a scenario at load time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScenarioDescriptor {
    pub profile: String,
    pub name: String,
    pub params: Vec<String>,
}

impl ScenarioDescriptor {
    #[must_use]
    pub fn new(profile: impl Into<String>, name: impl Into<String>, params: Vec<String>) -> Self {
        Self {
            profile: profile.into(),
            name: name.into(),
            params,
        }
    }
}

/// Collaborators injected into every scenario.
#[derive(Debug, Clone)]
pub struct ScenarioContext {
    pub reporter: Reporter,
    pub config: Arc<TckConfig>,
}

impl ScenarioContext {
    /// Audit-log line, fire-and-forget.
    pub fn log(&self, message: impl Into<String>) {
        self.reporter.log(message);
    }

    /// Operator instruction, fire-and-forget.
    pub fn prompt(&self, message: impl Into<String>) {
        self.reporter.prompt(message);
    }
}

pub trait TestScenario: Send {
    /// Display name used in reports.
    fn name(&self) -> &str;

    /// Requirement ids this scenario is responsible for. Ids never recorded
    /// are reported as `NOT EXECUTED`.
    fn requirement_ids(&self) -> &[&'static str];

    fn on_connect(&mut self, _event: &ClientConnectEvent) -> ScenarioAction {
        ScenarioAction::Continue
    }

    fn on_disconnect(&mut self, _event: &ClientDisconnectEvent) -> ScenarioAction {
        ScenarioAction::Continue
    }

    fn on_subscribe(&mut self, _event: &ClientSubscribeEvent) -> ScenarioAction {
        ScenarioAction::Continue
    }

    fn on_publish(&mut self, _event: &ClientPublishEvent) -> ScenarioAction {
        ScenarioAction::Continue
    }

    /// Outcomes recorded so far in this run.
    fn results(&self) -> &ResultSet;

    /// Called exactly once per run with the observers' merged results.
    /// Publishes the summary report and returns the final result set.
    fn end_test(&mut self, carried: ResultSet) -> ResultSet;
}

/// Builds a scenario's final result set: its own entries first, then carried
/// entries for ids it did not record, then `NOT EXECUTED` for owned ids that
/// were never set.
#[must_use]
pub fn finalize_results(own: &ResultSet, carried: &ResultSet, owned_ids: &[&str]) -> ResultSet {
    let mut results = own.clone();
    results.merge_missing(carried);
    results.fill_not_executed(owned_ids);
    results
}
