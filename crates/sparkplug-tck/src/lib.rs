//! Sparkplug conformance harness.
//!
//! Observes every event a broker reports (connect, disconnect, subscribe,
//! publish), routes them to the single active conformance scenario plus the
//! always-on observers, and aggregates requirement outcomes into a summary
//! report published on the results channel.
//!
//! The entry point is [`TestController`]. Scenarios implement
//! [`TestScenario`] and are selected by name through a [`ScenarioRegistry`].
//! All output goes through a [`ReportSink`], so the whole harness runs
//! without a broker in tests.

#![warn(clippy::pedantic)]
#![allow(clippy::missing_errors_doc)]

pub mod aggregator;
pub mod config;
pub mod control;
pub mod controller;
pub mod error;
pub mod events;
pub mod listener;
pub mod monitor;
pub mod report;
pub mod requirements;
pub mod results;
pub mod scenario;
pub mod sink;
pub mod topic;
pub mod types;

pub use aggregator::{ResultsAggregator, RunRecord};
pub use config::TckConfig;
pub use control::ControlCommand;
pub use controller::TestController;
pub use error::{Result, TckError};
pub use events::{
    AuthenticationSuccessEvent, BrokerEventHandler, ClientConnectEvent, ClientDisconnectEvent,
    ClientPublishEvent, ClientSubscribeEvent, ConnectionStartEvent, SubscriptionInfo, WillInfo,
};
pub use listener::{CapturedMessage, TrafficListener};
pub use monitor::{PassiveMonitor, SessionState};
pub use report::{Overall, SummaryReport};
pub use results::{Outcome, ResultSet, Verdict};
pub use scenario::{
    ScenarioAction, ScenarioContext, ScenarioDescriptor, ScenarioRegistry, TestScenario,
};
pub use sink::{Channel, ChannelSink, MemorySink, Publication, ReportSink, Reporter};
pub use types::{ProtocolVersion, QoS};
