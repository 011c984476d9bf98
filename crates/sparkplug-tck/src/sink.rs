//! Fire-and-forget output channels.
//!
//! Everything the harness emits (summary reports, audit log lines, operator
//! prompts) becomes a [`Publication`] handed to a [`ReportSink`]. The sink
//! never blocks and never reports delivery back, so scenario logic can run
//! inside a broker callback and be unit tested without any transport.

use crate::config::TckConfig;
use crate::report::SummaryReport;
use crate::results::ResultSet;
use crate::types::QoS;
use bytes::Bytes;
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info};

/// Logical output channel of a publication.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    Results,
    Log,
    Prompt,
}

/// A text message the host broker should publish on behalf of the harness.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Publication {
    pub channel: Channel,
    pub topic: String,
    pub payload: Bytes,
    pub qos: QoS,
    pub retain: bool,
}

impl Publication {
    #[must_use]
    pub fn text(channel: Channel, topic: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            channel,
            topic: topic.into(),
            payload: Bytes::from(text.into()),
            qos: QoS::AtLeastOnce,
            retain: false,
        }
    }

    #[must_use]
    pub fn payload_str(&self) -> &str {
        std::str::from_utf8(&self.payload).unwrap_or_default()
    }
}

pub trait ReportSink: Send + Sync {
    fn publish(&self, publication: Publication);
}

/// Forwards publications to an unbounded channel drained by the host broker.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<Publication>,
}

impl ChannelSink {
    #[must_use]
    pub fn new() -> (Self, mpsc::UnboundedReceiver<Publication>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl ReportSink for ChannelSink {
    fn publish(&self, publication: Publication) {
        if let Err(e) = self.tx.send(publication) {
            debug!(topic = %e.0.topic, "publication dropped, receiver closed");
        }
    }
}

/// Collects publications in memory for later assertion.
///
/// Thread-safe and clone-friendly; clones share the same buffer.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    publications: Arc<Mutex<Vec<Publication>>>,
}

impl MemorySink {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a snapshot of all publications.
    #[must_use]
    pub fn publications(&self) -> Vec<Publication> {
        self.publications.lock().clone()
    }

    /// Returns the payload text of every publication on `channel`, oldest first.
    #[must_use]
    pub fn texts(&self, channel: Channel) -> Vec<String> {
        self.publications
            .lock()
            .iter()
            .filter(|p| p.channel == channel)
            .map(|p| p.payload_str().to_string())
            .collect()
    }

    #[must_use]
    pub fn count(&self, channel: Channel) -> usize {
        self.publications
            .lock()
            .iter()
            .filter(|p| p.channel == channel)
            .count()
    }

    pub fn clear(&self) {
        self.publications.lock().clear();
    }
}

impl ReportSink for MemorySink {
    fn publish(&self, publication: Publication) {
        self.publications.lock().push(publication);
    }
}

/// The log/prompt/results capabilities handed to the controller and to every
/// scenario.
#[derive(Clone)]
pub struct Reporter {
    sink: Arc<dyn ReportSink>,
    results_topic: String,
    log_topic: String,
    prompt_topic: String,
}

impl std::fmt::Debug for Reporter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Reporter")
            .field("results_topic", &self.results_topic)
            .field("log_topic", &self.log_topic)
            .field("prompt_topic", &self.prompt_topic)
            .finish_non_exhaustive()
    }
}

impl Reporter {
    #[must_use]
    pub fn new(sink: Arc<dyn ReportSink>, config: &TckConfig) -> Self {
        Self {
            sink,
            results_topic: config.results_topic.clone(),
            log_topic: config.log_topic.clone(),
            prompt_topic: config.prompt_topic.clone(),
        }
    }

    pub fn log(&self, message: impl Into<String>) {
        let message = message.into();
        info!("TCK log {message}");
        self.sink
            .publish(Publication::text(Channel::Log, &self.log_topic, message));
    }

    pub fn prompt(&self, message: impl Into<String>) {
        self.sink.publish(Publication::text(
            Channel::Prompt,
            &self.prompt_topic,
            message,
        ));
    }

    /// Publishes raw text on the results channel.
    pub fn results(&self, text: impl Into<String>) {
        self.sink.publish(Publication::text(
            Channel::Results,
            &self.results_topic,
            text,
        ));
    }

    /// Formats `results` as a timestamped summary and publishes it.
    pub fn report_results(&self, scenario: &str, results: &ResultSet) {
        let report = SummaryReport::new(scenario, results.clone());
        info!(scenario, overall = %report.overall(), "Summary Test Results");
        self.results(report.generate_text());
    }
}
