//! Broker-wide traffic listener.
//!
//! Once started, the listener receives every publication matching its
//! subscription filter for the rest of the process. It captures them for
//! cross-checking and derives findings about topic and STATE payload shape.

use crate::config::TckConfig;
use crate::events::ClientPublishEvent;
use crate::requirements::{HOST_STATE_PAYLOAD, TOPIC_STRUCTURE_NAMESPACE};
use crate::results::{Outcome, ResultSet};
use crate::topic::topic_matches_filter;
use crate::types::QoS;
use bytes::Bytes;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;
use tracing::{debug, info};

const SPARKPLUG_NAMESPACE: &str = "spBv1.0";
const STATE_LEVEL: &str = "STATE";
const NODE_MESSAGE_TYPES: [&str; 4] = ["NBIRTH", "NDEATH", "NDATA", "NCMD"];
const DEVICE_MESSAGE_TYPES: [&str; 4] = ["DBIRTH", "DDEATH", "DDATA", "DCMD"];

/// A publication seen by the listener.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedMessage {
    pub client_id: Arc<str>,
    pub topic: Arc<str>,
    pub payload: Option<Bytes>,
    pub qos: QoS,
    pub retain: bool,
}

#[derive(Debug, Default)]
struct ListenerState {
    started: bool,
    captured: VecDeque<CapturedMessage>,
    results: ResultSet,
}

#[derive(Debug)]
pub struct TrafficListener {
    filter: String,
    state_root: String,
    max_captured: usize,
    state: Mutex<ListenerState>,
}

impl TrafficListener {
    #[must_use]
    pub fn new(config: &TckConfig) -> Self {
        Self {
            filter: config.listener_filter.clone(),
            state_root: config.state_root.clone(),
            max_captured: config.max_captured_messages,
            state: Mutex::new(ListenerState::default()),
        }
    }

    /// Subscribes the listener. Returns `false` if it was already running.
    pub fn start(&self) -> bool {
        let mut state = self.state.lock();
        if state.started {
            return false;
        }
        state.started = true;
        info!(filter = %self.filter, "traffic listener subscribed");
        true
    }

    #[must_use]
    pub fn is_started(&self) -> bool {
        self.state.lock().started
    }

    /// Delivery of one publication through the listener's subscription.
    pub fn on_message(&self, event: &ClientPublishEvent) {
        if !topic_matches_filter(&event.topic, &self.filter) {
            return;
        }
        let mut state = self.state.lock();
        if !state.started {
            return;
        }

        if self.max_captured > 0 && state.captured.len() >= self.max_captured {
            state.captured.pop_front();
        }
        state.captured.push_back(CapturedMessage {
            client_id: Arc::clone(&event.client_id),
            topic: Arc::clone(&event.topic),
            payload: event.payload.clone(),
            qos: event.qos,
            retain: event.retain,
        });

        if event.topic.split('/').next() == Some(SPARKPLUG_NAMESPACE) {
            let valid = is_valid_sparkplug_topic(&event.topic);
            debug!(topic = %event.topic, valid, "Check Req: {}", TOPIC_STRUCTURE_NAMESPACE.id);
            state.results.record_sticky_fail(
                TOPIC_STRUCTURE_NAMESPACE.id,
                Outcome::check(valid, TOPIC_STRUCTURE_NAMESPACE.text),
            );
        }

        if self.is_state_topic(&event.topic) {
            let valid = matches!(event.payload_str(), Some("ONLINE" | "OFFLINE"));
            debug!(topic = %event.topic, valid, "Check Req: {}", HOST_STATE_PAYLOAD.id);
            state.results.record_sticky_fail(
                HOST_STATE_PAYLOAD.id,
                Outcome::check(valid, HOST_STATE_PAYLOAD.text),
            );
        }
    }

    /// `{state_root}/{host_application_id}` with a single, non-empty host id level.
    fn is_state_topic(&self, topic: &str) -> bool {
        topic
            .strip_prefix(self.state_root.as_str())
            .and_then(|rest| rest.strip_prefix('/'))
            .is_some_and(|host_id| !host_id.is_empty() && !host_id.contains('/'))
    }

    #[cfg(test)]
    pub(crate) fn record_finding(&self, id: &str, outcome: Outcome) {
        self.state.lock().results.record_sticky_fail(id, outcome);
    }

    /// Snapshot of findings since the last clear.
    #[must_use]
    pub fn results(&self) -> ResultSet {
        self.state.lock().results.clone()
    }

    /// Drops findings and captured messages; the subscription stays active.
    pub fn clear_results(&self) {
        let mut state = self.state.lock();
        state.results.clear();
        state.captured.clear();
    }

    #[must_use]
    pub fn captured(&self) -> Vec<CapturedMessage> {
        self.state.lock().captured.iter().cloned().collect()
    }

    #[must_use]
    pub fn messages_on(&self, topic: &str) -> Vec<CapturedMessage> {
        self.state
            .lock()
            .captured
            .iter()
            .filter(|m| m.topic.as_ref() == topic)
            .cloned()
            .collect()
    }
}

/// `spBv1.0/group_id/message_type/edge_node_id[/device_id]`, or the
/// `spBv1.0/STATE/host_id` form used by host applications.
fn is_valid_sparkplug_topic(topic: &str) -> bool {
    let levels: Vec<&str> = topic.split('/').collect();
    if levels.iter().any(|l| l.is_empty()) {
        return false;
    }
    match levels.as_slice() {
        [SPARKPLUG_NAMESPACE, STATE_LEVEL, _host_id] => true,
        [SPARKPLUG_NAMESPACE, _group, msg_type, _edge] => NODE_MESSAGE_TYPES.contains(msg_type),
        [SPARKPLUG_NAMESPACE, _group, msg_type, _edge, _device] => {
            DEVICE_MESSAGE_TYPES.contains(msg_type)
        }
        _ => false,
    }
}
