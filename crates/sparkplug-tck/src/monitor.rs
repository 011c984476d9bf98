//! Always-on observer of client connection lifecycles.
//!
//! The monitor sees every connection event regardless of which scenario is
//! active. It keeps a process-lifetime table of client sessions, and a
//! per-run set of findings about requirements every Sparkplug client must
//! meet when it connects.

use crate::events::{
    AuthenticationSuccessEvent, ClientConnectEvent, ClientDisconnectEvent, ClientPublishEvent,
    ClientSubscribeEvent, ConnectionStartEvent,
};
use crate::requirements::{CLEAN_SESSION_311, CLEAN_SESSION_50};
use crate::results::{Outcome, ResultSet};
use crate::types::ProtocolVersion;
use parking_lot::Mutex;
use std::collections::HashMap;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Connecting,
    Authenticated,
    Connected,
    Disconnected,
}

#[derive(Debug, Clone)]
struct SessionFact {
    state: SessionState,
    protocol_version: ProtocolVersion,
}

#[derive(Debug, Default)]
struct MonitorState {
    sessions: HashMap<String, SessionFact>,
    results: ResultSet,
}

#[derive(Debug, Default)]
pub struct PassiveMonitor {
    state: Mutex<MonitorState>,
}

impl PassiveMonitor {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_connection_start(&self, event: &ConnectionStartEvent) {
        debug!(client_id = %event.client_id, "connection start");
        let mut state = self.state.lock();
        state.sessions.insert(
            event.client_id.to_string(),
            SessionFact {
                state: SessionState::Connecting,
                protocol_version: event.protocol_version,
            },
        );
    }

    pub fn on_authentication_success(&self, event: &AuthenticationSuccessEvent) {
        debug!(client_id = %event.client_id, "authentication successful");
        let mut state = self.state.lock();
        state
            .sessions
            .entry(event.client_id.to_string())
            .and_modify(|fact| fact.state = SessionState::Authenticated)
            .or_insert(SessionFact {
                state: SessionState::Authenticated,
                protocol_version: ProtocolVersion::default(),
            });
    }

    pub fn on_connect(&self, event: &ClientConnectEvent) {
        let mut state = self.state.lock();
        state.sessions.insert(
            event.client_id.to_string(),
            SessionFact {
                state: SessionState::Connected,
                protocol_version: event.protocol_version,
            },
        );

        match event.protocol_version {
            ProtocolVersion::V311 => {
                debug!(client_id = %event.client_id, clean_session = event.clean_start, "Check Req: {}", CLEAN_SESSION_311.id);
                state.results.record_sticky_fail(
                    CLEAN_SESSION_311.id,
                    Outcome::check(event.clean_start, CLEAN_SESSION_311.text),
                );
            }
            ProtocolVersion::V5 => {
                let passed = event.clean_start && event.session_expiry_interval == 0;
                debug!(
                    client_id = %event.client_id,
                    clean_start = event.clean_start,
                    session_expiry = event.session_expiry_interval,
                    "Check Req: {}", CLEAN_SESSION_50.id
                );
                state.results.record_sticky_fail(
                    CLEAN_SESSION_50.id,
                    Outcome::check(passed, CLEAN_SESSION_50.text),
                );
            }
        }
    }

    pub fn on_disconnect(&self, event: &ClientDisconnectEvent) {
        let mut state = self.state.lock();
        if let Some(fact) = state.sessions.get_mut(event.client_id.as_ref()) {
            fact.state = SessionState::Disconnected;
        }
    }

    pub fn on_subscribe(&self, event: &ClientSubscribeEvent) {
        debug!(
            client_id = %event.client_id,
            filters = event.subscriptions.len(),
            "subscribe observed"
        );
    }

    pub fn on_publish(&self, event: &ClientPublishEvent) {
        debug!(client_id = %event.client_id, topic = %event.topic, "publish observed");
    }

    /// Clears per-run findings; the session table is kept.
    pub fn start_test(&self) {
        self.state.lock().results.clear();
    }

    /// Clears per-run findings; the session table is kept.
    pub fn end_test(&self) {
        self.state.lock().results.clear();
    }

    #[cfg(test)]
    pub(crate) fn record_finding(&self, id: &str, outcome: Outcome) {
        self.state.lock().results.record_sticky_fail(id, outcome);
    }

    /// Snapshot of this run's findings.
    #[must_use]
    pub fn results(&self) -> ResultSet {
        self.state.lock().results.clone()
    }

    #[must_use]
    pub fn session_state(&self, client_id: &str) -> Option<SessionState> {
        self.state.lock().sessions.get(client_id).map(|f| f.state)
    }

    #[must_use]
    pub fn protocol_version(&self, client_id: &str) -> Option<ProtocolVersion> {
        self.state
            .lock()
            .sessions
            .get(client_id)
            .map(|f| f.protocol_version)
    }

    #[must_use]
    pub fn known_clients(&self) -> usize {
        self.state.lock().sessions.len()
    }
}
