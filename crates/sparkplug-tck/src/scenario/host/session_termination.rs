//! Primary host application session termination.
//!
//! The host application id is known up front, but Sparkplug places no
//! requirement on the MQTT client id, so it is supplied as a parameter. The
//! run only tracks that one client: a deployment where several host
//! applications connect concurrently is not distinguished.

use crate::error::{Result, TckError};
use crate::events::{ClientDisconnectEvent, ClientPublishEvent};
use crate::requirements::{
    HOST_DEATH_PAYLOAD, HOST_DEATH_PAYLOAD_PRESENT, HOST_DEATH_QOS, HOST_DEATH_RETAINED,
    HOST_DEATH_TOPIC, HOST_DISCONNECT_INTENTIONAL,
};
use crate::results::{Outcome, ResultSet};
use crate::scenario::{finalize_results, ScenarioAction, ScenarioContext, TestScenario};
use crate::types::QoS;
use tracing::{debug, error, info};

const NAME: &str = "Host SessionTermination";
const DEATH_PAYLOAD: &str = "OFFLINE";

const REQUIREMENT_IDS: [&str; 6] = [
    HOST_DISCONNECT_INTENTIONAL.id,
    HOST_DEATH_TOPIC.id,
    HOST_DEATH_PAYLOAD_PRESENT.id,
    HOST_DEATH_PAYLOAD.id,
    HOST_DEATH_QOS.id,
    HOST_DEATH_RETAINED.id,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TestState {
    None,
    DeathMessageReceived,
}

#[derive(Debug)]
pub struct SessionTerminationTest {
    ctx: ScenarioContext,
    host_application_id: String,
    host_client_id: String,
    state_topic: String,
    state: TestState,
    results: ResultSet,
}

impl SessionTerminationTest {
    /// Expects exactly `[host_application_id, host_client_id]`.
    pub fn new(ctx: ScenarioContext, params: &[String]) -> Result<Self> {
        info!("Primary host {NAME}: Parameters: {params:?}");

        let [host_application_id, host_client_id] = params else {
            let reason =
                "Parameters to host session termination test must be: hostApplicationId hostClientId";
            error!("{reason}");
            ctx.prompt(reason);
            return Err(TckError::InvalidParameters {
                scenario: NAME.to_string(),
                reason: format!("{reason} (got {} parameters)", params.len()),
            });
        };

        info!(
            host_application_id = %host_application_id,
            host_client_id = %host_client_id,
            "session termination parameters"
        );

        let state_topic = ctx.config.state_topic(host_application_id);
        Ok(Self {
            host_application_id: host_application_id.clone(),
            host_client_id: host_client_id.clone(),
            state_topic,
            state: TestState::None,
            results: ResultSet::new(),
            ctx,
        })
    }

    #[must_use]
    pub fn host_application_id(&self) -> &str {
        &self.host_application_id
    }

    #[must_use]
    pub fn death_message_received(&self) -> bool {
        self.state == TestState::DeathMessageReceived
    }

    /// Records all five death message checks and returns whether every one
    /// held. No check short-circuits another.
    fn check_death_message(&mut self, event: &ClientPublishEvent) -> bool {
        debug!(topic = %event.topic, state = ?self.state, "{NAME} checkDeathMessage");

        let is_state_topic = *event.topic == *self.state_topic;
        let payload_present = event.payload.is_some();
        let payload_is_offline = event.payload_str() == Some(DEATH_PAYLOAD);
        let is_qos1 = event.qos == QoS::AtLeastOnce;
        let is_retained = event.retain;

        let checks = [
            (HOST_DEATH_TOPIC, is_state_topic),
            (HOST_DEATH_PAYLOAD_PRESENT, payload_present),
            (HOST_DEATH_PAYLOAD, payload_is_offline),
            (HOST_DEATH_QOS, is_qos1),
            (HOST_DEATH_RETAINED, is_retained),
        ];
        for (requirement, passed) in checks {
            debug!("Check Req: {}:{}.", requirement.id, requirement.text);
            self.results
                .record(requirement.id, Outcome::check(passed, requirement.text));
        }

        checks.iter().all(|(_, passed)| *passed)
    }
}

impl TestScenario for SessionTerminationTest {
    fn name(&self) -> &str {
        NAME
    }

    fn requirement_ids(&self) -> &[&'static str] {
        &REQUIREMENT_IDS
    }

    fn on_disconnect(&mut self, event: &ClientDisconnectEvent) -> ScenarioAction {
        info!(client_id = %event.client_id, state = ?self.state, "Host - {NAME} test - DISCONNECT");

        if *event.client_id != *self.host_client_id {
            return ScenarioAction::Continue;
        }

        debug!(
            "Check Req: {}:{}.",
            HOST_DISCONNECT_INTENTIONAL.id, HOST_DISCONNECT_INTENTIONAL.text
        );
        self.results.record(
            HOST_DISCONNECT_INTENTIONAL.id,
            Outcome::check(
                self.state == TestState::DeathMessageReceived,
                HOST_DISCONNECT_INTENTIONAL.text,
            ),
        );
        ScenarioAction::EndTest
    }

    fn on_publish(&mut self, event: &ClientPublishEvent) -> ScenarioAction {
        info!(topic = %event.topic, client_id = %event.client_id, "{NAME} test - PUBLISH");

        if *event.client_id == *self.host_client_id && self.check_death_message(event) {
            self.state = TestState::DeathMessageReceived;
            self.ctx
                .log(format!("{NAME}: death message received on {}", event.topic));
        }
        ScenarioAction::Continue
    }

    fn results(&self) -> &ResultSet {
        &self.results
    }

    fn end_test(&mut self, carried: ResultSet) -> ResultSet {
        let results = finalize_results(&self.results, &carried, &REQUIREMENT_IDS);
        self.ctx.reporter.report_results(NAME, &results);
        results
    }
}
