#![allow(dead_code)]

use sparkplug_tck::{
    Channel, ClientPublishEvent, MemorySink, QoS, ScenarioRegistry, TckConfig, TestController,
};
use std::sync::Arc;

pub const HOST_APP_ID: &str = "Host1";
pub const HOST_CLIENT_ID: &str = "HostClient1";

pub fn controller() -> (TestController, MemorySink) {
    controller_with_registry(ScenarioRegistry::builtin())
}

pub fn controller_with_registry(registry: ScenarioRegistry) -> (TestController, MemorySink) {
    let sink = MemorySink::new();
    let controller =
        TestController::with_registry(TckConfig::default(), Arc::new(sink.clone()), registry)
            .expect("default configuration is valid");
    (controller, sink)
}

pub fn host_params() -> Vec<String> {
    vec![HOST_APP_ID.to_string(), HOST_CLIENT_ID.to_string()]
}

pub fn start_session_termination(controller: &TestController) {
    controller
        .start_test("host", "SessionTerminationTest", &host_params())
        .expect("session termination test should load");
}

pub fn death_message(payload: &str) -> ClientPublishEvent {
    ClientPublishEvent::new(HOST_CLIENT_ID, "STATE/Host1", payload.to_string())
        .with_qos(QoS::AtLeastOnce)
        .with_retain(true)
}

/// The verdict text recorded for `id` in a published summary report.
pub fn report_entry(report: &str, id: &str) -> Option<String> {
    let prefix = format!("{id}: ");
    report
        .lines()
        .find_map(|line| line.strip_prefix(&prefix))
        .map(|rest| rest.trim_end_matches(';').to_string())
}

pub fn last_report(sink: &MemorySink) -> String {
    sink.texts(Channel::Results)
        .pop()
        .expect("a report should have been published")
}
