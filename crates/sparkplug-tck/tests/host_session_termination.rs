mod common;

use common::{
    controller, death_message, last_report, report_entry, start_session_termination,
    HOST_CLIENT_ID,
};
use sparkplug_tck::requirements::{
    HOST_DEATH_PAYLOAD, HOST_DEATH_PAYLOAD_PRESENT, HOST_DEATH_QOS, HOST_DEATH_RETAINED,
    HOST_DEATH_TOPIC, HOST_DISCONNECT_INTENTIONAL,
};
use sparkplug_tck::{Channel, ClientDisconnectEvent, ClientPublishEvent, QoS, Verdict};

const DEATH_CHECKS: [&str; 5] = [
    HOST_DEATH_TOPIC.id,
    HOST_DEATH_PAYLOAD_PRESENT.id,
    HOST_DEATH_PAYLOAD.id,
    HOST_DEATH_QOS.id,
    HOST_DEATH_RETAINED.id,
];

// ---------------------------------------------------------------------------
// Group 1: Death message followed by disconnect
// ---------------------------------------------------------------------------

/// A retained QoS 1 `OFFLINE` on `STATE/Host1` followed by the host's
/// disconnect passes every requirement and ends the run by itself.
#[test]
fn death_message_then_disconnect_passes_and_self_terminates() {
    let (controller, sink) = controller();
    start_session_termination(&controller);

    controller.on_publish(&death_message("OFFLINE"));
    assert!(controller.is_active(), "publish alone must not end the run");

    controller.on_disconnect(&ClientDisconnectEvent::normal(HOST_CLIENT_ID));
    assert!(!controller.is_active(), "host disconnect must end the run");

    let report = last_report(&sink);
    for id in DEATH_CHECKS {
        assert_eq!(report_entry(&report, id).as_deref(), Some("PASS"), "{id}");
    }
    assert_eq!(
        report_entry(&report, HOST_DISCONNECT_INTENTIONAL.id).as_deref(),
        Some("PASS")
    );
    assert!(report.contains("OVERALL: PASS;"));

    let run = controller.aggregator().last_run().expect("run recorded");
    assert_eq!(
        run.results.verdict(HOST_DISCONNECT_INTENTIONAL.id),
        Some(Verdict::Pass)
    );
}

/// An `ONLINE` payload fails only the payload value check; every other
/// death message check is evaluated on its own.
#[test]
fn wrong_payload_fails_value_check_and_disconnect() {
    let (controller, sink) = controller();
    start_session_termination(&controller);

    controller.on_publish(&death_message("ONLINE"));
    controller.on_disconnect(&ClientDisconnectEvent::normal(HOST_CLIENT_ID));

    let run = controller.aggregator().last_run().expect("run recorded");
    let results = run.results;
    assert_eq!(results.verdict(HOST_DEATH_PAYLOAD.id), Some(Verdict::Fail));
    assert_eq!(results.verdict(HOST_DEATH_TOPIC.id), Some(Verdict::Pass));
    assert_eq!(results.verdict(HOST_DEATH_QOS.id), Some(Verdict::Pass));
    assert_eq!(results.verdict(HOST_DEATH_RETAINED.id), Some(Verdict::Pass));
    assert_eq!(
        results.verdict(HOST_DEATH_PAYLOAD_PRESENT.id),
        Some(Verdict::Pass)
    );
    assert_eq!(
        results.verdict(HOST_DISCONNECT_INTENTIONAL.id),
        Some(Verdict::Fail)
    );

    let report = last_report(&sink);
    assert_eq!(
        report_entry(&report, HOST_DEATH_PAYLOAD.id),
        Some(format!("FAIL {}", HOST_DEATH_PAYLOAD.text))
    );
    assert!(report.contains("OVERALL: FAIL;"));
}

/// A later valid death message recovers the state machine; the latest
/// evaluation of each check is what gets reported.
#[test]
fn later_valid_death_message_is_accepted() {
    let (controller, _sink) = controller();
    start_session_termination(&controller);

    controller.on_publish(&death_message("ONLINE"));
    controller.on_publish(&death_message("OFFLINE"));
    controller.on_disconnect(&ClientDisconnectEvent::normal(HOST_CLIENT_ID));

    let results = controller.aggregator().last_run().unwrap().results;
    assert_eq!(results.verdict(HOST_DEATH_PAYLOAD.id), Some(Verdict::Pass));
    assert_eq!(
        results.verdict(HOST_DISCONNECT_INTENTIONAL.id),
        Some(Verdict::Pass)
    );
}

// ---------------------------------------------------------------------------
// Group 2: Isolation from other clients
// ---------------------------------------------------------------------------

/// Events from any client other than the configured host client never
/// change the scenario's state or results.
#[test]
fn other_clients_do_not_affect_the_run() {
    let (controller, sink) = controller();
    start_session_termination(&controller);

    controller.on_publish(
        &ClientPublishEvent::new("Impostor", "STATE/Host1", "OFFLINE")
            .with_qos(QoS::AtLeastOnce)
            .with_retain(true),
    );
    controller.on_disconnect(&ClientDisconnectEvent::normal("Impostor"));
    assert!(controller.is_active(), "foreign disconnect must not end the run");

    let results = controller.end_test().expect("scenario was active");
    for id in DEATH_CHECKS {
        assert_eq!(results.verdict(id), Some(Verdict::NotExecuted), "{id}");
    }
    assert_eq!(
        results.verdict(HOST_DISCONNECT_INTENTIONAL.id),
        Some(Verdict::NotExecuted)
    );
    assert_eq!(sink.count(Channel::Results), 1);
}

/// A host client that never disconnects keeps the run open until an
/// explicit end request.
#[test]
fn run_without_host_disconnect_stays_open() {
    let (controller, sink) = controller();
    start_session_termination(&controller);

    controller.on_publish(&death_message("OFFLINE"));
    assert!(controller.is_active());
    assert_eq!(sink.count(Channel::Results), 0);

    let results = controller.end_test().unwrap();
    assert_eq!(results.verdict(HOST_DEATH_PAYLOAD.id), Some(Verdict::Pass));
    assert_eq!(
        results.verdict(HOST_DISCONNECT_INTENTIONAL.id),
        Some(Verdict::NotExecuted)
    );
}
