mod common;

use common::{
    controller, controller_with_registry, death_message, host_params, last_report,
    report_entry, start_session_termination, HOST_CLIENT_ID,
};
use sparkplug_tck::report::{Overall, NOT_EXECUTED_SUMMARY};
use sparkplug_tck::requirements::{
    CLEAN_SESSION_311, CLEAN_SESSION_50, HOST_DEATH_PAYLOAD, HOST_DISCONNECT_INTENTIONAL,
    HOST_STATE_PAYLOAD, TOPIC_STRUCTURE_NAMESPACE,
};
use sparkplug_tck::{
    Channel, ClientConnectEvent, ClientDisconnectEvent, ClientPublishEvent, Outcome,
    ProtocolVersion, ResultSet, ScenarioAction, ScenarioRegistry, TckError,
    TestScenario, Verdict,
};
use std::sync::Arc;
use std::thread;

// ---------------------------------------------------------------------------
// Group 1: Run lifecycle
// ---------------------------------------------------------------------------

/// Ending a run that saw no events reports every owned requirement as
/// `NOT EXECUTED`.
#[test]
fn start_then_end_reports_every_owned_id() {
    let (controller, sink) = controller();
    start_session_termination(&controller);
    assert_eq!(
        controller.active_scenario().as_deref(),
        Some("Host SessionTermination")
    );

    let results = controller.end_test().expect("scenario was active");
    assert_eq!(results.len(), 6);
    assert!(results.iter().all(|(_, o)| o.verdict == Verdict::NotExecuted));

    let report = last_report(&sink);
    assert!(report.contains("Summary Test Results for Host SessionTermination"));
    assert_eq!(
        report_entry(&report, HOST_DISCONNECT_INTENTIONAL.id).as_deref(),
        Some("NOT EXECUTED")
    );
    assert!(report.contains("OVERALL: NOT EXECUTED;"));
    assert!(!controller.is_active());
}

/// A carried observer PASS does not lift a run whose own requirements
/// never executed.
#[test]
fn observer_pass_does_not_hide_unexecuted_requirements() {
    let (controller, sink) = controller();
    start_session_termination(&controller);
    controller.on_connect(&ClientConnectEvent::new("Bystander").with_clean_start(true));

    let results = controller.end_test().unwrap();
    assert_eq!(results.verdict(CLEAN_SESSION_50.id), Some(Verdict::Pass));

    let report = last_report(&sink);
    assert_eq!(report_entry(&report, CLEAN_SESSION_50.id).as_deref(), Some("PASS"));
    assert!(!report.contains("OVERALL: PASS;"), "unexpected report: {report}");
    assert!(report.contains("OVERALL: NOT EXECUTED;"));
    assert_eq!(
        controller.aggregator().last_run().map(|run| run.overall),
        Some(Overall::NotExecuted)
    );
}

/// Ending with nothing active is a no-op that publishes no report.
#[test]
fn end_without_active_scenario_is_noop() {
    let (controller, sink) = controller();
    assert!(controller.end_test().is_none());
    assert_eq!(sink.count(Channel::Results), 0);
    assert!(controller.aggregator().history().is_empty());
}

/// A second start replaces the first scenario, which never reports.
#[test]
fn second_start_replaces_first_unreported() {
    let (controller, sink) = controller();
    start_session_termination(&controller);
    controller
        .start_test(
            "host",
            "SessionTerminationTest",
            &["Host2".to_string(), "HostClient2".to_string()],
        )
        .unwrap();

    assert_eq!(sink.count(Channel::Results), 0);

    // Events for the first host no longer reach any scenario.
    controller.on_disconnect(&ClientDisconnectEvent::normal(HOST_CLIENT_ID));
    assert!(controller.is_active());

    controller.on_disconnect(&ClientDisconnectEvent::normal("HostClient2"));
    assert!(!controller.is_active());
    assert_eq!(sink.count(Channel::Results), 1);
    assert_eq!(controller.aggregator().history().len(), 1);
}

/// Each finished run is recorded in the aggregator history.
#[test]
fn runs_accumulate_in_history() {
    let (controller, _sink) = controller();
    start_session_termination(&controller);
    controller.end_test();
    start_session_termination(&controller);
    controller.on_publish(&death_message("OFFLINE"));
    controller.on_disconnect(&ClientDisconnectEvent::normal(HOST_CLIENT_ID));

    let verdicts = controller
        .aggregator()
        .verdict_history(HOST_DISCONNECT_INTENTIONAL.id);
    let verdicts: Vec<Verdict> = verdicts.into_iter().map(|(_, v)| v).collect();
    assert_eq!(verdicts, vec![Verdict::NotExecuted, Verdict::Pass]);
}

// ---------------------------------------------------------------------------
// Group 2: Load failures
// ---------------------------------------------------------------------------

/// An unknown scenario publishes `OVERALL: NOT EXECUTED` and returns an error.
#[test]
fn unknown_scenario_reports_not_executed() {
    let (controller, sink) = controller();
    let err = controller
        .start_test("host", "NoSuchTest", &host_params())
        .unwrap_err();
    assert!(matches!(err, TckError::UnknownScenario { .. }));
    assert_eq!(sink.texts(Channel::Results), vec![NOT_EXECUTED_SUMMARY]);
    assert!(!controller.is_active());
}

/// Wrong parameters prompt the operator and leave no scenario active.
#[test]
fn wrong_parameter_count_is_rejected() {
    let (controller, sink) = controller();
    let err = controller
        .start_test("host", "SessionTerminationTest", &["Host1".to_string()])
        .unwrap_err();
    assert!(matches!(err, TckError::InvalidParameters { .. }));
    assert_eq!(sink.count(Channel::Prompt), 1);
    assert_eq!(sink.texts(Channel::Results), vec![NOT_EXECUTED_SUMMARY]);
    assert!(!controller.is_active());
}

/// A failed load keeps the previously active scenario running.
#[test]
fn failed_load_keeps_previous_scenario() {
    let (controller, _sink) = controller();
    start_session_termination(&controller);
    assert!(controller.start_test("host", "NoSuchTest", &[]).is_err());
    assert_eq!(
        controller.active_scenario().as_deref(),
        Some("Host SessionTermination")
    );
}

// ---------------------------------------------------------------------------
// Group 3: Observer results
// ---------------------------------------------------------------------------

/// Monitor and listener findings are carried into the final report next to
/// the scenario's own requirements.
#[test]
fn observer_results_are_carried_into_report() {
    let (controller, sink) = controller();
    start_session_termination(&controller);

    controller.on_connect(
        &ClientConnectEvent::new(HOST_CLIENT_ID)
            .with_protocol_version(ProtocolVersion::V311)
            .with_clean_start(true),
    );
    controller.on_publish(&ClientPublishEvent::new(
        "EdgeNode1",
        "spBv1.0/Group1/NBIRTH/Edge1",
        vec![0u8, 1, 2],
    ));
    controller.on_publish(&death_message("OFFLINE"));
    controller.on_disconnect(&ClientDisconnectEvent::normal(HOST_CLIENT_ID));

    let report = last_report(&sink);
    assert_eq!(report_entry(&report, CLEAN_SESSION_311.id).as_deref(), Some("PASS"));
    assert_eq!(
        report_entry(&report, TOPIC_STRUCTURE_NAMESPACE.id).as_deref(),
        Some("PASS")
    );
    assert_eq!(report_entry(&report, HOST_STATE_PAYLOAD.id).as_deref(), Some("PASS"));
    assert!(report.contains("OVERALL: PASS;"));

    // Observers start clean for the next run.
    assert!(controller.monitor().results().is_empty());
    assert!(controller.listener().results().is_empty());
}

/// Observer results from before a run started are not carried into it.
#[test]
fn listener_results_are_cleared_on_start() {
    let (controller, _sink) = controller();
    start_session_termination(&controller);
    controller.on_publish(&ClientPublishEvent::new("Edge", "spBv1.0/bad", "x"));
    assert_eq!(
        controller.listener().results().verdict(TOPIC_STRUCTURE_NAMESPACE.id),
        Some(Verdict::Fail)
    );

    start_session_termination(&controller);
    let results = controller.end_test().unwrap();
    assert!(!results.contains(TOPIC_STRUCTURE_NAMESPACE.id));
}

struct OverlapTest {
    results: ResultSet,
}

impl TestScenario for OverlapTest {
    fn name(&self) -> &str {
        "Overlap"
    }

    fn requirement_ids(&self) -> &[&'static str] {
        &[CLEAN_SESSION_311.id]
    }

    fn on_connect(&mut self, _event: &ClientConnectEvent) -> ScenarioAction {
        self.results.record(CLEAN_SESSION_311.id, Outcome::pass());
        ScenarioAction::Continue
    }

    fn results(&self) -> &ResultSet {
        &self.results
    }

    fn end_test(&mut self, carried: ResultSet) -> ResultSet {
        sparkplug_tck::scenario::finalize_results(&self.results, &carried, self.requirement_ids())
    }
}

/// When a scenario and an observer record the same id, the scenario wins.
#[test]
fn scenario_entries_take_precedence_over_carried() {
    let mut registry = ScenarioRegistry::new();
    registry.register("test", "Overlap", |_ctx, _params| {
        Ok(Box::new(OverlapTest {
            results: ResultSet::new(),
        }))
    });
    let (controller, _sink) = controller_with_registry(registry);
    controller.start_test("test", "Overlap", &[]).unwrap();

    controller.on_connect(
        &ClientConnectEvent::new("Legacy")
            .with_protocol_version(ProtocolVersion::V311)
            .with_clean_start(false),
    );
    assert_eq!(
        controller.monitor().results().verdict(CLEAN_SESSION_311.id),
        Some(Verdict::Fail)
    );

    let results = controller.end_test().unwrap();
    assert_eq!(results.verdict(CLEAN_SESSION_311.id), Some(Verdict::Pass));
}

// ---------------------------------------------------------------------------
// Group 4: Concurrent delivery
// ---------------------------------------------------------------------------

/// Events delivered from many threads finalize the run exactly once.
#[test]
fn concurrent_events_finalize_once() {
    let (controller, sink) = controller();
    let controller = Arc::new(controller);
    start_session_termination(&controller);
    controller.on_publish(&death_message("OFFLINE"));

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let controller = Arc::clone(&controller);
            thread::spawn(move || {
                for _ in 0..50 {
                    controller.on_publish(&ClientPublishEvent::new(
                        format!("Edge{i}"),
                        format!("spBv1.0/Group/NDATA/Edge{i}"),
                        "data",
                    ));
                }
                controller.on_disconnect(&ClientDisconnectEvent::normal(HOST_CLIENT_ID));
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    assert!(!controller.is_active());
    assert_eq!(sink.count(Channel::Results), 1);
    let report = last_report(&sink);
    assert_eq!(report_entry(&report, HOST_DEATH_PAYLOAD.id).as_deref(), Some("PASS"));
}
