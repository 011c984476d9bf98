//! The dispatcher that owns the active scenario.
//!
//! [`TestController`] is installed in the broker as its event handler. Every
//! event goes to the active scenario (if any) and then to the passive
//! monitor; publications are additionally delivered to the traffic listener.
//! Entry points may be called from any broker worker thread: the scenario
//! slot is a single mutex held for the whole of each dispatch, so a scenario
//! never sees two events at once and never changes underneath an event.

use crate::aggregator::ResultsAggregator;
use crate::config::TckConfig;
use crate::control::ControlCommand;
use crate::error::Result;
use crate::events::{
    AuthenticationSuccessEvent, BrokerEventHandler, ClientConnectEvent, ClientDisconnectEvent,
    ClientPublishEvent, ClientSubscribeEvent, ConnectionStartEvent,
};
use crate::listener::TrafficListener;
use crate::monitor::PassiveMonitor;
use crate::report::NOT_EXECUTED_SUMMARY;
use crate::results::ResultSet;
use crate::scenario::{
    ScenarioAction, ScenarioContext, ScenarioDescriptor, ScenarioRegistry, TestScenario,
};
use crate::sink::{ReportSink, Reporter};
use parking_lot::Mutex;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use tracing::{error, info, warn};

type ScenarioSlot = Option<Box<dyn TestScenario>>;

pub struct TestController {
    config: Arc<TckConfig>,
    reporter: Reporter,
    registry: ScenarioRegistry,
    current: Mutex<ScenarioSlot>,
    monitor: PassiveMonitor,
    listener: TrafficListener,
    aggregator: ResultsAggregator,
}

impl std::fmt::Debug for TestController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TestController")
            .field("config", &self.config)
            .field("registry", &self.registry)
            .field(
                "active",
                &self
                    .current
                    .try_lock()
                    .map(|slot| slot.as_ref().map(|s| s.name().to_string())),
            )
            .finish_non_exhaustive()
    }
}

impl TestController {
    /// A controller with the built-in scenarios registered.
    ///
    /// # Errors
    ///
    /// Returns an error if `config` does not pass [`TckConfig::validate`].
    pub fn new(config: TckConfig, sink: Arc<dyn ReportSink>) -> Result<Self> {
        Self::with_registry(config, sink, ScenarioRegistry::builtin())
    }

    /// # Errors
    ///
    /// Returns an error if `config` does not pass [`TckConfig::validate`].
    pub fn with_registry(
        config: TckConfig,
        sink: Arc<dyn ReportSink>,
        registry: ScenarioRegistry,
    ) -> Result<Self> {
        config.validate()?;

        let reporter = Reporter::new(sink, &config);
        let listener = TrafficListener::new(&config);
        Ok(Self {
            config: Arc::new(config),
            reporter,
            registry,
            current: Mutex::new(None),
            monitor: PassiveMonitor::new(),
            listener,
            aggregator: ResultsAggregator::new(),
        })
    }

    #[must_use]
    pub fn config(&self) -> &TckConfig {
        &self.config
    }

    #[must_use]
    pub fn registry(&self) -> &ScenarioRegistry {
        &self.registry
    }

    #[must_use]
    pub fn monitor(&self) -> &PassiveMonitor {
        &self.monitor
    }

    #[must_use]
    pub fn listener(&self) -> &TrafficListener {
        &self.listener
    }

    #[must_use]
    pub fn aggregator(&self) -> &ResultsAggregator {
        &self.aggregator
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.current.lock().is_some()
    }

    /// Display name of the active scenario.
    #[must_use]
    pub fn active_scenario(&self) -> Option<String> {
        self.current.lock().as_ref().map(|s| s.name().to_string())
    }

    /// Loads and activates a scenario.
    ///
    /// On a load error the failure is logged and `OVERALL: NOT EXECUTED` is
    /// published on the results channel before the error is returned; the
    /// previously active scenario, if any, stays active. On success any
    /// previously active scenario is dropped without being finalized.
    pub fn start_test(&self, profile: &str, name: &str, params: &[String]) -> Result<()> {
        let descriptor = ScenarioDescriptor::new(profile, name, params.to_vec());
        info!(profile, test = name, "Test requested");

        let mut current = self.current.lock();
        let ctx = ScenarioContext {
            reporter: self.reporter.clone(),
            config: Arc::clone(&self.config),
        };
        let scenario = match self.registry.create(
            &descriptor.profile,
            &descriptor.name,
            ctx,
            &descriptor.params,
        ) {
            Ok(scenario) => scenario,
            Err(e) => {
                error!(profile, test = name, "Error starting test: {e}");
                self.publish_report(NOT_EXECUTED_SUMMARY);
                return Err(e);
            }
        };

        if let Some(previous) = current.replace(scenario) {
            warn!(
                previous = previous.name(),
                "new test started while another was active; discarding it unreported"
            );
        }

        self.monitor.start_test();
        if self.listener.start() {
            info!("traffic listener started");
        }
        self.aggregator.start();
        self.listener.clear_results();
        Ok(())
    }

    /// Finalizes the active scenario and returns its final results.
    ///
    /// Returns `None` without publishing anything when no scenario is active.
    pub fn end_test(&self) -> Option<ResultSet> {
        let mut current = self.current.lock();
        self.finish_run(&mut current)
    }

    fn finish_run(&self, current: &mut ScenarioSlot) -> Option<ResultSet> {
        let Some(mut scenario) = current.take() else {
            info!("Test end requested but no test active");
            return None;
        };
        info!(scenario = scenario.name(), "Test end requested");

        let monitor_results = self.monitor.results();
        let listener_results = self.listener.results();
        let carried = ResultsAggregator::merge(&[&monitor_results, &listener_results]);

        let results = scenario.end_test(carried);

        self.monitor.end_test();
        self.listener.clear_results();
        self.aggregator.record_run(scenario.name(), &results);
        Some(results)
    }

    /// Runs `handler` against the active scenario, finishing the run if it
    /// asks to, then notifies the observers.
    fn dispatch<F, O>(&self, handler: F, observers: O)
    where
        F: FnOnce(&mut dyn TestScenario) -> ScenarioAction,
        O: FnOnce(),
    {
        let mut current = self.current.lock();
        let action = match current.as_deref_mut() {
            Some(scenario) => handler(scenario),
            None => ScenarioAction::Continue,
        };
        if action == ScenarioAction::EndTest {
            self.finish_run(&mut current);
        }
        observers();
    }

    pub fn on_connection_start(&self, event: &ConnectionStartEvent) {
        self.monitor.on_connection_start(event);
    }

    pub fn on_authentication_success(&self, event: &AuthenticationSuccessEvent) {
        self.monitor.on_authentication_success(event);
    }

    pub fn on_connect(&self, event: &ClientConnectEvent) {
        self.dispatch(|s| s.on_connect(event), || self.monitor.on_connect(event));
    }

    pub fn on_disconnect(&self, event: &ClientDisconnectEvent) {
        self.dispatch(
            |s| s.on_disconnect(event),
            || self.monitor.on_disconnect(event),
        );
    }

    pub fn on_subscribe(&self, event: &ClientSubscribeEvent) {
        self.dispatch(
            |s| s.on_subscribe(event),
            || self.monitor.on_subscribe(event),
        );
    }

    pub fn on_publish(&self, event: &ClientPublishEvent) {
        self.dispatch(
            |s| s.on_publish(event),
            || {
                self.monitor.on_publish(event);
                self.listener.on_message(event);
            },
        );
    }

    /// Applies a command received on the control topic.
    pub fn handle_control(&self, payload: &str) -> Result<()> {
        match ControlCommand::parse(payload)? {
            ControlCommand::NewTest(descriptor) => {
                self.start_test(&descriptor.profile, &descriptor.name, &descriptor.params)
            }
            ControlCommand::EndTest => {
                self.end_test();
                Ok(())
            }
        }
    }

    /// Publishes `text` on the results channel.
    pub fn publish_report(&self, text: &str) {
        self.reporter.results(text);
    }
}

impl BrokerEventHandler for TestController {
    fn on_connection_start<'a>(
        &'a self,
        event: ConnectionStartEvent,
    ) -> Pin<Box<dyn Future<Output = ()> + Send + 'a>> {
        Box::pin(async move { TestController::on_connection_start(self, &event) })
    }

    fn on_authentication_success<'a>(
        &'a self,
        event: AuthenticationSuccessEvent,
    ) -> Pin<Box<dyn Future<Output = ()> + Send + 'a>> {
        Box::pin(async move { TestController::on_authentication_success(self, &event) })
    }

    fn on_client_connect<'a>(
        &'a self,
        event: ClientConnectEvent,
    ) -> Pin<Box<dyn Future<Output = ()> + Send + 'a>> {
        Box::pin(async move { self.on_connect(&event) })
    }

    fn on_client_subscribe<'a>(
        &'a self,
        event: ClientSubscribeEvent,
    ) -> Pin<Box<dyn Future<Output = ()> + Send + 'a>> {
        Box::pin(async move { self.on_subscribe(&event) })
    }

    fn on_client_publish<'a>(
        &'a self,
        event: ClientPublishEvent,
    ) -> Pin<Box<dyn Future<Output = ()> + Send + 'a>> {
        Box::pin(async move {
            if *event.topic == *self.config.control_topic {
                let payload = event.payload_str().unwrap_or_default();
                if let Err(e) = self.handle_control(payload) {
                    warn!(client_id = %event.client_id, "control command rejected: {e}");
                }
                return;
            }
            self.on_publish(&event);
        })
    }

    fn on_client_disconnect<'a>(
        &'a self,
        event: ClientDisconnectEvent,
    ) -> Pin<Box<dyn Future<Output = ()> + Send + 'a>> {
        Box::pin(async move { self.on_disconnect(&event) })
    }
}
