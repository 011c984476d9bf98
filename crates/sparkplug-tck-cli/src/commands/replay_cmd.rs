use anyhow::{bail, Context, Result};
use bytes::Bytes;
use clap::Args;
use serde::Deserialize;
use sparkplug_tck::report::{Overall, SummaryReport};
use sparkplug_tck::{
    AuthenticationSuccessEvent, BrokerEventHandler, Channel, ChannelSink, ClientConnectEvent,
    ClientDisconnectEvent, ClientPublishEvent, ClientSubscribeEvent, ConnectionStartEvent,
    ProtocolVersion, Publication, QoS, TckConfig, TestController,
};
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info, warn};

#[derive(Args)]
pub struct ReplayCommand {
    /// Event script, one JSON object per line
    pub script: PathBuf,

    /// Harness configuration file (TOML)
    #[arg(long, short)]
    pub config: Option<PathBuf>,

    /// Print each finished run as a JSON report after the replay
    #[arg(long)]
    pub json: bool,

    /// Leave the active scenario running at the end of the script
    #[arg(long)]
    pub keep_open: bool,

    /// Exit with an error when any run's overall verdict is FAIL
    #[arg(long)]
    pub strict: bool,
}

/// One line of an event script.
#[derive(Debug, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
enum ScriptEvent {
    ConnectionStart {
        client_id: String,
        #[serde(default = "default_protocol_version")]
        protocol_version: u8,
    },
    Authenticated {
        client_id: String,
    },
    Connect {
        client_id: String,
        #[serde(default = "default_protocol_version")]
        protocol_version: u8,
        #[serde(default = "default_clean_start")]
        clean_start: bool,
        #[serde(default)]
        session_expiry_interval: u32,
    },
    Subscribe {
        client_id: String,
        topic_filter: String,
        #[serde(default)]
        qos: u8,
    },
    Publish {
        client_id: String,
        topic: String,
        #[serde(default)]
        payload: Option<String>,
        #[serde(default)]
        qos: u8,
        #[serde(default)]
        retain: bool,
    },
    Disconnect {
        client_id: String,
        #[serde(default)]
        reason_code: u8,
        #[serde(default)]
        unexpected: bool,
    },
    StartTest {
        profile: String,
        name: String,
        #[serde(default)]
        params: Vec<String>,
    },
    EndTest,
}

fn default_protocol_version() -> u8 {
    5
}

fn default_clean_start() -> bool {
    true
}

fn protocol_version(value: u8) -> Result<ProtocolVersion> {
    ProtocolVersion::try_from(value)
        .map_err(|()| anyhow::anyhow!("Invalid protocol version: {value}. Use 4 or 5"))
}

fn qos(value: u8) -> Result<QoS> {
    QoS::try_from(value).map_err(|()| anyhow::anyhow!("QoS must be 0, 1, or 2, got: {value}"))
}

fn channel_label(channel: Channel) -> &'static str {
    match channel {
        Channel::Results => "RESULT",
        Channel::Log => "LOG",
        Channel::Prompt => "PROMPT",
    }
}

fn print_publication(publication: &Publication) {
    let label = channel_label(publication.channel);
    for line in publication.payload_str().lines() {
        println!("[{label}] {}: {line}", publication.topic);
    }
}

async fn apply(controller: &TestController, event: ScriptEvent) -> Result<()> {
    match event {
        ScriptEvent::ConnectionStart {
            client_id,
            protocol_version: version,
        } => {
            let event = ConnectionStartEvent {
                client_id: client_id.into(),
                protocol_version: protocol_version(version)?,
            };
            BrokerEventHandler::on_connection_start(controller, event).await;
        }
        ScriptEvent::Authenticated { client_id } => {
            let event = AuthenticationSuccessEvent {
                client_id: client_id.into(),
            };
            BrokerEventHandler::on_authentication_success(controller, event).await;
        }
        ScriptEvent::Connect {
            client_id,
            protocol_version: version,
            clean_start,
            session_expiry_interval,
        } => {
            let event = ClientConnectEvent::new(client_id)
                .with_protocol_version(protocol_version(version)?)
                .with_clean_start(clean_start)
                .with_session_expiry_interval(session_expiry_interval);
            controller.on_client_connect(event).await;
        }
        ScriptEvent::Subscribe {
            client_id,
            topic_filter,
            qos: level,
        } => {
            let event = ClientSubscribeEvent::single(client_id, &topic_filter, qos(level)?);
            controller.on_client_subscribe(event).await;
        }
        ScriptEvent::Publish {
            client_id,
            topic,
            payload,
            qos: level,
            retain,
        } => {
            let event = match payload {
                Some(payload) => ClientPublishEvent::new(client_id, topic, Bytes::from(payload)),
                None => ClientPublishEvent::new(client_id, topic, Bytes::new()).without_payload(),
            }
            .with_qos(qos(level)?)
            .with_retain(retain);
            controller.on_client_publish(event).await;
        }
        ScriptEvent::Disconnect {
            client_id,
            reason_code,
            unexpected,
        } => {
            controller
                .on_client_disconnect(ClientDisconnectEvent {
                    client_id: client_id.into(),
                    reason_code,
                    unexpected,
                })
                .await;
        }
        ScriptEvent::StartTest {
            profile,
            name,
            params,
        } => {
            if let Err(e) = controller.start_test(&profile, &name, &params) {
                warn!("Failed to start {profile} {name}: {e}");
            }
        }
        ScriptEvent::EndTest => {
            controller.end_test();
        }
    }
    Ok(())
}

pub async fn execute(cmd: ReplayCommand) -> Result<()> {
    let config = match &cmd.config {
        Some(path) => TckConfig::load(path)
            .with_context(|| format!("Failed to load config: {}", path.display()))?,
        None => TckConfig::default(),
    };

    let script = fs::read_to_string(&cmd.script)
        .with_context(|| format!("Failed to read script: {}", cmd.script.display()))?;

    let (sink, mut rx) = ChannelSink::new();
    let controller =
        TestController::new(config, Arc::new(sink)).context("Invalid harness configuration")?;
    let printer = tokio::spawn(async move {
        while let Some(publication) = rx.recv().await {
            print_publication(&publication);
        }
    });
    info!(script = %cmd.script.display(), "Replaying event script");

    for (index, line) in script.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let event: ScriptEvent = serde_json::from_str(line)
            .with_context(|| format!("Invalid event on line {}", index + 1))?;
        debug!(line = index + 1, ?event, "replaying");
        apply(&controller, event)
            .await
            .with_context(|| format!("Failed to apply event on line {}", index + 1))?;
    }

    if !cmd.keep_open && controller.is_active() {
        info!("End of script, finishing the active test");
        controller.end_test();
    }

    let history = controller.aggregator().history();
    drop(controller);
    printer.await.context("Publication printer failed")?;

    if cmd.json {
        for run in &history {
            let report = SummaryReport::new(run.scenario.clone(), run.results.clone());
            println!(
                "{}",
                report
                    .generate_json()
                    .context("Failed to serialize report")?
            );
        }
    }

    if cmd.strict {
        let failed = history
            .iter()
            .filter(|run| run.overall == Overall::Fail)
            .count();
        if failed > 0 {
            bail!("{failed} of {} runs failed", history.len());
        }
    }
    Ok(())
}
