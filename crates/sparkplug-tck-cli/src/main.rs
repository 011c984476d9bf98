use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

use commands::{replay_cmd, scenarios_cmd};

/// Sparkplug conformance harness driver
#[derive(Parser)]
#[command(name = "sparkplug-tck")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Enable verbose logging
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay a recorded broker event script through the harness
    Replay(replay_cmd::ReplayCommand),
    /// List the scenarios the harness can run
    Scenarios(scenarios_cmd::ScenariosCommand),
}

fn init_tracing(verbose: bool) {
    let default_filter = if verbose {
        "sparkplug_tck=debug"
    } else {
        "sparkplug_tck=info"
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Replay(cmd) => replay_cmd::execute(cmd).await,
        Commands::Scenarios(cmd) => {
            scenarios_cmd::execute(&cmd);
            Ok(())
        }
    }
}
