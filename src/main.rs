mod access;
mod config;
mod front;
mod probe;
mod signal;
mod wake;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use config::WakeonConfig;
use futures::future::join_all;
use signal::MagicPacketSender;
use std::path::PathBuf;
use std::sync::Arc;
use wake::{WakeOrchestrator, WakeOutcome, WakeResult, WakeService};
use wakeon_shared::OperatorId;

use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "wakeon")]
#[command(about = "Wake registered devices and confirm they came online", long_about = None)]
struct Cli {
    /// Configuration file
    #[arg(short, long, default_value = "wakeon.toml")]
    config: PathBuf,

    /// Identity of the operator issuing the request
    #[arg(short, long)]
    operator: String,

    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the devices that can be woken.
    Devices,
    /// Wake one or more devices and wait for them to come online.
    Wake {
        #[arg(required = true)]
        devices: Vec<String>,
    },
    /// Read commands from stdin, one per line.
    Console,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing; stdout is reserved for replies
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .init();

    let cli = Cli::parse();

    let config = WakeonConfig::load(&cli.config)
        .await
        .with_context(|| format!("Failed to load {}", cli.config.display()))?;

    let sender = MagicPacketSender::new(config.signal);
    info!(
        "Wake signal target: {}, probe: {:?}, {} attempt(s) every {:?}",
        sender.config().target(),
        config.probe,
        config.policy.max_attempts,
        config.policy.interval
    );

    let orchestrator = WakeOrchestrator::new(
        Arc::new(config.registry),
        Arc::new(sender),
        config.probe.build(),
        config.policy,
    );
    let service = Arc::new(WakeService::new(config.gate, orchestrator));
    let operator = OperatorId::new(cli.operator);

    match cli.cmd {
        Commands::Devices => {
            println!("{}", front::device_menu(&service, &operator));
            if !service.is_authorized(&operator) {
                bail!("operator {} is not authorized", operator);
            }
        }
        Commands::Wake { devices } => {
            let results = join_all(
                devices
                    .iter()
                    .map(|name| service.request_wake(&operator, name)),
            )
            .await;

            let mut all_online = true;
            for result in &results {
                println!("{}", result);
                if !matches!(result.outcome(), Some(WakeOutcome::Online)) {
                    all_online = false;
                }
                if let WakeResult::Unauthorized = result {
                    warn!("Operator {} was refused", operator);
                }
            }

            if !all_online {
                bail!("not every device came online");
            }
        }
        Commands::Console => {
            front::run_console(service, operator).await?;
        }
    }

    Ok(())
}
