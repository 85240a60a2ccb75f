use anyhow::Context;
use clap::{Parser, Subcommand};
use pilot_link::catalog::SymbolicTag;
use pilot_link::config::StationConfig;
use pilot_link::model::{LineId, MachineState, OrderStartRequest, Quantity};
use pilot_link::runtime::setup_tracing;
use pilot_link::session::{Connector, SessionFactory};
use pilot_link::station::PilotStation;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Parser)]
#[command(
    name = "pilot-link",
    version,
    about = "Send orders to the LGN line controllers and read their state"
)]
struct Cli {
    /// Configuration file (default: ./pilot-link.toml if present).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Defaults to `states` when omitted.
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Write the order number to a line (starts the order on the controller).
    Start {
        /// Line key (LGN01..LGN03) or an opc.tcp:// URL.
        target: String,
        /// Order number, e.g. WH/MO/00012.
        order: String,
    },

    /// Write the full order: number, article code, quantity and date.
    Send {
        line: LineId,
        order: String,
        code: String,
        /// Whole units; a fractional amount is truncated.
        quantity: f64,
        /// Sent to the controller as given.
        date: String,
    },

    /// Print the machine state of every line.
    States {
        /// Print the states as a JSON object.
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    setup_tracing();
    let cli = Cli::parse();

    let config = StationConfig::load(cli.config.as_deref(), None).context("loading configuration")?;
    let sessions = SessionFactory::new(config, connector()?)?;

    match command_or_default(cli.command) {
        Command::Start { target, order } => run_start(sessions, &target, &order).await,
        Command::Send {
            line,
            order,
            code,
            quantity,
            date,
        } => {
            let request = OrderStartRequest::new(line, order, code, Quantity::from_f64(quantity)?)
                .with_date_text(date);
            let station = PilotStation::start(sessions);
            let sent = station.start_full(request).await;
            station.shutdown().await?;
            Ok(report(sent))
        }
        Command::States { json } => {
            let station = PilotStation::start(sessions);
            let snapshot = station.poll_all().await;
            station.shutdown().await?;

            if json {
                println!("{}", serde_json::to_string_pretty(&snapshot)?);
            } else {
                for (line, state) in &snapshot {
                    println!("{line}: {state}");
                }
            }
            let reachable = snapshot.values().filter(|s| s.is_reachable()).count();
            info!(reachable, total = snapshot.len(), "States read");
            Ok(if snapshot.values().all(MachineState::is_reachable) {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            })
        }
    }
}

async fn run_start(sessions: SessionFactory, target: &str, order: &str) -> anyhow::Result<ExitCode> {
    if let Ok(line) = target.parse::<LineId>() {
        let station = PilotStation::start(sessions);
        let sent = station.start_minimal(line, order).await;
        station.shutdown().await?;
        return Ok(report(sent));
    }

    // Direct URL: a controller outside the line registry.
    let sent = match sessions.open_target(target).await {
        Ok(mut session) => {
            let written = session.write(SymbolicTag::StartOrder, order).await;
            session.close().await;
            match written {
                Ok(()) => true,
                Err(error) => {
                    warn!(controller = %target, %error, "Start failed");
                    false
                }
            }
        }
        Err(error) => {
            warn!(controller = %target, %error, "Start failed");
            false
        }
    };
    Ok(report(sent))
}

/// With no subcommand the tool prints the fleet state.
fn command_or_default(command: Option<Command>) -> Command {
    command.unwrap_or(Command::States { json: false })
}

fn report(sent: bool) -> ExitCode {
    println!("{sent}");
    if sent {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

#[cfg(feature = "opcua")]
fn connector() -> anyhow::Result<Arc<dyn Connector>> {
    Ok(Arc::new(pilot_link::session::opcua::OpcUaConnector::default()))
}

#[cfg(not(feature = "opcua"))]
fn connector() -> anyhow::Result<Arc<dyn Connector>> {
    anyhow::bail!("no OPC UA transport compiled in; rebuild with `--features opcua`")
}
