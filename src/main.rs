//! panlctl - PanL hub command tool
//!
//! Encodes PanL room-panel commands into hub datagrams, sends them over UDP,
//! discovers agents, injects RFID taps, and launches emulator topologies.

mod agents;
mod catalog;
mod client;
mod config;
mod launch;
mod protocol;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use agents::AgentStore;
use catalog::Invocation;
use client::Dispatcher;
use config::Config;
use protocol::Command as PanlCommand;

/// panlctl - PanL hub command tool
#[derive(Parser)]
#[command(name = "panlctl")]
#[command(version = "0.1.0")]
#[command(about = "Send PanL panel commands through a hub", long_about = None)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Encode a panel command and send it to the hub
    Send {
        /// Command name (see `panlctl info` for the list)
        name: String,

        /// Command arguments; empty uses configured defaults, `help` prints usage
        #[arg(trailing_var_arg = true)]
        args: Vec<String>,

        /// Hub host (overrides configuration)
        #[arg(short = 'i', long)]
        host: Option<String>,

        /// Hub port (overrides configuration)
        #[arg(short, long)]
        port: Option<u16>,

        /// Address a discovered agent by its 1-based index
        #[arg(short, long)]
        agent: Option<usize>,

        /// Destination panel MAC (overrides configuration)
        #[arg(short, long)]
        mac: Option<u8>,
    },

    /// Request the agent UUID list from the hub and persist it
    Discover {
        /// Hub host (overrides configuration)
        #[arg(short = 'i', long)]
        host: Option<String>,

        /// Hub port (overrides configuration)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Show the persisted agent list
    Agents,

    /// Inject a simulated RFID card tap at an agent
    Rfid {
        /// Card id to present
        #[arg(long)]
        card: Option<String>,

        /// Agent host (overrides configuration)
        #[arg(short = 'i', long)]
        host: Option<String>,

        /// Agent port (overrides configuration)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Launch the configured hub/agent/panel emulator processes
    Launch,

    /// Show current configuration
    Config {
        /// Generate sample configuration
        #[arg(long)]
        generate: bool,

        /// Output path for generated config
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// List supported commands and protocol constants
    Info,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();

    // Load configuration. A broken config file is fatal: commands must not
    // be sent with the wrong defaults. No file at all still yields the
    // compiled-in defaults.
    let config = if let Some(config_path) = &cli.config {
        Config::load(config_path)?
    } else {
        Config::load_default()?
    };

    match cli.command {
        Commands::Send {
            name,
            args,
            host,
            port,
            agent,
            mac,
        } => {
            run_send(config, &name, &args, host, port, agent, mac).await?;
        }
        Commands::Discover { host, port } => {
            run_discover(config, host, port).await?;
        }
        Commands::Agents => {
            run_agents(config)?;
        }
        Commands::Rfid { card, host, port } => {
            run_rfid(config, card, host, port).await?;
        }
        Commands::Launch => {
            launch::run(&config.launch).await?;
        }
        Commands::Config { generate, output } => {
            if generate {
                let sample = config::generate_sample_config();
                if let Some(path) = output {
                    std::fs::write(&path, &sample)?;
                    println!("Configuration written to: {}", path.display());
                } else {
                    println!("{}", sample);
                }
            } else {
                println!("{}", toml::to_string_pretty(&config)?);
            }
        }
        Commands::Info => {
            print_info();
        }
    }

    Ok(())
}

/// Encode one command and send it, or print usage for a `help` token.
async fn run_send(
    config: Config,
    name: &str,
    args: &[String],
    host: Option<String>,
    port: Option<u16>,
    agent: Option<usize>,
    mac: Option<u8>,
) -> anyhow::Result<()> {
    let command = match catalog::parse(name, args, &config.defaults)? {
        Invocation::Help(usage) => {
            println!("{}", usage);
            return Ok(());
        }
        Invocation::Send(command) => command,
    };

    // GET_UUID is a request/response exchange, not a forwarded command.
    if command == PanlCommand::GetUuid {
        return run_discover(config, host, port).await;
    }

    let mut device = config.device.clone();
    if let Some(mac) = mac {
        device.panel_mac = mac;
    }

    let host = host.unwrap_or(config.hub.host);
    let port = port.unwrap_or(config.hub.port);
    let mut dispatcher = Dispatcher::connect(&host, port, &device).await?;

    if let Some(index) = agent {
        let store = AgentStore::new(&config.agents.list_path);
        let list = store.load()?;
        dispatcher.set_agent_uuid(*list.get(index)?);
    }

    dispatcher.send_command(&command).await?;
    Ok(())
}

/// Run the discovery exchange and print the resulting list.
async fn run_discover(
    config: Config,
    host: Option<String>,
    port: Option<u16>,
) -> anyhow::Result<()> {
    let host = host.unwrap_or(config.hub.host);
    let port = port.unwrap_or(config.hub.port);
    let dispatcher = Dispatcher::connect(&host, port, &config.device).await?;

    let store = AgentStore::new(&config.agents.list_path);
    let list = dispatcher.discover_agents(&store).await?;

    println!("Discovered {} agent(s):", list.len());
    for (i, uuid) in list.iter().enumerate() {
        println!("  {}: {}", i + 1, uuid);
    }
    Ok(())
}

/// Print the persisted agent list without touching the network.
fn run_agents(config: Config) -> anyhow::Result<()> {
    let store = AgentStore::new(&config.agents.list_path);
    let list = store.load()?;

    if list.is_empty() {
        println!("No agents known. Run `panlctl discover` first.");
        return Ok(());
    }
    println!("Known agents ({}):", list.len());
    for (i, uuid) in list.iter().enumerate() {
        println!("  {}: {}", i + 1, uuid);
    }
    Ok(())
}

async fn run_rfid(
    config: Config,
    card: Option<String>,
    host: Option<String>,
    port: Option<u16>,
) -> anyhow::Result<()> {
    let mut rfid = config.rfid.clone();
    if let Some(card) = card {
        rfid.card_id = card;
    }
    if let Some(host) = host {
        rfid.agent_host = host;
    }
    if let Some(port) = port {
        rfid.agent_port = port;
    }
    client::inject_rfid(&rfid, config.device.version).await?;
    Ok(())
}

fn print_info() {
    println!("panlctl - PanL hub command tool\n");
    println!("Protocol version: {:#010x}", protocol::PROTOCOL_VERSION);
    println!("Default hub port: {}", protocol::DEFAULT_PORT);
    println!("\nCommands (use `panlctl send <name> help` for usage):");
    for name in catalog::COMMAND_NAMES {
        println!("  {}", name);
    }
}
