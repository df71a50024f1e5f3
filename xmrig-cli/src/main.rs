use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use xmrig_api::{ControlAction, ManagerConfig, MinerEndpoint, MinerManager};

mod commands;
use commands::{config, control, monitor, status};

#[derive(Parser)]
#[command(name = "xmrig-cli")]
#[command(version = "0.1.0")]
#[command(about = "Command-line interface for XMRig miner HTTP APIs")]
struct Cli {
    /// Fleet configuration file (TOML)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Act on a single named miner from the config file
    #[arg(short, long, global = true)]
    miner: Option<String>,

    /// Ad-hoc miner host, used instead of a config file
    #[arg(long, global = true)]
    host: Option<String>,

    /// Ad-hoc miner API port
    #[arg(long, global = true, default_value_t = 37841)]
    port: u16,

    /// Bearer token for the miner's HTTP API
    #[arg(long, global = true)]
    token: Option<String>,

    /// Connect to the ad-hoc miner over TLS
    #[arg(long, global = true)]
    tls: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show miner summary
    Summary,

    /// Show backend and thread details
    Backends,

    /// Show or replace miner configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Pause mining
    Pause,

    /// Resume mining after a pause
    Resume,

    /// Stop mining
    Stop,

    /// Start mining after a stop
    Start,

    /// List configured miners
    Miners,

    /// Live fleet monitor
    Monitor {
        /// Seconds between refreshes
        #[arg(short, long, default_value_t = 5)]
        interval: u64,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the current configuration as JSON
    Show,

    /// Push a JSON configuration file to the miner
    Apply {
        /// Path to the config file
        file: PathBuf,
    },
}

/// Build a manager and the list of miner names the command acts on
async fn build_manager(cli: &Cli) -> Result<(Arc<MinerManager>, Vec<String>)> {
    if let Some(path) = &cli.config {
        let fleet = ManagerConfig::load(path)
            .with_context(|| format!("Failed to load {}", path.display()))?;
        let manager = Arc::new(MinerManager::from_config(&fleet).await?);

        let targets = match &cli.miner {
            Some(name) => {
                manager
                    .miner(name)
                    .await
                    .with_context(|| format!("Miner '{}' is not in {}", name, path.display()))?;
                vec![name.clone()]
            }
            None => manager.list_miners().await,
        };
        if targets.is_empty() {
            anyhow::bail!("No miners configured in {}", path.display());
        }
        return Ok((manager, targets));
    }

    let host = cli
        .host
        .clone()
        .context("Provide either --config or --host")?;
    let name = cli.miner.clone().unwrap_or_else(|| host.clone());

    let mut endpoint = MinerEndpoint::new(name.clone(), host, cli.port).with_tls(cli.tls);
    if let Some(token) = &cli.token {
        endpoint = endpoint.with_access_token(token.clone());
    }

    let manager = Arc::new(MinerManager::new());
    manager.add_miner(endpoint).await?;
    Ok((manager, vec![name]))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let (manager, targets) = build_manager(&cli).await?;

    match cli.command {
        Commands::Summary => status::handle_summary(&manager, &targets).await,
        Commands::Backends => status::handle_backends(&manager, &targets).await,
        Commands::Config { action } => match action {
            ConfigAction::Show => config::handle_config_show(&manager, &targets).await,
            ConfigAction::Apply { file } => {
                config::handle_config_apply(&manager, &targets, &file).await
            }
        },
        Commands::Pause => control::handle_control(&manager, &targets, ControlAction::Pause).await,
        Commands::Resume => {
            control::handle_control(&manager, &targets, ControlAction::Resume).await
        }
        Commands::Stop => control::handle_control(&manager, &targets, ControlAction::Stop).await,
        Commands::Start => control::handle_control(&manager, &targets, ControlAction::Start).await,
        Commands::Miners => status::handle_miners(&manager).await,
        Commands::Monitor { interval } => {
            monitor::handle_monitor(&manager, &targets, interval.max(1)).await
        }
    }
}
