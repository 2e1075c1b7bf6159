//! fleetlensd — the fleetlens daemon.
//!
//! Single binary that assembles the scheduling engine:
//! - Snapshot store (redb)
//! - Member-cluster client registry and probe
//! - Scheduling engine
//! - REST API
//!
//! # Usage
//!
//! ```text
//! fleetlensd serve --config /etc/fleetlens/fleetlens.toml
//! fleetlensd import snapshot.json --state /var/lib/fleetlens/fleetlens.redb
//! fleetlensd print-config
//! ```

mod import;
mod serve;

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use fleetlens_core::LensConfig;
use tracing::info;
use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "info,fleetlens=debug,fleetlensd=debug";

#[derive(Parser)]
#[command(name = "fleetlensd", about = "fleetlens scheduling inspector daemon")]
struct Cli {
    /// Emit logs as JSON lines.
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Serve the scheduling API.
    Serve {
        /// Configuration file (TOML). Defaults apply when omitted.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Listen address, overriding the configuration.
        #[arg(long)]
        listen: Option<String>,

        /// State database path, overriding the configuration.
        #[arg(long)]
        state: Option<PathBuf>,
    },

    /// Load a published-state snapshot (JSON) into the state database.
    Import {
        /// Snapshot file.
        file: PathBuf,

        #[arg(long)]
        config: Option<PathBuf>,

        #[arg(long)]
        state: Option<PathBuf>,
    },

    /// Print the effective default configuration.
    PrintConfig,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_json);

    match cli.command {
        Command::Serve {
            config,
            listen,
            state,
        } => {
            let mut config = load_config(config.as_deref())?;
            if let Some(listen) = listen {
                config.server.listen = listen;
            }
            if let Some(state) = state {
                config.state.path = state;
            }
            serve::run(config).await
        }
        Command::Import {
            file,
            config,
            state,
        } => {
            let mut config = load_config(config.as_deref())?;
            if let Some(state) = state {
                config.state.path = state;
            }
            import::run(&config, &file)
        }
        Command::PrintConfig => {
            print!("{}", LensConfig::default().to_toml_string()?);
            Ok(())
        }
    }
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn load_config(path: Option<&Path>) -> anyhow::Result<LensConfig> {
    match path {
        Some(path) => {
            let config = LensConfig::from_file(path)?;
            info!(path = %path.display(), clusters = config.clusters.len(), "configuration loaded");
            Ok(config)
        }
        None => Ok(LensConfig::default()),
    }
}
