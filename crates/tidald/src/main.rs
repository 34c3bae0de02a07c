//! tidald — the Tidal daemon.
//!
//! One binary, two roles:
//! - `serve`: the optimizer (global state, decision engine, HTTP boundary)
//! - `agent`: a demo service that pushes simulated telemetry and follows
//!   the policy the optimizer hands back
//!
//! # Usage
//!
//! ```text
//! tidald serve --config tidal.toml --port 8080
//! SERVICE_ID=inventory-service tidald agent --optimizer 127.0.0.1:8080
//! ```

mod agent_mode;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing::info;

use tidal_core::TidalConfig;

const DEFAULT_FILTER: &str = "info,tidald=debug,tidal=debug";

#[derive(Parser)]
#[command(name = "tidald", about = "Tidal adaptive consistency optimizer")]
struct Cli {
    /// Emit logs as JSON lines.
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the optimizer.
    Serve {
        /// TOML config file. Built-in defaults when omitted.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Override the port of the configured listen address.
        #[arg(long)]
        port: Option<u16>,
    },

    /// Run a demo agent that reports simulated load.
    Agent {
        /// Service id to report as.
        #[arg(long, env = "SERVICE_ID", default_value = "inventory-service")]
        service_id: String,

        /// Optimizer address (host:port).
        #[arg(long, default_value = "127.0.0.1:8080")]
        optimizer: String,

        /// Seconds between telemetry pushes.
        #[arg(long, default_value = "2")]
        interval: u64,

        /// Seconds between policy polls.
        #[arg(long, default_value = "5")]
        policy_interval: u64,
    },

    /// Print the effective configuration as TOML.
    Config {
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(DEFAULT_FILTER));
    if cli.json_logs {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }

    match cli.command {
        Command::Serve { config, port } => run_serve(load_config(config)?, port).await,
        Command::Agent {
            service_id,
            optimizer,
            interval,
            policy_interval,
        } => agent_mode::run_agent(service_id, optimizer, interval, policy_interval).await,
        Command::Config { config } => {
            print!("{}", load_config(config)?.to_toml_string()?);
            Ok(())
        }
    }
}

fn load_config(path: Option<PathBuf>) -> anyhow::Result<TidalConfig> {
    match path {
        Some(path) => {
            let config = TidalConfig::from_file(&path)?;
            info!(path = ?path, services = config.services.len(), "config loaded");
            Ok(config)
        }
        None => Ok(TidalConfig::default()),
    }
}

async fn run_serve(mut config: TidalConfig, port: Option<u16>) -> anyhow::Result<()> {
    info!("Tidal optimizer starting");

    if let Some(port) = port {
        let mut addr = config.listen_addr()?;
        addr.set_port(port);
        config.optimizer.listen = addr.to_string();
    }

    // Bootstrap failures are fatal; nothing is served from a partial registry.
    let state = tidal_state::GlobalState::from_config(&config)?;
    let addr = config.listen_addr()?;

    let router = tidal_api::build_router(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "API server listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "failed to listen for ctrl-c");
                std::future::pending::<()>().await;
            }
            info!("shutdown signal received");
        })
        .await?;

    info!("Tidal optimizer stopped");
    Ok(())
}
