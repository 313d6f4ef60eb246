//! # nriiswatch: NRIIS pending-proposal watcher
//!
//! Polls the NRIIS research portal for proposals awaiting
//! certification, recovers an expired session by replaying the login
//! form, relays rows to a spreadsheet webhook and keeps a badge plus a
//! desktop-style notification up to date.
//!
//! Usage:
//!   nriiswatch run                         # start the polling daemon
//!   nriiswatch once                        # one cycle, then exit
//!   nriiswatch creds -u USER -p PASS       # store portal credentials
//!   nriiswatch query getListAgree          # ask a running daemon

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use nriiswatch_core::config::{FileCredentials, WatchConfig};
use nriiswatch_core::state::RunState;
use nriiswatch_portal::NriisPortal;
use nriiswatch_relay::{AppsScriptSink, DesktopSurface};
use nriiswatch_scheduler::bridge::Bridge;
use nriiswatch_scheduler::{Watcher, alarms, bridge};

#[derive(Parser)]
#[command(name = "nriiswatch", version, about = "🛰️ NRIIS pending-proposal watcher")]
struct Cli {
    /// Settings file (default: ~/.nriiswatch/config.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Start the polling daemon (alarms plus message bridge).
    Run,
    /// Run exactly one cycle and exit. No startup delay, no bridge.
    Once,
    /// Store portal credentials in the settings file.
    Creds {
        #[arg(short, long)]
        username: String,
        #[arg(short, long)]
        password: String,
    },
    /// Query a running daemon's bridge (getListAgree | nriiscookies).
    Query { method: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        "nriiswatch=debug,tower_http=debug"
    } else {
        "nriiswatch=info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .with_target(false)
        .init();

    let config_path = cli.config.clone().unwrap_or_else(WatchConfig::default_path);

    match cli.command {
        Command::Run => run_daemon(&config_path).await,
        Command::Once => run_once(&config_path).await,
        Command::Creds { username, password } => store_creds(&config_path, username, password),
        Command::Query { method } => query_bridge(&config_path, &method).await,
    }
}

fn load_config(path: &PathBuf) -> Result<WatchConfig> {
    if path.exists() {
        WatchConfig::load_from(path).with_context(|| format!("loading {}", path.display()))
    } else {
        Ok(WatchConfig::default())
    }
}

fn build_watcher(cfg: &WatchConfig, config_path: &PathBuf) -> Result<Arc<Watcher>> {
    let portal = Arc::new(NriisPortal::new(cfg.portal.clone())?);
    let sink = Arc::new(AppsScriptSink::new(&cfg.sink)?);
    let surface = Arc::new(DesktopSurface::new());
    let credentials = Arc::new(FileCredentials::new(config_path.clone()));
    Ok(Arc::new(Watcher::new(
        portal,
        sink,
        surface,
        credentials,
        RunState::new(),
        cfg.schedule.clone(),
    )))
}

async fn run_daemon(config_path: &PathBuf) -> Result<()> {
    let cfg = load_config(config_path)?;
    let watcher = build_watcher(&cfg, config_path)?;
    tracing::info!(portal = %cfg.portal.base_url, "🛰️ nriiswatch starting");

    let (trigger_tx, trigger_rx) = tokio::sync::mpsc::channel(8);

    if cfg.bridge.enabled {
        let handler = Bridge::new(Arc::clone(watcher.state()), trigger_tx.clone());
        let addr = cfg.bridge.listen_addr.clone();
        tokio::spawn(async move {
            if let Err(e) = bridge::serve(&addr, handler).await {
                tracing::error!("bridge stopped: {e}");
            }
        });
    }

    alarms::arm_startup_alarm(trigger_tx, cfg.schedule.startup_delay());
    alarms::run(watcher, cfg.schedule.poll_interval(), trigger_rx).await;
    Ok(())
}

async fn run_once(config_path: &PathBuf) -> Result<()> {
    let cfg = load_config(config_path)?;
    let watcher = build_watcher(&cfg, config_path)?;
    watcher.run_cycle().await;
    println!("latest count: {}", watcher.state().latest_count());
    Ok(())
}

fn store_creds(config_path: &PathBuf, username: String, password: String) -> Result<()> {
    let mut cfg = load_config(config_path)?;
    cfg.credentials.username = username;
    cfg.credentials.password = password;
    cfg.save_to(config_path)
        .with_context(|| format!("writing {}", config_path.display()))?;
    println!("credentials saved to {}", config_path.display());
    Ok(())
}

async fn query_bridge(config_path: &PathBuf, method: &str) -> Result<()> {
    let cfg = load_config(config_path)?;
    let url = format!("http://{}/", cfg.bridge.listen_addr);
    let resp: serde_json::Value = reqwest::Client::new()
        .post(&url)
        .json(&serde_json::json!({ "method": method }))
        .send()
        .await
        .with_context(|| format!("is the daemon running? ({url})"))?
        .json()
        .await?;
    println!("{resp}");
    Ok(())
}
