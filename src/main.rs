//! bg3-client - multiworld client for Baldur's Gate 3.
//!
//! Environment variables (flags win over them):
//! - BG3_AP_SERVER: server address, `host[:port]`
//! - BG3_AP_SLOT: slot name
//! - BG3_AP_PASSWORD: room password
//! - BG3_BRIDGE_DIR: Script Extender directory holding the bridge files
//! - BG3_TICK_MS: reconciler interval in milliseconds
//! - BG3_AP_TABLE: JSON translation table replacing the built-in one
//! - RUST_LOG: log filter, default `bg3_bridge=info`

use std::io;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tokio::io::BufReader;
use tokio::sync::watch;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use bg3_bridge::bridge::FileBridgeStore;
use bg3_bridge::command::CommandSurface;
use bg3_bridge::config::{BridgeConfig, BridgeConfigBuilder};
use bg3_bridge::session::RemoteSession;
use bg3_bridge::sync::{ProgressReconciler, SyncFlag};
use bg3_bridge::translate::IdentifierTranslator;

#[derive(Parser, Debug)]
#[command(name = "bg3-client")]
#[command(about = "Multiworld client bridging Baldur's Gate 3 and an Archipelago server")]
#[command(version)]
struct Args {
    /// Server address; without it the client waits for /connect
    #[arg(short, long)]
    server: Option<String>,

    /// Slot name
    #[arg(long)]
    slot: Option<String>,

    /// Room password
    #[arg(long)]
    password: Option<String>,

    /// Script Extender directory holding ap_in.json and ap_out.json
    #[arg(long, value_name = "DIR")]
    bridge_dir: Option<PathBuf>,

    /// Reconciler interval in milliseconds
    #[arg(long, value_name = "MS")]
    tick_ms: Option<u64>,

    /// JSON translation table replacing the built-in one
    #[arg(long, value_name = "FILE")]
    table: Option<PathBuf>,

    /// Do not read operator commands from stdin
    #[arg(long)]
    no_console: bool,
}

impl Args {
    fn apply(&self, config: BridgeConfig) -> BridgeConfig {
        let mut builder = BridgeConfigBuilder::from_config(config);
        if let Some(server) = &self.server {
            builder = builder.server(server.clone());
        }
        if let Some(slot) = &self.slot {
            builder = builder.slot_name(slot.clone());
        }
        if let Some(password) = &self.password {
            builder = builder.password(password.clone());
        }
        if let Some(dir) = &self.bridge_dir {
            builder = builder.bridge_dir(dir.clone());
        }
        if let Some(ms) = self.tick_ms {
            builder = builder.tick_interval(Duration::from_millis(ms));
        }
        if let Some(table) = &self.table {
            builder = builder.table_path(table.clone());
        }
        builder.build()
    }
}

fn main() -> ExitCode {
    let args = Args::parse();

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("bg3_bridge=info"));
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    let runtime = match tokio::runtime::Builder::new_multi_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(err) => {
            error!(error = %err, "failed to start the async runtime");
            return ExitCode::FAILURE;
        }
    };
    let result = runtime.block_on(run(args));
    // Stdin reads park a blocking thread that never returns on its own.
    runtime.shutdown_timeout(Duration::from_millis(250));

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{err:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args) -> anyhow::Result<()> {
    let config = args.apply(BridgeConfig::from_env()?);
    config.validate()?;
    info!(config = ?config, "starting bg3-client");

    let table = Arc::new(config.load_table()?);
    let store = FileBridgeStore::open(&config.bridge_dir)?;
    info!(dir = %store.dir().display(), "bridge files ready");

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let sync_flag = SyncFlag::new();

    let (session, handle) = RemoteSession::new(config.session_config(), shutdown_rx.clone());
    let reconciler = ProgressReconciler::new(
        store.clone(),
        store,
        handle.clone(),
        IdentifierTranslator::new(table),
        sync_flag.clone(),
    );
    let commands = CommandSurface::new(
        sync_flag,
        handle.subscribe(),
        handle.control(),
        shutdown_tx.clone(),
    );

    if config.server.is_none() {
        warn!("no server configured; use /connect <address>");
    }

    let session_task = tokio::spawn(session.run());
    let reconciler_task = tokio::spawn(reconciler.run(
        handle.subscribe(),
        shutdown_rx.clone(),
        config.tick_interval,
    ));
    if !args.no_console {
        tokio::spawn(commands.run(BufReader::new(tokio::io::stdin())));
    }

    wait_for_stop(tokio::signal::ctrl_c(), shutdown_rx).await;
    shutdown_tx.send_replace(true);

    let _ = reconciler_task.await;
    let _ = session_task.await;
    info!("bye");
    Ok(())
}

/// Resolve on ctrl-c or a shutdown request. When the signal handler cannot
/// be installed only the shutdown request remains.
async fn wait_for_stop<F>(interrupt: F, mut shutdown: watch::Receiver<bool>)
where
    F: Future<Output = io::Result<()>>,
{
    let interrupted = async {
        match interrupt.await {
            Ok(()) => info!("interrupted, shutting down"),
            Err(err) => {
                warn!(error = %err, "failed to listen for ctrl-c; use /exit to stop");
                std::future::pending::<()>().await
            }
        }
    };

    tokio::select! {
        _ = interrupted => {}
        _ = shutdown.wait_for(|stop| *stop) => {}
    }
}
