mod common;
mod config;
mod headless;
mod network;
mod ui;

use std::error::Error;
use std::time::Duration;

use clap::{Parser, Subcommand};
use common::NetworkCommand;
use config::{BackendConfig, ChannelSettings};
use dotenvy::dotenv;
use network::{BackendHandle, ChatClient};
use tokio::sync::mpsc;
use ui::ChatApp;

const SHUTDOWN_GRACE: Duration = Duration::from_secs(3);

#[derive(Parser)]
#[command(
    name = "hyper_talk",
    version,
    about = "Realtime chat client for a hosted messages table"
)]
struct Cli {
    /// Backend project URL
    #[arg(long, env = config::URL_ENV, value_name = "URL")]
    url: Option<String>,
    /// Public (anon) API key
    #[arg(long, env = config::ANON_KEY_ENV, value_name = "KEY", hide_env_values = true)]
    anon_key: Option<String>,
    /// Realtime channel name
    #[arg(long, default_value = config::DEFAULT_CHANNEL)]
    channel: String,
    /// Table holding the messages
    #[arg(long, default_value = config::DEFAULT_TABLE)]
    table: String,
    /// Database schema of the table
    #[arg(long, default_value = config::DEFAULT_SCHEMA)]
    schema: String,
    /// Realtime keepalive interval
    #[arg(
        long,
        default_value_t = config::DEFAULT_HEARTBEAT_SECS,
        value_parser = clap::value_parser!(u64).range(1..),
        value_name = "SECS"
    )]
    heartbeat_secs: u64,
    /// Give up on the realtime handshake after this long
    #[arg(
        long,
        default_value_t = config::DEFAULT_JOIN_TIMEOUT_SECS,
        value_parser = clap::value_parser!(u64).range(1..),
        value_name = "SECS"
    )]
    join_timeout_secs: u64,
    #[command(subcommand)]
    mode: Option<Mode>,
}

#[derive(Subcommand, Clone, PartialEq, Eq)]
enum Mode {
    /// Print messages to the terminal as they arrive (no window)
    Tail,
    /// Insert a single message and exit
    Send { text: String },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    dotenv().ok();
    env_logger::init();

    let cli = Cli::parse();
    let settings = ChannelSettings {
        channel: cli.channel,
        schema: cli.schema,
        table: cli.table,
        heartbeat: Duration::from_secs(cli.heartbeat_secs),
        join_timeout: Duration::from_secs(cli.join_timeout_secs),
    };

    let config = match BackendConfig::new(cli.url, cli.anon_key) {
        Ok(config) => config,
        Err(err) => {
            log::error!("Cannot create backend client: {err}");
            return Err(err.into());
        }
    };
    let handle = BackendHandle::new(config)?;

    match cli.mode {
        Some(Mode::Tail) => headless::tail(handle, settings).await,
        Some(Mode::Send { text }) => headless::send_once(&handle, &settings, &text).await?,
        None => run_window(handle, settings).await?,
    }

    Ok(())
}

async fn run_window(
    handle: BackendHandle,
    settings: ChannelSettings,
) -> Result<(), eframe::Error> {
    // UI -> network
    let (cmd_tx, cmd_rx) = mpsc::channel(100);
    // Network -> UI
    let (event_tx, event_rx) = mpsc::channel(100);

    let network = tokio::spawn(ChatClient::new(handle, settings, event_tx, cmd_rx).run());

    let options = eframe::NativeOptions::default();
    let mut event_rx = Some(event_rx);
    let ui_cmd_tx = cmd_tx.clone();

    let result = eframe::run_native(
        "Hyper-Talk",
        options,
        Box::new(move |cc| {
            let event_receiver = event_rx
                .take()
                .expect("ChatApp should only be initialized once");

            Ok(Box::new(ChatApp::new(cc, ui_cmd_tx.clone(), event_receiver)))
        }),
    );

    // The app normally tears down on close; this covers an aborted event loop.
    if cmd_tx.send(NetworkCommand::Shutdown).await.is_err() {
        log::debug!("Network task already stopped");
    }
    drop(cmd_tx);
    match tokio::time::timeout(SHUTDOWN_GRACE, network).await {
        Ok(Ok(())) => {}
        Ok(Err(err)) => log::error!("Network task failed: {err}"),
        Err(_) => log::warn!("Network task did not stop within {SHUTDOWN_GRACE:?}"),
    }

    result
}
