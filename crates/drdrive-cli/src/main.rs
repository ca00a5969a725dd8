//! DrDrive CLI - a terminal front-end for the DrDrive vehicle diagnostics assistant.
//!
//! Sign in, manage your profile and ask the backend to diagnose a problem
//! with your car from a description and an optional photo.

mod commands;
mod navigation;
mod prompt;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Result;
use drdrive_core::{storage, ApiClient, Config, SessionManager};
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use commands::{Command, USAGE};
use navigation::{Navigator, Screen};

/// Log file name prefix; the appender adds a date suffix
const LOG_FILE_PREFIX: &str = "drdrive.log";

/// Initialize the tracing subscriber, writing to a daily log file.
/// The returned guard flushes buffered lines when dropped.
fn init_tracing(log_dir: &Path) -> WorkerGuard {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    let appender = tracing_appender::rolling::daily(log_dir, LOG_FILE_PREFIX);
    let (writer, guard) = tracing_appender::non_blocking(appender);

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(writer).with_ansi(false))
        .with(filter)
        .init();

    guard
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let command = match Command::parse(&args) {
        Ok(command) => command,
        Err(msg) => {
            eprintln!("{}\n\n{}", msg, USAGE);
            std::process::exit(2);
        }
    };
    if command == Command::Help {
        println!("{}", USAGE);
        return Ok(());
    }

    let (mut config, config_error) = match Config::load() {
        Ok(c) => (c, None),
        Err(e) => (Config::default(), Some(e)),
    };

    let log_dir = config
        .data_dir()
        .map(|dir| dir.join("logs"))
        .unwrap_or_else(|_| PathBuf::from("./logs"));
    let log_guard = init_tracing(&log_dir);
    info!("DrDrive starting");
    if let Some(e) = config_error {
        warn!(error = %e, "Failed to load config, using defaults");
    }

    let store = storage::open(&config)?;
    let api = ApiClient::from_config(&config)?;
    info!(base_url = api.base_url(), storage = ?config.storage, "Backend configured");

    let session = Arc::new(SessionManager::new(api, store));
    let mut navigator = Navigator::new(session.subscribe());

    session.restore().await;
    let screen = navigator.wait_until_restored().await;
    if screen == Screen::SignIn && !matches!(command, Command::Login { .. } | Command::Register) {
        commands::show(screen, &session);
    }

    let result = commands::run(command, &session, &mut navigator, &mut config).await;

    info!("DrDrive shutting down");
    drop(log_guard);

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
    Ok(())
}
