//! promptkeeper - manage prompts stored on a remote API from the terminal.
//!
//! Signs in against the API's `auth/local` endpoints, keeps the session token
//! between runs, and offers list/create/edit/delete commands on the prompt
//! collection.

mod input;
mod shell;

use std::io;
use std::path::Path;

use anyhow::{Context, Result};
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use promptkeeper_core::{ApiClient, Config, ResourceSyncEngine, SessionController};

use input::TerminalPrompter;
use shell::ApplicationShell;

/// Log file prefix inside `<data_dir>/logs`
const LOG_FILE_PREFIX: &str = "promptkeeper.log";

/// Initialize the tracing subscriber for logging.
///
/// Logs go to a daily file so they never mix with the interactive prompt.
/// Use RUST_LOG to control the level (e.g., RUST_LOG=debug).
fn init_tracing(data_dir: &Path) -> WorkerGuard {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    let appender = tracing_appender::rolling::daily(data_dir.join("logs"), LOG_FILE_PREFIX);
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

    let config_path = Config::default_path()?;
    let config_result = Config::load_from(&config_path);
    let config = config_result.as_ref().cloned().unwrap_or_default();

    let data_dir = config.data_dir()?;
    let _log_guard = init_tracing(&data_dir);
    info!("promptkeeper starting");

    if let Err(e) = config_result {
        warn!(error = %e, "Failed to load config, using defaults");
    }

    let api_url = config.api_url();
    info!(api_url = %api_url, backend = ?config.credential_backend, "Configuration resolved");

    let api = ApiClient::new(&api_url)?;
    let store = config
        .credential_store()
        .context("Failed to set up credential storage")?;
    let engine = ResourceSyncEngine::new(api.clone());
    let session = SessionController::restore(api, store, engine);

    let mut shell = ApplicationShell::new(config, session, TerminalPrompter::new(), io::stdout())
        .with_config_path(config_path);
    let result = shell.run().await;

    info!("promptkeeper shutting down");
    result
}
