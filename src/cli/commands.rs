//! CLI command implementations
//!
//! `serve` opens the store before binding; any failure up to that point
//! aborts startup without serving a request.

use std::sync::Arc;

use tracing::info;

use super::args::{Command, StoreArgs};
use super::config::Config;
use super::errors::{CliError, CliResult};
use crate::file_storage::{open_store, reset_store, FileService};
use crate::http_server::HttpServer;
use crate::observability::{init_logging, LogFormat};

/// Main CLI entry point
///
/// Parses arguments and dispatches to the appropriate command.
/// This is the only function that main.rs should call.
pub fn run() -> CliResult<()> {
    let cli = super::args::Cli::parse_args();
    run_command(cli.command)
}

/// Run the appropriate command based on CLI args
pub fn run_command(cmd: Command) -> CliResult<()> {
    match cmd {
        Command::Serve {
            store,
            address,
            log_format,
        } => serve(&store, address.as_deref(), log_format),
        Command::Reset { store } => reset(&store),
    }
}

/// Start the HTTP file server.
///
/// 1. Load and validate configuration
/// 2. Open the store (creates directory and schema)
/// 3. Bind and serve until Ctrl-C
/// 4. Close the store
pub fn serve(args: &StoreArgs, address: Option<&str>, log_format: Option<LogFormat>) -> CliResult<()> {
    let mut config = Config::resolve(args)?;
    if let Some(address) = address {
        config.http.set_address(address).map_err(CliError::Config)?;
    }
    if let Some(format) = log_format {
        config.log_format = format;
    }
    config.validate()?;

    init_logging(config.log_format);

    let store = open_store(&config.store).map_err(CliError::boot_failed)?;
    info!(
        directory = %config.store.directory.display(),
        backend = ?config.store.backend,
        "storage ready"
    );

    let service = FileService::new(Arc::clone(&store)).with_duplicate_policy(config.duplicate_policy);
    let server = HttpServer::new(config.http.clone(), service);

    let rt = tokio::runtime::Runtime::new()
        .map_err(|e| CliError::BootFailed(format!("Failed to create tokio runtime: {}", e)))?;

    let served = rt.block_on(server.start());
    // start() closes the store on a clean exit; close again in case bind failed.
    store.close();

    served.map_err(|e| CliError::BootFailed(format!("HTTP server failed: {}", e)))
}

/// Remove every persisted file for the configured backend.
pub fn reset(args: &StoreArgs) -> CliResult<()> {
    let config = Config::resolve(args)?;
    config.validate()?;

    init_logging(config.log_format);

    reset_store(&config.store).map_err(|e| CliError::ResetFailed(e.to_string()))?;
    info!(directory = %config.store.directory.display(), "store reset");
    Ok(())
}
