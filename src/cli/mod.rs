//! CLI module for AeroStore
//!
//! - serve: open the store and run the HTTP server
//! - reset: delete the persisted store

mod args;
mod commands;
mod config;
mod errors;

pub use args::{Cli, Command, StoreArgs};
pub use commands::{reset, run, run_command, serve};
pub use config::Config;
pub use errors::{CliError, CliResult};
