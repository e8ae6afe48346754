//! CLI argument definitions using clap
//!
//! Commands:
//! - aerostore serve [--config <path>] [--store <dir>] [--address <host:port>]
//! - aerostore reset [--config <path>] [--store <dir>]

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::file_storage::BackendKind;
use crate::observability::LogFormat;

/// AeroStore - A content-addressed, self-hostable file store
#[derive(Parser, Debug)]
#[command(name = "aerostore")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// Storage options shared by every command
#[derive(Args, Debug, Clone, Default)]
pub struct StoreArgs {
    /// Path to JSON configuration file
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Directory to store files in
    #[arg(long)]
    pub store: Option<PathBuf>,

    /// Storage backend
    #[arg(long, value_enum)]
    pub backend: Option<BackendKind>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Start the HTTP file server
    Serve {
        #[command(flatten)]
        store: StoreArgs,

        /// Address to listen at: host:port
        #[arg(long)]
        address: Option<String>,

        /// Log output format
        #[arg(long, value_enum)]
        log_format: Option<LogFormat>,
    },

    /// Delete every stored file
    Reset {
        #[command(flatten)]
        store: StoreArgs,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
