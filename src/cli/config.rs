//! Configuration file structure
//!
//! Every field is optional; a missing file section takes its defaults.
//!
//! ```json
//! {
//!   "http": { "host": "127.0.0.1", "port": 8080, "max_upload_bytes": 67108864 },
//!   "store": { "directory": "/var/lib/aerostore", "backend": "sqlite" },
//!   "duplicate_policy": "return-existing",
//!   "log_format": "text"
//! }
//! ```

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::args::StoreArgs;
use super::errors::{CliError, CliResult};
use crate::file_storage::{DuplicatePolicy, StoreConfig};
use crate::http_server::HttpServerConfig;
use crate::observability::LogFormat;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub http: HttpServerConfig,

    #[serde(default)]
    pub store: StoreConfig,

    #[serde(default)]
    pub duplicate_policy: DuplicatePolicy,

    #[serde(default)]
    pub log_format: LogFormat,
}

impl Config {
    /// Load configuration from file
    pub fn load(path: &Path) -> CliResult<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| CliError::Config(format!("Failed to read config {}: {}", path.display(), e)))?;

        serde_json::from_str(&content)
            .map_err(|e| CliError::Config(format!("Invalid config JSON: {}", e)))
    }

    /// Load the file named by `args` (or defaults) and apply flag overrides.
    pub fn resolve(args: &StoreArgs) -> CliResult<Self> {
        let mut config = match &args.config {
            Some(path) => Self::load(path)?,
            None => Self::default(),
        };

        if let Some(dir) = &args.store {
            config.store.directory = dir.clone();
        }
        if let Some(backend) = args.backend {
            config.store.backend = backend;
        }
        Ok(config)
    }

    pub fn validate(&self) -> CliResult<()> {
        if self.http.port == 0 {
            return Err(CliError::Config("http.port must be > 0".to_string()));
        }
        if self.http.max_upload_bytes == 0 {
            return Err(CliError::Config("http.max_upload_bytes must be > 0".to_string()));
        }
        self.store
            .validate()
            .map_err(|e| CliError::Config(e.to_string()))
    }
}
