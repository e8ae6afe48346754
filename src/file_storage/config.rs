//! Storage configuration and backend selection

use std::path::PathBuf;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::backend::FileStore;
use super::disk::DiskFileStore;
use super::errors::{StorageError, StorageResult};
use super::sqlite::SqliteFileStore;

/// Which durable backend to open
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// Single SQLite database file
    #[default]
    Sqlite,
    /// Hash-sharded object files
    Disk,
}

/// Storage configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Directory holding all persisted state; created if missing
    #[serde(default = "default_directory")]
    pub directory: PathBuf,

    #[serde(default)]
    pub backend: BackendKind,

    /// Database file name inside `directory` (sqlite backend)
    #[serde(default = "default_database_file")]
    pub database_file: String,

    /// Table name (sqlite backend)
    #[serde(default = "default_table")]
    pub table: String,
}

pub fn default_directory() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".aerostore")
}

fn default_database_file() -> String {
    "aerostore.db".to_string()
}

fn default_table() -> String {
    "files".to_string()
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            directory: default_directory(),
            backend: BackendKind::default(),
            database_file: default_database_file(),
            table: default_table(),
        }
    }
}

impl StoreConfig {
    /// Config rooted at `directory` with every other field defaulted
    pub fn at(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
            ..Default::default()
        }
    }

    pub fn with_backend(mut self, backend: BackendKind) -> Self {
        self.backend = backend;
        self
    }

    pub fn validate(&self) -> StorageResult<()> {
        if !is_identifier(&self.table) {
            return Err(StorageError::Internal(format!(
                "Invalid table name: '{}'",
                self.table
            )));
        }

        let file = std::path::Path::new(&self.database_file);
        if self.database_file.is_empty() || file.components().count() != 1 {
            return Err(StorageError::Internal(format!(
                "Invalid database file name: '{}'",
                self.database_file
            )));
        }

        Ok(())
    }

    /// Path of the SQLite database file
    pub fn database_path(&self) -> PathBuf {
        self.directory.join(&self.database_file)
    }
}

/// SQL identifiers are spliced into statements, so only allow `[A-Za-z_][A-Za-z0-9_]*`.
fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Open the configured backend.
///
/// Creates the storage directory and schema if needed. Any failure here is a
/// startup failure.
pub fn open_store(config: &StoreConfig) -> StorageResult<Arc<dyn FileStore>> {
    config.validate()?;

    let store: Arc<dyn FileStore> = match config.backend {
        BackendKind::Sqlite => Arc::new(SqliteFileStore::open(config)?),
        BackendKind::Disk => Arc::new(DiskFileStore::open(config)?),
    };
    Ok(store)
}

/// Remove everything the configured backend persisted.
pub fn reset_store(config: &StoreConfig) -> StorageResult<()> {
    config.validate()?;

    match config.backend {
        BackendKind::Sqlite => SqliteFileStore::reset(config),
        BackendKind::Disk => DiskFileStore::reset(config),
    }
}
