//! # AeroStore File Storage Module
//!
//! Content-addressed file storage: a file's identity is the SHA-256 digest of
//! its bytes, and each backend keeps at most one record per digest.

pub mod backend;
pub mod checksum;
pub mod config;
pub mod disk;
pub mod errors;
pub mod hash;
pub mod memory;
pub mod metadata;
pub mod record;
pub mod service;
pub mod sqlite;

pub use backend::FileStore;
pub use config::{open_store, reset_store, BackendKind, StoreConfig};
pub use disk::DiskFileStore;
pub use errors::{StorageError, StorageResult};
pub use hash::ContentHash;
pub use memory::MemoryFileStore;
pub use metadata::{content_type_for, FileMetadata, FileRecord};
pub use service::{DuplicatePolicy, FileService};
pub use sqlite::SqliteFileStore;
