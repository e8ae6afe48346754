//! # Storage Backend Trait

use super::errors::StorageResult;
use super::hash::ContentHash;
use super::metadata::{FileMetadata, FileRecord};

/// Durable store of file records keyed by content hash.
///
/// Implementations must make a single record's insert and removal atomic,
/// must never overwrite an existing hash, and must be safe to share across
/// threads.
pub trait FileStore: Send + Sync + std::fmt::Debug {
    /// Insert a record. Fails with `Conflict` if the hash is already stored.
    fn add(&self, record: &FileRecord) -> StorageResult<FileMetadata>;

    /// Fetch a record. Fails with `NotFound` if absent.
    fn get(&self, hash: &ContentHash) -> StorageResult<FileRecord>;

    /// Remove a record. Fails with `NotFound` if absent.
    fn delete(&self, hash: &ContentHash) -> StorageResult<()>;

    /// Release underlying resources. Safe to call more than once.
    fn close(&self);
}
