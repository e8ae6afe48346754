//! # In-Memory Backend
//!
//! Non-durable `FileStore` used as a test fake.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::RwLock;

use super::backend::FileStore;
use super::errors::{StorageError, StorageResult};
use super::hash::ContentHash;
use super::metadata::{FileMetadata, FileRecord};

#[derive(Debug, Default)]
pub struct MemoryFileStore {
    records: RwLock<HashMap<ContentHash, FileRecord>>,
    closed: AtomicBool,
}

impl MemoryFileStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored records
    pub fn len(&self) -> usize {
        self.records.read().map(|r| r.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn check_open(&self, op: &'static str, hash: &ContentHash) -> StorageResult<()> {
        if self.closed.load(Ordering::Acquire) {
            return Err(StorageError::internal(op, hash.as_str(), "store is closed"));
        }
        Ok(())
    }
}

impl FileStore for MemoryFileStore {
    fn add(&self, record: &FileRecord) -> StorageResult<FileMetadata> {
        self.check_open("add", record.hash())?;

        let mut records = self
            .records
            .write()
            .map_err(|_| StorageError::internal("add", record.hash().as_str(), "lock poisoned"))?;

        if records.contains_key(record.hash()) {
            return Err(StorageError::conflict(record.hash().as_str()));
        }

        let metadata = record.metadata.clone();
        records.insert(metadata.hash.clone(), record.clone());
        Ok(metadata)
    }

    fn get(&self, hash: &ContentHash) -> StorageResult<FileRecord> {
        self.check_open("get", hash)?;

        let records = self
            .records
            .read()
            .map_err(|_| StorageError::internal("get", hash.as_str(), "lock poisoned"))?;

        records
            .get(hash)
            .cloned()
            .ok_or_else(|| StorageError::not_found(hash.as_str()))
    }

    fn delete(&self, hash: &ContentHash) -> StorageResult<()> {
        self.check_open("delete", hash)?;

        let mut records = self
            .records
            .write()
            .map_err(|_| StorageError::internal("delete", hash.as_str(), "lock poisoned"))?;

        records
            .remove(hash)
            .map(|_| ())
            .ok_or_else(|| StorageError::not_found(hash.as_str()))
    }

    fn close(&self) {
        self.closed.store(true, Ordering::Release);
    }
}
