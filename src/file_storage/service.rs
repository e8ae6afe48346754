//! # File Service
//!
//! Facade over a `FileStore`: hashes uploads, builds records and applies the
//! duplicate policy. The HTTP layer only talks to this type.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::backend::FileStore;
use super::errors::{StorageError, StorageResult};
use super::hash::ContentHash;
use super::metadata::{FileMetadata, FileRecord};

/// Attempts `add_file` makes before giving up on a racing delete
const MAX_ADD_ATTEMPTS: usize = 8;

/// What `add_file` does when the payload is already stored
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DuplicatePolicy {
    /// Return the stored metadata unchanged
    #[default]
    ReturnExisting,
    /// Surface `Conflict` to the caller
    Reject,
}

/// File service for add/get/delete
#[derive(Debug, Clone)]
pub struct FileService {
    store: Arc<dyn FileStore>,
    duplicates: DuplicatePolicy,
}

impl FileService {
    pub fn new(store: Arc<dyn FileStore>) -> Self {
        Self {
            store,
            duplicates: DuplicatePolicy::default(),
        }
    }

    pub fn with_duplicate_policy(mut self, policy: DuplicatePolicy) -> Self {
        self.duplicates = policy;
        self
    }

    pub fn duplicate_policy(&self) -> DuplicatePolicy {
        self.duplicates
    }

    /// Store an uploaded payload and return its metadata.
    ///
    /// Under `ReturnExisting`, a duplicate whose stored copy is deleted
    /// before it can be read is stored again, so a concurrent delete never
    /// surfaces as `NotFound` to the uploader.
    pub fn add_file(
        &self,
        name: &str,
        content_type: &str,
        data: Vec<u8>,
    ) -> StorageResult<FileMetadata> {
        let record = FileRecord::new(name, content_type, data);
        let hash = record.hash().clone();
        info!(hash = %hash, name, size = record.metadata.size, "adding file");

        for attempt in 1..=MAX_ADD_ATTEMPTS {
            match self.store.add(&record) {
                Err(StorageError::Conflict(_)) if self.duplicates == DuplicatePolicy::ReturnExisting => {
                    debug!(hash = %hash, "payload already stored");
                    match self.store.get(&hash) {
                        Err(StorageError::NotFound(_)) => {
                            debug!(hash = %hash, attempt, "stored copy deleted concurrently, retrying add");
                        }
                        result => return result.map(|existing| existing.metadata),
                    }
                }
                result => return result,
            }
        }

        Err(StorageError::internal(
            "add",
            hash.as_str(),
            format!("add and delete kept racing after {} attempts", MAX_ADD_ATTEMPTS),
        ))
    }

    /// Fetch a file by candidate hash.
    ///
    /// A malformed candidate can never name a stored record, so it is
    /// reported as `NotFound`.
    pub fn get_file(&self, hash: &str) -> StorageResult<FileRecord> {
        let hash = Self::parse(hash)?;
        self.store.get(&hash)
    }

    /// Delete a file by candidate hash.
    pub fn delete_file(&self, hash: &str) -> StorageResult<()> {
        let hash = Self::parse(hash)?;
        self.store.delete(&hash)?;
        info!(hash = %hash, "deleted file");
        Ok(())
    }

    pub fn close(&self) {
        self.store.close();
    }

    fn parse(candidate: &str) -> StorageResult<ContentHash> {
        ContentHash::parse(candidate).ok_or_else(|| StorageError::not_found(candidate))
    }
}
