//! # Disk Backend
//!
//! Content-addressed object files, sharded by hash prefix:
//!
//! ```text
//! <root>/objects/2c/2cf24dba...9824
//! <root>/tmp/<uuid>.tmp
//! ```
//!
//! A write lands in `tmp/`, is fsynced, then published with `hard_link`,
//! which fails if the target exists. Publishing and deleting are each a
//! single filesystem operation, so a record is either fully visible or
//! absent.

use std::fs::{self, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::{debug, info, warn};
use uuid::Uuid;

use super::backend::FileStore;
use super::config::StoreConfig;
use super::errors::{StorageError, StorageResult};
use super::hash::ContentHash;
use super::metadata::{FileMetadata, FileRecord};
use super::record::{decode_record, write_record};

const OBJECTS_DIR: &str = "objects";
const TMP_DIR: &str = "tmp";

/// Filesystem storage backend
#[derive(Debug)]
pub struct DiskFileStore {
    root: PathBuf,
    closed: AtomicBool,
}

impl DiskFileStore {
    /// Open the store, creating its directories and discarding unpublished
    /// writes left by a crash.
    pub fn open(config: &StoreConfig) -> StorageResult<Self> {
        let root = config.directory.clone();

        for dir in [root.join(OBJECTS_DIR), root.join(TMP_DIR)] {
            fs::create_dir_all(&dir).map_err(|e| {
                StorageError::Internal(format!(
                    "Failed to create directory {}: {}",
                    dir.display(),
                    e
                ))
            })?;
        }

        let store = Self {
            root,
            closed: AtomicBool::new(false),
        };
        store.clear_tmp()?;

        info!(path = %store.root.display(), "opened disk file store");
        Ok(store)
    }

    /// Remove the object tree and scratch directory.
    pub fn reset(config: &StoreConfig) -> StorageResult<()> {
        for dir in [config.directory.join(OBJECTS_DIR), config.directory.join(TMP_DIR)] {
            match fs::remove_dir_all(&dir) {
                Ok(()) => info!(path = %dir.display(), "removed"),
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => {
                    return Err(StorageError::Internal(format!(
                        "Failed to remove {}: {}",
                        dir.display(),
                        e
                    )))
                }
            }
        }
        Ok(())
    }

    fn clear_tmp(&self) -> StorageResult<()> {
        let tmp = self.root.join(TMP_DIR);
        let entries = fs::read_dir(&tmp).map_err(|e| {
            StorageError::Internal(format!("Failed to read {}: {}", tmp.display(), e))
        })?;

        for entry in entries.flatten() {
            let path = entry.path();
            if let Err(e) = fs::remove_file(&path) {
                warn!(path = %path.display(), error = %e, "could not remove stale temp file");
            } else {
                debug!(path = %path.display(), "removed stale temp file");
            }
        }
        Ok(())
    }

    fn object_path(&self, hash: &ContentHash) -> PathBuf {
        self.root
            .join(OBJECTS_DIR)
            .join(hash.shard())
            .join(hash.as_str())
    }

    fn check_open(&self, op: &'static str, hash: &ContentHash) -> StorageResult<()> {
        if self.closed.load(Ordering::Acquire) {
            return Err(StorageError::internal(op, hash.as_str(), "store is closed"));
        }
        Ok(())
    }

    /// Write the record to a fresh temp file and fsync it.
    fn write_tmp(&self, record: &FileRecord) -> io::Result<PathBuf> {
        let tmp_path = self.root.join(TMP_DIR).join(format!("{}.tmp", Uuid::new_v4()));

        let file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&tmp_path)?;

        let mut writer = BufWriter::new(file);
        let written = write_record(&mut writer, record)
            .and_then(|_| writer.flush())
            .and_then(|_| writer.get_ref().sync_all());

        if let Err(e) = written {
            let _ = fs::remove_file(&tmp_path);
            return Err(e);
        }
        Ok(tmp_path)
    }

    /// Publish `tmp_path` at `target`. Fails with `AlreadyExists` if taken.
    fn publish(tmp_path: &Path, target: &Path) -> io::Result<()> {
        let linked = fs::hard_link(tmp_path, target);
        if let Err(e) = fs::remove_file(tmp_path) {
            warn!(path = %tmp_path.display(), error = %e, "could not remove temp file");
        }
        linked?;

        if let Some(parent) = target.parent() {
            sync_dir(parent)?;
        }
        Ok(())
    }
}

#[cfg(unix)]
fn sync_dir(dir: &Path) -> io::Result<()> {
    fs::File::open(dir)?.sync_all()
}

#[cfg(not(unix))]
fn sync_dir(_dir: &Path) -> io::Result<()> {
    Ok(())
}

impl FileStore for DiskFileStore {
    fn add(&self, record: &FileRecord) -> StorageResult<FileMetadata> {
        let hash = record.hash().clone();
        self.check_open("add", &hash)?;

        let target = self.object_path(&hash);
        if target.exists() {
            return Err(StorageError::conflict(hash.as_str()));
        }

        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).map_err(|e| StorageError::internal("add", hash.as_str(), e))?;
        }

        let tmp_path = self
            .write_tmp(record)
            .map_err(|e| StorageError::internal("add", hash.as_str(), e))?;

        match Self::publish(&tmp_path, &target) {
            Ok(()) => {
                debug!(hash = %hash, size = record.metadata.size, "stored object");
                Ok(record.metadata.clone())
            }
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                Err(StorageError::conflict(hash.as_str()))
            }
            Err(e) => Err(StorageError::internal("add", hash.as_str(), e)),
        }
    }

    fn get(&self, hash: &ContentHash) -> StorageResult<FileRecord> {
        self.check_open("get", hash)?;

        let bytes = fs::read(self.object_path(hash)).map_err(|e| {
            if e.kind() == io::ErrorKind::NotFound {
                StorageError::not_found(hash.as_str())
            } else {
                StorageError::internal("get", hash.as_str(), e)
            }
        })?;

        let record = decode_record(&bytes).map_err(|e| StorageError::internal("get", hash.as_str(), e))?;

        if record.hash() != hash {
            return Err(StorageError::internal(
                "get",
                hash.as_str(),
                format!("object file holds record for {}", record.hash()),
            ));
        }
        Ok(record)
    }

    fn delete(&self, hash: &ContentHash) -> StorageResult<()> {
        self.check_open("delete", hash)?;

        let path = self.object_path(hash);
        fs::remove_file(&path).map_err(|e| {
            if e.kind() == io::ErrorKind::NotFound {
                StorageError::not_found(hash.as_str())
            } else {
                StorageError::internal("delete", hash.as_str(), e)
            }
        })?;

        if let Some(parent) = path.parent() {
            if let Err(e) = sync_dir(parent) {
                warn!(hash = %hash, error = %e, "could not sync shard directory after delete");
            }
        }
        Ok(())
    }

    fn close(&self) {
        if !self.closed.swap(true, Ordering::AcqRel) {
            info!(path = %self.root.display(), "closed disk file store");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn create_test_store() -> (DiskFileStore, TempDir) {
        let temp = TempDir::new().unwrap();
        let store = DiskFileStore::open(&StoreConfig::at(temp.path())).unwrap();
        (store, temp)
    }

    #[test]
    fn test_write_read() {
        let (store, _temp) = create_test_store();
        let record = FileRecord::new("hello.txt", "text/plain", b"hello".to_vec());

        store.add(&record).unwrap();
        assert_eq!(store.get(record.hash()).unwrap(), record);
    }

    #[test]
    fn test_sharded_layout() {
        let (store, temp) = create_test_store();
        let record = FileRecord::new("hello.txt", "text/plain", b"hello".to_vec());
        store.add(&record).unwrap();

        let expected = temp
            .path()
            .join("objects")
            .join("2c")
            .join(record.hash().as_str());
        assert!(expected.is_file());
    }

    #[test]
    fn test_conflict_keeps_original() {
        let (store, _temp) = create_test_store();
        let first = FileRecord::new("first.txt", "text/plain", b"same".to_vec());
        store.add(&first).unwrap();

        let result = store.add(&FileRecord::new("second.txt", "", b"same".to_vec()));
        assert!(matches!(result, Err(StorageError::Conflict(_))));
        assert_eq!(store.get(first.hash()).unwrap(), first);
    }

    #[test]
    fn test_delete() {
        let (store, _temp) = create_test_store();
        let record = FileRecord::new("bye.txt", "text/plain", b"bye".to_vec());
        store.add(&record).unwrap();

        store.delete(record.hash()).unwrap();
        assert!(matches!(store.delete(record.hash()), Err(StorageError::NotFound(_))));
        assert!(matches!(store.get(record.hash()), Err(StorageError::NotFound(_))));

        // deleted hashes can be stored again
        store.add(&record).unwrap();
        assert_eq!(store.get(record.hash()).unwrap(), record);
    }

    #[test]
    fn test_corruption_is_internal() {
        let (store, _temp) = create_test_store();
        let record = FileRecord::new("c.bin", "", vec![7u8; 128]);
        store.add(&record).unwrap();

        let path = store.object_path(record.hash());
        let mut contents = fs::read(&path).unwrap();
        let mid = contents.len() / 2;
        contents[mid] ^= 0xFF;
        fs::write(&path, contents).unwrap();

        assert!(matches!(store.get(record.hash()), Err(StorageError::Internal(_))));
    }

    #[test]
    fn test_stale_tmp_cleared_on_open() {
        let temp = TempDir::new().unwrap();
        let config = StoreConfig::at(temp.path());
        DiskFileStore::open(&config).unwrap();

        let stale = temp.path().join("tmp").join("leftover.tmp");
        fs::write(&stale, b"partial").unwrap();

        DiskFileStore::open(&config).unwrap();
        assert!(!stale.exists());
    }

    #[test]
    fn test_tmp_empty_after_add() {
        let (store, temp) = create_test_store();
        store.add(&FileRecord::new("a", "", b"a".to_vec())).unwrap();
        let _ = store.add(&FileRecord::new("b", "", b"a".to_vec()));

        let leftovers = fs::read_dir(temp.path().join("tmp")).unwrap().count();
        assert_eq!(leftovers, 0);
    }

    #[test]
    fn test_reset() {
        let temp = TempDir::new().unwrap();
        let config = StoreConfig::at(temp.path());
        let store = DiskFileStore::open(&config).unwrap();
        store.add(&FileRecord::new("a", "", b"a".to_vec())).unwrap();

        DiskFileStore::reset(&config).unwrap();
        assert!(!temp.path().join("objects").exists());
    }
}
