//! # SQLite Backend
//!
//! One table keyed on the hash column. The primary-key constraint enforces
//! one record per hash; a single connection behind a mutex serializes
//! writers.

use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;

use rusqlite::{params, Connection, ErrorCode, OptionalExtension};
use tracing::{debug, info, warn};

use super::backend::FileStore;
use super::config::StoreConfig;
use super::errors::{StorageError, StorageResult};
use super::hash::ContentHash;
use super::metadata::{FileMetadata, FileRecord};

/// Statements built once per store from the configured table name
#[derive(Debug)]
struct Statements {
    create: String,
    insert: String,
    select: String,
    delete: String,
}

impl Statements {
    fn for_table(table: &str) -> Self {
        Self {
            create: format!(
                "create table if not exists {table}(\
                 hash char(64) not null primary key, \
                 size bigint not null, \
                 name varchar(512) not null, \
                 contentType varchar(128) not null, \
                 data blob not null);"
            ),
            insert: format!(
                "insert into {table}(hash, size, name, contentType, data) values(?1, ?2, ?3, ?4, ?5);"
            ),
            select: format!(
                "select hash, size, name, contentType, data from {table} where hash = ?1;"
            ),
            delete: format!("delete from {table} where hash = ?1;"),
        }
    }
}

#[derive(Debug)]
pub struct SqliteFileStore {
    path: PathBuf,
    statements: Statements,
    /// `None` once closed
    conn: Mutex<Option<Connection>>,
}

impl SqliteFileStore {
    /// Open (or create) the database and its table.
    pub fn open(config: &StoreConfig) -> StorageResult<Self> {
        config.validate()?;

        fs::create_dir_all(&config.directory).map_err(|e| {
            StorageError::Internal(format!(
                "Failed to create storage directory {}: {}",
                config.directory.display(),
                e
            ))
        })?;

        let path = config.database_path();
        let conn = Connection::open(&path).map_err(|e| {
            StorageError::Internal(format!("Failed to open database {}: {}", path.display(), e))
        })?;

        let statements = Statements::for_table(&config.table);
        conn.execute_batch(&format!("pragma synchronous = FULL; {}", statements.create))
            .map_err(|e| StorageError::Internal(format!("Failed to create tables: {}", e)))?;

        info!(path = %path.display(), table = %config.table, "opened sqlite file store");

        Ok(Self {
            path,
            statements,
            conn: Mutex::new(Some(conn)),
        })
    }

    /// Delete the database file and its rollback journal.
    pub fn reset(config: &StoreConfig) -> StorageResult<()> {
        let path = config.database_path();
        let journal = PathBuf::from(format!("{}-journal", path.display()));

        for file in [&path, &journal] {
            match fs::remove_file(file) {
                Ok(()) => info!(path = %file.display(), "removed"),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => {
                    return Err(StorageError::Internal(format!(
                        "Failed to remove {}: {}",
                        file.display(),
                        e
                    )))
                }
            }
        }
        Ok(())
    }

    pub fn path(&self) -> &std::path::Path {
        &self.path
    }

    fn with_conn<T>(
        &self,
        op: &'static str,
        hash: &ContentHash,
        f: impl FnOnce(&Connection) -> StorageResult<T>,
    ) -> StorageResult<T> {
        let guard = self
            .conn
            .lock()
            .map_err(|_| StorageError::internal(op, hash.as_str(), "connection lock poisoned"))?;

        match guard.as_ref() {
            Some(conn) => f(conn),
            None => Err(StorageError::internal(op, hash.as_str(), "store is closed")),
        }
    }
}

impl FileStore for SqliteFileStore {
    fn add(&self, record: &FileRecord) -> StorageResult<FileMetadata> {
        let meta = &record.metadata;
        debug!(hash = %meta.hash, name = %meta.name, content_type = %meta.content_type, "add file");

        self.with_conn("add", &meta.hash, |conn| {
            let size = i64::try_from(meta.size)
                .map_err(|e| StorageError::internal("add", meta.hash.as_str(), e))?;

            let result = conn.execute(
                &self.statements.insert,
                params![meta.hash.as_str(), size, meta.name, meta.content_type, record.data],
            );

            match result {
                Ok(1) => Ok(record.metadata.clone()),
                Ok(count) => Err(StorageError::internal(
                    "add",
                    meta.hash.as_str(),
                    format!("insert affected {} rows", count),
                )),
                Err(rusqlite::Error::SqliteFailure(e, _)) if e.code == ErrorCode::ConstraintViolation => {
                    Err(StorageError::conflict(meta.hash.as_str()))
                }
                Err(e) => Err(StorageError::internal("add", meta.hash.as_str(), e)),
            }
        })
    }

    fn get(&self, hash: &ContentHash) -> StorageResult<FileRecord> {
        self.with_conn("get", hash, |conn| {
            let row = conn
                .query_row(&self.statements.select, params![hash.as_str()], |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, i64>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, String>(3)?,
                        row.get::<_, Vec<u8>>(4)?,
                    ))
                })
                .optional()
                .map_err(|e| StorageError::internal("get", hash.as_str(), e))?;

            let (stored_hash, size, name, content_type, data) =
                row.ok_or_else(|| StorageError::not_found(hash.as_str()))?;

            if stored_hash != hash.as_str() {
                return Err(StorageError::internal("get", hash.as_str(), "row hash mismatch"));
            }
            let size = u64::try_from(size)
                .map_err(|e| StorageError::internal("get", hash.as_str(), e))?;

            Ok(FileRecord {
                metadata: FileMetadata {
                    name,
                    size,
                    hash: hash.clone(),
                    content_type,
                },
                data,
            })
        })
    }

    fn delete(&self, hash: &ContentHash) -> StorageResult<()> {
        self.with_conn("delete", hash, |conn| {
            let count = conn
                .execute(&self.statements.delete, params![hash.as_str()])
                .map_err(|e| StorageError::internal("delete", hash.as_str(), e))?;

            match count {
                0 => Err(StorageError::not_found(hash.as_str())),
                _ => Ok(()),
            }
        })
    }

    fn close(&self) {
        let Ok(mut guard) = self.conn.lock() else {
            warn!(path = %self.path.display(), "connection lock poisoned during close");
            return;
        };

        if let Some(conn) = guard.take() {
            match conn.close() {
                Ok(()) => info!(path = %self.path.display(), "closed sqlite file store"),
                Err((_, e)) => warn!(path = %self.path.display(), error = %e, "error closing database"),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn create_test_store() -> (SqliteFileStore, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let store = SqliteFileStore::open(&StoreConfig::at(temp_dir.path())).unwrap();
        (store, temp_dir)
    }

    #[test]
    fn test_add_get() {
        let (store, _temp) = create_test_store();
        let record = FileRecord::new("hello.txt", "text/plain", b"hello".to_vec());

        let meta = store.add(&record).unwrap();
        assert_eq!(meta, record.metadata);
        assert_eq!(store.get(record.hash()).unwrap(), record);
    }

    #[test]
    fn test_duplicate_keeps_original() {
        let (store, _temp) = create_test_store();
        let first = FileRecord::new("first.txt", "text/plain", b"same".to_vec());
        store.add(&first).unwrap();

        let second = FileRecord::new("second.bin", "", b"same".to_vec());
        assert!(matches!(store.add(&second), Err(StorageError::Conflict(_))));
        assert_eq!(store.get(first.hash()).unwrap().metadata.name, "first.txt");
    }

    #[test]
    fn test_delete_single_shot() {
        let (store, _temp) = create_test_store();
        let record = FileRecord::new("a", "", b"a".to_vec());
        store.add(&record).unwrap();

        store.delete(record.hash()).unwrap();
        assert!(matches!(store.delete(record.hash()), Err(StorageError::NotFound(_))));
        assert!(matches!(store.get(record.hash()), Err(StorageError::NotFound(_))));
    }

    #[test]
    fn test_schema_creation_is_idempotent() {
        let temp = TempDir::new().unwrap();
        let config = StoreConfig::at(temp.path());
        let record = FileRecord::new("a", "", b"persist".to_vec());

        {
            let store = SqliteFileStore::open(&config).unwrap();
            store.add(&record).unwrap();
            store.close();
        }

        let reopened = SqliteFileStore::open(&config).unwrap();
        assert_eq!(reopened.get(record.hash()).unwrap(), record);
    }

    #[test]
    fn test_custom_table() {
        let temp = TempDir::new().unwrap();
        let mut config = StoreConfig::at(temp.path());
        config.table = "blobs".to_string();

        let store = SqliteFileStore::open(&config).unwrap();
        let record = FileRecord::new("a", "", b"x".to_vec());
        store.add(&record).unwrap();
        assert_eq!(store.get(record.hash()).unwrap(), record);
    }

    #[test]
    fn test_close_then_use() {
        let (store, _temp) = create_test_store();
        store.close();
        store.close();

        let result = store.get(&ContentHash::of(b"x"));
        assert!(matches!(result, Err(StorageError::Internal(_))));
    }

    #[test]
    fn test_reset_removes_database() {
        let temp = TempDir::new().unwrap();
        let config = StoreConfig::at(temp.path());
        let store = SqliteFileStore::open(&config).unwrap();
        assert_eq!(store.path(), config.database_path());
        store.close();

        assert!(config.database_path().exists());
        SqliteFileStore::reset(&config).unwrap();
        assert!(!config.database_path().exists());
        SqliteFileStore::reset(&config).unwrap();
    }
}
