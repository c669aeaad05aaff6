//! Cache storage trait and its backends.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use chrono::{DateTime, Utc};
use color_eyre::{eyre::eyre, Result};
use rusqlite::{params, Connection, OpenFlags, OptionalExtension};
use tracing::debug;

use crate::dto::ResponseEnvelope;
use crate::error::CacheError;

use super::traits::{CachedRecord, CachedResponse, Cacheable, QueryKey};

/// Trait for cache storage backends.
///
/// Backends hold at most one record per `(kind, key)`. A save replaces the
/// stored record atomically, unless the stored one was fetched later.
pub trait ResponseStorage: Send + Sync + 'static {
  /// Load the record for a key.
  fn load(&self, kind: &str, key_hash: &str) -> Result<CachedRecord, CacheError>;

  /// Upsert the record for a key.
  fn save(
    &self,
    kind: &str,
    key_hash: &str,
    description: &str,
    record: &CachedRecord,
  ) -> Result<(), CacheError>;

  /// Evict every record.
  fn clear(&self) -> Result<(), CacheError>;

  /// Read the last stored response for a query. Missing entries and
  /// entries that no longer deserialize are both a miss.
  fn read<T: Cacheable, K: QueryKey + ?Sized>(&self, key: &K) -> Option<CachedResponse<T>>
  where
    Self: Sized,
  {
    let record = self.load(T::entity_type(), &key.cache_hash());
    match record.and_then(|r| Ok((r.to_envelope::<T>()?, r.fetched_at))) {
      Ok((envelope, fetched_at)) => Some(CachedResponse {
        envelope,
        fetched_at,
      }),
      Err(CacheError::EntityNotFound) => None,
      Err(e) => {
        debug!(kind = T::entity_type(), key = %key.description(), error = %e, "treating cache entry as miss");
        None
      }
    }
  }

  /// Store a response for a query.
  fn write<T: Cacheable, K: QueryKey + ?Sized>(
    &self,
    key: &K,
    envelope: &ResponseEnvelope<T>,
    fetched_at: DateTime<Utc>,
  ) -> Result<(), CacheError>
  where
    Self: Sized,
  {
    let record = CachedRecord::from_envelope(envelope, fetched_at)?;
    self.save(
      T::entity_type(),
      &key.cache_hash(),
      &key.description(),
      &record,
    )
  }
}

impl<S: ResponseStorage> ResponseStorage for Arc<S> {
  fn load(&self, kind: &str, key_hash: &str) -> Result<CachedRecord, CacheError> {
    (**self).load(kind, key_hash)
  }

  fn save(
    &self,
    kind: &str,
    key_hash: &str,
    description: &str,
    record: &CachedRecord,
  ) -> Result<(), CacheError> {
    (**self).save(kind, key_hash, description, record)
  }

  fn clear(&self) -> Result<(), CacheError> {
    (**self).clear()
  }
}

/// Storage implementation that doesn't cache anything.
/// Used when caching is disabled - all operations are no-ops.
pub struct NoopStorage;

impl ResponseStorage for NoopStorage {
  fn load(&self, _kind: &str, _key_hash: &str) -> Result<CachedRecord, CacheError> {
    Err(CacheError::EntityNotFound) // Always miss
  }

  fn save(&self, _: &str, _: &str, _: &str, _: &CachedRecord) -> Result<(), CacheError> {
    Ok(()) // Discard
  }

  fn clear(&self) -> Result<(), CacheError> {
    Ok(())
  }
}

/// Process-local storage, lost on exit.
#[derive(Default)]
pub struct MemoryStorage {
  records: Mutex<HashMap<(String, String), CachedRecord>>,
}

impl MemoryStorage {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn len(&self) -> usize {
    self.records().map(|r| r.len()).unwrap_or(0)
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }

  fn records(&self) -> Result<MutexGuard<'_, HashMap<(String, String), CachedRecord>>, CacheError> {
    self
      .records
      .lock()
      .map_err(|e| CacheError::Storage(format!("Lock poisoned: {}", e)))
  }
}

impl ResponseStorage for MemoryStorage {
  fn load(&self, kind: &str, key_hash: &str) -> Result<CachedRecord, CacheError> {
    self
      .records()?
      .get(&(kind.to_string(), key_hash.to_string()))
      .cloned()
      .ok_or(CacheError::EntityNotFound)
  }

  fn save(
    &self,
    kind: &str,
    key_hash: &str,
    _description: &str,
    record: &CachedRecord,
  ) -> Result<(), CacheError> {
    let mut records = self.records()?;
    let slot = records
      .entry((kind.to_string(), key_hash.to_string()))
      .or_insert_with(|| record.clone());
    if record.fetched_at >= slot.fetched_at {
      *slot = record.clone();
    }
    Ok(())
  }

  fn clear(&self) -> Result<(), CacheError> {
    self.records()?.clear();
    Ok(())
  }
}

/// SQLite-based cache storage implementation.
///
/// On-disk databases run in WAL mode with a dedicated read connection, so
/// synchronous cache reads never wait behind a background write. SQLite
/// admits one writer at a time: writes to different keys take turns on the
/// write connection, each as one short transaction on a blocking thread.
/// In-memory databases are private to one connection and share it.
pub struct SqliteStorage {
  conn: Mutex<Connection>,
  reader: Option<Mutex<Connection>>,
}

impl SqliteStorage {
  /// Open (or create) the cache database at `path`.
  pub fn open(path: &Path) -> Result<Self> {
    // Ensure parent directory exists
    if let Some(parent) = path.parent() {
      std::fs::create_dir_all(parent)
        .map_err(|e| eyre!("Failed to create cache directory: {}", e))?;
    }

    let conn = Connection::open(path)
      .map_err(|e| eyre!("Failed to open cache database at {}: {}", path.display(), e))?;

    conn
      .pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get::<_, String>(0))
      .map_err(|e| eyre!("Failed to enable WAL journal: {}", e))?;
    conn
      .busy_timeout(Duration::from_secs(5))
      .map_err(|e| eyre!("Failed to set busy timeout: {}", e))?;

    let mut storage = Self::with_connection(conn)?;

    let reader = Connection::open_with_flags(
      path,
      OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
    )
    .map_err(|e| eyre!("Failed to open cache reader at {}: {}", path.display(), e))?;
    reader
      .busy_timeout(Duration::from_secs(5))
      .map_err(|e| eyre!("Failed to set busy timeout: {}", e))?;
    storage.reader = Some(Mutex::new(reader));

    Ok(storage)
  }

  /// Open a private in-memory database.
  pub fn open_in_memory() -> Result<Self> {
    let conn = Connection::open_in_memory()
      .map_err(|e| eyre!("Failed to open in-memory cache database: {}", e))?;
    Self::with_connection(conn)
  }

  /// Get the default database path.
  pub fn default_path() -> Result<PathBuf> {
    let data_dir = dirs::data_dir()
      .or_else(|| dirs::home_dir().map(|p| p.join(".local/share")))
      .ok_or_else(|| eyre!("Could not determine data directory"))?;

    Ok(data_dir.join("mediaflow").join("cache.db"))
  }

  fn with_connection(conn: Connection) -> Result<Self> {
    conn
      .execute_batch(CACHE_SCHEMA)
      .map_err(|e| eyre!("Failed to run cache migrations: {}", e))?;

    Ok(Self {
      conn: Mutex::new(conn),
      reader: None,
    })
  }

  fn conn(&self) -> Result<MutexGuard<'_, Connection>, CacheError> {
    lock(&self.conn)
  }

  fn reader(&self) -> Result<MutexGuard<'_, Connection>, CacheError> {
    lock(self.reader.as_ref().unwrap_or(&self.conn))
  }
}

fn lock(conn: &Mutex<Connection>) -> Result<MutexGuard<'_, Connection>, CacheError> {
  conn
    .lock()
    .map_err(|e| CacheError::Storage(format!("Lock poisoned: {}", e)))
}

/// Schema for cache tables.
const CACHE_SCHEMA: &str = r#"
-- Last successful response per (response kind, query)
CREATE TABLE IF NOT EXISTS response_cache (
    response_kind TEXT NOT NULL,
    query_hash TEXT NOT NULL,
    query_description TEXT NOT NULL,
    status TEXT NOT NULL,
    results INTEGER NOT NULL,
    data BLOB NOT NULL,
    fetched_at INTEGER NOT NULL,
    cached_at TEXT NOT NULL DEFAULT (datetime('now')),
    PRIMARY KEY (response_kind, query_hash)
);
"#;

fn storage_error(context: &str, e: rusqlite::Error) -> CacheError {
  CacheError::Storage(format!("{}: {}", context, e))
}

impl ResponseStorage for SqliteStorage {
  fn load(&self, kind: &str, key_hash: &str) -> Result<CachedRecord, CacheError> {
    let conn = self.reader()?;

    let row: Option<(String, u32, Vec<u8>, i64)> = conn
      .query_row(
        "SELECT status, results, data, fetched_at FROM response_cache
         WHERE response_kind = ? AND query_hash = ?",
        params![kind, key_hash],
        |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?)),
      )
      .optional()
      .map_err(|e| match e {
        rusqlite::Error::FromSqlConversionFailure(..) | rusqlite::Error::InvalidColumnType(..) => {
          CacheError::DeserializationFailed(e.to_string())
        }
        other => storage_error("Failed to read cache entry", other),
      })?;

    let (status, results, data, fetched_at) = row.ok_or(CacheError::EntityNotFound)?;
    let fetched_at = DateTime::from_timestamp_micros(fetched_at).ok_or_else(|| {
      CacheError::DeserializationFailed(format!("invalid fetched_at {}", fetched_at))
    })?;

    Ok(CachedRecord {
      status,
      results,
      data,
      fetched_at,
    })
  }

  fn save(
    &self,
    kind: &str,
    key_hash: &str,
    description: &str,
    record: &CachedRecord,
  ) -> Result<(), CacheError> {
    let mut conn = self.conn()?;
    let tx = conn
      .transaction()
      .map_err(|e| storage_error("Failed to begin transaction", e))?;

    tx.execute(
      "INSERT INTO response_cache
         (response_kind, query_hash, query_description, status, results, data, fetched_at, cached_at)
       VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, datetime('now'))
       ON CONFLICT (response_kind, query_hash) DO UPDATE SET
         query_description = excluded.query_description,
         status = excluded.status,
         results = excluded.results,
         data = excluded.data,
         fetched_at = excluded.fetched_at,
         cached_at = excluded.cached_at
       WHERE excluded.fetched_at >= response_cache.fetched_at",
      params![
        kind,
        key_hash,
        description,
        record.status,
        record.results,
        record.data,
        record.fetched_at.timestamp_micros(),
      ],
    )
    .map_err(|e| storage_error("Failed to store cache entry", e))?;

    tx.commit()
      .map_err(|e| storage_error("Failed to commit transaction", e))
  }

  fn clear(&self) -> Result<(), CacheError> {
    self
      .conn()?
      .execute("DELETE FROM response_cache", [])
      .map_err(|e| storage_error("Failed to clear cache", e))?;
    Ok(())
  }
}
