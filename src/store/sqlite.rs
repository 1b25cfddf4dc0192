//! SQLite implementation of the record store.

use chrono::{DateTime, SecondsFormat, Utc};
use color_eyre::{eyre::eyre, Result};
use rusqlite::{params, types::Type, Connection, OptionalExtension, Row};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use super::traits::RecordStore;
use crate::error::SyncError;
use crate::feed::AppRecord;

/// SQLite-backed record store.
///
/// The connection sits behind a mutex, so every write funnels through one
/// serialized handle.
pub struct SqliteStore {
  conn: Mutex<Connection>,
}

impl SqliteStore {
  /// Open (or create) the store at `path`, creating parent directories.
  pub fn open(path: &Path) -> Result<Self> {
    if let Some(parent) = path.parent() {
      std::fs::create_dir_all(parent)
        .map_err(|e| eyre!("Failed to create cache directory: {}", e))?;
    }

    let conn = Connection::open(path)
      .map_err(|e| eyre!("Failed to open cache database at {}: {}", path.display(), e))?;

    Self::with_connection(conn)
  }

  /// Open a private in-memory store.
  pub fn open_in_memory() -> Result<Self> {
    let conn = Connection::open_in_memory()
      .map_err(|e| eyre!("Failed to open in-memory database: {}", e))?;

    Self::with_connection(conn)
  }

  fn with_connection(conn: Connection) -> Result<Self> {
    let store = Self {
      conn: Mutex::new(conn),
    };
    store.run_migrations()?;

    Ok(store)
  }

  /// Get the default database path.
  pub fn default_path() -> Result<PathBuf> {
    let data_dir = dirs::data_dir()
      .or_else(|| dirs::home_dir().map(|p| p.join(".local/share")))
      .ok_or_else(|| eyre!("Could not determine data directory"))?;

    Ok(data_dir.join("appfeed").join("apps.db"))
  }

  fn run_migrations(&self) -> Result<()> {
    let conn = self.lock().map_err(|e| eyre!(e))?;

    conn
      .execute_batch(SCHEMA)
      .map_err(|e| eyre!("Failed to run cache migrations: {}", e))?;

    Ok(())
  }

  fn lock(&self) -> std::result::Result<MutexGuard<'_, Connection>, String> {
    self.conn.lock().map_err(|e| format!("Lock poisoned: {}", e))
  }
}

/// Schema for the app table.
///
/// `seq` breaks ties between rows inserted within the same microsecond.
const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS apps (
    seq INTEGER PRIMARY KEY AUTOINCREMENT,
    id TEXT NOT NULL UNIQUE,
    name TEXT,
    artist_name TEXT,
    release_date TEXT,
    artwork_url TEXT,
    url TEXT,
    genres TEXT NOT NULL DEFAULT '[]',
    inserted_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_apps_inserted ON apps(inserted_at, seq);
"#;

const SELECT_COLUMNS: &str =
  "id, name, artist_name, release_date, artwork_url, url, genres, inserted_at";

impl RecordStore for SqliteStore {
  fn query_page(&self, offset: usize, limit: usize) -> Result<Vec<AppRecord>, SyncError> {
    if limit == 0 {
      return Ok(Vec::new());
    }

    let conn = self.lock().map_err(SyncError::StoreRead)?;

    let mut stmt = conn
      .prepare(&format!(
        "SELECT {} FROM apps ORDER BY inserted_at ASC, seq ASC LIMIT ? OFFSET ?",
        SELECT_COLUMNS
      ))
      .map_err(|e| SyncError::StoreRead(format!("Failed to prepare page query: {}", e)))?;

    let records = stmt
      .query_map(params![to_sql_int(limit), to_sql_int(offset)], row_to_record)
      .map_err(|e| SyncError::StoreRead(format!("Failed to query page: {}", e)))?
      .collect::<rusqlite::Result<Vec<_>>>()
      .map_err(|e| SyncError::StoreRead(format!("Failed to read row: {}", e)))?;

    Ok(records)
  }

  fn upsert(&self, record: &AppRecord) -> Result<(), SyncError> {
    if !record.has_id() {
      return Err(SyncError::StoreWrite("record has no id".to_string()));
    }

    let genres = serde_json::to_string(&record.genres)
      .map_err(|e| SyncError::StoreWrite(format!("Failed to serialize genres: {}", e)))?;
    let inserted_at = Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true);

    let conn = self.lock().map_err(SyncError::StoreWrite)?;

    conn
      .execute(
        "INSERT INTO apps (id, name, artist_name, release_date, artwork_url, url, genres, inserted_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
         ON CONFLICT(id) DO UPDATE SET
           name = excluded.name,
           artist_name = excluded.artist_name,
           release_date = excluded.release_date,
           artwork_url = excluded.artwork_url,
           url = excluded.url,
           genres = excluded.genres",
        params![
          record.id,
          record.name,
          record.artist_name,
          record.release_date,
          record.artwork_url,
          record.url,
          genres,
          inserted_at
        ],
      )
      .map_err(|e| SyncError::StoreWrite(format!("Failed to store app {}: {}", record.id, e)))?;

    Ok(())
  }

  fn get(&self, id: &str) -> Result<Option<AppRecord>, SyncError> {
    let conn = self.lock().map_err(SyncError::StoreRead)?;

    conn
      .query_row(
        &format!("SELECT {} FROM apps WHERE id = ?", SELECT_COLUMNS),
        params![id],
        row_to_record,
      )
      .optional()
      .map_err(|e| SyncError::StoreRead(format!("Failed to get app {}: {}", id, e)))
  }

  fn count(&self) -> Result<usize, SyncError> {
    let conn = self.lock().map_err(SyncError::StoreRead)?;

    let count: i64 = conn
      .query_row("SELECT COUNT(*) FROM apps", [], |row| row.get(0))
      .map_err(|e| SyncError::StoreRead(format!("Failed to count apps: {}", e)))?;

    Ok(count as usize)
  }
}

/// SQLite integers are signed; a negative LIMIT would mean "no limit".
fn to_sql_int(n: usize) -> i64 {
  i64::try_from(n).unwrap_or(i64::MAX)
}

fn row_to_record(row: &Row<'_>) -> rusqlite::Result<AppRecord> {
  let genres: String = row.get(6)?;
  let genres: Vec<String> = serde_json::from_str(&genres)
    .map_err(|e| rusqlite::Error::FromSqlConversionFailure(6, Type::Text, Box::new(e)))?;

  let inserted_at: String = row.get(7)?;
  let inserted_at = DateTime::parse_from_rfc3339(&inserted_at)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| rusqlite::Error::FromSqlConversionFailure(7, Type::Text, Box::new(e)))?;

  Ok(AppRecord {
    id: row.get(0)?,
    name: row.get(1)?,
    artist_name: row.get(2)?,
    release_date: row.get(3)?,
    artwork_url: row.get(4)?,
    url: row.get(5)?,
    genres,
    inserted_at: Some(inserted_at),
  })
}
