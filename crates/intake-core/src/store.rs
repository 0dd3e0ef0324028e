//! Durable record store for submitted applications.
//!
//! One append-only SQLite table. Rows are never updated or deleted.

use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{Local, NaiveDateTime, Timelike};
use rusqlite::{params, Connection};

/// Persisted timestamp layout (`datetime` column).
pub const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M";

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS applications (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    phone TEXT NOT NULL,
    topic TEXT NOT NULL,
    datetime TEXT NOT NULL
);
"#;

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("field `{0}` must not be empty")]
    EmptyField(&'static str),

    #[error("database connection lock poisoned")]
    Poisoned,

    #[error("storage task failed: {0}")]
    Join(String),
}

pub type StorageResult<T> = std::result::Result<T, StorageError>;

/// A single completed, persisted form submission.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Application {
    pub id: i64,
    pub name: String,
    pub phone: String,
    pub topic: String,
    /// Local wall-clock time, truncated to the minute.
    pub submitted_at: NaiveDateTime,
}

impl Application {
    pub fn submitted_at_text(&self) -> String {
        self.submitted_at.format(DATETIME_FORMAT).to_string()
    }
}

/// Port for the record store so the submission path can be driven by test doubles.
pub trait ApplicationStore: Send + Sync {
    /// Durably append one application. Nothing is written when this fails.
    fn append(&self, name: &str, phone: &str, topic: &str) -> StorageResult<Application>;
}

/// SQLite-backed store. Cheap to clone; all clones share one connection.
#[derive(Clone)]
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    /// Open or create the database at `path` and make sure the table exists.
    pub fn open<P: AsRef<Path>>(path: P) -> StorageResult<Self> {
        let store = Self {
            conn: Arc::new(Mutex::new(Connection::open(path)?)),
        };
        store.initialize()?;
        Ok(store)
    }

    pub fn open_in_memory() -> StorageResult<Self> {
        let store = Self {
            conn: Arc::new(Mutex::new(Connection::open_in_memory()?)),
        };
        store.initialize()?;
        Ok(store)
    }

    /// Idempotent; safe on every startup and never touches existing rows.
    pub fn initialize(&self) -> StorageResult<()> {
        self.lock()?.execute_batch(SCHEMA)?;
        Ok(())
    }

    pub fn count(&self) -> StorageResult<i64> {
        let conn = self.lock()?;
        let n = conn.query_row("SELECT COUNT(*) FROM applications", [], |row| row.get(0))?;
        Ok(n)
    }

    /// Newest first.
    pub fn recent(&self, limit: usize) -> StorageResult<Vec<Application>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT id, name, phone, topic, datetime FROM applications
             ORDER BY id DESC LIMIT ?1",
        )?;

        let rows = stmt.query_map(params![limit as i64], |row| {
            let raw: String = row.get(4)?;
            let submitted_at =
                NaiveDateTime::parse_from_str(&raw, DATETIME_FORMAT).map_err(|e| {
                    rusqlite::Error::FromSqlConversionFailure(
                        4,
                        rusqlite::types::Type::Text,
                        Box::new(e),
                    )
                })?;
            Ok(Application {
                id: row.get(0)?,
                name: row.get(1)?,
                phone: row.get(2)?,
                topic: row.get(3)?,
                submitted_at,
            })
        })?;

        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    fn lock(&self) -> StorageResult<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| StorageError::Poisoned)
    }
}

impl ApplicationStore for SqliteStore {
    fn append(&self, name: &str, phone: &str, topic: &str) -> StorageResult<Application> {
        for (field, value) in [("name", name), ("phone", phone), ("topic", topic)] {
            if value.trim().is_empty() {
                return Err(StorageError::EmptyField(field));
            }
        }

        let now = Local::now().naive_local();
        let submitted_at = now
            .with_second(0)
            .and_then(|t| t.with_nanosecond(0))
            .unwrap_or(now);

        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO applications (name, phone, topic, datetime) VALUES (?1, ?2, ?3, ?4)",
            params![
                name,
                phone,
                topic,
                submitted_at.format(DATETIME_FORMAT).to_string()
            ],
        )?;

        Ok(Application {
            id: conn.last_insert_rowid(),
            name: name.to_string(),
            phone: phone.to_string(),
            topic: topic.to_string(),
            submitted_at,
        })
    }
}
