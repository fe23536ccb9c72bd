//! SQLite-based snapshot backend
//!
//! A small key/value table mirrors browser local storage: the whole
//! dataset is one JSON document stored under [`STORAGE_KEY`].

use std::sync::Mutex;

use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};

use super::{Dataset, StorageBackend, StoreResult, STORAGE_KEY};
use crate::error::ServiceError;

/// Current schema version
const SCHEMA_VERSION: i32 = 1;

pub struct SqliteBackend {
    conn: Mutex<Connection>,
}

impl SqliteBackend {
    /// Open or create a SQLite database at the given path
    pub fn open(path: &str) -> StoreResult<Self> {
        let conn = Connection::open(path)?;
        Self::migrate(&conn)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Open a private in-memory database
    pub fn open_in_memory() -> StoreResult<Self> {
        let conn = Connection::open_in_memory()?;
        Self::migrate(&conn)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Current schema version of the open database
    pub fn schema_version(&self) -> StoreResult<i32> {
        let conn = self.conn.lock().unwrap();
        Self::get_schema_version(&conn)
    }

    /// Run database migrations
    fn migrate(conn: &Connection) -> StoreResult<()> {
        let current_version = Self::get_schema_version(conn)?;

        if current_version < SCHEMA_VERSION {
            tracing::info!(
                current = current_version,
                target = SCHEMA_VERSION,
                "Running database migrations"
            );

            if current_version < 1 {
                Self::migrate_v1(conn)?;
            }

            conn.execute(
                "INSERT OR REPLACE INTO schema_version (version) VALUES (?1)",
                params![SCHEMA_VERSION],
            )?;

            tracing::info!("Database migrations complete");
        }

        Ok(())
    }

    /// Get current schema version (0 if no schema exists)
    fn get_schema_version(conn: &Connection) -> StoreResult<i32> {
        let table_exists: bool = conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM sqlite_master
             WHERE type='table' AND name='schema_version')",
            [],
            |row| row.get(0),
        )?;

        if !table_exists {
            return Ok(0);
        }

        Ok(conn.query_row("SELECT MAX(version) FROM schema_version", [], |row| {
            row.get::<_, Option<i32>>(0).map(|v| v.unwrap_or(0))
        })?)
    }

    /// Migration to version 1: key/value table
    fn migrate_v1(conn: &Connection) -> StoreResult<()> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS schema_version (
                version INTEGER PRIMARY KEY
            );

            CREATE TABLE IF NOT EXISTS kv_store (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );
            "#,
        )?;

        Ok(())
    }
}

impl StorageBackend for SqliteBackend {
    fn load(&self) -> StoreResult<Option<Dataset>> {
        let conn = self.conn.lock().unwrap();

        let json: Option<String> = conn
            .query_row(
                "SELECT value FROM kv_store WHERE key = ?1",
                params![STORAGE_KEY],
                |row| row.get(0),
            )
            .optional()?;

        match json {
            Some(json) => serde_json::from_str(&json)
                .map(Some)
                .map_err(|e| ServiceError::CorruptSnapshot(e.to_string())),
            None => Ok(None),
        }
    }

    fn save(&self, data: &Dataset) -> StoreResult<()> {
        let json =
            serde_json::to_string(data).map_err(|e| ServiceError::Persistence(e.to_string()))?;
        let conn = self.conn.lock().unwrap();

        conn.execute(
            "INSERT INTO kv_store (key, value, updated_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(key) DO UPDATE
             SET value = excluded.value, updated_at = excluded.updated_at",
            params![STORAGE_KEY, json, Utc::now().to_rfc3339()],
        )?;

        Ok(())
    }
}
