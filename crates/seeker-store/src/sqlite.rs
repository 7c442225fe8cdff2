//! SQLite-based store implementation.

use chrono::Utc;
use rusqlite::{Connection, OptionalExtension, params};
use seeker_core::{ArtifactStore, PageKind, RefinedSeries, Result, SeekerError, StockCode};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, instrument};

/// SQLite-based artifact store.
///
/// Raw pages are kept verbatim in `raw_pages`, refined series as JSON in
/// `refined_series`. A single connection is shared behind a mutex.
#[derive(Debug)]
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Create a new SQLite store at the given path.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or schema creation fails.
    pub fn new(path: impl AsRef<Path>) -> Result<Self> {
        let conn = Connection::open(path).map_err(|e| SeekerError::Store(e.to_string()))?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.initialize_schema()?;
        Ok(store)
    }

    /// Create an in-memory SQLite store.
    ///
    /// # Errors
    /// Returns an error if schema creation fails.
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(|e| SeekerError::Store(e.to_string()))?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.initialize_schema()?;
        Ok(store)
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| SeekerError::Store(e.to_string()))
    }

    fn initialize_schema(&self) -> Result<()> {
        let conn = self.lock()?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS raw_pages (
                code TEXT NOT NULL,
                page TEXT NOT NULL,
                body TEXT NOT NULL,
                fetched_at TEXT NOT NULL,
                PRIMARY KEY (code, page)
            )",
            [],
        )
        .map_err(|e| SeekerError::Store(e.to_string()))?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS refined_series (
                code TEXT NOT NULL PRIMARY KEY,
                data_json TEXT NOT NULL,
                refined_at TEXT NOT NULL
            )",
            [],
        )
        .map_err(|e| SeekerError::Store(e.to_string()))?;

        debug!("SQLite store schema initialized");
        Ok(())
    }
}

impl ArtifactStore for SqliteStore {
    fn has_page(&self, code: &StockCode, page: PageKind) -> Result<bool> {
        let conn = self.lock()?;
        let found = conn
            .query_row(
                "SELECT 1 FROM raw_pages WHERE code = ?1 AND page = ?2",
                params![code.as_str(), page.as_str()],
                |_| Ok(()),
            )
            .optional()
            .map_err(|e| SeekerError::Store(e.to_string()))?;
        Ok(found.is_some())
    }

    #[instrument(skip(self), fields(stock = %code, page = %page))]
    fn get_page(&self, code: &StockCode, page: PageKind) -> Result<Option<String>> {
        let conn = self.lock()?;
        let body = conn
            .query_row(
                "SELECT body FROM raw_pages WHERE code = ?1 AND page = ?2",
                params![code.as_str(), page.as_str()],
                |row| row.get::<_, String>(0),
            )
            .optional()
            .map_err(|e| SeekerError::Store(e.to_string()))?;

        if body.is_none() {
            debug!("No stored raw page found");
        }
        Ok(body)
    }

    #[instrument(skip(self, text), fields(stock = %code, page = %page))]
    fn put_page(&self, code: &StockCode, page: PageKind, text: &str) -> Result<()> {
        let fetched_at = Utc::now().to_rfc3339();
        let conn = self.lock()?;
        conn.execute(
            "INSERT OR REPLACE INTO raw_pages (code, page, body, fetched_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![code.as_str(), page.as_str(), text, fetched_at],
        )
        .map_err(|e| SeekerError::Store(e.to_string()))?;
        debug!("Stored raw page of {} bytes", text.len());
        Ok(())
    }

    fn has_refined(&self, code: &StockCode) -> Result<bool> {
        let conn = self.lock()?;
        let found = conn
            .query_row(
                "SELECT 1 FROM refined_series WHERE code = ?1",
                params![code.as_str()],
                |_| Ok(()),
            )
            .optional()
            .map_err(|e| SeekerError::Store(e.to_string()))?;
        Ok(found.is_some())
    }

    #[instrument(skip(self), fields(stock = %code))]
    fn get_refined(&self, code: &StockCode) -> Result<Option<RefinedSeries>> {
        let conn = self.lock()?;
        let result = conn
            .query_row(
                "SELECT data_json FROM refined_series WHERE code = ?1",
                params![code.as_str()],
                |row| row.get::<_, String>(0),
            )
            .optional()
            .map_err(|e| SeekerError::Store(e.to_string()))?;

        match result {
            Some(json) => {
                let series: RefinedSeries =
                    serde_json::from_str(&json).map_err(|e| SeekerError::Parse(e.to_string()))?;
                debug!("Found stored refined series");
                Ok(Some(series))
            }
            None => {
                debug!("No stored refined series found");
                Ok(None)
            }
        }
    }

    #[instrument(skip(self, series), fields(stock = %code))]
    fn put_refined(&self, code: &StockCode, series: &RefinedSeries) -> Result<()> {
        let refined_at = Utc::now().to_rfc3339();
        let data_json =
            serde_json::to_string(series).map_err(|e| SeekerError::Parse(e.to_string()))?;

        let conn = self.lock()?;
        conn.execute(
            "INSERT OR REPLACE INTO refined_series (code, data_json, refined_at)
             VALUES (?1, ?2, ?3)",
            params![code.as_str(), data_json, refined_at],
        )
        .map_err(|e| SeekerError::Store(e.to_string()))?;
        debug!("Stored refined series with {} rows", series.len());
        Ok(())
    }

    #[instrument(skip(self))]
    fn clear(&self) -> Result<()> {
        let conn = self.lock()?;
        conn.execute("DELETE FROM raw_pages", [])
            .map_err(|e| SeekerError::Store(e.to_string()))?;
        conn.execute("DELETE FROM refined_series", [])
            .map_err(|e| SeekerError::Store(e.to_string()))?;
        debug!("Cleared SQLite store");
        Ok(())
    }
}
