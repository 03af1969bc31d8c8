//! SQLite store for raw mirror-node response bodies.
//!
//! Keys are content hashes of the request path (including the query string),
//! so identical requests hit the same row across runs. Only raw HTTP bodies
//! are stored here; projections are always recomputed from fresh decodes.

use rusqlite::{Connection, OptionalExtension};
use sha2::{Digest, Sha256};
use std::path::Path;
use std::sync::Mutex;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CacheError {
    #[error("sqlite: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

/// Content-addressed cache of mirror responses.
pub struct ResponseCache {
    conn: Mutex<Connection>,
}

impl ResponseCache {
    /// Open or create the cache at `path`. Creates parent dirs if needed.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, CacheError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS responses (
                key TEXT PRIMARY KEY,
                body TEXT NOT NULL,
                fetched_utc INTEGER NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_responses_fetched ON responses(fetched_utc);
            "#,
        )?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Cache key for a request path (SHA-256 hex).
    pub fn key_for(request: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(request.as_bytes());
        hex::encode(hasher.finalize())
    }

    /// Cached body for `key`, or None.
    pub fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| std::io::Error::other(e.to_string()))?;
        let mut stmt = conn.prepare("SELECT body FROM responses WHERE key = ?1")?;
        let row = stmt
            .query_row([key], |r| r.get::<_, String>(0))
            .optional()?;
        Ok(row)
    }

    /// Insert or replace the body for `key`.
    pub fn put(&self, key: &str, body: &str) -> Result<(), CacheError> {
        let fetched = time::OffsetDateTime::now_utc().unix_timestamp();
        let conn = self
            .conn
            .lock()
            .map_err(|e| std::io::Error::other(e.to_string()))?;
        conn.execute(
            "INSERT OR REPLACE INTO responses (key, body, fetched_utc) VALUES (?1, ?2, ?3)",
            rusqlite::params![key, body, fetched],
        )?;
        Ok(())
    }

    /// Drop entries fetched before `cutoff_utc`. Returns rows removed.
    pub fn purge_older_than(&self, cutoff_utc: i64) -> Result<usize, CacheError> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| std::io::Error::other(e.to_string()))?;
        let removed = conn.execute(
            "DELETE FROM responses WHERE fetched_utc < ?1",
            rusqlite::params![cutoff_utc],
        )?;
        Ok(removed)
    }
}
