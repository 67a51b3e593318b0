//! # strand-store
//!
//! Local credential store for the strand bootstrap.
//!
//! A single SQLite file (`credentials.db` under the data directory) holds
//! opaque text blobs keyed by name. Writes are durable and visible to later
//! process runs on the same device.
//!
//! - WAL journal mode, busy timeout for cross-process writers
//! - Schema version stored in `PRAGMA user_version`
//! - Timestamps are Unix epoch seconds

pub mod handle;
pub mod migrations;
pub mod queries;
pub mod schema;

use rusqlite::Connection;
use std::path::Path;

pub use handle::CredentialStore;

/// Current schema version.
pub const SCHEMA_VERSION: u32 = 1;

/// File name of the store inside the data directory.
pub const FILE_NAME: &str = "credentials.db";

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("migration failed: {0}")]
    Migration(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, StoreError>;

/// Open or create the store at `path`, running pending migrations.
pub fn open(path: &Path) -> Result<Connection> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let conn = Connection::open(path)?;
    configure(&conn)?;
    migrations::run(&conn)?;
    Ok(conn)
}

/// Open an in-memory store.
pub fn open_memory() -> Result<Connection> {
    let conn = Connection::open_in_memory()?;
    configure(&conn)?;
    migrations::run(&conn)?;
    Ok(conn)
}

fn configure(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "PRAGMA journal_mode = WAL;
         PRAGMA busy_timeout = 5000;
         PRAGMA synchronous = FULL;",
    )?;
    Ok(())
}
