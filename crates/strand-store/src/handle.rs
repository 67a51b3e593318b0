//! Async, cloneable handle over one store connection.

use std::path::Path;
use std::sync::Arc;

use rusqlite::Connection;
use tokio::sync::Mutex;

use crate::queries::credentials;
use crate::Result;

/// Shared handle to the credential store.
///
/// Clones share one connection; calls are serialized by an async mutex.
/// SQLite's own locking serializes writers from other processes.
#[derive(Clone)]
pub struct CredentialStore {
    conn: Arc<Mutex<Connection>>,
}

impl CredentialStore {
    /// Open the on-disk store at `path`.
    pub fn open(path: &Path) -> Result<Self> {
        let conn = crate::open(path)?;
        tracing::debug!(path = %path.display(), "credential store opened");
        Ok(Self::from_connection(conn))
    }

    /// Store that lives only as long as this handle and its clones.
    pub fn in_memory() -> Result<Self> {
        Ok(Self::from_connection(crate::open_memory()?))
    }

    pub fn from_connection(conn: Connection) -> Self {
        Self {
            conn: Arc::new(Mutex::new(conn)),
        }
    }

    pub async fn get(&self, key: &str) -> Result<Option<String>> {
        let conn = self.conn.lock().await;
        credentials::get(&conn, key)
    }

    pub async fn set(&self, key: &str, value: &str) -> Result<()> {
        let conn = self.conn.lock().await;
        credentials::set(&conn, key, value)
    }

    /// Compare-and-swap write; returns the value that ended up stored.
    pub async fn insert_if_absent(&self, key: &str, value: &str) -> Result<String> {
        let conn = self.conn.lock().await;
        credentials::insert_if_absent(&conn, key, value)
    }

    pub async fn remove(&self, key: &str) -> Result<bool> {
        let conn = self.conn.lock().await;
        credentials::remove(&conn, key)
    }
}

impl std::fmt::Debug for CredentialStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialStore").finish_non_exhaustive()
    }
}
