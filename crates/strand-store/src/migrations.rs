//! Forward-only migrations keyed on `PRAGMA user_version`.

use rusqlite::Connection;

use crate::{schema, Result, StoreError, SCHEMA_VERSION};

/// Bring the schema up to [`SCHEMA_VERSION`].
pub fn run(conn: &Connection) -> Result<()> {
    let current: u32 = conn.pragma_query_value(None, "user_version", |row| row.get(0))?;

    if current == 0 {
        tracing::info!(version = SCHEMA_VERSION, "initializing credential store schema");
        conn.execute_batch(schema::SCHEMA_V1)?;
        conn.pragma_update(None, "user_version", SCHEMA_VERSION)?;
    } else if current < SCHEMA_VERSION {
        for version in (current + 1)..=SCHEMA_VERSION {
            tracing::info!(version, "running credential store migration");
            run_migration(conn, version)?;
            conn.pragma_update(None, "user_version", version)?;
        }
    } else if current > SCHEMA_VERSION {
        return Err(StoreError::Migration(format!(
            "store version {current} is newer than supported {SCHEMA_VERSION}"
        )));
    }

    Ok(())
}

fn run_migration(_conn: &Connection, version: u32) -> Result<()> {
    Err(StoreError::Migration(format!(
        "unknown migration version: {version}"
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fresh_migration() {
        let conn = Connection::open_in_memory().expect("open");
        run(&conn).expect("migrate");

        let count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name='credentials'",
                [],
                |row| row.get(0),
            )
            .expect("query");
        assert_eq!(count, 1);
    }

    #[test]
    fn test_idempotent_migration() {
        let conn = Connection::open_in_memory().expect("open");
        run(&conn).expect("first run");
        run(&conn).expect("second run should be no-op");
    }

    #[test]
    fn test_newer_version_rejected() {
        let conn = Connection::open_in_memory().expect("open");
        conn.pragma_update(None, "user_version", SCHEMA_VERSION + 1)
            .expect("pragma");
        assert!(matches!(run(&conn), Err(StoreError::Migration(_))));
    }
}
