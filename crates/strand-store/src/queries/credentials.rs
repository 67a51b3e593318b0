//! Credential blob queries.

use std::time::{SystemTime, UNIX_EPOCH};

use rusqlite::{Connection, OptionalExtension, Transaction, TransactionBehavior};

use crate::Result;

fn now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}

/// Stored value for `key`, if any.
pub fn get(conn: &Connection, key: &str) -> Result<Option<String>> {
    let value = conn
        .query_row(
            "SELECT value FROM credentials WHERE key = ?1",
            [key],
            |row| row.get(0),
        )
        .optional()?;
    Ok(value)
}

/// Store `value` under `key`, replacing any previous value.
pub fn set(conn: &Connection, key: &str, value: &str) -> Result<()> {
    conn.execute(
        "INSERT INTO credentials (key, value, updated_at) VALUES (?1, ?2, ?3)
         ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
        rusqlite::params![key, value, now()],
    )?;
    Ok(())
}

/// Store `value` only if `key` is unset; returns whatever is stored afterwards.
///
/// Runs in an immediate transaction so a concurrent writer in another
/// process either lands entirely before or entirely after this call.
pub fn insert_if_absent(conn: &Connection, key: &str, value: &str) -> Result<String> {
    let tx = Transaction::new_unchecked(conn, TransactionBehavior::Immediate)?;
    tx.execute(
        "INSERT OR IGNORE INTO credentials (key, value, updated_at) VALUES (?1, ?2, ?3)",
        rusqlite::params![key, value, now()],
    )?;
    let stored: String = tx.query_row(
        "SELECT value FROM credentials WHERE key = ?1",
        [key],
        |row| row.get(0),
    )?;
    tx.commit()?;
    Ok(stored)
}

/// Delete `key`; returns whether a row was removed.
pub fn remove(conn: &Connection, key: &str) -> Result<bool> {
    let removed = conn.execute("DELETE FROM credentials WHERE key = ?1", [key])?;
    Ok(removed > 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_db() -> Connection {
        crate::open_memory().expect("open test store")
    }

    #[test]
    fn test_get_missing() {
        let conn = test_db();
        assert_eq!(get(&conn, "user-private-identity").expect("get"), None);
    }

    #[test]
    fn test_set_and_get() {
        let conn = test_db();
        set(&conn, "k", "one").expect("set");
        assert_eq!(get(&conn, "k").expect("get").as_deref(), Some("one"));
        set(&conn, "k", "two").expect("overwrite");
        assert_eq!(get(&conn, "k").expect("get").as_deref(), Some("two"));
    }

    #[test]
    fn test_insert_if_absent_keeps_first() {
        let conn = test_db();
        assert_eq!(insert_if_absent(&conn, "k", "first").expect("insert"), "first");
        assert_eq!(insert_if_absent(&conn, "k", "second").expect("insert"), "first");
        assert_eq!(get(&conn, "k").expect("get").as_deref(), Some("first"));
    }

    #[test]
    fn test_remove() {
        let conn = test_db();
        set(&conn, "k", "v").expect("set");
        assert!(remove(&conn, "k").expect("remove"));
        assert!(!remove(&conn, "k").expect("remove again"));
        assert_eq!(get(&conn, "k").expect("get"), None);
    }

    #[test]
    fn test_updated_at_recorded() {
        let conn = test_db();
        set(&conn, "k", "v").expect("set");
        let ts: i64 = conn
            .query_row("SELECT updated_at FROM credentials WHERE key = 'k'", [], |row| {
                row.get(0)
            })
            .expect("query");
        assert!(ts > 0);
    }
}
