//! SQL schema definitions.

/// Schema v1: a single key/value table of credential blobs.
pub const SCHEMA_V1: &str = r#"
CREATE TABLE IF NOT EXISTS credentials (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL,
    updated_at INTEGER NOT NULL
);
"#;
