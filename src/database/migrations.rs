//! Schema migrations for the Markstash state database.
//!
//! Applied versions are recorded in `schema_version`; `run_all` applies every
//! entry of [`MIGRATIONS`] newer than the recorded version, in order.

use rusqlite::{params, Connection};

type MigrationFn = fn(&Connection) -> Result<(), rusqlite::Error>;

/// `(version, description, apply)` in ascending version order.
const MIGRATIONS: &[(i32, &str, MigrationFn)] = &[(
    1,
    "Persisted state key/value table",
    create_persisted_state,
)];

/// Latest schema version known to this build.
pub const CURRENT_SCHEMA_VERSION: i32 = 1;

/// Highest applied version, or 0 on a fresh database.
pub fn get_schema_version(conn: &Connection) -> i32 {
    conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_version",
        [],
        |row| row.get(0),
    )
    .unwrap_or(0)
}

/// Brings the schema up to [`CURRENT_SCHEMA_VERSION`]. Idempotent.
pub fn run_all(conn: &Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(
        "PRAGMA journal_mode = WAL;
         CREATE TABLE IF NOT EXISTS schema_version (
             version INTEGER PRIMARY KEY,
             applied_at INTEGER NOT NULL,
             description TEXT NOT NULL
         );",
    )?;

    let applied = get_schema_version(conn);
    for (version, description, apply) in MIGRATIONS {
        if *version <= applied {
            continue;
        }
        apply(conn)?;
        conn.execute(
            "INSERT OR IGNORE INTO schema_version (version, applied_at, description)
             VALUES (?1, ?2, ?3)",
            params![version, chrono::Utc::now().timestamp(), description],
        )?;
    }
    Ok(())
}

// v1: one row per storage key holding the serialized state envelope.
fn create_persisted_state(conn: &Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS persisted_state (
             key TEXT PRIMARY KEY,
             value TEXT NOT NULL,
             updated_at INTEGER NOT NULL
         );",
    )
}
