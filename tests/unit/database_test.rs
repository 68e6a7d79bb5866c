//! Unit tests for the Markstash database layer (connection + migrations).

use markstash::database::migrations::{get_schema_version, run_all, CURRENT_SCHEMA_VERSION};
use markstash::database::Database;
use tempfile::TempDir;

#[test]
fn test_open_in_memory_succeeds() {
    let db = Database::open_in_memory();
    assert!(db.is_ok(), "open_in_memory should succeed");
}

#[test]
fn test_migrations_create_state_table() {
    let db = Database::open_in_memory().expect("open_in_memory failed");
    let conn = db.connection();

    for table in ["schema_version", "persisted_state"] {
        let exists: bool = conn
            .query_row(
                "SELECT COUNT(*) > 0 FROM sqlite_master WHERE type='table' AND name=?1",
                [table],
                |row| row.get(0),
            )
            .unwrap_or(false);
        assert!(exists, "Table '{}' should exist after migrations", table);
    }
}

#[test]
fn test_schema_version_is_current() {
    let db = Database::open_in_memory().unwrap();
    assert_eq!(get_schema_version(db.connection()), CURRENT_SCHEMA_VERSION);
}

#[test]
fn test_migrations_are_idempotent() {
    let db = Database::open_in_memory().unwrap();
    run_all(db.connection()).expect("second run should succeed");
    run_all(db.connection()).expect("third run should succeed");

    let rows: i64 = db
        .connection()
        .query_row("SELECT COUNT(*) FROM schema_version", [], |row| row.get(0))
        .unwrap();
    assert_eq!(rows, CURRENT_SCHEMA_VERSION as i64);
}

#[test]
fn test_open_creates_parent_directories() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("nested").join("deeper").join("state.db");

    let db = Database::open(&path);
    assert!(db.is_ok(), "open should create missing parents");
    assert!(path.exists());
}

#[test]
fn test_open_fails_when_parent_is_a_file() {
    let dir = TempDir::new().unwrap();
    let blocker = dir.path().join("blocker");
    std::fs::write(&blocker, b"not a directory").unwrap();

    let db = Database::open(blocker.join("nested").join("state.db"));
    assert!(db.is_err(), "open must report the unusable directory");
}

#[test]
fn test_persisted_state_key_is_unique() {
    let db = Database::open_in_memory().unwrap();
    let conn = db.connection();
    conn.execute(
        "INSERT INTO persisted_state (key, value, updated_at) VALUES ('k', 'a', 0)",
        [],
    )
    .unwrap();
    let dup = conn.execute(
        "INSERT INTO persisted_state (key, value, updated_at) VALUES ('k', 'b', 0)",
        [],
    );
    assert!(dup.is_err(), "duplicate key must be rejected");
}
