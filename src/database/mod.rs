//! Markstash database layer.
//!
//! SQLite connection management and schema migrations for the persisted
//! store state.
//!
//! # Usage
//!
//! ```no_run
//! use markstash::database::Database;
//!
//! let db = Database::open("markstash.db").expect("failed to open database");
//! let conn = db.connection();
//! ```

pub mod connection;
pub mod migrations;

pub use connection::Database;
