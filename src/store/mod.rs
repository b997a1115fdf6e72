//! SQLite record storage.
//!
//! Persists discovered names in a single table:
//! - students: id (primary key), name
//!
//! Supports:
//! - Insert on first discovery, committed before the next ID is processed
//! - Repairing rows whose stored name is a placeholder left by an earlier,
//!   less careful run
//! - Point lookup, listing, and listing placeholder-valued rows

pub mod records;

pub use records::{default_db_path, Record, RecordStore, StoreError, Upsert};
