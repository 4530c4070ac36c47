//! # horde-rs-db-backends
//!
//! Execution backends for horde-rs. Each backend implements
//! [`DbExecutor`](horde_rs_db::executor::DbExecutor): it binds named
//! parameters, runs the statement, and hands rows back with every column
//! rendered as text.
//!
//! Supported backends:
//! - `SQLite` (feature `sqlite`, on by default)

#![allow(clippy::doc_markdown)]
#![allow(clippy::result_large_err)]
#![allow(clippy::significant_drop_tightening)]

#[cfg(feature = "sqlite")]
pub mod sqlite;

#[cfg(feature = "sqlite")]
pub use sqlite::SqliteBackend;
