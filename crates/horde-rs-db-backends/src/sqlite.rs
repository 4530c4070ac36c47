//! SQLite execution backend using `rusqlite`.
//!
//! This module provides the [`SqliteBackend`], which implements
//! [`DbExecutor`] using `rusqlite` wrapped in `tokio::task::spawn_blocking`
//! for async compatibility.
//!
//! - Named parameters (`:name`) are bound from [`Bindings`] by name
//! - Every column value is rendered to text; NULL stays NULL
//! - In-memory databases via `:memory:` (great for testing)

use std::path::PathBuf;
use std::sync::Arc;

use horde_rs_core::{Dialect, HordeError, HordeResult};
use horde_rs_db::executor::DbExecutor;
use horde_rs_db::value::{Bindings, FlatRow, Value};
use rusqlite::types::ValueRef;
use tokio::sync::Mutex;

/// A SQLite database backend.
///
/// Uses a single `rusqlite` connection behind an async mutex. All work runs
/// on the blocking thread pool.
pub struct SqliteBackend {
    /// The path to the database file (or ":memory:").
    path: PathBuf,
    /// The connection, guarded by an async mutex.
    conn: Arc<Mutex<rusqlite::Connection>>,
}

fn failure(context: &str, e: impl std::fmt::Display) -> HordeError {
    HordeError::ExecutionFailure(format!("{context}: {e}"))
}

impl SqliteBackend {
    /// Opens a SQLite database at the given path.
    ///
    /// If the path is `:memory:`, an in-memory database is created.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened.
    pub fn open(path: impl Into<PathBuf>) -> HordeResult<Self> {
        let path = path.into();
        let conn = if path.to_str() == Some(":memory:") {
            rusqlite::Connection::open_in_memory()
        } else {
            rusqlite::Connection::open(&path)
        }
        .map_err(|e| failure("SQLite open failed", e))?;

        conn.execute_batch("PRAGMA foreign_keys=ON;")
            .map_err(|e| failure("Failed to set pragmas", e))?;

        tracing::debug!(path = %path.display(), "horde.sqlite.open");
        Ok(Self {
            path,
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Opens an in-memory database.
    pub fn memory() -> HordeResult<Self> {
        Self::open(":memory:")
    }

    /// Returns the database file path.
    pub const fn path(&self) -> &PathBuf {
        &self.path
    }

    /// Runs one or more statements without parameters, e.g. schema setup.
    pub async fn execute_batch(&self, sql: &str) -> HordeResult<()> {
        let conn = Arc::clone(&self.conn);
        let sql = sql.to_string();
        tokio::task::spawn_blocking(move || {
            let conn = conn.blocking_lock();
            conn.execute_batch(&sql)
                .map_err(|e| failure("SQLite batch failed", e))
        })
        .await
        .map_err(|e| failure("Task join error", e))?
    }

    /// Binds every binding the statement references, by `:name`.
    fn bind_params(stmt: &mut rusqlite::Statement<'_>, bindings: &Bindings) -> HordeResult<()> {
        for binding in bindings {
            let key = format!(":{}", binding.name);
            let Some(idx) = stmt
                .parameter_index(&key)
                .map_err(|e| failure("Parameter lookup failed", e))?
            else {
                continue;
            };
            let bound = match &binding.value {
                Value::Null => stmt.raw_bind_parameter(idx, rusqlite::types::Null),
                Value::Bool(b) => stmt.raw_bind_parameter(idx, b),
                Value::Int(v) => stmt.raw_bind_parameter(idx, v),
                Value::Float(v) => stmt.raw_bind_parameter(idx, v),
                Value::String(s) => stmt.raw_bind_parameter(idx, s.as_str()),
            };
            bound.map_err(|e| failure(&format!("Failed to bind {key}"), e))?;
        }
        Ok(())
    }

    /// Renders one `rusqlite` row as text columns.
    fn convert_row(row: &rusqlite::Row<'_>, column_names: &[String]) -> HordeResult<FlatRow> {
        column_names
            .iter()
            .enumerate()
            .map(|(i, name)| {
                let value = row
                    .get_ref(i)
                    .map_err(|e| failure(&format!("Failed to read column {name}"), e))?;
                let text = match value {
                    ValueRef::Null => None,
                    ValueRef::Integer(v) => Some(v.to_string()),
                    ValueRef::Real(v) => Some(v.to_string()),
                    ValueRef::Text(b) | ValueRef::Blob(b) => {
                        Some(String::from_utf8_lossy(b).into_owned())
                    }
                };
                Ok((name.clone(), text))
            })
            .collect()
    }
}

#[async_trait::async_trait]
impl DbExecutor for SqliteBackend {
    fn dialect(&self) -> Dialect {
        Dialect::Sqlite
    }

    async fn execute_query(&self, sql: &str, bindings: &Bindings) -> HordeResult<Vec<FlatRow>> {
        tracing::debug!(sql = %sql, params = bindings.len(), "horde.sqlite.query");
        let conn = Arc::clone(&self.conn);
        let sql = sql.to_string();
        let bindings = bindings.clone();

        tokio::task::spawn_blocking(move || {
            let conn = conn.blocking_lock();
            let mut stmt = conn
                .prepare(&sql)
                .map_err(|e| failure("SQLite prepare failed", e))?;

            let column_names: Vec<String> = stmt
                .column_names()
                .into_iter()
                .map(String::from)
                .collect();

            Self::bind_params(&mut stmt, &bindings)?;

            let mut raw_rows = stmt.raw_query();
            let mut rows = Vec::new();
            while let Some(row) = raw_rows
                .next()
                .map_err(|e| failure("SQLite query failed", e))?
            {
                rows.push(Self::convert_row(row, &column_names)?);
            }
            Ok(rows)
        })
        .await
        .map_err(|e| failure("Task join error", e))?
    }

    async fn execute_statement(&self, sql: &str, bindings: &Bindings) -> HordeResult<u64> {
        tracing::debug!(sql = %sql, params = bindings.len(), "horde.sqlite.execute");
        let conn = Arc::clone(&self.conn);
        let sql = sql.to_string();
        let bindings = bindings.clone();

        tokio::task::spawn_blocking(move || {
            let conn = conn.blocking_lock();
            let mut stmt = conn
                .prepare(&sql)
                .map_err(|e| failure("SQLite prepare failed", e))?;
            Self::bind_params(&mut stmt, &bindings)?;
            let count = stmt
                .raw_execute()
                .map_err(|e| failure("SQLite execute failed", e))?;
            Ok(count as u64)
        })
        .await
        .map_err(|e| failure("Task join error", e))?
    }
}
