//! A recording executor with canned results.
//!
//! [`MockExecutor`] never touches a database. Every statement handed to it
//! is recorded together with its bindings, queries replay the configured
//! rows, statements report the configured rows-affected count, and scalar
//! statements return the configured identity row. A failure message turns
//! every call into an `ExecutionFailure`.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use horde_rs_core::{Dialect, HordeError, HordeResult};
use horde_rs_db::executor::DbExecutor;
use horde_rs_db::value::{Bindings, FlatRow};

use crate::assert_queries::QueryCounter;

/// A statement recorded by [`MockExecutor`].
#[derive(Debug, Clone)]
pub struct RecordedStatement {
    /// The SQL text as compiled.
    pub sql: String,
    /// The bindings passed alongside.
    pub bindings: Bindings,
}

/// An in-process [`DbExecutor`] that records statements and replays canned
/// results.
#[derive(Debug)]
pub struct MockExecutor {
    dialect: Dialect,
    rows: Vec<FlatRow>,
    scalar: Option<FlatRow>,
    affected: u64,
    fail_with: Option<String>,
    executed: Mutex<Vec<RecordedStatement>>,
    query_count: AtomicUsize,
}

impl MockExecutor {
    /// Creates a mock speaking the given dialect, with no canned results.
    pub fn new(dialect: Dialect) -> Self {
        Self {
            dialect,
            rows: Vec::new(),
            scalar: None,
            affected: 0,
            fail_with: None,
            executed: Mutex::new(Vec::new()),
            query_count: AtomicUsize::new(0),
        }
    }

    /// Creates a SQL Server mock.
    pub fn sql_server() -> Self {
        Self::new(Dialect::SqlServer)
    }

    /// Creates a SQLite mock.
    pub fn sqlite() -> Self {
        Self::new(Dialect::Sqlite)
    }

    /// Rows returned by every query.
    pub fn with_rows(mut self, rows: Vec<FlatRow>) -> Self {
        self.rows = rows;
        self
    }

    /// The row returned by scalar statements; falls back to the first canned
    /// query row when unset.
    pub fn with_scalar(mut self, row: FlatRow) -> Self {
        self.scalar = Some(row);
        self
    }

    /// The rows-affected count reported by statements.
    pub const fn with_affected(mut self, affected: u64) -> Self {
        self.affected = affected;
        self
    }

    /// Makes every call fail with `ExecutionFailure(message)`.
    pub fn failing(mut self, message: impl Into<String>) -> Self {
        self.fail_with = Some(message.into());
        self
    }

    /// Returns every statement seen so far, in order.
    pub fn statements(&self) -> Vec<RecordedStatement> {
        self.executed
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }

    /// Returns the SQL of the most recent statement.
    pub fn last_sql(&self) -> Option<String> {
        self.statements().pop().map(|s| s.sql)
    }

    fn record(&self, sql: &str, bindings: &Bindings) -> HordeResult<()> {
        self.query_count.fetch_add(1, Ordering::Relaxed);
        if let Ok(mut executed) = self.executed.lock() {
            executed.push(RecordedStatement {
                sql: sql.to_string(),
                bindings: bindings.clone(),
            });
        }
        tracing::trace!(sql = %sql, bindings = bindings.len(), "horde.mock.record");
        match &self.fail_with {
            Some(message) => Err(HordeError::ExecutionFailure(message.clone())),
            None => Ok(()),
        }
    }
}

impl QueryCounter for MockExecutor {
    fn query_count(&self) -> usize {
        self.query_count.load(Ordering::Relaxed)
    }

    fn reset_query_count(&self) {
        self.query_count.store(0, Ordering::Relaxed);
    }
}

#[async_trait::async_trait]
impl DbExecutor for MockExecutor {
    fn dialect(&self) -> Dialect {
        self.dialect
    }

    async fn execute_query(&self, sql: &str, bindings: &Bindings) -> HordeResult<Vec<FlatRow>> {
        self.record(sql, bindings)?;
        Ok(self.rows.clone())
    }

    async fn execute_statement(&self, sql: &str, bindings: &Bindings) -> HordeResult<u64> {
        self.record(sql, bindings)?;
        Ok(self.affected)
    }

    async fn execute_scalar(&self, sql: &str, bindings: &Bindings) -> HordeResult<FlatRow> {
        self.record(sql, bindings)?;
        self.scalar
            .clone()
            .or_else(|| self.rows.first().cloned())
            .ok_or_else(|| HordeError::ExecutionFailure("statement returned no rows".to_string()))
    }
}
