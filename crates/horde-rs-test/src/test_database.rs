//! Test database utilities.
//!
//! Provides [`TestDatabase`], an in-memory SQLite database for tests. It
//! implements [`DbExecutor`] so builders run against it directly, creates
//! tables from record declarations, and counts executed statements for
//! [`assert_num_queries`](crate::assert_num_queries).
//!
//! ## Example
//!
//! ```rust,no_run
//! use horde_rs_db::schema::Record;
//! use horde_rs_test::fixtures::Customer;
//! use horde_rs_test::TestDatabase;
//!
//! async fn example() {
//!     let db = TestDatabase::new();
//!     db.setup_table(Customer::meta()).await.unwrap();
//! }
//! ```

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use horde_rs_core::{Dialect, HordeError, HordeResult};
use horde_rs_db::executor::DbExecutor;
use horde_rs_db::schema::{describe, FieldKind, RecordMeta};
use horde_rs_db::value::{Bindings, FlatRow};
use horde_rs_db_backends::SqliteBackend;

use crate::assert_queries::QueryCounter;

/// An in-memory SQLite database for testing.
///
/// Clones share the same connection and counter.
#[derive(Clone)]
pub struct TestDatabase {
    backend: Arc<SqliteBackend>,
    query_count: Arc<AtomicUsize>,
}

impl TestDatabase {
    /// Creates a new in-memory SQLite test database.
    ///
    /// # Panics
    ///
    /// Panics if the in-memory database cannot be created.
    pub fn new() -> Self {
        let backend = SqliteBackend::memory().expect("Failed to create in-memory SQLite database");
        Self {
            backend: Arc::new(backend),
            query_count: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Creates the table a record declares.
    ///
    /// The identity field becomes the primary key; an integer identity is
    /// assigned by SQLite on insert.
    pub async fn setup_table(&self, meta: &RecordMeta) -> HordeResult<()> {
        let sql = Self::create_table_sql(meta)?;
        self.execute_raw(&sql).await
    }

    /// Drops every user table.
    pub async fn teardown(&self) -> HordeResult<()> {
        let rows = self
            .backend
            .execute_query(
                "SELECT name AS name FROM sqlite_master WHERE type='table' AND name NOT LIKE 'sqlite_%'",
                &Bindings::new(),
            )
            .await?;
        for row in &rows {
            let name = row.get("name").ok_or_else(|| {
                HordeError::ExecutionFailure("sqlite_master row without a name".to_string())
            })?;
            self.backend
                .execute_batch(&format!("DROP TABLE IF EXISTS \"{name}\""))
                .await?;
        }
        Ok(())
    }

    /// Executes raw SQL with no parameters. Counts as one statement.
    pub async fn execute_raw(&self, sql: &str) -> HordeResult<()> {
        self.query_count.fetch_add(1, Ordering::Relaxed);
        self.backend.execute_batch(sql).await
    }

    pub fn backend(&self) -> &SqliteBackend {
        &self.backend
    }

    fn create_table_sql(meta: &RecordMeta) -> HordeResult<String> {
        let schema = describe(meta)?;
        let identity = schema.identity().name;
        let columns: Vec<String> = schema
            .columns()
            .iter()
            .map(|c| {
                let ty = match c.kind {
                    FieldKind::String => "TEXT",
                    FieldKind::Integer => "INTEGER",
                    FieldKind::Float => "REAL",
                };
                if c.name == identity {
                    format!("\"{}\" {ty} PRIMARY KEY", c.column)
                } else {
                    format!("\"{}\" {ty}", c.column)
                }
            })
            .collect();
        Ok(format!(
            "CREATE TABLE IF NOT EXISTS \"{}\" ({})",
            schema.table(),
            columns.join(", ")
        ))
    }
}

impl Default for TestDatabase {
    fn default() -> Self {
        Self::new()
    }
}

impl QueryCounter for TestDatabase {
    fn query_count(&self) -> usize {
        self.query_count.load(Ordering::Relaxed)
    }

    fn reset_query_count(&self) {
        self.query_count.store(0, Ordering::Relaxed);
    }
}

#[async_trait::async_trait]
impl DbExecutor for TestDatabase {
    fn dialect(&self) -> Dialect {
        Dialect::Sqlite
    }

    async fn execute_query(&self, sql: &str, bindings: &Bindings) -> HordeResult<Vec<FlatRow>> {
        self.query_count.fetch_add(1, Ordering::Relaxed);
        self.backend.execute_query(sql, bindings).await
    }

    async fn execute_statement(&self, sql: &str, bindings: &Bindings) -> HordeResult<u64> {
        self.query_count.fetch_add(1, Ordering::Relaxed);
        self.backend.execute_statement(sql, bindings).await
    }

    async fn execute_scalar(&self, sql: &str, bindings: &Bindings) -> HordeResult<FlatRow> {
        self.query_count.fetch_add(1, Ordering::Relaxed);
        self.backend.execute_scalar(sql, bindings).await
    }
}
