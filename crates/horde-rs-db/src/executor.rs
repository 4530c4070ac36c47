//! The SQL execution collaborator.
//!
//! horde-rs never talks to a database itself. It emits SQL text plus named
//! [`Bindings`] and hands them to a [`DbExecutor`], which runs the statement
//! and returns rows with every column rendered as text. Backends live in the
//! `horde-rs-db-backends` crate; tests use an in-memory recorder.

use horde_rs_core::{Dialect, HordeError, HordeResult};

use crate::value::{Bindings, FlatRow};

/// Minimal async database executor trait.
///
/// Builder terminals accept `&dyn DbExecutor`. Failures are returned as
/// [`HordeError::ExecutionFailure`] and passed through to the caller
/// unchanged.
#[async_trait::async_trait]
pub trait DbExecutor: Send + Sync {
    /// The dialect statements for this executor must be written in.
    fn dialect(&self) -> Dialect;

    /// Runs a query and returns every row, in the order the database
    /// produced them.
    async fn execute_query(&self, sql: &str, bindings: &Bindings) -> HordeResult<Vec<FlatRow>>;

    /// Runs a statement that returns no rows and reports the rows affected.
    async fn execute_statement(&self, sql: &str, bindings: &Bindings) -> HordeResult<u64>;

    /// Runs a statement that produces a single row, such as an INSERT that
    /// reads back its generated identity.
    ///
    /// The default runs [`execute_query`](DbExecutor::execute_query) and
    /// keeps the first row.
    async fn execute_scalar(&self, sql: &str, bindings: &Bindings) -> HordeResult<FlatRow> {
        self.execute_query(sql, bindings)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| {
                HordeError::ExecutionFailure("statement returned no rows".to_string())
            })
    }
}
