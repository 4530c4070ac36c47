//! The fluent query builder.
//!
//! [`Model`] is the entry point for every read and write of a record type.
//! Each call consumes the builder and returns it, so chains read naturally
//! and a builder cannot be reused once a terminal (`get` or `save`) has run.
//!
//! Builder calls never fail on their own. The first misuse (an unknown
//! relationship, an AND before any filter, a join whose prefix is missing)
//! is remembered and every later call becomes a no-op; the error surfaces
//! from `build`, `get`, or `save`.
//!
//! # Examples
//!
//! ```ignore
//! let customers = Model::<Customer>::new()
//!     .find_all()
//!     .join("SavingsAccounts", [Where::gt("Balance", 100.0)])
//!     .filter(Where::eq("LastName", "Smith"))
//!     .get(&db)
//!     .await?;
//! ```

use std::marker::PhantomData;

use horde_rs_core::logging::query_span;
use horde_rs_core::{CoercionPolicy, Dialect, HordeError, HordeResult, SETTINGS};
use tracing::Instrument;

use super::compiler::SqlCompiler;
use super::plan::{Connective, QueryMode, QueryPlan, Where};
use crate::executor::DbExecutor;
use crate::materialize::{Materializer, QueryResult};
use crate::mutation::{self, TranResult};
use crate::schema::{describe, Record};
use crate::value::{Bindings, Value};

/// A query or mutation against the table of record type `R`.
pub struct Model<R: Record> {
    plan: Option<QueryPlan>,
    coercion: CoercionPolicy,
    error: Option<HordeError>,
    _record: PhantomData<fn() -> R>,
}

impl<R: Record> Default for Model<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: Record> std::fmt::Debug for Model<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Model")
            .field("record", &R::meta().type_name)
            .field("plan", &self.plan)
            .field("coercion", &self.coercion)
            .field("error", &self.error)
            .finish()
    }
}

impl<R: Record> Model<R> {
    /// Creates an empty builder.
    ///
    /// The coercion policy starts from the global settings when they are
    /// configured, and from [`CoercionPolicy::Lenient`] otherwise.
    pub fn new() -> Self {
        Self {
            plan: None,
            coercion: SETTINGS.try_get().map(|s| s.coercion).unwrap_or_default(),
            error: None,
            _record: PhantomData,
        }
    }

    /// Selects every record of `R`.
    pub fn find_all(self) -> Self {
        self.start(QueryMode::All)
    }

    /// Selects the first record of `R`.
    pub fn find_one(self) -> Self {
        self.start(QueryMode::One)
    }

    /// Adds a filter on the base table. The first filter opens the WHERE
    /// clause; later ones are joined with AND.
    pub fn filter(self, filter: Where) -> Self {
        self.with_plan(|plan| plan.push_base_filter(None, filter))
    }

    /// Adds a filter on the base table joined with AND.
    pub fn and_filter(self, filter: Where) -> Self {
        self.with_plan(|plan| plan.push_base_filter(Some(Connective::And), filter))
    }

    /// Adds a filter on the base table joined with OR.
    pub fn or_filter(self, filter: Where) -> Self {
        self.with_plan(|plan| plan.push_base_filter(Some(Connective::Or), filter))
    }

    /// Joins the relationship chain `path` (for example `"SavingsAccounts"`
    /// or `"SavingsAccounts.Transactions"`) and filters the joined table by
    /// `extra`.
    ///
    /// Only the last relationship of the chain is joined. Every shorter
    /// prefix must already have been joined by an earlier call.
    pub fn join<I>(self, path: &str, extra: I) -> Self
    where
        I: IntoIterator<Item = Where>,
    {
        let extra: Vec<Where> = extra.into_iter().collect();
        self.with_plan(|plan| plan.add_join(path, extra))
    }

    /// Sets what happens when a numeric column does not parse.
    pub fn coercion(mut self, policy: CoercionPolicy) -> Self {
        self.coercion = policy;
        if let Some(plan) = self.plan.as_mut() {
            plan.set_coercion(policy);
        }
        self
    }

    /// The plan built so far.
    pub fn plan(&self) -> HordeResult<&QueryPlan> {
        if let Some(err) = &self.error {
            return Err(err.clone());
        }
        self.plan.as_ref().ok_or_else(|| {
            HordeError::InvalidQueryState(format!(
                "no query on '{}': call find_all or find_one first",
                R::meta().table
            ))
        })
    }

    /// Renders the SELECT for `dialect` without running it.
    pub fn build(&self, dialect: Dialect) -> HordeResult<(String, Bindings)> {
        Ok(SqlCompiler::new(dialect).compile_select(self.plan()?))
    }

    /// Renders the SELECT for the dialect in the global settings, or for
    /// [`Dialect::SqlServer`] when nothing was configured.
    pub fn build_default(&self) -> HordeResult<(String, Bindings)> {
        self.build(SETTINGS.try_get().map(|s| s.dialect).unwrap_or_default())
    }

    /// Runs the SELECT and folds the rows into records.
    pub async fn get(self, db: &dyn DbExecutor) -> HordeResult<QueryResult> {
        if let Some(err) = self.error {
            return Err(err);
        }
        let Some(plan) = self.plan else {
            return Err(HordeError::InvalidQueryState(format!(
                "no query on '{}': call find_all or find_one first",
                R::meta().table
            )));
        };
        let span = query_span(plan.table());

        async {
            let (sql, bindings) = SqlCompiler::new(db.dialect()).compile_select(&plan);
            tracing::debug!(sql = %sql, bindings = bindings.len(), "horde.select");
            let rows = db.execute_query(&sql, &bindings).await?;
            tracing::debug!(rows = rows.len(), "horde.select rows");
            Materializer::new(&plan).materialize(&rows)
        }
        .instrument(span)
        .await
    }

    /// Writes `fields` (storage column, value) to the table of `R`.
    ///
    /// A builder that never called `find_all` / `find_one` inserts a row,
    /// reading back the generated identity when `auto_increment` is set. A
    /// find-style builder with at least one filter and no joins updates the
    /// rows its filters select; `auto_increment` is ignored.
    pub async fn save<I, K, V>(
        self,
        fields: I,
        auto_increment: bool,
        db: &dyn DbExecutor,
    ) -> HordeResult<TranResult>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        if let Some(err) = self.error {
            return Err(err);
        }
        let schema = describe(R::meta())?;
        let fields = fields
            .into_iter()
            .map(|(k, v)| {
                let key: String = k.into();
                let column = schema.storage_column(&key)?;
                Ok((column.to_string(), v.into()))
            })
            .collect::<HordeResult<Vec<(String, Value)>>>()?;
        let table = R::meta().table;

        match self.plan {
            None => {
                mutation::insert(db, table, &fields, auto_increment)
                    .instrument(query_span(table))
                    .await
            }
            Some(plan) => {
                mutation::update(db, &plan, &fields)
                    .instrument(query_span(table))
                    .await
            }
        }
    }

    // ── internals ────────────────────────────────────────────────────

    fn start(mut self, mode: QueryMode) -> Self {
        if self.error.is_some() {
            return self;
        }
        if self.plan.is_some() {
            return self.fail(HordeError::InvalidQueryState(format!(
                "query on '{}' already started",
                R::meta().table
            )));
        }
        match QueryPlan::new(mode, R::meta()) {
            Ok(mut plan) => {
                plan.set_coercion(self.coercion);
                self.plan = Some(plan);
                self
            }
            Err(e) => self.fail(e),
        }
    }

    fn with_plan<F>(mut self, f: F) -> Self
    where
        F: FnOnce(&mut QueryPlan) -> HordeResult<()>,
    {
        if self.error.is_some() {
            return self;
        }
        let result = match self.plan.as_mut() {
            Some(plan) => f(plan),
            None => Err(HordeError::InvalidQueryState(format!(
                "no query on '{}': call find_all or find_one first",
                R::meta().table
            ))),
        };
        match result {
            Ok(()) => self,
            Err(e) => self.fail(e),
        }
    }

    fn fail(mut self, err: HordeError) -> Self {
        tracing::debug!(error = %err, "query builder misuse");
        if self.error.is_none() {
            self.error = Some(err);
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{row, Customer, RecordingExecutor};

    #[tokio::test]
    async fn test_get_find_one_with_join() {
        let db = RecordingExecutor::new(Dialect::SqlServer).with_rows(vec![
            row(&[
                ("CustomerCustomerID", Some("026-0000002")),
                ("CustomerLastName", Some("Smith")),
                ("CustomerFirstName", Some("Jane")),
                ("SavingsAccountAccountNumber", Some("A1")),
                ("SavingsAccountFKCustomerIDAccount", Some("026-0000002")),
                ("SavingsAccountBalance", Some("100.50")),
            ]),
            row(&[
                ("CustomerCustomerID", Some("026-0000002")),
                ("CustomerLastName", Some("Smith")),
                ("CustomerFirstName", Some("Jane")),
                ("SavingsAccountAccountNumber", Some("A2")),
                ("SavingsAccountFKCustomerIDAccount", Some("026-0000002")),
                ("SavingsAccountBalance", Some("7")),
            ]),
        ]);

        let record = Model::<Customer>::new()
            .find_one()
            .join("SavingsAccounts", [])
            .filter(Where::eq("CustomerID", "026-0000002"))
            .get(&db)
            .await
            .unwrap()
            .into_one()
            .unwrap();

        let accounts = record.related("SavingsAccounts").unwrap();
        assert_eq!(accounts.len(), 2);
        assert_eq!(accounts[0].get("AccountNumber"), Some(&Value::from("A1")));
        assert_eq!(accounts[1].get("AccountNumber"), Some(&Value::from("A2")));
        assert_eq!(accounts[0].get("Balance"), Some(&Value::Float(100.5)));

        let statements = db.statements().await;
        assert_eq!(statements.len(), 1);
        let (sql, bindings) = &statements[0];
        assert!(sql.contains("INNER JOIN SavingsAccount"));
        assert!(sql.contains("WHERE Customer.CustomerID = @CustomerCustomerID"));
        assert_eq!(
            bindings.get("CustomerCustomerID"),
            Some(&Value::from("026-0000002"))
        );
    }

    #[tokio::test]
    async fn test_get_reports_builder_misuse_without_executing() {
        let db = RecordingExecutor::new(Dialect::SqlServer);
        let err = Model::<Customer>::new()
            .find_all()
            .or_filter(Where::eq("LastName", "Smith"))
            .get(&db)
            .await
            .unwrap_err();
        assert!(err.is_builder_misuse());
        assert!(db.statements().await.is_empty());

        let err = Model::<Customer>::new().get(&db).await.unwrap_err();
        assert!(matches!(err, HordeError::InvalidQueryState(_)));
    }

    #[tokio::test]
    async fn test_get_propagates_execution_failure() {
        let db = RecordingExecutor::new(Dialect::SqlServer).failing("connection reset");
        let err = Model::<Customer>::new().find_all().get(&db).await.unwrap_err();
        match err {
            HordeError::ExecutionFailure(msg) => assert_eq!(msg, "connection reset"),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_save_insert_with_identity() {
        let db = RecordingExecutor::new(Dialect::SqlServer)
            .with_rows(vec![row(&[("ID", Some("17"))])]);
        let result = Model::<Customer>::new()
            .save([("LastName", "X")], true, &db)
            .await
            .unwrap();
        assert_eq!(
            result,
            TranResult {
                last_inserted_id: 17,
                rows_affected: 1
            }
        );
        let statements = db.statements().await;
        assert_eq!(
            statements[0].0,
            "INSERT INTO Customer (LastName) VALUES (@LastName); \
             SELECT ID = CONVERT(BIGINT, SCOPE_IDENTITY());"
        );
    }

    #[tokio::test]
    async fn test_save_insert_zero_identity() {
        let db = RecordingExecutor::new(Dialect::Sqlite).with_rows(vec![row(&[("ID", Some("0"))])]);
        let result = Model::<Customer>::new()
            .save([("LastName", "X")], true, &db)
            .await
            .unwrap();
        assert_eq!(result, TranResult::default());
    }

    #[tokio::test]
    async fn test_save_insert_without_identity() {
        let db = RecordingExecutor::new(Dialect::Sqlite).with_affected(1);
        let result = Model::<Customer>::new()
            .save(
                vec![
                    ("CustomerID".to_string(), Value::from("9")),
                    ("LastName".to_string(), Value::from("X")),
                ],
                false,
                &db,
            )
            .await
            .unwrap();
        assert_eq!(result.rows_affected, 1);
        assert_eq!(result.last_inserted_id, 0);
        let statements = db.statements().await;
        assert_eq!(
            statements[0].0,
            "INSERT INTO Customer (CustomerID, LastName) VALUES (:CustomerID, :LastName)"
        );
    }

    #[tokio::test]
    async fn test_save_update() {
        let db = RecordingExecutor::new(Dialect::SqlServer).with_affected(3);
        let result = Model::<Customer>::new()
            .find_all()
            .filter(Where::eq("LastName", "Smith"))
            .save([("FirstName", "Ann")], false, &db)
            .await
            .unwrap();
        assert_eq!(result.rows_affected, 3);
        let statements = db.statements().await;
        let (sql, bindings) = &statements[0];
        assert_eq!(
            sql,
            "UPDATE Customer SET FirstName = @valFirstName WHERE Customer.LastName = @CustomerLastName"
        );
        assert_eq!(bindings.len(), 2);
    }

    #[tokio::test]
    async fn test_save_rejects_invalid_mutations() {
        let db = RecordingExecutor::new(Dialect::SqlServer);

        let empty: [(&str, &str); 0] = [];
        let err = Model::<Customer>::new().save(empty, true, &db).await.unwrap_err();
        assert!(matches!(err, HordeError::InvalidQueryState(_)));

        let err = Model::<Customer>::new()
            .find_all()
            .save([("FirstName", "Ann")], false, &db)
            .await
            .unwrap_err();
        assert!(matches!(err, HordeError::InvalidQueryState(_)));

        assert!(db.statements().await.is_empty());
    }

    #[tokio::test]
    async fn test_save_rejects_unknown_columns() {
        let db = RecordingExecutor::new(Dialect::SqlServer).with_affected(1);

        let err = Model::<Customer>::new()
            .save([("Nickname", "Al")], false, &db)
            .await
            .unwrap_err();
        assert!(matches!(err, HordeError::InvalidQueryState(m) if m.contains("Nickname")));

        let err = Model::<Customer>::new()
            .find_all()
            .filter(Where::eq("LastName", "Smith"))
            .save([("LastName = 'x' --", "Ann")], false, &db)
            .await
            .unwrap_err();
        assert!(matches!(err, HordeError::InvalidQueryState(_)));

        assert!(db.statements().await.is_empty());
    }

    #[test]
    fn test_filters_reject_unknown_columns() {
        let err = Model::<Customer>::new()
            .find_all()
            .filter(Where::eq("1 = 1 OR LastName", "Smith"))
            .build(Dialect::SqlServer)
            .unwrap_err();
        assert!(matches!(err, HordeError::InvalidQueryState(_)));

        let err = Model::<Customer>::new()
            .find_all()
            .join("SavingsAccounts", [Where::gt("LastName", 1)])
            .build(Dialect::SqlServer)
            .unwrap_err();
        assert!(matches!(err, HordeError::InvalidQueryState(m) if m.contains("SavingsAccount")));
    }

    #[test]
    fn test_build_default_uses_default_dialect() {
        let model = Model::<Customer>::new()
            .find_all()
            .filter(Where::eq("LastName", "Smith"));
        assert_eq!(
            model.build_default().unwrap(),
            model.build(Dialect::SqlServer).unwrap()
        );
    }
}
