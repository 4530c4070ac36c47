//! # horde-rs
//!
//! A relationship-aware ORM layer. Record types declare their table, fields,
//! and relationships; a fluent builder turns a relationship path such as
//! `"SavingsAccounts.Transactions"` into a single SELECT with INNER JOINs,
//! and the flat result rows are folded back into nested records.
//!
//! This is the meta-crate that re-exports the sub-crates. Depend on it for
//! everything, or on the individual crates for finer-grained control. Code
//! generated by `#[derive(Record)]` names `horde_rs_db` directly, so crates
//! using the derive also depend on `horde-rs-db`.
//!
//! ```rust,no_run
//! use horde_rs::prelude::*;
//!
//! async fn accounts<R: Record>(db: &dyn DbExecutor) -> HordeResult<QueryResult> {
//!     Model::<R>::new()
//!         .find_all()
//!         .join("SavingsAccounts", [Where::gt("Balance", 100.0)])
//!         .get(db)
//!         .await
//! }
//! ```

/// Error types, settings, and logging setup.
pub use horde_rs_core as core;

/// Records, relationships, the query builder, the materializer, and mutations.
pub use horde_rs_db as db;

/// Execution backends.
pub use horde_rs_db_backends as db_backends;

/// `#[derive(Record)]`.
#[cfg(feature = "macros")]
pub use horde_rs_macros as macros;

/// Mock executor, row builders, query-count assertions, and fixtures.
#[cfg(feature = "testing")]
pub use horde_rs_test as test;

/// The types most programs need.
pub mod prelude {
    pub use horde_rs_core::{CoercionPolicy, Dialect, HordeError, HordeResult, Settings};
    pub use horde_rs_db::{
        DbExecutor, FromMaterialized, MaterializedRecord, Model, QueryResult, Record,
        RelationKind, TranResult, Value, Where,
    };

    #[cfg(feature = "sqlite")]
    pub use horde_rs_db_backends::SqliteBackend;

    #[cfg(feature = "macros")]
    pub use horde_rs_macros::Record;
}
