//! # horde-rs-db
//!
//! The ORM core of horde-rs. A record type declares its table, fields, and
//! relationships through [`Record`](schema::Record); the
//! [`Model`](query::Model) builder turns those declarations into one
//! parameterized SELECT with INNER JOINs along relationship chains, and the
//! [`Materializer`](materialize::Materializer) folds the flat result rows
//! back into a tree of nested records.
//!
//! ## Architecture
//!
//! Nothing here opens a connection. Every statement is handed to a
//! [`DbExecutor`](executor::DbExecutor) as SQL text plus named
//! [`Bindings`](value::Bindings), and rows come back with every column
//! rendered as text. Backends live in `horde-rs-db-backends`.
//!
//! ## Module Overview
//!
//! - [`schema`] - [`Record`](schema::Record), [`RecordMeta`](schema::RecordMeta), and [`describe`](schema::describe)
//! - [`relationship`] - Relationship declarations and chain resolution
//! - [`query`] - The query builder, plans, and the SQL compiler
//! - [`materialize`] - Row folding into [`MaterializedRecord`](materialize::MaterializedRecord)s
//! - [`mutation`] - INSERT and UPDATE execution
//! - [`executor`] - The [`DbExecutor`](executor::DbExecutor) seam
//! - [`value`] - [`Value`](value::Value), [`FlatRow`](value::FlatRow), and bindings
//! - [`from_value`] - Conversion of materialized values into typed fields

// - cast_precision_loss / cast_possible_truncation: i64 <-> f64 conversions are range-checked
// - result_large_err: HordeError is the crate-wide error type
// - return_self_not_must_use: builder methods are self-documenting
// - float_cmp: identity values are compared for exact integrality
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::result_large_err)]
#![allow(clippy::return_self_not_must_use)]
#![allow(clippy::float_cmp)]
#![allow(clippy::missing_const_for_fn)]
#![allow(clippy::option_if_let_else)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::doc_markdown)]

pub mod executor;
pub mod from_value;
pub mod materialize;
pub mod mutation;
pub mod query;
pub mod relationship;
pub mod schema;
pub mod value;

#[cfg(test)]
pub(crate) mod testing;

pub use horde_rs_core::{HordeError, HordeResult};

pub use executor::DbExecutor;
pub use from_value::{FromMaterialized, FromValue};
pub use materialize::{MaterializedRecord, Materializer, QueryResult};
pub use mutation::TranResult;
pub use query::{Model, Op, QueryMode, QueryPlan, SqlCompiler, Where};
pub use relationship::{resolve_chain, RelationKind, Relationship, ResolvedLink};
pub use schema::{describe, Column, FieldDef, FieldKind, Record, RecordMeta, Schema};
pub use value::{Binding, Bindings, FlatRow, Value};
