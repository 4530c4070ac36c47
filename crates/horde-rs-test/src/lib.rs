//! # horde-rs-test
//!
//! Testing utilities for horde-rs. Provides a recording [`MockExecutor`] that
//! replays canned rows, a [`FlatRowBuilder`] for hand-written result rows,
//! query-count assertions, the shared banking fixture records, and (with the
//! `sqlite` feature) an in-memory [`TestDatabase`](test_database::TestDatabase).
//!
//! ## Example
//!
//! ```rust,no_run
//! use horde_rs_db::query::{Model, Where};
//! use horde_rs_test::fixtures::Customer;
//! use horde_rs_test::{FlatRowBuilder, MockExecutor};
//!
//! async fn example() {
//!     let db = MockExecutor::sqlite().with_rows(vec![FlatRowBuilder::new()
//!         .column("CustomerCustomerID", "026-0000002")
//!         .column("CustomerLastName", "Smith")
//!         .null("CustomerFirstName")
//!         .build()]);
//!     let result = Model::<Customer>::new()
//!         .find_one()
//!         .filter(Where::eq("CustomerID", "026-0000002"))
//!         .get(&db)
//!         .await
//!         .unwrap();
//!     assert_eq!(result.len(), 1);
//! }
//! ```

#![allow(clippy::doc_markdown)]
#![allow(clippy::return_self_not_must_use)]

pub mod assert_queries;
pub mod fixtures;
pub mod mock_executor;
pub mod rows;
#[cfg(feature = "sqlite")]
pub mod test_database;

pub use assert_queries::{assert_max_queries, assert_num_queries, QueryCounter};
pub use mock_executor::MockExecutor;
pub use rows::FlatRowBuilder;
#[cfg(feature = "sqlite")]
pub use test_database::TestDatabase;
