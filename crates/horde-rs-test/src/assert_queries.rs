//! Query counting assertions.
//!
//! [`assert_num_queries`] counts the statements an executor receives while
//! an async closure runs. A query builder issues exactly one SELECT per
//! `get`, however many relationships it joins, and these assertions pin that
//! down in tests.
//!
//! ## Example
//!
//! ```rust,no_run
//! use horde_rs_db::query::Model;
//! use horde_rs_test::assert_queries::assert_num_queries;
//! use horde_rs_test::fixtures::Customer;
//! use horde_rs_test::MockExecutor;
//!
//! async fn example() {
//!     let db = MockExecutor::sql_server();
//!     assert_num_queries(&db, 1, || async {
//!         Model::<Customer>::new()
//!             .find_all()
//!             .join("SavingsAccounts", [])
//!             .join("SavingsAccounts.Transactions", [])
//!             .get(&db)
//!             .await
//!             .unwrap();
//!     })
//!     .await;
//! }
//! ```

use std::future::Future;

/// An executor that counts the statements it receives.
pub trait QueryCounter {
    /// Statements received since the last reset.
    fn query_count(&self) -> usize;

    /// Resets the counter to zero.
    fn reset_query_count(&self);
}

/// Asserts that exactly `expected_count` statements are executed during the
/// async closure.
///
/// # Panics
///
/// Panics if the number of statements does not match `expected_count`.
pub async fn assert_num_queries<D, F, Fut>(db: &D, expected_count: usize, f: F)
where
    D: QueryCounter + ?Sized,
    F: FnOnce() -> Fut,
    Fut: Future<Output = ()>,
{
    db.reset_query_count();
    f().await;
    let actual = db.query_count();
    assert_eq!(
        actual, expected_count,
        "Expected {expected_count} SQL queries, but {actual} were executed"
    );
}

/// Asserts that at most `max_count` statements are executed during the async
/// closure.
///
/// # Panics
///
/// Panics if more than `max_count` statements are executed.
pub async fn assert_max_queries<D, F, Fut>(db: &D, max_count: usize, f: F)
where
    D: QueryCounter + ?Sized,
    F: FnOnce() -> Fut,
    Fut: Future<Output = ()>,
{
    db.reset_query_count();
    f().await;
    let actual = db.query_count();
    assert!(
        actual <= max_count,
        "Expected at most {max_count} SQL queries, but {actual} were executed"
    );
}
