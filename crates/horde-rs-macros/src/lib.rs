//! # horde-rs-macros
//!
//! Procedural macros for horde-rs. `#[derive(Record)]` turns a named struct
//! into a record type: it implements `horde_rs_db::schema::Record` with a
//! static declaration of the table, fields, and relationships, and
//! `horde_rs_db::from_value::FromMaterialized` so materialized rows can be
//! read back into the struct.
//!
//! This crate is independent of the other horde-rs crates because proc-macro
//! crates cannot depend on crates that use them.

use proc_macro::TokenStream;
use syn::{parse_macro_input, DeriveInput};

mod record;

/// Derives `Record` and `FromMaterialized` for a named struct.
///
/// ```ignore
/// #[derive(Record)]
/// #[record(
///     table = "Customer",
///     relation(
///         name = "SavingsAccounts",
///         to = "SavingsAccount",
///         parent_key = "CustomerID",
///         child_key = "FKCustomerIDAccount",
///         kind = "has_many",
///     )
/// )]
/// pub struct Customer {
///     #[field(name = "CustomerID")]
///     pub customer_id: String,
///     #[field(name = "LastName")]
///     pub last_name: String,
/// }
/// ```
///
/// Struct attributes (`#[record(...)]`):
///
/// - `table`: the table name; defaults to the struct name.
/// - `relation(name, to, parent_key, child_key, kind)`: repeatable. `to` is
///   the related record type; `kind` is one of `has_one`, `has_many`,
///   `belongs_to_many`, `belongs_to_one` (or the codes `"00"` to `"03"`) and
///   defaults to `has_many`.
///
/// Field attributes (`#[field(...)]`):
///
/// - `name`: the field name used in aliases and materialized records;
///   defaults to the Rust field name.
/// - `column`: the storage column; defaults to the field name.
#[proc_macro_derive(Record, attributes(record, field))]
pub fn derive_record(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    record::derive_record_impl(&input).into()
}
