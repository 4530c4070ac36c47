//! The banking fixture records.
//!
//! A `Customer` has many `SavingsAccount`s, each of which has many
//! `Transaction`s stored in the `AccountTransaction` table. `Owner` leads
//! from an account back to its customer.

use horde_rs_macros::Record;

/// A bank customer.
#[derive(Debug, Clone, PartialEq, Record)]
#[record(
    table = "Customer",
    relation(
        name = "SavingsAccounts",
        to = "SavingsAccount",
        parent_key = "CustomerID",
        child_key = "FKCustomerIDAccount",
        kind = "has_many"
    )
)]
pub struct Customer {
    #[field(name = "CustomerID")]
    pub customer_id: String,
    #[field(name = "LastName")]
    pub last_name: String,
    #[field(name = "FirstName")]
    pub first_name: Option<String>,
}

/// A savings account owned by one customer.
#[derive(Debug, Clone, PartialEq, Record)]
#[record(
    table = "SavingsAccount",
    relation(
        name = "Transactions",
        to = "Transaction",
        parent_key = "AccountNumber",
        child_key = "FKAccountNumber",
        kind = "has_many"
    ),
    relation(
        name = "Owner",
        to = "Customer",
        parent_key = "FKCustomerIDAccount",
        child_key = "CustomerID",
        kind = "belongs_to_one"
    )
)]
pub struct SavingsAccount {
    #[field(name = "AccountNumber")]
    pub account_number: String,
    #[field(name = "FKCustomerIDAccount")]
    pub customer_id: String,
    #[field(name = "Balance")]
    pub balance: f64,
}

/// A posting against a savings account.
#[derive(Debug, Clone, PartialEq, Record)]
#[record(table = "AccountTransaction")]
pub struct Transaction {
    #[field(name = "TransactionID")]
    pub transaction_id: i64,
    #[field(name = "FKAccountNumber")]
    pub account_number: String,
    #[field(name = "Amount")]
    pub amount: f64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use horde_rs_db::relationship::{resolve_chain, RelationKind};
    use horde_rs_db::schema::{describe, FieldKind, Record};

    #[test]
    fn test_fixture_chain_resolves() {
        let links = resolve_chain(Customer::meta(), "SavingsAccounts.Transactions").unwrap();
        assert_eq!(links.len(), 2);
        assert_eq!(links[1].child().table, "AccountTransaction");
    }

    #[test]
    fn test_fixture_kinds() {
        let owner = SavingsAccount::meta().relationship("Owner").unwrap();
        assert_eq!(owner.kind, RelationKind::BelongsToOne);
        let schema = describe(Transaction::meta()).unwrap();
        let kinds: Vec<_> = schema.columns().iter().map(|c| c.kind).collect();
        assert_eq!(
            kinds,
            vec![FieldKind::Integer, FieldKind::String, FieldKind::Float]
        );
    }
}
