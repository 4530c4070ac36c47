//! Fixtures shared by the unit tests of this crate.

use std::sync::LazyLock;

use horde_rs_core::{Dialect, HordeError, HordeResult};
use tokio::sync::Mutex as TokioMutex;

use crate::executor::DbExecutor;
use crate::relationship::{RelationKind, Relationship};
use crate::schema::{FieldDef, Record, RecordMeta};
use crate::value::{Bindings, FlatRow};

pub struct Customer;
pub struct SavingsAccount;
pub struct Transaction;
pub struct Gadget;

static CUSTOMER: LazyLock<RecordMeta> = LazyLock::new(|| RecordMeta {
    type_name: "Customer",
    table: "Customer",
    fields: vec![
        FieldDef::new("CustomerID", "CustomerID", "String"),
        FieldDef::new("LastName", "LastName", "String"),
        FieldDef::new("FirstName", "FirstName", "String"),
    ],
    relations: vec![
        Relationship::new(
            "SavingsAccounts",
            SavingsAccount::meta,
            "CustomerID",
            "FKCustomerIDAccount",
            RelationKind::HasMany,
        ),
        Relationship::new(
            "Gadgets",
            Gadget::meta,
            "CustomerID",
            "OwnerID",
            RelationKind::HasMany,
        ),
    ],
});

static SAVINGS_ACCOUNT: LazyLock<RecordMeta> = LazyLock::new(|| RecordMeta {
    type_name: "SavingsAccount",
    table: "SavingsAccount",
    fields: vec![
        FieldDef::new("AccountNumber", "AccountNumber", "String"),
        FieldDef::new("FKCustomerIDAccount", "FKCustomerIDAccount", "String"),
        FieldDef::new("Balance", "Balance", "f64"),
    ],
    relations: vec![
        Relationship::new(
            "Transactions",
            Transaction::meta,
            "AccountNumber",
            "FKAccountNumber",
            RelationKind::HasMany,
        ),
        Relationship::new(
            "Owner",
            Customer::meta,
            "FKCustomerIDAccount",
            "CustomerID",
            RelationKind::BelongsToOne,
        ),
    ],
});

static TRANSACTION: LazyLock<RecordMeta> = LazyLock::new(|| RecordMeta {
    type_name: "Transaction",
    table: "AccountTransaction",
    fields: vec![
        FieldDef::new("TransactionID", "TransactionID", "i64"),
        FieldDef::new("FKAccountNumber", "FKAccountNumber", "String"),
        FieldDef::new("Amount", "Amount", "f64"),
    ],
    relations: vec![],
});

static GADGET: LazyLock<RecordMeta> = LazyLock::new(|| RecordMeta {
    type_name: "Gadget",
    table: "Gadget",
    fields: vec![
        FieldDef::new("GadgetID", "GadgetID", "i64"),
        FieldDef::new("Enabled", "Enabled", "bool"),
    ],
    relations: vec![],
});

impl Record for Customer {
    fn meta() -> &'static RecordMeta {
        &CUSTOMER
    }
}

impl Record for SavingsAccount {
    fn meta() -> &'static RecordMeta {
        &SAVINGS_ACCOUNT
    }
}

impl Record for Transaction {
    fn meta() -> &'static RecordMeta {
        &TRANSACTION
    }
}

impl Record for Gadget {
    fn meta() -> &'static RecordMeta {
        &GADGET
    }
}

/// Builds a row from `(alias, text)` pairs.
pub fn row(cols: &[(&str, Option<&str>)]) -> FlatRow {
    cols.iter()
        .map(|(k, v)| ((*k).to_string(), v.map(str::to_string)))
        .collect()
}

/// An executor that records every statement and replays canned results.
pub struct RecordingExecutor {
    pub dialect: Dialect,
    pub rows: Vec<FlatRow>,
    pub affected: u64,
    pub fail_with: Option<String>,
    pub executed: TokioMutex<Vec<(String, Bindings)>>,
}

impl RecordingExecutor {
    pub fn new(dialect: Dialect) -> Self {
        Self {
            dialect,
            rows: Vec::new(),
            affected: 0,
            fail_with: None,
            executed: TokioMutex::new(Vec::new()),
        }
    }

    pub fn with_rows(mut self, rows: Vec<FlatRow>) -> Self {
        self.rows = rows;
        self
    }

    pub const fn with_affected(mut self, affected: u64) -> Self {
        self.affected = affected;
        self
    }

    pub fn failing(mut self, msg: &str) -> Self {
        self.fail_with = Some(msg.to_string());
        self
    }

    pub async fn statements(&self) -> Vec<(String, Bindings)> {
        self.executed.lock().await.clone()
    }

    async fn record(&self, sql: &str, bindings: &Bindings) -> HordeResult<()> {
        self.executed
            .lock()
            .await
            .push((sql.to_string(), bindings.clone()));
        match &self.fail_with {
            Some(msg) => Err(HordeError::ExecutionFailure(msg.clone())),
            None => Ok(()),
        }
    }
}

#[async_trait::async_trait]
impl DbExecutor for RecordingExecutor {
    fn dialect(&self) -> Dialect {
        self.dialect
    }

    async fn execute_query(&self, sql: &str, bindings: &Bindings) -> HordeResult<Vec<FlatRow>> {
        self.record(sql, bindings).await?;
        Ok(self.rows.clone())
    }

    async fn execute_statement(&self, sql: &str, bindings: &Bindings) -> HordeResult<u64> {
        self.record(sql, bindings).await?;
        Ok(self.affected)
    }
}
