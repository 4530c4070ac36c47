//! Hand-written result rows.

use horde_rs_db::value::{FlatRow, Value};

/// Builds a [`FlatRow`] column by column.
///
/// Values are rendered to text the way a backend would return them; `NULL`
/// becomes an absent value.
#[derive(Debug, Clone, Default)]
pub struct FlatRowBuilder {
    columns: Vec<(String, Option<String>)>,
}

impl FlatRowBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `alias` with the text form of `value`.
    pub fn column(mut self, alias: impl Into<String>, value: impl Into<Value>) -> Self {
        self.columns
            .push((alias.into(), value.into().to_sql_text()));
        self
    }

    /// Appends `alias` as NULL.
    pub fn null(mut self, alias: impl Into<String>) -> Self {
        self.columns.push((alias.into(), None));
        self
    }

    /// Appends every field of `table` under its `<table><field>` alias.
    pub fn record<V: Into<Value>>(
        mut self,
        table: &str,
        fields: impl IntoIterator<Item = (&'static str, V)>,
    ) -> Self {
        for (field, value) in fields {
            self = self.column(format!("{table}{field}"), value);
        }
        self
    }

    pub fn build(self) -> FlatRow {
        FlatRow::new(self.columns)
    }
}
