//! SQL rendering for query plans and mutations.
//!
//! The [`SqlCompiler`] turns a [`QueryPlan`] into parameterized SQL for a
//! given [`Dialect`]. The dialect only affects how named parameters are
//! written and how a generated identity is read back after an INSERT; the
//! statement shapes are otherwise identical.

use horde_rs_core::{Dialect, HordeError, HordeResult};

use super::plan::QueryPlan;
use crate::value::{Bindings, Value};

/// Compiles plans and mutations into SQL text plus named bindings.
#[derive(Debug, Clone, Copy)]
pub struct SqlCompiler {
    dialect: Dialect,
}

impl SqlCompiler {
    /// Creates a compiler for `dialect`.
    pub const fn new(dialect: Dialect) -> Self {
        Self { dialect }
    }

    pub const fn dialect(&self) -> Dialect {
        self.dialect
    }

    /// Writes a named parameter reference.
    ///
    /// # Examples
    ///
    /// ```
    /// use horde_rs_core::Dialect;
    /// use horde_rs_db::query::SqlCompiler;
    ///
    /// assert_eq!(SqlCompiler::new(Dialect::SqlServer).placeholder("x"), "@x");
    /// assert_eq!(SqlCompiler::new(Dialect::Sqlite).placeholder("x"), ":x");
    /// ```
    pub fn placeholder(&self, name: &str) -> String {
        match self.dialect {
            Dialect::SqlServer => format!("@{name}"),
            Dialect::Sqlite => format!(":{name}"),
        }
    }

    /// The fragment appended to an INSERT to read back the generated
    /// identity as a single column named `ID`.
    pub const fn identity_fragment(&self) -> &'static str {
        match self.dialect {
            Dialect::SqlServer => "; SELECT ID = CONVERT(BIGINT, SCOPE_IDENTITY());",
            Dialect::Sqlite => " RETURNING rowid AS ID",
        }
    }

    /// Renders the SELECT for `plan`.
    pub fn compile_select(&self, plan: &QueryPlan) -> (String, Bindings) {
        let mut sql = format!(
            "SELECT {} FROM {}",
            plan.columns().join(", "),
            plan.table()
        );
        for step in plan.joins() {
            sql.push(' ');
            sql.push_str(&step.clause());
        }
        sql.push_str(&self.where_clause(plan));
        sql.push_str(" ORDER BY ");
        sql.push_str(&plan.order_by().join(", "));
        (sql, plan.bindings().clone())
    }

    /// Renders an INSERT of `fields` into `table`, in the given order.
    ///
    /// Each field is bound under its own name. With `auto_increment` the
    /// dialect's identity fragment is appended.
    pub fn compile_insert(
        &self,
        table: &str,
        fields: &[(String, Value)],
        auto_increment: bool,
    ) -> HordeResult<(String, Bindings)> {
        if fields.is_empty() {
            return Err(HordeError::InvalidQueryState(format!(
                "insert into '{table}' has no fields"
            )));
        }

        let mut bindings = Bindings::new();
        let mut columns = Vec::with_capacity(fields.len());
        let mut placeholders = Vec::with_capacity(fields.len());
        for (key, value) in fields {
            let name = bindings.push_unique(key, value.clone());
            columns.push(key.as_str());
            placeholders.push(self.placeholder(&name));
        }

        let mut sql = format!(
            "INSERT INTO {table} ({}) VALUES ({})",
            columns.join(", "),
            placeholders.join(", ")
        );
        if auto_increment {
            sql.push_str(self.identity_fragment());
        }
        Ok((sql, bindings))
    }

    /// Renders an UPDATE of `fields` restricted by the filters of `plan`.
    ///
    /// The filter bindings come first; each field is bound as `val<field>`.
    pub fn compile_update(
        &self,
        plan: &QueryPlan,
        fields: &[(String, Value)],
    ) -> HordeResult<(String, Bindings)> {
        if fields.is_empty() {
            return Err(HordeError::InvalidQueryState(format!(
                "update of '{}' has no fields",
                plan.table()
            )));
        }
        if plan.filters().is_empty() {
            return Err(HordeError::InvalidQueryState(format!(
                "update of '{}' has no filter",
                plan.table()
            )));
        }
        if !plan.joins().is_empty() {
            return Err(HordeError::InvalidQueryState(format!(
                "update of '{}' cannot carry joins",
                plan.table()
            )));
        }

        let mut bindings = plan.bindings().clone();
        let assignments = fields
            .iter()
            .map(|(key, value)| {
                let column = plan.base().storage_column(key)?;
                let name = bindings.push_unique(&format!("val{column}"), value.clone());
                Ok(format!("{column} = {}", self.placeholder(&name)))
            })
            .collect::<HordeResult<Vec<String>>>()?;

        let sql = format!(
            "UPDATE {} SET {}{}",
            plan.table(),
            assignments.join(", "),
            self.where_clause(plan)
        );
        Ok((sql, bindings))
    }

    /// Renders ` WHERE ...`, or an empty string when there are no filters.
    fn where_clause(&self, plan: &QueryPlan) -> String {
        let mut sql = String::new();
        for f in plan.filters() {
            sql.push(' ');
            sql.push_str(f.connective.as_sql());
            sql.push(' ');
            sql.push_str(&f.qualified());
            sql.push(' ');
            sql.push_str(f.op.as_sql());
            sql.push(' ');
            sql.push_str(&self.placeholder(&f.param));
        }
        sql
    }
}
