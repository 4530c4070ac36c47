//! The query plan: everything a SELECT needs, in structured form.
//!
//! A [`QueryPlan`] is created by `find_all` / `find_one` and grows with every
//! filter and join. It is rendered to SQL by the
//! [`SqlCompiler`](super::compiler::SqlCompiler) and read (never mutated) by
//! the [`Materializer`](crate::materialize::Materializer).

use horde_rs_core::{CoercionPolicy, HordeError, HordeResult};

use crate::relationship::{resolve_chain, Relationship};
use crate::schema::{describe, RecordMeta, Schema};
use crate::value::{Bindings, Value};

/// Whether a query yields every base record or only the first one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryMode {
    /// Every base-record group becomes a result.
    All,
    /// Only the first base-record group becomes a result.
    One,
}

/// A comparison operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    /// `=`
    Eq,
    /// `<>`
    Ne,
    /// `<`
    Lt,
    /// `<=`
    Lte,
    /// `>`
    Gt,
    /// `>=`
    Gte,
    /// `LIKE`
    Like,
    /// `NOT LIKE`
    NotLike,
}

impl Op {
    /// The SQL spelling of the operator.
    pub const fn as_sql(self) -> &'static str {
        match self {
            Self::Eq => "=",
            Self::Ne => "<>",
            Self::Lt => "<",
            Self::Lte => "<=",
            Self::Gt => ">",
            Self::Gte => ">=",
            Self::Like => "LIKE",
            Self::NotLike => "NOT LIKE",
        }
    }
}

/// A single comparison against a storage column.
///
/// # Examples
///
/// ```
/// use horde_rs_db::query::{Op, Where};
/// use horde_rs_db::value::Value;
///
/// let w = Where::eq("LastName", "Smith");
/// assert_eq!(w.op, Op::Eq);
/// assert_eq!(w.value, Value::String("Smith".into()));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Where {
    /// The storage column, unqualified.
    pub column: String,
    /// The operator.
    pub op: Op,
    /// The compared value, always sent as a bound parameter.
    pub value: Value,
}

impl Where {
    /// Creates a comparison.
    pub fn new(column: impl Into<String>, op: Op, value: impl Into<Value>) -> Self {
        Self {
            column: column.into(),
            op,
            value: value.into(),
        }
    }

    pub fn eq(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new(column, Op::Eq, value)
    }

    pub fn ne(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new(column, Op::Ne, value)
    }

    pub fn lt(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new(column, Op::Lt, value)
    }

    pub fn lte(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new(column, Op::Lte, value)
    }

    pub fn gt(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new(column, Op::Gt, value)
    }

    pub fn gte(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new(column, Op::Gte, value)
    }

    pub fn like(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new(column, Op::Like, value)
    }

    pub fn not_like(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new(column, Op::NotLike, value)
    }
}

/// How a filter clause attaches to the clauses before it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Connective {
    /// Opens the WHERE clause.
    Where,
    /// `AND`
    And,
    /// `OR`
    Or,
}

impl Connective {
    /// The SQL keyword.
    pub const fn as_sql(self) -> &'static str {
        match self {
            Self::Where => "WHERE",
            Self::And => "AND",
            Self::Or => "OR",
        }
    }
}

/// One recorded filter. Its value lives in the plan's bindings under `param`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterClause {
    pub connective: Connective,
    pub table: &'static str,
    pub column: String,
    pub op: Op,
    pub param: String,
}

impl FilterClause {
    /// The qualified column, `table.column`.
    pub fn qualified(&self) -> String {
        format!("{}.{}", self.table, self.column)
    }
}

/// One joined relationship chain.
///
/// Only the terminal relationship of the chain contributes columns and a
/// JOIN clause; the earlier hops must have been joined by their own steps.
#[derive(Debug, Clone)]
pub struct JoinStep {
    /// The dot-separated chain, e.g. `"SavingsAccounts.Transactions"`.
    pub path: String,
    /// The relationship names along the chain.
    pub chain: Vec<&'static str>,
    /// The table that owns the terminal relationship.
    pub parent_table: &'static str,
    /// The terminal relationship.
    pub relationship: &'static Relationship,
    /// The described related record.
    pub schema: Schema,
}

impl JoinStep {
    /// The 1-based depth of the chain.
    pub fn depth(&self) -> usize {
        self.chain.len()
    }

    /// The terminal relationship name, which keys the nested collection.
    pub const fn name(&self) -> &'static str {
        self.relationship.name
    }

    /// The path of the chain without its terminal hop, if the chain has more
    /// than one hop.
    pub fn prefix(&self) -> Option<String> {
        (self.chain.len() > 1).then(|| self.chain[..self.chain.len() - 1].join("."))
    }

    /// Returns `true` if `other` extends this chain by one or more hops.
    pub fn is_ancestor_of(&self, other: &Self) -> bool {
        other.chain.len() > self.chain.len() && other.chain.starts_with(&self.chain)
    }

    /// The JOIN clause,
    /// `INNER JOIN related ON parent.parent_key = related.child_key`.
    pub fn clause(&self) -> String {
        let related = self.schema.table();
        format!(
            "INNER JOIN {related} ON {}.{} = {related}.{}",
            self.parent_table, self.relationship.parent_key, self.relationship.child_key
        )
    }
}

/// The structured form of one SELECT.
#[derive(Debug, Clone)]
pub struct QueryPlan {
    mode: QueryMode,
    root: &'static RecordMeta,
    base: Schema,
    joins: Vec<JoinStep>,
    filters: Vec<FilterClause>,
    bindings: Bindings,
    coercion: CoercionPolicy,
}

impl QueryPlan {
    /// Starts a plan for `root`, selecting every declared field.
    pub fn new(mode: QueryMode, root: &'static RecordMeta) -> HordeResult<Self> {
        Ok(Self {
            mode,
            root,
            base: describe(root)?,
            joins: Vec::new(),
            filters: Vec::new(),
            bindings: Bindings::new(),
            coercion: CoercionPolicy::default(),
        })
    }

    pub const fn mode(&self) -> QueryMode {
        self.mode
    }

    /// The base table name.
    pub const fn table(&self) -> &'static str {
        self.base.table()
    }

    /// The described base record.
    pub const fn base(&self) -> &Schema {
        &self.base
    }

    /// The join steps, in the order they were added.
    pub fn joins(&self) -> &[JoinStep] {
        &self.joins
    }

    /// The filter clauses, in the order they were added.
    pub fn filters(&self) -> &[FilterClause] {
        &self.filters
    }

    /// The filter values keyed by parameter name.
    pub const fn bindings(&self) -> &Bindings {
        &self.bindings
    }

    pub const fn coercion(&self) -> CoercionPolicy {
        self.coercion
    }

    pub(crate) fn set_coercion(&mut self, policy: CoercionPolicy) {
        self.coercion = policy;
    }

    /// The SELECT list: base columns first, then each join's columns.
    pub fn columns(&self) -> Vec<String> {
        let mut cols = self.base.select_list();
        for step in &self.joins {
            cols.extend(step.schema.select_list());
        }
        cols
    }

    /// The ORDER BY list. It mirrors the SELECT list column for column.
    pub fn order_by(&self) -> Vec<String> {
        let mut cols = self.base.order_list();
        for step in &self.joins {
            cols.extend(step.schema.order_list());
        }
        cols
    }

    /// Records a filter against `table`.
    ///
    /// With `connective` of `None` the clause opens the WHERE clause if it is
    /// the first filter, and is joined with AND otherwise. An explicit AND or
    /// OR requires an earlier filter.
    pub(crate) fn push_filter(
        &mut self,
        connective: Option<Connective>,
        table: &'static str,
        filter: Where,
    ) -> HordeResult<()> {
        let connective = match (connective, self.filters.is_empty()) {
            (None, true) => Connective::Where,
            (None, false) => Connective::And,
            (Some(c), false) => c,
            (Some(c), true) => {
                return Err(HordeError::InvalidQueryState(format!(
                    "{} filter on '{table}.{}' has no preceding filter",
                    c.as_sql(),
                    filter.column
                )))
            }
        };

        let param = self
            .bindings
            .push_unique(&format!("{table}{}", filter.column), filter.value);
        self.filters.push(FilterClause {
            connective,
            table,
            column: filter.column,
            op: filter.op,
            param,
        });
        Ok(())
    }

    /// Records a filter against the base table.
    pub(crate) fn push_base_filter(
        &mut self,
        connective: Option<Connective>,
        filter: Where,
    ) -> HordeResult<()> {
        let column = self.base.storage_column(&filter.column)?;
        let table = self.base.table();
        self.push_filter(
            connective,
            table,
            Where {
                column: column.to_string(),
                ..filter
            },
        )
    }

    /// Resolves `path` from the base record and adds its terminal join, then
    /// records `extra` filters against the joined table.
    pub(crate) fn add_join(&mut self, path: &str, extra: Vec<Where>) -> HordeResult<()> {
        let links = resolve_chain(self.root, path)?;
        let Some(terminal) = links.last().copied() else {
            return Err(HordeError::UnknownRelationship {
                record: self.root.type_name.to_string(),
                name: path.to_string(),
            });
        };

        let chain: Vec<&'static str> = links.iter().map(|l| l.relationship.name).collect();
        let path = chain.join(".");
        if self.joins.iter().any(|j| j.path == path) {
            return Err(HordeError::InvalidQueryState(format!(
                "'{path}' is already joined"
            )));
        }
        if chain.len() > 1 {
            let prefix = chain[..chain.len() - 1].join(".");
            if !self.joins.iter().any(|j| j.path == prefix) {
                return Err(HordeError::InvalidQueryState(format!(
                    "'{path}' needs '{prefix}' to be joined first"
                )));
            }
        }

        let schema = describe(terminal.child())?;
        let table = schema.table();
        if table == self.base.table() || self.joins.iter().any(|j| j.schema.table() == table) {
            return Err(HordeError::InvalidQueryState(format!(
                "table '{table}' is already part of the query"
            )));
        }

        let extra = extra
            .into_iter()
            .map(|filter| {
                let column = schema.storage_column(&filter.column)?;
                Ok(Where {
                    column: column.to_string(),
                    ..filter
                })
            })
            .collect::<HordeResult<Vec<_>>>()?;

        self.joins.push(JoinStep {
            path,
            chain,
            parent_table: terminal.parent.table,
            relationship: terminal.relationship,
            schema,
        });
        for filter in extra {
            self.push_filter(None, table, filter)?;
        }
        Ok(())
    }
}
