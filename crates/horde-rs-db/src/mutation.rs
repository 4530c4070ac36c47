//! INSERT and UPDATE execution.
//!
//! `Model::save` routes here. A builder that never ran `find_all` /
//! `find_one` inserts a new row into the record's table; a find-style builder
//! with filters updates the rows those filters select.

use horde_rs_core::{HordeError, HordeResult};

use crate::executor::DbExecutor;
use crate::query::{QueryPlan, SqlCompiler};
use crate::value::{FlatRow, Value};

/// The outcome of a mutation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub struct TranResult {
    /// The generated identity of an auto-increment INSERT, or 0.
    pub last_inserted_id: i64,
    /// The number of rows the statement touched.
    pub rows_affected: u64,
}

/// Inserts `fields` into `table`.
///
/// With `auto_increment` the generated identity is read back from the `ID`
/// column of the returned row. A positive identity reports one row affected;
/// anything else reports an identity of 0 and no rows affected.
pub async fn insert(
    db: &dyn DbExecutor,
    table: &str,
    fields: &[(String, Value)],
    auto_increment: bool,
) -> HordeResult<TranResult> {
    let (sql, bindings) = SqlCompiler::new(db.dialect()).compile_insert(table, fields, auto_increment)?;
    tracing::debug!(sql = %sql, bindings = bindings.len(), "horde.insert");

    if !auto_increment {
        let rows_affected = db.execute_statement(&sql, &bindings).await?;
        return Ok(TranResult {
            last_inserted_id: 0,
            rows_affected,
        });
    }

    let row = db.execute_scalar(&sql, &bindings).await?;
    let id = parse_identity(&row)?;
    Ok(if id > 0 {
        TranResult {
            last_inserted_id: id,
            rows_affected: 1,
        }
    } else {
        TranResult::default()
    })
}

/// Updates the rows selected by the filters of `plan`.
pub async fn update(
    db: &dyn DbExecutor,
    plan: &QueryPlan,
    fields: &[(String, Value)],
) -> HordeResult<TranResult> {
    let (sql, bindings) = SqlCompiler::new(db.dialect()).compile_update(plan, fields)?;
    tracing::debug!(sql = %sql, bindings = bindings.len(), "horde.update");

    let rows_affected = db.execute_statement(&sql, &bindings).await?;
    Ok(TranResult {
        last_inserted_id: 0,
        rows_affected,
    })
}

fn parse_identity(row: &FlatRow) -> HordeResult<i64> {
    let raw = row.get("ID").ok_or_else(|| HordeError::CoercionFailure {
        column: "ID".to_string(),
        value: String::new(),
        kind: "integer".to_string(),
    })?;
    let trimmed = raw.trim();
    // SCOPE_IDENTITY() can come back as a decimal such as "42.0".
    trimmed
        .parse::<i64>()
        .ok()
        .or_else(|| {
            trimmed
                .parse::<f64>()
                .ok()
                .filter(|f| f.fract() == 0.0 && f.is_finite())
                .map(|f| f as i64)
        })
        .ok_or_else(|| HordeError::CoercionFailure {
            column: "ID".to_string(),
            value: raw.to_string(),
            kind: "integer".to_string(),
        })
}
