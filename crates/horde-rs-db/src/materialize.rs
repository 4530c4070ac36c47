//! Folding flat JOIN rows back into nested records.
//!
//! A JOIN returns one row per combination of matching children, so a
//! parent repeats once for each of its descendants. The rows arrive ordered
//! by every selected column, which makes each logical record a contiguous
//! run of rows sharing the value of its first field. The [`Materializer`]
//! walks the rows once and:
//!
//! - starts a new base record whenever the base identity column changes;
//! - for every join step, descends from the current base record through the
//!   most recent element of each ancestor collection, then appends the
//!   row's child unless it repeats the last element already there.
//!
//! Cursors count the elements appended per join step since that step was
//! last reset. They live for one call only.

use horde_rs_core::{CoercionPolicy, HordeError, HordeResult};
use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;

use crate::query::{QueryMode, QueryPlan};
use crate::schema::{Column, FieldKind, Schema};
use crate::value::{FlatRow, Value};

/// One materialized record with its nested related records.
#[derive(Debug, Clone, PartialEq)]
pub struct MaterializedRecord {
    record: &'static str,
    fields: Vec<(&'static str, Value)>,
    relations: Vec<(&'static str, Vec<MaterializedRecord>)>,
}

impl MaterializedRecord {
    /// The record type name.
    pub const fn record(&self) -> &'static str {
        self.record
    }

    /// Returns the value of the field `name`.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.iter().find(|(k, _)| *k == name).map(|(_, v)| v)
    }

    /// Returns the related records collected under relationship `name`.
    ///
    /// A relationship that was joined but matched nothing for this record is
    /// absent, the same as one that was never joined.
    pub fn related(&self, name: &str) -> Option<&[MaterializedRecord]> {
        self.relations
            .iter()
            .find(|(k, _)| *k == name)
            .map(|(_, v)| v.as_slice())
    }

    /// The fields in declaration order.
    pub fn fields(&self) -> &[(&'static str, Value)] {
        &self.fields
    }

    /// The nested collections in the order they were first populated.
    pub fn relations(&self) -> &[(&'static str, Vec<MaterializedRecord>)] {
        &self.relations
    }

    /// Converts the record into a JSON object. Nested collections become
    /// arrays keyed by relationship name.
    pub fn to_json(&self) -> serde_json::Value {
        let mut map = serde_json::Map::new();
        for (k, v) in &self.fields {
            map.insert((*k).to_string(), v.to_json());
        }
        for (k, children) in &self.relations {
            map.insert(
                (*k).to_string(),
                serde_json::Value::Array(children.iter().map(Self::to_json).collect()),
            );
        }
        serde_json::Value::Object(map)
    }

    fn identity(&self) -> Option<&Value> {
        self.fields.first().map(|(_, v)| v)
    }

    fn relation_mut(&mut self, name: &str) -> Option<&mut Vec<Self>> {
        self.relations
            .iter_mut()
            .find(|(k, _)| *k == name)
            .map(|(_, v)| v)
    }
}

impl Serialize for MaterializedRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len() + self.relations.len()))?;
        for (k, v) in &self.fields {
            map.serialize_entry(k, &v.to_json())?;
        }
        for (k, children) in &self.relations {
            map.serialize_entry(k, children)?;
        }
        map.end()
    }
}

/// The outcome of a SELECT.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryResult {
    /// Every base record, from `find_all`.
    Many(Vec<MaterializedRecord>),
    /// The first base record, if any, from `find_one`.
    One(Option<MaterializedRecord>),
}

impl QueryResult {
    /// Returns the records as a sequence regardless of mode.
    pub fn into_many(self) -> Vec<MaterializedRecord> {
        match self {
            Self::Many(records) => records,
            Self::One(record) => record.into_iter().collect(),
        }
    }

    /// Returns the first record regardless of mode.
    pub fn into_one(self) -> Option<MaterializedRecord> {
        match self {
            Self::Many(records) => records.into_iter().next(),
            Self::One(record) => record,
        }
    }

    /// The number of base records.
    pub fn len(&self) -> usize {
        match self {
            Self::Many(records) => records.len(),
            Self::One(record) => usize::from(record.is_some()),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Self::Many(records) => {
                serde_json::Value::Array(records.iter().map(MaterializedRecord::to_json).collect())
            }
            Self::One(record) => record
                .as_ref()
                .map_or(serde_json::Value::Null, MaterializedRecord::to_json),
        }
    }
}

/// Folds the rows of one plan's SELECT into records.
pub struct Materializer<'a> {
    plan: &'a QueryPlan,
    /// For each join step, the indices of the steps joining each proper
    /// prefix of its chain, shortest first.
    ancestors: Vec<Vec<usize>>,
    /// For each join step, the indices of the steps whose chains extend it.
    descendants: Vec<Vec<usize>>,
}

impl<'a> Materializer<'a> {
    pub fn new(plan: &'a QueryPlan) -> Self {
        let joins = plan.joins();
        let ancestors: Vec<Vec<usize>> = joins
            .iter()
            .map(|step| {
                (1..step.depth())
                    .filter_map(|len| {
                        joins
                            .iter()
                            .position(|other| other.chain.as_slice() == &step.chain[..len])
                    })
                    .collect()
            })
            .collect();
        let descendants: Vec<Vec<usize>> = joins
            .iter()
            .map(|step| {
                joins
                    .iter()
                    .enumerate()
                    .filter(|(_, other)| step.is_ancestor_of(other))
                    .map(|(i, _)| i)
                    .collect()
            })
            .collect();
        Self {
            plan,
            ancestors,
            descendants,
        }
    }

    /// Folds `rows` into records.
    pub fn materialize(&self, rows: &[FlatRow]) -> HordeResult<QueryResult> {
        let base = self.plan.base();
        let identity = &base.identity().alias;
        let mut records: Vec<MaterializedRecord> = Vec::new();
        let mut current: Option<Option<&str>> = None;
        let mut cursors = vec![0_usize; self.plan.joins().len()];

        for row in rows {
            let key = row.get(identity);
            if current != Some(key) {
                current = Some(key);
                cursors.fill(0);
                if self.plan.mode() == QueryMode::One && !records.is_empty() {
                    // Later groups still feed the joins of the first record.
                    tracing::trace!(table = base.table(), key = ?key, "folding into single result");
                } else {
                    tracing::trace!(table = base.table(), key = ?key, "new base group");
                    records.push(self.extract(base, row)?);
                }
            }
            let Some(record) = records.last_mut() else {
                continue;
            };
            for idx in 0..self.plan.joins().len() {
                self.attach(record, idx, row, &mut cursors)?;
            }
        }

        Ok(match self.plan.mode() {
            QueryMode::All => QueryResult::Many(records),
            QueryMode::One => QueryResult::One(records.into_iter().next()),
        })
    }

    fn attach(
        &self,
        root: &mut MaterializedRecord,
        idx: usize,
        row: &FlatRow,
        cursors: &mut [usize],
    ) -> HordeResult<()> {
        let step = &self.plan.joins()[idx];
        let mut target = root;
        for (hop, &ancestor) in self.ancestors[idx].iter().enumerate() {
            let name = step.chain[hop];
            let children = target
                .relation_mut(name)
                .filter(|c| !c.is_empty())
                .ok_or_else(|| {
                    HordeError::InvalidQueryState(format!(
                        "'{}' was reached before '{name}' was populated",
                        step.path
                    ))
                })?;
            let at = cursors[ancestor].saturating_sub(1).min(children.len() - 1);
            target = &mut children[at];
        }

        let child = self.extract(&step.schema, row)?;
        let appended = match target.relation_mut(step.name()) {
            None => {
                target.relations.push((step.name(), vec![child]));
                true
            }
            Some(children) => {
                if children.last().and_then(MaterializedRecord::identity) == child.identity() {
                    false
                } else {
                    children.push(child);
                    true
                }
            }
        };

        if appended {
            tracing::trace!(path = %step.path, "new child group");
            cursors[idx] += 1;
            for &d in &self.descendants[idx] {
                cursors[d] = 0;
            }
        }
        Ok(())
    }

    fn extract(&self, schema: &Schema, row: &FlatRow) -> HordeResult<MaterializedRecord> {
        let fields = schema
            .columns()
            .iter()
            .map(|col| Ok((col.name, self.coerce(col, row.get(&col.alias))?)))
            .collect::<HordeResult<Vec<_>>>()?;
        Ok(MaterializedRecord {
            record: schema.record(),
            fields,
            relations: Vec::new(),
        })
    }

    fn coerce(&self, col: &Column, raw: Option<&str>) -> HordeResult<Value> {
        let Some(raw) = raw else {
            return Ok(Value::Null);
        };
        let parsed = match col.kind {
            FieldKind::String => return Ok(Value::String(raw.to_string())),
            FieldKind::Integer => raw.trim().parse::<i64>().ok().map(Value::Int),
            FieldKind::Float => raw.trim().parse::<f64>().ok().map(Value::Float),
        };
        if let Some(value) = parsed {
            return Ok(value);
        }
        match self.plan.coercion() {
            CoercionPolicy::Strict => Err(HordeError::CoercionFailure {
                column: col.alias.clone(),
                value: raw.to_string(),
                kind: col.kind.to_string(),
            }),
            CoercionPolicy::Lenient => {
                tracing::warn!(
                    column = %col.alias,
                    value = raw,
                    kind = %col.kind,
                    "unparsable value replaced with zero"
                );
                Ok(match col.kind {
                    FieldKind::Float => Value::Float(0.0),
                    _ => Value::Int(0),
                })
            }
        }
    }
}
