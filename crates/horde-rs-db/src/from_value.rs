//! Typed access to materialized values.
//!
//! [`FromValue`] converts a [`Value`] into a field type. `#[derive(Record)]`
//! uses it to implement [`FromMaterialized`], which rebuilds a record struct
//! from a [`MaterializedRecord`].

use horde_rs_core::{HordeError, HordeResult};

use crate::materialize::MaterializedRecord;
use crate::value::Value;

/// Conversion from a [`Value`] into a concrete field type.
pub trait FromValue: Sized {
    /// Attempts the conversion. `column` is used in the error.
    fn from_value(value: &Value, column: &str) -> HordeResult<Self>;
}

fn mismatch(value: &Value, column: &str, kind: &str) -> HordeError {
    HordeError::CoercionFailure {
        column: column.to_string(),
        value: value.to_string(),
        kind: kind.to_string(),
    }
}

impl FromValue for String {
    fn from_value(value: &Value, column: &str) -> HordeResult<Self> {
        match value {
            Value::String(s) => Ok(s.clone()),
            _ => Err(mismatch(value, column, "string")),
        }
    }
}

impl FromValue for char {
    fn from_value(value: &Value, column: &str) -> HordeResult<Self> {
        let mut chars = value.as_str().map(str::chars);
        match chars.as_mut().map(|c| (c.next(), c.next())) {
            Some((Some(ch), None)) => Ok(ch),
            _ => Err(mismatch(value, column, "char")),
        }
    }
}

impl FromValue for bool {
    fn from_value(value: &Value, column: &str) -> HordeResult<Self> {
        match value {
            Value::Bool(b) => Ok(*b),
            Value::Int(0) => Ok(false),
            Value::Int(1) => Ok(true),
            _ => Err(mismatch(value, column, "bool")),
        }
    }
}

macro_rules! impl_from_value_int {
    ($($t:ty),*) => {
        $(
            impl FromValue for $t {
                fn from_value(value: &Value, column: &str) -> HordeResult<Self> {
                    match value {
                        Value::Int(i) => <$t>::try_from(*i).map_err(|_| mismatch(value, column, stringify!($t))),
                        _ => Err(mismatch(value, column, "integer")),
                    }
                }
            }
        )*
    };
}

impl_from_value_int!(i8, i16, i32, u8, u16, u32, isize);

impl FromValue for i64 {
    fn from_value(value: &Value, column: &str) -> HordeResult<Self> {
        value
            .as_i64()
            .ok_or_else(|| mismatch(value, column, "integer"))
    }
}

impl FromValue for f64 {
    fn from_value(value: &Value, column: &str) -> HordeResult<Self> {
        value.as_f64().ok_or_else(|| mismatch(value, column, "float"))
    }
}

impl FromValue for f32 {
    fn from_value(value: &Value, column: &str) -> HordeResult<Self> {
        value
            .as_f64()
            .map(|f| f as f32)
            .ok_or_else(|| mismatch(value, column, "float"))
    }
}

impl<T: FromValue> FromValue for Option<T> {
    fn from_value(value: &Value, column: &str) -> HordeResult<Self> {
        match value {
            Value::Null => Ok(None),
            other => T::from_value(other, column).map(Some),
        }
    }
}

/// A record struct that can be rebuilt from a [`MaterializedRecord`].
///
/// Implemented by `#[derive(Record)]`. Nested relationships stay on the
/// materialized record; only the declared fields are read.
pub trait FromMaterialized: Sized {
    fn from_materialized(record: &MaterializedRecord) -> HordeResult<Self>;
}

impl MaterializedRecord {
    /// Reads the field `name` as `T`. A missing field reads as NULL.
    pub fn get_as<T: FromValue>(&self, name: &str) -> HordeResult<T> {
        T::from_value(self.get(name).unwrap_or(&Value::Null), name)
    }

    /// Rebuilds the typed record.
    pub fn to_record<R: FromMaterialized>(&self) -> HordeResult<R> {
        R::from_materialized(self)
    }
}
