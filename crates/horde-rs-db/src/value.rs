//! Value types exchanged with the SQL execution collaborator.
//!
//! [`Value`] is the scalar passed as a named parameter and produced by the
//! row materializer. [`FlatRow`] is one row of a result set as the executor
//! hands it back: every column keyed by its alias and rendered as text, with
//! `None` standing for SQL NULL. [`Bindings`] is the ordered list of named
//! parameters that accompanies every generated statement.

use std::fmt;

/// A backend-agnostic scalar value.
///
/// # Examples
///
/// ```
/// use horde_rs_db::value::Value;
///
/// assert_eq!(Value::from(42_i64), Value::Int(42));
/// assert_eq!(Value::from("Smith"), Value::String("Smith".to_string()));
/// assert_eq!(Value::from(None::<i64>), Value::Null);
/// ```
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "type", content = "value")]
pub enum Value {
    /// SQL NULL.
    Null,
    /// A boolean value.
    Bool(bool),
    /// A 64-bit signed integer.
    Int(i64),
    /// A 64-bit floating-point number.
    Float(f64),
    /// A UTF-8 string.
    String(String),
}

impl Value {
    /// Returns `true` if this value is SQL NULL.
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Returns the string payload, if this is a `Value::String`.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the integer payload, if this is a `Value::Int`.
    pub const fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Returns the value as a float. Integers are widened.
    pub const fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Float(f) => Some(*f),
            Self::Int(i) => Some(*i as f64),
            _ => None,
        }
    }

    /// Converts this value into its natural JSON representation.
    ///
    /// Unlike the `Serialize` impl, which is tagged, this produces plain JSON
    /// scalars (`null`, `true`, `42`, `1.5`, `"text"`). Non-finite floats
    /// become `null`.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Self::Null => serde_json::Value::Null,
            Self::Bool(b) => serde_json::Value::Bool(*b),
            Self::Int(i) => serde_json::Value::from(*i),
            Self::Float(f) => serde_json::Number::from_f64(*f)
                .map_or(serde_json::Value::Null, serde_json::Value::Number),
            Self::String(s) => serde_json::Value::String(s.clone()),
        }
    }

    /// Renders the value as the text a backend binds for it, or `None` for NULL.
    pub fn to_sql_text(&self) -> Option<String> {
        match self {
            Self::Null => None,
            Self::Bool(b) => Some(if *b { "1".into() } else { "0".into() }),
            Self::Int(i) => Some(i.to_string()),
            Self::Float(f) => Some(f.to_string()),
            Self::String(s) => Some(s.clone()),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => write!(f, "NULL"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(i) => write!(f, "{i}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::String(s) => write!(f, "{s}"),
        }
    }
}

// ── From conversions ──────────────────────────────────────────────────

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Self::Int(i64::from(v))
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<u32> for Value {
    fn from(v: u32) -> Self {
        Self::Int(i64::from(v))
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::String(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::String(v.to_string())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Self::Null, Into::into)
    }
}

// ── FlatRow ───────────────────────────────────────────────────────────

/// One row of a result set as returned by the execution collaborator.
///
/// Columns keep the order the backend reported them in. A column whose value
/// is SQL NULL carries `None`.
///
/// # Examples
///
/// ```
/// use horde_rs_db::value::FlatRow;
///
/// let row = FlatRow::new(vec![
///     ("CustomerCustomerID".to_string(), Some("1".to_string())),
///     ("CustomerLastName".to_string(), None),
/// ]);
/// assert_eq!(row.get("CustomerCustomerID"), Some("1"));
/// assert_eq!(row.get("CustomerLastName"), None);
/// assert!(row.contains("CustomerLastName"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlatRow {
    columns: Vec<(String, Option<String>)>,
}

impl FlatRow {
    /// Creates a row from `(alias, text)` pairs.
    pub fn new(columns: Vec<(String, Option<String>)>) -> Self {
        Self { columns }
    }

    /// Returns the text of the column with the given alias.
    ///
    /// Missing columns and NULL columns both yield `None`.
    pub fn get(&self, alias: &str) -> Option<&str> {
        self.columns
            .iter()
            .find(|(name, _)| name == alias)
            .and_then(|(_, v)| v.as_deref())
    }

    /// Returns `true` if the row has a column with the given alias.
    pub fn contains(&self, alias: &str) -> bool {
        self.columns.iter().any(|(name, _)| name == alias)
    }

    /// Returns the number of columns.
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// Returns `true` if the row has no columns.
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Iterates over `(alias, text)` pairs in column order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&str>)> {
        self.columns.iter().map(|(k, v)| (k.as_str(), v.as_deref()))
    }
}

impl FromIterator<(String, Option<String>)> for FlatRow {
    fn from_iter<I: IntoIterator<Item = (String, Option<String>)>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

// ── Bindings ──────────────────────────────────────────────────────────

/// A single named parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct Binding {
    /// The parameter name without its dialect prefix.
    pub name: String,
    /// The bound value.
    pub value: Value,
}

/// The ordered set of named parameters for one statement.
///
/// Names are unique: [`push_unique`](Bindings::push_unique) suffixes a
/// repeated base name with `_2`, `_3`, and so on.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Bindings {
    items: Vec<Binding>,
}

impl Bindings {
    /// Creates an empty binding set.
    pub const fn new() -> Self {
        Self { items: Vec::new() }
    }

    /// Adds a binding under `base`, or under the first free `base_N` if `base`
    /// is taken, and returns the name actually used.
    ///
    /// # Examples
    ///
    /// ```
    /// use horde_rs_db::value::{Bindings, Value};
    ///
    /// let mut b = Bindings::new();
    /// assert_eq!(b.push_unique("CustomerLastName", Value::from("Smith")), "CustomerLastName");
    /// assert_eq!(b.push_unique("CustomerLastName", Value::from("Jones")), "CustomerLastName_2");
    /// ```
    pub fn push_unique(&mut self, base: &str, value: Value) -> String {
        let mut name = base.to_string();
        let mut n = 2;
        while self.contains(&name) {
            name = format!("{base}_{n}");
            n += 1;
        }
        self.items.push(Binding {
            name: name.clone(),
            value,
        });
        name
    }

    /// Returns `true` if a binding with this exact name exists.
    pub fn contains(&self, name: &str) -> bool {
        self.items.iter().any(|b| b.name == name)
    }

    /// Returns the value bound under `name`.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.items.iter().find(|b| b.name == name).map(|b| &b.value)
    }

    /// Appends every binding of `other`, which must not reuse names.
    pub(crate) fn extend(&mut self, other: Self) {
        self.items.extend(other.items);
    }

    /// Returns the number of bindings.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns `true` if there are no bindings.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Iterates over the bindings in insertion order.
    pub fn iter(&self) -> std::slice::Iter<'_, Binding> {
        self.items.iter()
    }
}

impl<'a> IntoIterator for &'a Bindings {
    type Item = &'a Binding;
    type IntoIter = std::slice::Iter<'a, Binding>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_from_option() {
        assert_eq!(Value::from(Some(3_i64)), Value::Int(3));
        assert_eq!(Value::from(None::<String>), Value::Null);
    }

    #[test]
    fn test_value_to_json_is_untagged() {
        assert_eq!(Value::Int(7).to_json(), serde_json::json!(7));
        assert_eq!(Value::Float(1.5).to_json(), serde_json::json!(1.5));
        assert_eq!(Value::from("x").to_json(), serde_json::json!("x"));
        assert_eq!(Value::Null.to_json(), serde_json::Value::Null);
        assert_eq!(Value::Float(f64::NAN).to_json(), serde_json::Value::Null);
    }

    #[test]
    fn test_value_to_sql_text() {
        assert_eq!(Value::Null.to_sql_text(), None);
        assert_eq!(Value::Bool(true).to_sql_text().as_deref(), Some("1"));
        assert_eq!(Value::Float(100.5).to_sql_text().as_deref(), Some("100.5"));
    }

    #[test]
    fn test_value_as_f64_widens_int() {
        assert_eq!(Value::Int(2).as_f64(), Some(2.0));
        assert_eq!(Value::from("2").as_f64(), None);
    }

    #[test]
    fn test_flat_row_missing_and_null() {
        let row: FlatRow = vec![("a".to_string(), None), ("b".to_string(), Some("x".into()))]
            .into_iter()
            .collect();
        assert_eq!(row.get("a"), None);
        assert_eq!(row.get("b"), Some("x"));
        assert_eq!(row.get("c"), None);
        assert!(row.contains("a"));
        assert!(!row.contains("c"));
        assert_eq!(row.len(), 2);
    }

    #[test]
    fn test_bindings_suffixes_duplicates() {
        let mut b = Bindings::new();
        assert_eq!(b.push_unique("x", Value::Int(1)), "x");
        assert_eq!(b.push_unique("x", Value::Int(2)), "x_2");
        assert_eq!(b.push_unique("x", Value::Int(3)), "x_3");
        assert_eq!(b.get("x_2"), Some(&Value::Int(2)));
        let names: Vec<_> = b.iter().map(|b| b.name.as_str()).collect();
        assert_eq!(names, vec!["x", "x_2", "x_3"]);
    }
}
