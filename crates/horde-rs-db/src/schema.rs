//! Record declarations and the schema descriptor.
//!
//! A record type implements [`Record`] to expose a static [`RecordMeta`]:
//! its table name, its declared fields, and the relationships it owns. In
//! practice the impl is produced by `#[derive(Record)]`, but it can be
//! written by hand.
//!
//! [`describe`] turns a `RecordMeta` into a [`Schema`]: one [`Column`] per
//! declared field with its storage kind and the alias that field has in
//! every generated SELECT.

use horde_rs_core::{HordeError, HordeResult};

use crate::relationship::Relationship;

/// A type that maps onto one table.
///
/// # Examples
///
/// ```
/// use std::sync::LazyLock;
/// use horde_rs_db::schema::{describe, FieldDef, Record, RecordMeta};
///
/// struct Customer;
///
/// impl Record for Customer {
///     fn meta() -> &'static RecordMeta {
///         static META: LazyLock<RecordMeta> = LazyLock::new(|| RecordMeta {
///             type_name: "Customer",
///             table: "Customer",
///             fields: vec![
///                 FieldDef::new("CustomerID", "CustomerID", "String"),
///                 FieldDef::new("LastName", "LastName", "String"),
///             ],
///             relations: vec![],
///         });
///         &META
///     }
/// }
///
/// let schema = describe(Customer::meta()).unwrap();
/// assert_eq!(schema.columns()[0].alias, "CustomerCustomerID");
/// ```
pub trait Record: Send + Sync + 'static {
    /// Returns the static declaration for this record type.
    fn meta() -> &'static RecordMeta;
}

/// The static declaration of a record type.
#[derive(Debug)]
pub struct RecordMeta {
    /// The Rust type name, used in error messages.
    pub type_name: &'static str,
    /// The table the record is stored in.
    pub table: &'static str,
    /// The declared fields, in declaration order.
    pub fields: Vec<FieldDef>,
    /// The relationships this record owns.
    pub relations: Vec<Relationship>,
}

/// One declared field of a record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDef {
    /// The field name. Used for the column alias and as the key in
    /// materialized records.
    pub name: &'static str,
    /// The storage column the field maps to.
    pub column: &'static str,
    /// The declared Rust type, as written in the source.
    pub declared: &'static str,
}

impl FieldDef {
    /// Creates a field definition.
    pub const fn new(name: &'static str, column: &'static str, declared: &'static str) -> Self {
        Self {
            name,
            column,
            declared,
        }
    }
}

/// The storage kind of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldKind {
    /// Text.
    String,
    /// A signed integer (fits in `i64`).
    Integer,
    /// A floating-point number.
    Float,
}

impl FieldKind {
    /// Maps a declared Rust type to its storage kind.
    ///
    /// Whitespace and module paths are ignored and `Option<T>` maps to the
    /// kind of `T`. Returns `None` for anything that is not a string,
    /// integer, or float type.
    ///
    /// # Examples
    ///
    /// ```
    /// use horde_rs_db::schema::FieldKind;
    ///
    /// assert_eq!(FieldKind::from_declared("i32"), Some(FieldKind::Integer));
    /// assert_eq!(FieldKind::from_declared("Option < f64 >"), Some(FieldKind::Float));
    /// assert_eq!(FieldKind::from_declared("std::string::String"), Some(FieldKind::String));
    /// assert_eq!(FieldKind::from_declared("bool"), None);
    /// ```
    pub fn from_declared(declared: &str) -> Option<Self> {
        let compact: String = declared.chars().filter(|c| !c.is_whitespace()).collect();
        Self::from_compact(&compact)
    }

    fn from_compact(ty: &str) -> Option<Self> {
        if let Some(inner) = strip_option(ty) {
            return Self::from_compact(inner);
        }
        let last = ty.rsplit("::").next().unwrap_or(ty);
        match last {
            "String" | "&str" | "&'staticstr" | "char" => Some(Self::String),
            "i8" | "i16" | "i32" | "i64" | "u8" | "u16" | "u32" | "isize" => Some(Self::Integer),
            "f32" | "f64" => Some(Self::Float),
            _ => None,
        }
    }

    /// Returns the lowercase name used in error messages.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Integer => "integer",
            Self::Float => "float",
        }
    }
}

impl std::fmt::Display for FieldKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

fn strip_option(ty: &str) -> Option<&str> {
    let rest = ty
        .strip_prefix("std::option::Option<")
        .or_else(|| ty.strip_prefix("core::option::Option<"))
        .or_else(|| ty.strip_prefix("Option<"))?;
    rest.strip_suffix('>')
}

/// One column of a described record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    /// The table the column lives in.
    pub table: &'static str,
    /// The field name.
    pub name: &'static str,
    /// The storage column.
    pub column: &'static str,
    /// The storage kind.
    pub kind: FieldKind,
    /// The result-set alias: table name immediately followed by field name.
    pub alias: String,
}

impl Column {
    /// The fully qualified column, `table.column`.
    pub fn qualified(&self) -> String {
        format!("{}.{}", self.table, self.column)
    }

    /// The SELECT list entry, `table.column AS alias`.
    pub fn select_expr(&self) -> String {
        format!("{}.{} AS {}", self.table, self.column, self.alias)
    }
}

/// The described shape of one record type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schema {
    record: &'static str,
    table: &'static str,
    columns: Vec<Column>,
}

impl Schema {
    /// The record type name.
    pub const fn record(&self) -> &'static str {
        self.record
    }

    /// The table name.
    pub const fn table(&self) -> &'static str {
        self.table
    }

    /// The columns, in field declaration order.
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// The column of the first declared field. Its value identifies a record
    /// while rows are being folded.
    pub fn identity(&self) -> &Column {
        &self.columns[0]
    }

    /// Looks up a column by field name.
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Resolves a caller-supplied column reference to its storage column.
    ///
    /// Both the storage column and the field name are accepted; anything
    /// else fails with [`HordeError::InvalidQueryState`].
    pub fn storage_column(&self, reference: &str) -> HordeResult<&'static str> {
        self.columns
            .iter()
            .find(|c| c.column == reference)
            .or_else(|| self.column(reference))
            .map(|c| c.column)
            .ok_or_else(|| {
                HordeError::InvalidQueryState(format!(
                    "'{reference}' is not a column of '{}'",
                    self.table
                ))
            })
    }

    /// The SELECT list entries for every column.
    pub fn select_list(&self) -> Vec<String> {
        self.columns.iter().map(Column::select_expr).collect()
    }

    /// The ORDER BY entries for every column.
    pub fn order_list(&self) -> Vec<String> {
        self.columns.iter().map(Column::qualified).collect()
    }
}

/// Describes a record declaration.
///
/// Fails with [`HordeError::UnsupportedFieldType`] for the first field whose
/// declared type has no storage kind, and with
/// [`HordeError::InvalidQueryState`] for a record that declares no fields.
pub fn describe(meta: &RecordMeta) -> HordeResult<Schema> {
    if meta.fields.is_empty() {
        return Err(HordeError::InvalidQueryState(format!(
            "record '{}' declares no fields",
            meta.type_name
        )));
    }

    let columns = meta
        .fields
        .iter()
        .map(|field| {
            let kind = FieldKind::from_declared(field.declared).ok_or_else(|| {
                HordeError::UnsupportedFieldType {
                    record: meta.type_name.to_string(),
                    field: field.name.to_string(),
                    declared: field.declared.to_string(),
                }
            })?;
            Ok(Column {
                table: meta.table,
                name: field.name,
                column: field.column,
                kind,
                alias: format!("{}{}", meta.table, field.name),
            })
        })
        .collect::<HordeResult<Vec<_>>>()?;

    Ok(Schema {
        record: meta.type_name,
        table: meta.table,
        columns,
    })
}
