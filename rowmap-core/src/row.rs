//! Untyped result rows and text-to-field coercion

use crate::value::DATETIME_FORMAT;
use crate::{Error, Result, Value};
use chrono::NaiveDateTime;
use serde::ser::{Serialize, SerializeMap, Serializer};
use std::collections::BTreeMap;

/// One result row: column names paired with their text value or NULL.
///
/// The connection hands every column back as text; typed fields are recovered
/// from the destination's declared type through [`ColumnType`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Row {
    columns: Vec<(String, Option<String>)>,
}

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, name: impl Into<String>, value: Option<String>) {
        self.columns.push((name.into(), value));
    }

    /// Append a non-null column and return the row
    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.push(name, Some(value.into()));
        self
    }

    /// Append a NULL column and return the row
    pub fn with_null(mut self, name: impl Into<String>) -> Self {
        self.push(name, None);
        self
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Look a column up by exact name, then ASCII case-insensitively.
    ///
    /// Returns `None` when the column is absent and `Some(None)` when it is NULL.
    pub fn get(&self, name: &str) -> Option<Option<&str>> {
        self.columns
            .iter()
            .find(|(column, _)| column == name)
            .or_else(|| {
                self.columns
                    .iter()
                    .find(|(column, _)| column.eq_ignore_ascii_case(name))
            })
            .map(|(_, value)| value.as_deref())
    }

    pub fn first(&self) -> Option<(&str, Option<&str>)> {
        self.columns
            .first()
            .map(|(name, value)| (name.as_str(), value.as_deref()))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&str>)> {
        self.columns
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_deref()))
    }

    /// Column names mapped to their text, NULL becoming the empty string
    pub fn into_map(self) -> BTreeMap<String, String> {
        self.columns
            .into_iter()
            .map(|(name, value)| (name, value.unwrap_or_default()))
            .collect()
    }
}

impl FromIterator<(String, Option<String>)> for Row {
    fn from_iter<I: IntoIterator<Item = (String, Option<String>)>>(iter: I) -> Self {
        Self {
            columns: iter.into_iter().collect(),
        }
    }
}

impl Serialize for Row {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.columns.len()))?;
        for (name, value) in &self.columns {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

/// A field type the codec can fill from column text and bind back as a [`Value`].
pub trait ColumnType: Sized {
    /// Name reported in coercion errors
    const TYPE_NAME: &'static str;

    /// Parse column text; `None` means the text does not fit the type.
    fn from_text(text: &str) -> Option<Self>;

    /// Value to store for a NULL column; `None` leaves the field untouched.
    fn from_null() -> Option<Self> {
        None
    }

    fn to_value(&self) -> Value;
}

/// Decode one column of `row` into `field`.
///
/// An absent column or a NULL leaves the field as it was (optional fields
/// become `None` on NULL). Text that does not parse is a coercion error.
pub fn decode_column<T: ColumnType>(row: &Row, column: &str, field: &mut T) -> Result<()> {
    match row.get(column) {
        None => Ok(()),
        Some(None) => {
            if let Some(value) = T::from_null() {
                *field = value;
            }
            Ok(())
        }
        Some(Some(text)) => {
            *field = T::from_text(text)
                .ok_or_else(|| Error::coercion(column, text, T::TYPE_NAME))?;
            Ok(())
        }
    }
}

impl ColumnType for String {
    const TYPE_NAME: &'static str = "String";

    fn from_text(text: &str) -> Option<Self> {
        Some(text.to_string())
    }

    fn to_value(&self) -> Value {
        Value::String(self.clone())
    }
}

macro_rules! impl_column_type_parsed {
    ($($ty:ty => $name:literal),* $(,)?) => {
        $(
            impl ColumnType for $ty {
                const TYPE_NAME: &'static str = $name;

                fn from_text(text: &str) -> Option<Self> {
                    text.trim().parse().ok()
                }

                fn to_value(&self) -> Value {
                    Value::from(*self)
                }
            }
        )*
    };
}

impl_column_type_parsed!(
    i32 => "i32",
    i64 => "i64",
    isize => "isize",
    u32 => "u32",
    f32 => "f32",
    f64 => "f64",
);

impl ColumnType for u64 {
    const TYPE_NAME: &'static str = "u64";

    fn from_text(text: &str) -> Option<Self> {
        text.trim().parse().ok()
    }

    fn to_value(&self) -> Value {
        match i64::try_from(*self) {
            Ok(v) => Value::I64(v),
            Err(_) => Value::String(self.to_string()),
        }
    }
}

impl ColumnType for bool {
    const TYPE_NAME: &'static str = "bool";

    fn from_text(text: &str) -> Option<Self> {
        match text.trim() {
            "1" => Some(true),
            "0" => Some(false),
            other if other.eq_ignore_ascii_case("true") => Some(true),
            other if other.eq_ignore_ascii_case("false") => Some(false),
            _ => None,
        }
    }

    fn to_value(&self) -> Value {
        Value::Bool(*self)
    }
}

impl ColumnType for NaiveDateTime {
    const TYPE_NAME: &'static str = "datetime";

    fn from_text(text: &str) -> Option<Self> {
        NaiveDateTime::parse_from_str(text.trim(), DATETIME_FORMAT).ok()
    }

    fn to_value(&self) -> Value {
        Value::DateTime(*self)
    }
}

#[cfg(feature = "uuid-support")]
impl ColumnType for uuid::Uuid {
    const TYPE_NAME: &'static str = "uuid";

    fn from_text(text: &str) -> Option<Self> {
        uuid::Uuid::parse_str(text.trim()).ok()
    }

    fn to_value(&self) -> Value {
        Value::from(*self)
    }
}

#[cfg(feature = "decimal-support")]
impl ColumnType for rust_decimal::Decimal {
    const TYPE_NAME: &'static str = "decimal";

    fn from_text(text: &str) -> Option<Self> {
        text.trim().parse().ok()
    }

    fn to_value(&self) -> Value {
        Value::from(*self)
    }
}

impl<T: ColumnType> ColumnType for Option<T> {
    const TYPE_NAME: &'static str = T::TYPE_NAME;

    fn from_text(text: &str) -> Option<Self> {
        T::from_text(text).map(Some)
    }

    fn from_null() -> Option<Self> {
        Some(None)
    }

    fn to_value(&self) -> Value {
        match self {
            Some(value) => value.to_value(),
            None => Value::Null,
        }
    }
}

/// Types a whole row can be decoded into.
///
/// Records decode by column name; scalars bind to the first column.
pub trait FromRow: Sized {
    fn from_row(row: &Row) -> Result<Self>;

    /// Record type name used to derive a table when a query has none bound
    fn record_type() -> Option<&'static str> {
        None
    }
}

impl FromRow for Row {
    fn from_row(row: &Row) -> Result<Self> {
        Ok(row.clone())
    }
}

fn scalar_from_row<T: ColumnType>(row: &Row) -> Result<T> {
    let (column, value) = row
        .first()
        .ok_or_else(|| Error::not_found("row has no columns"))?;
    match value {
        Some(text) => {
            T::from_text(text).ok_or_else(|| Error::coercion(column, text, T::TYPE_NAME))
        }
        None => T::from_null().ok_or_else(|| Error::coercion(column, "NULL", T::TYPE_NAME)),
    }
}

macro_rules! impl_from_row_scalar {
    ($($ty:ty),* $(,)?) => {
        $(
            impl FromRow for $ty {
                fn from_row(row: &Row) -> Result<Self> {
                    scalar_from_row(row)
                }
            }
        )*
    };
}

impl_from_row_scalar!(String, i32, i64, isize, u32, u64, f32, f64, bool, NaiveDateTime);

impl<T: ColumnType> FromRow for Option<T> {
    fn from_row(row: &Row) -> Result<Self> {
        scalar_from_row(row)
    }
}

/// Types usable as a record's primary key.
pub trait IdType: ColumnType + Clone + Send + Sync {
    /// Convert a sequence value to the key's declared type
    fn from_sequence(next: i64, column: &str) -> Result<Self>;

    /// Whether the key still needs a value from the sequence
    fn is_unset(&self) -> bool {
        self.to_value().is_unset_key()
    }
}

impl IdType for i32 {
    fn from_sequence(next: i64, column: &str) -> Result<Self> {
        i32::try_from(next).map_err(|_| Error::coercion(column, next.to_string(), "i32"))
    }
}

impl IdType for i64 {
    fn from_sequence(next: i64, _column: &str) -> Result<Self> {
        Ok(next)
    }
}

impl IdType for isize {
    fn from_sequence(next: i64, column: &str) -> Result<Self> {
        isize::try_from(next).map_err(|_| Error::coercion(column, next.to_string(), "isize"))
    }
}

impl IdType for String {
    fn from_sequence(next: i64, _column: &str) -> Result<Self> {
        Ok(next.to_string())
    }
}
