//! Value types for bound SQL parameters

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Text layout used for temporal columns in both directions
pub const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// A SQL value that can be bound to a `:n` marker
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    /// Null value
    Null,
    /// Boolean value, stored as 1/0
    Bool(bool),
    /// 32-bit integer
    I32(i32),
    /// 64-bit integer
    I64(i64),
    /// 32-bit float
    F32(f32),
    /// 64-bit float
    F64(f64),
    /// String value
    String(String),
    /// Date and time without zone
    DateTime(NaiveDateTime),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Get the column type name for this value
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "NULL",
            Value::Bool(_) => "NUMBER(1)",
            Value::I32(_) => "NUMBER(10)",
            Value::I64(_) => "NUMBER(19)",
            Value::F32(_) => "BINARY_FLOAT",
            Value::F64(_) => "BINARY_DOUBLE",
            Value::String(_) => "VARCHAR2",
            Value::DateTime(_) => "DATE",
        }
    }

    /// Text form as a row would carry it; `None` for NULL.
    pub fn to_text(&self) -> Option<String> {
        match self {
            Value::Null => None,
            Value::Bool(b) => Some(if *b { "1" } else { "0" }.to_string()),
            Value::I32(v) => Some(v.to_string()),
            Value::I64(v) => Some(v.to_string()),
            Value::F32(v) => Some(v.to_string()),
            Value::F64(v) => Some(v.to_string()),
            Value::String(s) => Some(s.clone()),
            Value::DateTime(dt) => Some(dt.format(DATETIME_FORMAT).to_string()),
        }
    }

    /// Display form used by statement tracers: text quoted, NULL bare.
    pub fn to_trace_string(&self) -> String {
        match self {
            Value::Null => "NULL".to_string(),
            Value::String(_) | Value::DateTime(_) => {
                format!("\"{}\"", self.to_text().unwrap_or_default())
            }
            other => other.to_text().unwrap_or_default(),
        }
    }

    /// True for values that leave a key unassigned: NULL, zero or empty text.
    pub fn is_unset_key(&self) -> bool {
        match self {
            Value::Null => true,
            Value::I32(v) => *v == 0,
            Value::I64(v) => *v == 0,
            Value::String(s) => s.is_empty() || s == "0",
            _ => false,
        }
    }
}

impl From<bool> for Value {
    fn from(val: bool) -> Self {
        Value::Bool(val)
    }
}

impl From<i32> for Value {
    fn from(val: i32) -> Self {
        Value::I32(val)
    }
}

impl From<i64> for Value {
    fn from(val: i64) -> Self {
        Value::I64(val)
    }
}

impl From<isize> for Value {
    fn from(val: isize) -> Self {
        Value::I64(val as i64)
    }
}

impl From<u32> for Value {
    fn from(val: u32) -> Self {
        Value::I64(i64::from(val))
    }
}

impl From<f32> for Value {
    fn from(val: f32) -> Self {
        Value::F32(val)
    }
}

impl From<f64> for Value {
    fn from(val: f64) -> Self {
        Value::F64(val)
    }
}

impl From<String> for Value {
    fn from(val: String) -> Self {
        Value::String(val)
    }
}

impl From<&str> for Value {
    fn from(val: &str) -> Self {
        Value::String(val.to_string())
    }
}

impl From<&String> for Value {
    fn from(val: &String) -> Self {
        Value::String(val.clone())
    }
}

impl From<NaiveDateTime> for Value {
    fn from(val: NaiveDateTime) -> Self {
        Value::DateTime(val)
    }
}

#[cfg(feature = "uuid-support")]
impl From<uuid::Uuid> for Value {
    fn from(val: uuid::Uuid) -> Self {
        Value::String(val.to_string())
    }
}

#[cfg(feature = "decimal-support")]
impl From<rust_decimal::Decimal> for Value {
    fn from(val: rust_decimal::Decimal) -> Self {
        Value::String(val.to_string())
    }
}

impl<T> From<Option<T>> for Value
where
    T: Into<Value>,
{
    fn from(opt: Option<T>) -> Self {
        match opt {
            Some(val) => val.into(),
            None => Value::Null,
        }
    }
}

/// Anything that can be bound as the argument list of one condition or statement.
///
/// Implemented for single values, tuples of up to six values, arrays,
/// `Vec<Value>` and `()` for "no arguments":
///
/// ```
/// use rowmap_core::{IntoParams, Value};
///
/// assert_eq!("bolt".into_params(), vec![Value::from("bolt")]);
/// assert_eq!(("bolt", 100).into_params().len(), 2);
/// assert!(().into_params().is_empty());
/// ```
pub trait IntoParams {
    fn into_params(self) -> Vec<Value>;
}

impl IntoParams for () {
    fn into_params(self) -> Vec<Value> {
        Vec::new()
    }
}

impl IntoParams for Vec<Value> {
    fn into_params(self) -> Vec<Value> {
        self
    }
}

impl IntoParams for &[Value] {
    fn into_params(self) -> Vec<Value> {
        self.to_vec()
    }
}

impl<T, const N: usize> IntoParams for [T; N]
where
    T: Into<Value>,
{
    fn into_params(self) -> Vec<Value> {
        self.into_iter().map(Into::into).collect()
    }
}

impl<T> IntoParams for Option<T>
where
    T: Into<Value>,
{
    fn into_params(self) -> Vec<Value> {
        vec![self.into()]
    }
}

macro_rules! impl_into_params_single {
    ($($ty:ty),* $(,)?) => {
        $(
            impl IntoParams for $ty {
                fn into_params(self) -> Vec<Value> {
                    vec![self.into()]
                }
            }
        )*
    };
}

impl_into_params_single!(bool, i32, i64, isize, u32, f32, f64, String, &str, &String, NaiveDateTime);

impl IntoParams for Value {
    fn into_params(self) -> Vec<Value> {
        vec![self]
    }
}

macro_rules! impl_into_params_tuple {
    ($($name:ident),+) => {
        impl<$($name),+> IntoParams for ($($name,)+)
        where
            $($name: Into<Value>,)+
        {
            #[allow(non_snake_case)]
            fn into_params(self) -> Vec<Value> {
                let ($($name,)+) = self;
                vec![$($name.into()),+]
            }
        }
    };
}

impl_into_params_tuple!(A);
impl_into_params_tuple!(A, B);
impl_into_params_tuple!(A, B, C);
impl_into_params_tuple!(A, B, C, D);
impl_into_params_tuple!(A, B, C, D, E);
impl_into_params_tuple!(A, B, C, D, E, F);

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn noon() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 9)
            .and_then(|d| d.and_hms_opt(12, 30, 5))
            .unwrap()
    }

    #[test]
    fn test_value_creation() {
        assert_eq!(Value::from(42i32), Value::I32(42));
        assert_eq!(Value::from(true), Value::Bool(true));
        assert_eq!(Value::from("hello"), Value::String("hello".to_string()));
        assert_eq!(Value::from(7u32), Value::I64(7));
        assert_eq!(Value::from(noon()), Value::DateTime(noon()));
    }

    #[test]
    fn test_option_conversion() {
        assert_eq!(Value::from(Some(42i32)), Value::I32(42));
        assert_eq!(Value::from(None::<i32>), Value::Null);
    }

    #[test]
    fn test_text_forms() {
        assert_eq!(Value::Null.to_text(), None);
        assert_eq!(Value::Bool(true).to_text().as_deref(), Some("1"));
        assert_eq!(Value::F64(2.5).to_text().as_deref(), Some("2.5"));
        assert_eq!(
            Value::DateTime(noon()).to_text().as_deref(),
            Some("2024-03-09 12:30:05")
        );
    }

    #[test]
    fn test_trace_strings() {
        assert_eq!(Value::from("bolt").to_trace_string(), "\"bolt\"");
        assert_eq!(Value::from(100).to_trace_string(), "100");
        assert_eq!(Value::Null.to_trace_string(), "NULL");
        assert_eq!(
            Value::DateTime(noon()).to_trace_string(),
            "\"2024-03-09 12:30:05\""
        );
    }

    #[test]
    fn test_unset_keys() {
        assert!(Value::Null.is_unset_key());
        assert!(Value::I64(0).is_unset_key());
        assert!(Value::from("").is_unset_key());
        assert!(Value::from("0").is_unset_key());
        assert!(!Value::I32(3).is_unset_key());
        assert!(!Value::from("a-1").is_unset_key());
    }

    #[test]
    fn test_into_params() {
        assert!(().into_params().is_empty());
        assert_eq!(5i64.into_params(), vec![Value::I64(5)]);
        assert_eq!(
            ("bolt", 100, 2.5f64).into_params(),
            vec![Value::from("bolt"), Value::I32(100), Value::F64(2.5)]
        );
        assert_eq!([1, 2, 3].into_params().len(), 3);
        assert_eq!(None::<String>.into_params(), vec![Value::Null]);
    }

    #[test]
    fn test_type_names() {
        assert_eq!(Value::I32(42).type_name(), "NUMBER(10)");
        assert_eq!(Value::from("test").type_name(), "VARCHAR2");
        assert_eq!(Value::Null.type_name(), "NULL");
    }
}
