//! Scalar values carried between the two stores.

use bytes::Bytes;
use chrono::{NaiveDate, NaiveDateTime};

use crate::error::AppError;

/// A single column value from either store.
///
/// Both schemas only use scalars, so a row is a flat list of these.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Bytes(Bytes),
    Timestamp(NaiveDateTime),
    Date(NaiveDate),
}

impl Value {
    /// Returns true for SQL NULL.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Short type name used in conversion errors.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Text(_) => "text",
            Value::Bytes(_) => "bytes",
            Value::Timestamp(_) => "timestamp",
            Value::Date(_) => "date",
        }
    }

    /// Lenient numeric reading: NULL and anything non-numeric count as zero.
    pub fn as_f64_or_zero(&self) -> f64 {
        match self {
            Value::Int(v) => *v as f64,
            Value::Float(v) => *v,
            Value::Bool(v) => f64::from(u8::from(*v)),
            Value::Text(s) => s.trim().parse().unwrap_or(0.0),
            _ => 0.0,
        }
    }

    /// Text rendering used for enumeration codes and ordering keys.
    pub fn as_code(&self) -> Option<String> {
        match self {
            Value::Text(s) => Some(s.clone()),
            Value::Int(v) => Some(v.to_string()),
            Value::Bool(v) => Some(v.to_string()),
            Value::Float(v) => Some(v.to_string()),
            _ => None,
        }
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Null => write!(f, "NULL"),
            Value::Bool(v) => write!(f, "{}", v),
            Value::Int(v) => write!(f, "{}", v),
            Value::Float(v) => write!(f, "{}", v),
            Value::Text(v) => write!(f, "{:?}", v),
            Value::Bytes(v) => write!(f, "<{} bytes>", v.len()),
            Value::Timestamp(v) => write!(f, "{}", v),
            Value::Date(v) => write!(f, "{}", v),
        }
    }
}

// --- conversions into Value (parameter binding) ---

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(v.into())
    }
}

impl From<u32> for Value {
    fn from(v: u32) -> Self {
        Value::Int(v.into())
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl From<&String> for Value {
    fn from(v: &String) -> Self {
        Value::Text(v.clone())
    }
}

impl From<Bytes> for Value {
    fn from(v: Bytes) -> Self {
        Value::Bytes(v)
    }
}

impl From<NaiveDateTime> for Value {
    fn from(v: NaiveDateTime) -> Self {
        Value::Timestamp(v)
    }
}

impl From<NaiveDate> for Value {
    fn from(v: NaiveDate) -> Self {
        Value::Date(v)
    }
}

impl From<&Value> for Value {
    fn from(v: &Value) -> Self {
        v.clone()
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::Null)
    }
}

// --- conversions out of Value (typed row access) ---

/// Typed extraction from a [`Value`].
///
/// NULL never converts; use `Option<T>` (or [`Row::get_opt`](super::Row::get_opt))
/// for nullable columns.
pub trait FromValue: Sized {
    fn from_value(value: &Value) -> Result<Self, AppError>;
}

fn mismatch(expected: &str, value: &Value) -> AppError {
    AppError::Internal(format!("expected {}, found {}", expected, value.kind()))
}

impl FromValue for Value {
    fn from_value(value: &Value) -> Result<Self, AppError> {
        Ok(value.clone())
    }
}

impl FromValue for i64 {
    fn from_value(value: &Value) -> Result<Self, AppError> {
        match value {
            Value::Int(v) => Ok(*v),
            Value::Bool(v) => Ok(i64::from(*v)),
            Value::Text(s) => s.trim().parse().map_err(|_| mismatch("int", value)),
            _ => Err(mismatch("int", value)),
        }
    }
}

impl FromValue for i32 {
    fn from_value(value: &Value) -> Result<Self, AppError> {
        let v = i64::from_value(value)?;
        i32::try_from(v).map_err(|_| AppError::Internal(format!("{} overflows i32", v)))
    }
}

impl FromValue for f64 {
    fn from_value(value: &Value) -> Result<Self, AppError> {
        match value {
            Value::Float(v) => Ok(*v),
            Value::Int(v) => Ok(*v as f64),
            Value::Text(s) => s.trim().parse().map_err(|_| mismatch("float", value)),
            _ => Err(mismatch("float", value)),
        }
    }
}

impl FromValue for bool {
    fn from_value(value: &Value) -> Result<Self, AppError> {
        match value {
            Value::Bool(v) => Ok(*v),
            Value::Int(v) => Ok(*v != 0),
            _ => Err(mismatch("bool", value)),
        }
    }
}

impl FromValue for String {
    fn from_value(value: &Value) -> Result<Self, AppError> {
        match value {
            Value::Text(s) => Ok(s.clone()),
            Value::Bytes(b) => Ok(String::from_utf8_lossy(b).into_owned()),
            Value::Null => Err(mismatch("text", value)),
            other => Ok(other.to_string()),
        }
    }
}

impl FromValue for Bytes {
    fn from_value(value: &Value) -> Result<Self, AppError> {
        match value {
            Value::Bytes(b) => Ok(b.clone()),
            Value::Text(s) => Ok(Bytes::from(s.clone().into_bytes())),
            _ => Err(mismatch("bytes", value)),
        }
    }
}

impl FromValue for NaiveDateTime {
    fn from_value(value: &Value) -> Result<Self, AppError> {
        match value {
            Value::Timestamp(v) => Ok(*v),
            Value::Date(d) => Ok(d.and_hms_opt(0, 0, 0).unwrap_or_default()),
            _ => Err(mismatch("timestamp", value)),
        }
    }
}

impl FromValue for NaiveDate {
    fn from_value(value: &Value) -> Result<Self, AppError> {
        match value {
            Value::Date(d) => Ok(*d),
            Value::Timestamp(v) => Ok(v.date()),
            _ => Err(mismatch("date", value)),
        }
    }
}

impl<T: FromValue> FromValue for Option<T> {
    fn from_value(value: &Value) -> Result<Self, AppError> {
        match value {
            Value::Null => Ok(None),
            v => T::from_value(v).map(Some),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lenient_numeric_reading() {
        assert_eq!(Value::Null.as_f64_or_zero(), 0.0);
        assert_eq!(Value::Text("abc".into()).as_f64_or_zero(), 0.0);
        assert_eq!(Value::Text(" 2.5 ".into()).as_f64_or_zero(), 2.5);
        assert_eq!(Value::Int(4).as_f64_or_zero(), 4.0);
    }

    #[test]
    fn test_option_from_null() {
        let v: Option<i64> = FromValue::from_value(&Value::Null).unwrap();
        assert_eq!(v, None);
        assert!(i64::from_value(&Value::Null).is_err());
    }

    #[test]
    fn test_bytes_display_is_summarised() {
        let v = Value::Bytes(Bytes::from_static(b"abcdef"));
        assert_eq!(v.to_string(), "<6 bytes>");
    }

    #[test]
    fn test_option_into_value() {
        let none: Option<i64> = None;
        assert_eq!(Value::from(none), Value::Null);
        assert_eq!(Value::from(Some("x")), Value::Text("x".into()));
    }
}
