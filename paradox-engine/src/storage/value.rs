//! Decoded column values

use chrono::{Duration, NaiveDate, NaiveDateTime};
use serde::{Serialize, Serializer};
use std::cmp::Ordering;
use std::fmt;

/// One decoded column value
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Field bytes were all zero, or the value could not be represented
    Null,
    Text(String),
    Short(i16),
    Long(i32),
    AutoInc(i32),
    Currency(f64),
    Number(f64),
    Date(NaiveDate),
    Timestamp(NaiveDateTime),
    /// Time of day
    Time(Duration),
    Logical(bool),
    Blob(Vec<u8>),
    Bytes(Vec<u8>),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Name of the variant, used in type-mismatch errors
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Text(_) => "text",
            Value::Short(_) => "short",
            Value::Long(_) => "long",
            Value::AutoInc(_) => "autoinc",
            Value::Currency(_) => "currency",
            Value::Number(_) => "number",
            Value::Date(_) => "date",
            Value::Timestamp(_) => "timestamp",
            Value::Time(_) => "time",
            Value::Logical(_) => "logical",
            Value::Blob(_) => "blob",
            Value::Bytes(_) => "bytes",
        }
    }

    fn as_integer(&self) -> Option<i64> {
        match self {
            Value::Short(v) => Some(*v as i64),
            Value::Long(v) | Value::AutoInc(v) => Some(*v as i64),
            _ => None,
        }
    }

    fn as_float(&self) -> Option<f64> {
        match self {
            Value::Currency(v) | Value::Number(v) => Some(*v),
            _ => self.as_integer().map(|v| v as f64),
        }
    }

    fn rank(&self) -> u8 {
        match self {
            Value::Null => 0,
            Value::Logical(_) => 1,
            Value::Short(_) | Value::Long(_) | Value::AutoInc(_) => 2,
            Value::Currency(_) | Value::Number(_) => 2,
            Value::Date(_) => 3,
            Value::Timestamp(_) => 4,
            Value::Time(_) => 5,
            Value::Text(_) => 6,
            Value::Blob(_) | Value::Bytes(_) => 7,
        }
    }

    /// Three-way comparison in the natural order of the value's type.
    ///
    /// Integer variants compare numerically with each other, and with the
    /// floating variants through `f64`. `Null` sorts before everything else.
    /// Comparing values of unrelated types is not meaningful; such pairs are
    /// ordered by type so the result is at least consistent.
    pub fn compare(&self, other: &Value) -> Ordering {
        if let (Some(a), Some(b)) = (self.as_integer(), other.as_integer()) {
            return a.cmp(&b);
        }
        if let (Some(a), Some(b)) = (self.as_float(), other.as_float()) {
            return a.total_cmp(&b);
        }
        match (self, other) {
            (Value::Null, Value::Null) => Ordering::Equal,
            (Value::Text(a), Value::Text(b)) => a.cmp(b),
            (Value::Date(a), Value::Date(b)) => a.cmp(b),
            (Value::Timestamp(a), Value::Timestamp(b)) => a.cmp(b),
            (Value::Time(a), Value::Time(b)) => a.cmp(b),
            (Value::Logical(a), Value::Logical(b)) => a.cmp(b),
            (Value::Blob(a) | Value::Bytes(a), Value::Blob(b) | Value::Bytes(b)) => a.cmp(b),
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

impl From<i16> for Value {
    fn from(v: i16) -> Self {
        Value::Short(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Long(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Number(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Logical(v)
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

impl From<NaiveDate> for Value {
    fn from(v: NaiveDate) -> Self {
        Value::Date(v)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => Ok(()),
            Value::Text(s) => f.write_str(s),
            Value::Short(v) => write!(f, "{}", v),
            Value::Long(v) | Value::AutoInc(v) => write!(f, "{}", v),
            Value::Currency(v) => write!(f, "{:.2}", v),
            Value::Number(v) => write!(f, "{}", v),
            Value::Date(d) => write!(f, "{}", d),
            Value::Timestamp(ts) => write!(f, "{}", ts.format("%Y-%m-%d %H:%M:%S%.3f")),
            Value::Time(t) => f.write_str(&format_time(t)),
            Value::Logical(b) => write!(f, "{}", b),
            Value::Blob(b) | Value::Bytes(b) => write!(f, "<{} bytes>", b.len()),
        }
    }
}

fn format_time(t: &Duration) -> String {
    let ms = t.num_milliseconds();
    let (sign, ms) = if ms < 0 { ("-", -ms) } else { ("", ms) };
    format!(
        "{}{:02}:{:02}:{:02}.{:03}",
        sign,
        ms / 3_600_000,
        ms / 60_000 % 60,
        ms / 1000 % 60,
        ms % 1000
    )
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Null => serializer.serialize_none(),
            Value::Text(s) => serializer.serialize_str(s),
            Value::Short(v) => serializer.serialize_i16(*v),
            Value::Long(v) | Value::AutoInc(v) => serializer.serialize_i32(*v),
            Value::Currency(v) | Value::Number(v) => serializer.serialize_f64(*v),
            Value::Logical(b) => serializer.serialize_bool(*b),
            Value::Blob(b) | Value::Bytes(b) => serializer.serialize_bytes(b),
            Value::Date(_) | Value::Timestamp(_) | Value::Time(_) => {
                serializer.collect_str(self)
            }
        }
    }
}
