use crate::{GenericSqlWriter, SqlWriter};
use rust_decimal::Decimal;
use std::fmt::{self, Display};
use time::{Date, PrimitiveDateTime, Time};
use uuid::Uuid;

/// Dynamically typed cell moved between objects, query parameters and result rows.
///
/// Native integers are widened to `Int64` / `UInt64` and floats to `Float64`, so a value read
/// from an object and the same value decoded from a row compare equal. Equality is strict: two
/// values are equal only when they have the same variant and the same payload.
#[derive(Default, Debug, Clone, PartialEq)]
pub enum Value {
    #[default]
    Null,
    Boolean(bool),
    Int64(i64),
    UInt64(u64),
    Float64(f64),
    Decimal(Decimal),
    Varchar(String),
    Blob(Box<[u8]>),
    Date(Date),
    Time(Time),
    Timestamp(PrimitiveDateTime),
    Uuid(Uuid),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// True for values that do not identify a persisted row: NULL, false, zero, the empty
    /// string and the string "0".
    pub fn is_empty_key(&self) -> bool {
        match self {
            Value::Null => true,
            Value::Boolean(v) => !v,
            Value::Int64(v) => *v == 0,
            Value::UInt64(v) => *v == 0,
            Value::Float64(v) => *v == 0.0,
            Value::Decimal(v) => v.is_zero(),
            Value::Varchar(v) => v.is_empty() || v == "0",
            Value::Blob(v) => v.is_empty(),
            _ => false,
        }
    }

    /// Name of the variant, used in conversion errors.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Null => "Null",
            Value::Boolean(..) => "Boolean",
            Value::Int64(..) => "Int64",
            Value::UInt64(..) => "UInt64",
            Value::Float64(..) => "Float64",
            Value::Decimal(..) => "Decimal",
            Value::Varchar(..) => "Varchar",
            Value::Blob(..) => "Blob",
            Value::Date(..) => "Date",
            Value::Time(..) => "Time",
            Value::Timestamp(..) => "Timestamp",
            Value::Uuid(..) => "Uuid",
        }
    }
}

/// Renders the value as a SQL literal.
impl Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = String::new();
        GenericSqlWriter::new().write_value(&mut out, self);
        f.write_str(&out)
    }
}

#[cfg(test)]
mod tests {
    use super::Value;
    use rust_decimal::Decimal;

    #[test]
    fn empty_keys() {
        assert!(Value::Null.is_empty_key());
        assert!(Value::Int64(0).is_empty_key());
        assert!(Value::UInt64(0).is_empty_key());
        assert!(Value::Varchar("".into()).is_empty_key());
        assert!(Value::Varchar("0".into()).is_empty_key());
        assert!(Value::Boolean(false).is_empty_key());
        assert!(Value::Decimal(Decimal::ZERO).is_empty_key());
        assert!(!Value::Int64(11).is_empty_key());
        assert!(!Value::Varchar("00".into()).is_empty_key());
        assert!(!Value::Varchar("abc".into()).is_empty_key());
    }

    #[test]
    fn strict_equality() {
        assert_eq!(Value::Null, Value::Null);
        assert_ne!(Value::Int64(1), Value::UInt64(1));
        assert_ne!(Value::Int64(1), Value::Varchar("1".into()));
        assert_eq!(Value::Varchar("a".into()), Value::Varchar("a".into()));
    }

    #[test]
    fn display_as_literal() {
        assert_eq!(Value::Null.to_string(), "NULL");
        assert_eq!(Value::Int64(-5).to_string(), "-5");
        assert_eq!(Value::Varchar("it's".into()).to_string(), "'it''s'");
        assert_eq!(Value::Boolean(true).to_string(), "true");
    }
}
