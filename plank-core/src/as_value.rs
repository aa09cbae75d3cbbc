use crate::{Error, Result, Value, truncate_long};
use rust_decimal::{
    Decimal,
    prelude::{FromPrimitive, ToPrimitive},
};
use std::{any, borrow::Cow, str::FromStr};
use time::{Date, PrimitiveDateTime, Time, macros::format_description};
use uuid::Uuid;

/// Conversion between native Rust types and the dynamically typed [`Value`].
///
/// This is what the field accessors use to move data in and out of objects, so every type
/// that appears as a mapped field must implement it.
///
/// # Error semantics
/// - Numeric conversions are range checked; the error names both the value and the target type.
/// - Text is parsed when the target is not a string (drivers using a text protocol return
///   numbers and dates as strings). Parsing must consume the whole input.
///
/// # Examples
/// ```rust
/// use plank_core::{AsValue, Value};
/// let v = 42i32.as_value();
/// assert_eq!(v, Value::Int64(42));
/// let n: i32 = AsValue::try_from_value(v).unwrap();
/// assert_eq!(n, 42);
/// ```
pub trait AsValue {
    /// Convert into the owned [`Value`] representation.
    fn as_value(self) -> Value;
    /// Attempt to convert a dynamic [`Value`] into `Self`.
    fn try_from_value(value: Value) -> Result<Self>
    where
        Self: Sized;
}

impl<T: AsValue> From<T> for Value {
    fn from(value: T) -> Self {
        value.as_value()
    }
}

impl From<&'static str> for Value {
    fn from(value: &'static str) -> Self {
        Value::Varchar(value.into())
    }
}

fn mismatch<T>(value: &Value) -> Error {
    Error::msg(format!(
        "Cannot convert a {} value ({}) to {}",
        value.kind(),
        truncate_long!(value.to_string()),
        any::type_name::<T>()
    ))
}

fn out_of_range<T>(value: impl ToString) -> Error {
    Error::msg(format!(
        "Value {} is out of range for {}",
        value.to_string(),
        any::type_name::<T>()
    ))
}

fn parse_text<T: FromStr>(text: &str) -> Result<T>
where
    <T as FromStr>::Err: std::error::Error + Send + Sync + 'static,
{
    text.trim().parse::<T>().map_err(|e| {
        Error::new(e).context(format!(
            "Cannot parse `{}` as {}",
            truncate_long!(text),
            any::type_name::<T>()
        ))
    })
}

macro_rules! impl_as_value_integer {
    ($variant:path, $wide:ty, $($source:ty),+ $(,)?) => {$(
        impl AsValue for $source {
            fn as_value(self) -> Value {
                $variant(self as $wide)
            }
            fn try_from_value(value: Value) -> Result<Self> {
                match value {
                    Value::Int64(v) => <$source>::try_from(v).map_err(|_| out_of_range::<Self>(v)),
                    Value::UInt64(v) => <$source>::try_from(v).map_err(|_| out_of_range::<Self>(v)),
                    Value::Boolean(v) => Ok(v as _),
                    Value::Decimal(v) if v.fract().is_zero() => {
                        v.to_i128()
                            .and_then(|v| <$source>::try_from(v).ok())
                            .ok_or_else(|| out_of_range::<Self>(v))
                    }
                    Value::Varchar(ref v) => parse_text::<$source>(v),
                    _ => Err(mismatch::<Self>(&value)),
                }
            }
        }
    )+};
}

impl_as_value_integer!(Value::Int64, i64, i8, i16, i32, i64);
impl_as_value_integer!(Value::UInt64, u64, u8, u16, u32, u64);

macro_rules! impl_as_value_float {
    ($($source:ty),+ $(,)?) => {$(
        impl AsValue for $source {
            fn as_value(self) -> Value {
                Value::Float64(self as f64)
            }
            fn try_from_value(value: Value) -> Result<Self> {
                match value {
                    Value::Float64(v) => Ok(v as _),
                    Value::Int64(v) => Ok(v as _),
                    Value::UInt64(v) => Ok(v as _),
                    Value::Decimal(v) => v.to_f64().map(|v| v as _).ok_or_else(|| out_of_range::<Self>(v)),
                    Value::Varchar(ref v) => parse_text::<$source>(v),
                    _ => Err(mismatch::<Self>(&value)),
                }
            }
        }
    )+};
}

impl_as_value_float!(f32, f64);

impl AsValue for bool {
    fn as_value(self) -> Value {
        Value::Boolean(self)
    }
    fn try_from_value(value: Value) -> Result<Self> {
        match value {
            Value::Boolean(v) => Ok(v),
            Value::Int64(v @ (0 | 1)) => Ok(v == 1),
            Value::UInt64(v @ (0 | 1)) => Ok(v == 1),
            Value::Varchar(ref v) => match v.as_str() {
                "1" | "true" | "TRUE" => Ok(true),
                "0" | "false" | "FALSE" => Ok(false),
                _ => Err(mismatch::<Self>(&value)),
            },
            _ => Err(mismatch::<Self>(&value)),
        }
    }
}

impl AsValue for Decimal {
    fn as_value(self) -> Value {
        Value::Decimal(self)
    }
    fn try_from_value(value: Value) -> Result<Self> {
        match value {
            Value::Decimal(v) => Ok(v),
            Value::Int64(v) => Ok(v.into()),
            Value::UInt64(v) => Ok(v.into()),
            Value::Float64(v) => Decimal::from_f64(v).ok_or_else(|| out_of_range::<Self>(v)),
            Value::Varchar(ref v) => parse_text::<Decimal>(v),
            _ => Err(mismatch::<Self>(&value)),
        }
    }
}

impl AsValue for String {
    fn as_value(self) -> Value {
        Value::Varchar(self)
    }
    fn try_from_value(value: Value) -> Result<Self> {
        match value {
            Value::Varchar(v) => Ok(v),
            Value::Blob(v) => String::from_utf8(v.into_vec())
                .map_err(|e| Error::new(e).context("Cannot read a binary value as a string")),
            Value::Uuid(v) => Ok(v.to_string()),
            _ => Err(mismatch::<Self>(&value)),
        }
    }
}

impl AsValue for Cow<'static, str> {
    fn as_value(self) -> Value {
        Value::Varchar(self.into_owned())
    }
    fn try_from_value(value: Value) -> Result<Self> {
        String::try_from_value(value).map(Into::into)
    }
}

impl AsValue for Box<[u8]> {
    fn as_value(self) -> Value {
        Value::Blob(self)
    }
    fn try_from_value(value: Value) -> Result<Self> {
        match value {
            Value::Blob(v) => Ok(v),
            Value::Varchar(v) => Ok(v.into_bytes().into()),
            _ => Err(mismatch::<Self>(&value)),
        }
    }
}

impl AsValue for Vec<u8> {
    fn as_value(self) -> Value {
        Value::Blob(self.into())
    }
    fn try_from_value(value: Value) -> Result<Self> {
        Box::<[u8]>::try_from_value(value).map(Into::into)
    }
}

impl AsValue for Date {
    fn as_value(self) -> Value {
        Value::Date(self)
    }
    fn try_from_value(value: Value) -> Result<Self> {
        match value {
            Value::Date(v) => Ok(v),
            Value::Timestamp(v) => Ok(v.date()),
            Value::Varchar(ref v) => Date::parse(v.trim(), format_description!("[year]-[month]-[day]"))
                .with_context_of::<Self>(v),
            _ => Err(mismatch::<Self>(&value)),
        }
    }
}

impl AsValue for Time {
    fn as_value(self) -> Value {
        Value::Time(self)
    }
    fn try_from_value(value: Value) -> Result<Self> {
        match value {
            Value::Time(v) => Ok(v),
            Value::Varchar(ref v) => Time::parse(
                v.trim(),
                format_description!("[hour]:[minute]:[second][optional [.[subsecond]]]"),
            )
            .with_context_of::<Self>(v),
            _ => Err(mismatch::<Self>(&value)),
        }
    }
}

impl AsValue for PrimitiveDateTime {
    fn as_value(self) -> Value {
        Value::Timestamp(self)
    }
    fn try_from_value(value: Value) -> Result<Self> {
        match value {
            Value::Timestamp(v) => Ok(v),
            Value::Date(v) => Ok(v.midnight()),
            Value::Varchar(ref v) => PrimitiveDateTime::parse(
                v.trim(),
                format_description!(
                    "[year]-[month]-[day][first [T][ ]][hour]:[minute]:[second][optional [.[subsecond]]]"
                ),
            )
            .with_context_of::<Self>(v),
            _ => Err(mismatch::<Self>(&value)),
        }
    }
}

impl AsValue for Uuid {
    fn as_value(self) -> Value {
        Value::Uuid(self)
    }
    fn try_from_value(value: Value) -> Result<Self> {
        match value {
            Value::Uuid(v) => Ok(v),
            Value::Varchar(ref v) => Uuid::parse_str(v.trim()).with_context_of::<Self>(v),
            Value::Blob(ref v) => Uuid::from_slice(v).with_context_of::<Self>(&format!("{v:?}")),
            _ => Err(mismatch::<Self>(&value)),
        }
    }
}

impl<T: AsValue> AsValue for Option<T> {
    fn as_value(self) -> Value {
        match self {
            Some(v) => v.as_value(),
            None => Value::Null,
        }
    }
    fn try_from_value(value: Value) -> Result<Self> {
        match value {
            Value::Null => Ok(None),
            v => T::try_from_value(v).map(Some),
        }
    }
}

trait ParseContext<T> {
    fn with_context_of<Target>(self, input: &str) -> Result<T>;
}

impl<T, E: std::error::Error + Send + Sync + 'static> ParseContext<T> for std::result::Result<T, E> {
    fn with_context_of<Target>(self, input: &str) -> Result<T> {
        self.map_err(|e| {
            Error::new(e).context(format!(
                "Cannot parse `{}` as {}",
                truncate_long!(input),
                any::type_name::<Target>()
            ))
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::{AsValue, Value};
    use rust_decimal::Decimal;
    use std::str::FromStr;
    use time::{
        Date, PrimitiveDateTime, Time,
        macros::{date, datetime, time},
    };
    use uuid::Uuid;

    #[test]
    fn integers_are_range_checked() {
        assert_eq!(u8::try_from_value(Value::Int64(255)).unwrap(), 255);
        assert!(u8::try_from_value(Value::Int64(256)).is_err());
        assert!(u32::try_from_value(Value::Int64(-1)).is_err());
        assert_eq!(i16::try_from_value(Value::UInt64(300)).unwrap(), 300);
        assert!(i64::try_from_value(Value::UInt64(u64::MAX)).is_err());
        assert_eq!(i32::try_from_value(Value::Varchar(" 42".into())).unwrap(), 42);
        assert!(i32::try_from_value(Value::Varchar("42abc".into())).is_err());
        assert!(i32::try_from_value(Value::Null).is_err());
    }

    #[test]
    fn narrow_types_widen() {
        assert_eq!(7u16.as_value(), Value::UInt64(7));
        assert_eq!((-7i8).as_value(), Value::Int64(-7));
        assert_eq!(1.5f32.as_value(), Value::Float64(1.5));
    }

    #[test]
    fn booleans() {
        assert!(bool::try_from_value(Value::Int64(1)).unwrap());
        assert!(!bool::try_from_value(Value::Varchar("0".into())).unwrap());
        assert!(bool::try_from_value(Value::Int64(2)).is_err());
    }

    #[test]
    fn options() {
        assert_eq!(Option::<i32>::try_from_value(Value::Null).unwrap(), None);
        assert_eq!(
            Option::<String>::try_from_value(Value::Varchar("a".into())).unwrap(),
            Some("a".to_string())
        );
        assert_eq!(None::<i32>.as_value(), Value::Null);
    }

    #[test]
    fn temporal_text() {
        assert_eq!(
            Date::try_from_value(Value::Varchar("2024-02-29".into())).unwrap(),
            date!(2024 - 02 - 29)
        );
        assert_eq!(
            Time::try_from_value(Value::Varchar("10:11:12.5".into())).unwrap(),
            time!(10:11:12.5)
        );
        assert_eq!(
            PrimitiveDateTime::try_from_value(Value::Varchar("2024-01-02 03:04:05".into()))
                .unwrap(),
            datetime!(2024-01-02 03:04:05)
        );
    }

    #[test]
    fn decimals_and_uuids() {
        assert_eq!(
            Decimal::try_from_value(Value::Varchar("12.50".into())).unwrap(),
            Decimal::from_str("12.50").unwrap()
        );
        let id = Uuid::parse_str("5e915574-bb30-4430-98cf-c5854f61fbbd").unwrap();
        assert_eq!(
            Uuid::try_from_value(Value::Varchar(id.to_string())).unwrap(),
            id
        );
    }
}
