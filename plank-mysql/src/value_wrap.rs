use mysql_async::{
    Column,
    consts::{ColumnFlags, ColumnType},
    from_value_opt,
};
use plank_core::{Error, Result, Value};
use rust_decimal::Decimal;
use time::{Date, PrimitiveDateTime, Time};

/// Character set number MySQL reports for binary columns.
const BINARY_CHARSET: u16 = 63;

pub(crate) struct ValueWrap(pub(crate) Value);

impl From<Value> for ValueWrap {
    fn from(value: Value) -> Self {
        Self(value)
    }
}
impl From<ValueWrap> for Value {
    fn from(value: ValueWrap) -> Self {
        value.0
    }
}

impl ValueWrap {
    /// Decodes a server value using the metadata of its column, the text protocol delivers
    /// everything as bytes.
    pub(crate) fn decode(value: mysql_async::Value, column: &Column) -> Result<Self> {
        if value == mysql_async::Value::NULL {
            return Ok(Value::Null.into());
        }
        let context = || {
            format!(
                "While decoding column `{}` of type {:?}",
                column.name_str(),
                column.column_type()
            )
        };
        let unsigned = column.flags().contains(ColumnFlags::UNSIGNED_FLAG);
        let result = match column.column_type() {
            ColumnType::MYSQL_TYPE_TINY
            | ColumnType::MYSQL_TYPE_SHORT
            | ColumnType::MYSQL_TYPE_INT24
            | ColumnType::MYSQL_TYPE_LONG
            | ColumnType::MYSQL_TYPE_LONGLONG
            | ColumnType::MYSQL_TYPE_YEAR => {
                if unsigned {
                    from_value_opt::<u64>(value).map(Value::UInt64)
                } else {
                    from_value_opt::<i64>(value).map(Value::Int64)
                }
            }
            ColumnType::MYSQL_TYPE_FLOAT | ColumnType::MYSQL_TYPE_DOUBLE => {
                from_value_opt::<f64>(value).map(Value::Float64)
            }
            ColumnType::MYSQL_TYPE_DECIMAL | ColumnType::MYSQL_TYPE_NEWDECIMAL => {
                from_value_opt::<Decimal>(value).map(Value::Decimal)
            }
            ColumnType::MYSQL_TYPE_DATE | ColumnType::MYSQL_TYPE_NEWDATE => {
                from_value_opt::<Date>(value).map(Value::Date)
            }
            ColumnType::MYSQL_TYPE_TIME | ColumnType::MYSQL_TYPE_TIME2 => {
                from_value_opt::<Time>(value).map(Value::Time)
            }
            ColumnType::MYSQL_TYPE_DATETIME
            | ColumnType::MYSQL_TYPE_DATETIME2
            | ColumnType::MYSQL_TYPE_TIMESTAMP
            | ColumnType::MYSQL_TYPE_TIMESTAMP2 => {
                from_value_opt::<PrimitiveDateTime>(value).map(Value::Timestamp)
            }
            _ => match value {
                mysql_async::Value::Bytes(v) if column.character_set() == BINARY_CHARSET => {
                    Ok(Value::Blob(v.into()))
                }
                mysql_async::Value::Bytes(v) => String::from_utf8(v)
                    .map(Value::Varchar)
                    .or_else(|e| Ok(Value::Blob(e.into_bytes().into()))),
                mysql_async::Value::Int(v) => Ok(Value::Int64(v)),
                mysql_async::Value::UInt(v) => Ok(Value::UInt64(v)),
                mysql_async::Value::Float(v) => Ok(Value::Float64(v.into())),
                mysql_async::Value::Double(v) => Ok(Value::Float64(v)),
                other => from_value_opt::<PrimitiveDateTime>(other).map(Value::Timestamp),
            },
        };
        result
            .map(ValueWrap)
            .map_err(|e| Error::msg(format!("{:?}", e.0)).context(context()))
    }
}

impl TryFrom<ValueWrap> for mysql_async::Value {
    type Error = Error;

    fn try_from(value: ValueWrap) -> std::result::Result<Self, Self::Error> {
        type MySqlValue = mysql_async::Value;
        Ok(match value.0 {
            Value::Null => MySqlValue::NULL,
            Value::Boolean(v) => MySqlValue::from(v),
            Value::Int64(v) => MySqlValue::from(v),
            Value::UInt64(v) => MySqlValue::from(v),
            Value::Float64(v) => MySqlValue::from(v),
            Value::Decimal(v) => MySqlValue::from(v),
            Value::Varchar(v) => MySqlValue::from(v),
            Value::Blob(v) => MySqlValue::Bytes(v.into_vec()),
            Value::Date(v) => MySqlValue::from(v),
            Value::Time(v) => MySqlValue::from(v),
            Value::Timestamp(v) => {
                let year = v.year();
                if !(0..=9999).contains(&year) {
                    return Err(Error::msg(format!(
                        "Timestamp {} is out of range for MySQL",
                        v
                    )));
                }
                MySqlValue::Date(
                    year as _,
                    v.month().into(),
                    v.day(),
                    v.hour(),
                    v.minute(),
                    v.second(),
                    v.microsecond(),
                )
            }
            Value::Uuid(v) => MySqlValue::from(v.hyphenated().to_string()),
        })
    }
}
