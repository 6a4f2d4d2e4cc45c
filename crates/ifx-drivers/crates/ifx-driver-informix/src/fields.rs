//! Semantic field types
//!
//! Every column the host maps has a [`FieldType`]. It decides the column
//! type used in DDL, and how values are adapted on the way in
//! ([`FieldType::to_db_value`]) and converted on the way out
//! ([`FieldType::from_db_value`]).

use std::str::FromStr;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use ifx_core::{IfxError, Result, Value};
use rust_decimal::Decimal;
use uuid::Uuid;

const DATETIME_FORMATS: [&str; 3] = ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M"];
const TIME_FORMATS: [&str; 2] = ["%H:%M:%S%.f", "%H:%M"];

/// Informix stores `datetime year to fraction(5)`
const FRACTION_DIGITS: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldType {
    Auto,
    BigAuto,
    Binary,
    Boolean,
    NullBoolean,
    /// Boolean stored as `'Y'` / `'N'` in a `char(1)` column
    CharToBoolean,
    Char { max_length: u32 },
    /// Char column whose trailing blanks are stripped on read
    TrimChar { max_length: u32 },
    Text { max_length: u32 },
    CommaSeparatedInteger { max_length: u32 },
    File { max_length: u32 },
    FilePath { max_length: u32 },
    Slug { max_length: u32 },
    Date,
    DateTime,
    Decimal { max_digits: u32, decimal_places: u32 },
    Duration,
    Float,
    Integer,
    BigInteger,
    SmallInteger,
    PositiveInteger,
    PositiveSmallInteger,
    OneToOne,
    IpAddress,
    GenericIpAddress,
    Time,
    Uuid,
}

impl FieldType {
    /// Column type used when creating or altering a column
    pub fn column_type(&self) -> String {
        match self {
            FieldType::Auto => "serial".into(),
            FieldType::BigAuto => "bigserial".into(),
            FieldType::Binary => "blob".into(),
            FieldType::Boolean | FieldType::NullBoolean => "boolean".into(),
            FieldType::CharToBoolean => "char(1)".into(),
            FieldType::Char { max_length }
            | FieldType::TrimChar { max_length }
            | FieldType::Text { max_length }
            | FieldType::CommaSeparatedInteger { max_length }
            | FieldType::File { max_length }
            | FieldType::FilePath { max_length }
            | FieldType::Slug { max_length } => format!("lvarchar({max_length})"),
            FieldType::Date => "date".into(),
            FieldType::DateTime => "datetime year to fraction(5)".into(),
            FieldType::Decimal { .. } => "decimal".into(),
            FieldType::Duration => "interval".into(),
            FieldType::Float => "smallfloat".into(),
            FieldType::Integer | FieldType::PositiveInteger | FieldType::OneToOne => {
                "integer".into()
            }
            FieldType::BigInteger => "bigint".into(),
            FieldType::SmallInteger | FieldType::PositiveSmallInteger => "smallint".into(),
            FieldType::IpAddress => "char(15)".into(),
            FieldType::GenericIpAddress => "char(39)".into(),
            FieldType::Time => "datetime hour to second".into(),
            FieldType::Uuid => "char(32)".into(),
        }
    }

    /// CHECK constraint body for the column, if the type needs one
    pub fn check_constraint(&self, column: &str) -> Option<String> {
        match self {
            FieldType::PositiveInteger | FieldType::PositiveSmallInteger => {
                Some(format!("{column} >= 0"))
            }
            _ => None,
        }
    }

    /// Convert a value read from the database into its application shape
    pub fn from_db_value(&self, value: Value) -> Result<Value> {
        if value.is_null() {
            return Ok(Value::Null);
        }
        match self {
            FieldType::Boolean | FieldType::NullBoolean => Ok(bool_from_db(&value)),
            FieldType::CharToBoolean => Ok(match value.as_str().map(str::trim) {
                Some("Y") => Value::Bool(true),
                Some("N") => Value::Bool(false),
                _ => Value::Null,
            }),
            FieldType::TrimChar { .. } => Ok(match value {
                Value::String(s) => Value::String(s.trim_end().to_string()),
                other => other,
            }),
            FieldType::Decimal {
                max_digits,
                decimal_places,
            } => normalize_decimal(&value, *max_digits, *decimal_places).map(Value::Decimal),
            FieldType::Date => match value {
                Value::String(s) => parse_date(&s).map(Value::Date),
                other => Ok(other),
            },
            FieldType::DateTime => match value {
                Value::String(s) => parse_datetime(&s).map(Value::DateTime),
                other => Ok(other),
            },
            FieldType::Time => match value {
                Value::String(s) => parse_time(&s).map(Value::Time),
                other => Ok(other),
            },
            FieldType::Uuid => match value {
                Value::String(s) => Uuid::parse_str(s.trim())
                    .map(Value::Uuid)
                    .map_err(|e| IfxError::Conversion(format!("invalid uuid {s:?}: {e}"))),
                other => Ok(other),
            },
            _ => Ok(value),
        }
    }

    /// Adapt an application value for storage
    pub fn to_db_value(&self, value: Value) -> Result<Value> {
        match (self, value) {
            (_, Value::Null) => Ok(Value::Null),
            (FieldType::Boolean | FieldType::NullBoolean, Value::Bool(b)) => {
                Ok(Value::Int32(i32::from(b)))
            }
            (FieldType::CharToBoolean, Value::Bool(b)) => {
                Ok(Value::String(if b { "Y" } else { "N" }.to_string()))
            }
            (FieldType::DateTime, Value::DateTime(dt)) => Ok(Value::String(adapt_datetime(&dt))),
            (FieldType::Uuid, Value::Uuid(id)) => Ok(Value::String(id.simple().to_string())),
            (_, value) => Ok(value),
        }
    }
}

fn bool_from_db(value: &Value) -> Value {
    match value {
        Value::Bool(b) => Value::Bool(*b),
        Value::String(s) => match s.trim() {
            "1" | "t" | "T" => Value::Bool(true),
            "0" | "f" | "F" => Value::Bool(false),
            _ => Value::Null,
        },
        other => match other.as_i64() {
            Some(1) => Value::Bool(true),
            Some(0) => Value::Bool(false),
            _ => Value::Null,
        },
    }
}

/// Render a datetime the way `datetime year to fraction(5)` accepts it
pub fn adapt_datetime(value: &NaiveDateTime) -> String {
    let mut text = value.format("%Y-%m-%d %H:%M:%S%.6f").to_string();
    text.truncate(text.len() - (6 - FRACTION_DIGITS));
    text
}

/// Round to `decimal_places` and check the result fits in `max_digits`
pub fn normalize_decimal(value: &Value, max_digits: u32, decimal_places: u32) -> Result<String> {
    let parsed = match value {
        Value::Decimal(s) | Value::String(s) => Decimal::from_str(s.trim()).ok(),
        Value::Float32(f) => Decimal::try_from(*f).ok(),
        Value::Float64(f) => Decimal::try_from(*f).ok(),
        other => other.as_i64().map(Decimal::from),
    }
    .ok_or_else(|| IfxError::Conversion(format!("not a decimal value: {value}")))?;

    let mut rounded = parsed.round_dp(decimal_places);
    rounded.rescale(decimal_places);

    let integer_part = rounded.trunc().abs().normalize();
    let integer_digits = if integer_part.is_zero() {
        0
    } else {
        integer_part.to_string().len() as u32
    };
    if integer_digits + decimal_places > max_digits {
        return Err(IfxError::Conversion(format!(
            "{rounded} does not fit in {max_digits} digits with {decimal_places} decimal places"
        )));
    }
    Ok(rounded.to_string())
}

fn parse_date(text: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(text.trim(), "%Y-%m-%d")
        .map_err(|e| IfxError::Conversion(format!("invalid date {text:?}: {e}")))
}

fn parse_datetime(text: &str) -> Result<NaiveDateTime> {
    let text = text.trim();
    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
        .ok_or_else(|| IfxError::Conversion(format!("invalid datetime {text:?}")))
}

fn parse_time(text: &str) -> Result<NaiveTime> {
    let text = text.trim();
    TIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveTime::parse_from_str(text, fmt).ok())
        .ok_or_else(|| IfxError::Conversion(format!("invalid time {text:?}")))
}
