//! Informix catalog type codes
//!
//! `syscolumns.coltype` stores the column type in its low byte; the
//! `0x100` bit marks NOT NULL columns.

use crate::fields::FieldType;

/// Column type codes as stored in the system catalog
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InformixType {
    Char,
    SmallInt,
    Integer,
    Float,
    SmallFloat,
    Decimal,
    Serial,
    Date,
    Money,
    Null,
    DateTime,
    Byte,
    Text,
    VarChar,
    Interval,
    NChar,
    NVarChar,
    Int8,
    Serial8,
    Set,
    Mask,
    UdtVar,
    UdtFixed,
    LVarChar,
    Boolean,
    BigInt,
    BigSerial,
}

impl InformixType {
    pub const ALL: [InformixType; 27] = [
        InformixType::Char,
        InformixType::SmallInt,
        InformixType::Integer,
        InformixType::Float,
        InformixType::SmallFloat,
        InformixType::Decimal,
        InformixType::Serial,
        InformixType::Date,
        InformixType::Money,
        InformixType::Null,
        InformixType::DateTime,
        InformixType::Byte,
        InformixType::Text,
        InformixType::VarChar,
        InformixType::Interval,
        InformixType::NChar,
        InformixType::NVarChar,
        InformixType::Int8,
        InformixType::Serial8,
        InformixType::Set,
        InformixType::Mask,
        InformixType::UdtVar,
        InformixType::UdtFixed,
        InformixType::LVarChar,
        InformixType::Boolean,
        InformixType::BigInt,
        InformixType::BigSerial,
    ];

    pub fn code(&self) -> i32 {
        match self {
            InformixType::Char => 0,
            InformixType::SmallInt => 1,
            InformixType::Integer => 2,
            InformixType::Float => 3,
            InformixType::SmallFloat => 4,
            InformixType::Decimal => 5,
            InformixType::Serial => 6,
            InformixType::Date => 7,
            InformixType::Money => 8,
            InformixType::Null => 9,
            InformixType::DateTime => 10,
            InformixType::Byte => 11,
            InformixType::Text => 12,
            InformixType::VarChar => 13,
            InformixType::Interval => 14,
            InformixType::NChar => 15,
            InformixType::NVarChar => 16,
            InformixType::Int8 => 17,
            InformixType::Serial8 => 18,
            InformixType::Set => 19,
            InformixType::Mask => 31,
            InformixType::UdtVar => 40,
            InformixType::UdtFixed => 41,
            InformixType::LVarChar => 43,
            InformixType::Boolean => 45,
            InformixType::BigInt => 52,
            InformixType::BigSerial => 53,
        }
    }

    pub fn from_code(code: i32) -> Option<Self> {
        Self::ALL.iter().copied().find(|t| t.code() == code)
    }

    pub fn name(&self) -> &'static str {
        match self {
            InformixType::Char => "CHAR",
            InformixType::SmallInt => "SMALLINT",
            InformixType::Integer => "INTEGER",
            InformixType::Float => "FLOAT",
            InformixType::SmallFloat => "SMALLFLOAT",
            InformixType::Decimal => "DECIMAL",
            InformixType::Serial => "SERIAL",
            InformixType::Date => "DATE",
            InformixType::Money => "MONEY",
            InformixType::Null => "NULL",
            InformixType::DateTime => "DATETIME",
            InformixType::Byte => "BYTE",
            InformixType::Text => "TEXT",
            InformixType::VarChar => "VARCHAR",
            InformixType::Interval => "INTERVAL",
            InformixType::NChar => "NCHAR",
            InformixType::NVarChar => "NVARCHAR",
            InformixType::Int8 => "INT8",
            InformixType::Serial8 => "SERIAL8",
            InformixType::Set => "SET",
            InformixType::Mask => "MASK",
            InformixType::UdtVar => "UDTVAR",
            InformixType::UdtFixed => "UDTFIXED",
            InformixType::LVarChar => "LVARCHAR",
            InformixType::Boolean => "BOOLEAN",
            InformixType::BigInt => "BIGINT",
            InformixType::BigSerial => "BIGSERIAL",
        }
    }

    /// Field type a column of this type is introspected as.
    ///
    /// `length` is the character length; `precision` and `scale` apply to
    /// decimal and money columns. Types with no field counterpart map to `None`.
    pub fn field_type(&self, length: u32, precision: u32, scale: u32) -> Option<FieldType> {
        let field = match self {
            InformixType::Char
            | InformixType::VarChar
            | InformixType::NChar
            | InformixType::NVarChar
            | InformixType::UdtVar
            | InformixType::LVarChar => FieldType::Char { max_length: length },
            InformixType::SmallInt => FieldType::SmallInteger,
            InformixType::Integer | InformixType::Int8 => FieldType::Integer,
            InformixType::Float | InformixType::SmallFloat => FieldType::Float,
            InformixType::Decimal | InformixType::Money => FieldType::Decimal {
                max_digits: precision,
                decimal_places: scale,
            },
            InformixType::Serial | InformixType::Serial8 => FieldType::Auto,
            InformixType::BigSerial => FieldType::BigAuto,
            InformixType::Date => FieldType::Date,
            InformixType::DateTime => FieldType::DateTime,
            InformixType::Byte => FieldType::Binary,
            InformixType::Text => FieldType::Text { max_length: length },
            InformixType::Interval => FieldType::Duration,
            InformixType::Boolean => FieldType::Boolean,
            InformixType::BigInt => FieldType::BigInteger,
            InformixType::Null | InformixType::Set | InformixType::Mask | InformixType::UdtFixed => {
                return None;
            }
        };
        Some(field)
    }
}

impl std::fmt::Display for InformixType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
