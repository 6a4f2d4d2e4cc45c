//! ODBC SQL type codes reported in result set descriptions

pub const CHAR: i16 = 1;
pub const NUMERIC: i16 = 2;
pub const DECIMAL: i16 = 3;
pub const INTEGER: i16 = 4;
pub const SMALLINT: i16 = 5;
pub const FLOAT: i16 = 6;
pub const REAL: i16 = 7;
pub const DOUBLE: i16 = 8;
pub const VARCHAR: i16 = 12;
pub const TYPE_DATE: i16 = 91;
pub const TYPE_TIME: i16 = 92;
pub const TYPE_TIMESTAMP: i16 = 93;
pub const LONGVARCHAR: i16 = -1;
pub const BINARY: i16 = -2;
pub const VARBINARY: i16 = -3;
pub const LONGVARBINARY: i16 = -4;
pub const BIGINT: i16 = -5;
pub const BIT: i16 = -7;
pub const WCHAR: i16 = -8;
pub const WVARCHAR: i16 = -9;
pub const WLONGVARCHAR: i16 = -10;

/// Informix-specific type used for constraint names in catalog queries
pub const INFX_CONSTRAINT_TEXT: i16 = -101;
/// Informix-specific type carrying integrity error text (UTF-16 big endian)
pub const INFX_INTEGRITY_TEXT: i16 = -391;

/// Character types whose raw bytes are decoded by the text output converter
pub const CHARACTER_TYPES: [i16; 6] = [CHAR, WCHAR, VARCHAR, WVARCHAR, LONGVARCHAR, WLONGVARCHAR];

pub fn is_binary(sql_type: i16) -> bool {
    matches!(sql_type, BINARY | VARBINARY | LONGVARBINARY)
}

pub fn is_character(sql_type: i16) -> bool {
    CHARACTER_TYPES.contains(&sql_type)
}
