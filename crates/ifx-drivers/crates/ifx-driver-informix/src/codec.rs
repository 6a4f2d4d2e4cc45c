//! Character data decoding
//!
//! The Informix CLI hands character columns back as raw bytes whose
//! encoding depends on the database locale. Each such cell is decoded by
//! trying the configured encodings in order; the first one that accepts the
//! bytes wins.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use encoding_rs::{UTF_8, UTF_16BE, WINDOWS_1252};
use ifx_core::{ColumnDescription, DecodeError, IfxError, RawRow, Result, Value, sql_type};

/// Bytes that are unassigned in Windows-1252
const CP1252_UNDEFINED: [u8; 5] = [0x81, 0x8D, 0x8F, 0x90, 0x9D];

/// A text encoding understood by the codec
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Encoding {
    Utf8,
    Utf16Be,
    /// Windows-1252, rejecting the five unassigned bytes
    Cp1252,
    /// ISO-8859-1: every byte maps to the code point of the same value
    Latin1,
    Ascii,
}

impl Encoding {
    pub fn name(&self) -> &'static str {
        match self {
            Encoding::Utf8 => "utf-8",
            Encoding::Utf16Be => "utf-16-be",
            Encoding::Cp1252 => "cp1252",
            Encoding::Latin1 => "iso-8859-1",
            Encoding::Ascii => "ascii",
        }
    }

    /// Decode `bytes`, or `None` if they are not valid in this encoding
    pub fn decode(&self, bytes: &[u8]) -> Option<String> {
        match self {
            Encoding::Utf8 => UTF_8
                .decode_without_bom_handling_and_without_replacement(bytes)
                .map(|s| s.into_owned()),
            Encoding::Utf16Be => UTF_16BE
                .decode_without_bom_handling_and_without_replacement(bytes)
                .map(|s| s.into_owned()),
            Encoding::Cp1252 => {
                if bytes.iter().any(|b| CP1252_UNDEFINED.contains(b)) {
                    return None;
                }
                let (text, had_errors) =
                    WINDOWS_1252.decode_without_bom_handling(bytes);
                (!had_errors).then(|| text.into_owned())
            }
            Encoding::Latin1 => Some(bytes.iter().map(|&b| b as char).collect()),
            Encoding::Ascii => bytes
                .is_ascii()
                .then(|| String::from_utf8_lossy(bytes).into_owned()),
        }
    }

    /// Encode `text`, or `None` if it contains unmappable characters
    pub fn encode(&self, text: &str) -> Option<Vec<u8>> {
        match self {
            Encoding::Utf8 => Some(text.as_bytes().to_vec()),
            Encoding::Utf16Be => Some(text.encode_utf16().flat_map(u16::to_be_bytes).collect()),
            Encoding::Cp1252 => {
                let (bytes, _, had_errors) = WINDOWS_1252.encode(text);
                (!had_errors).then(|| bytes.into_owned())
            }
            Encoding::Latin1 => text
                .chars()
                .map(|c| u8::try_from(u32::from(c)).ok())
                .collect(),
            Encoding::Ascii => text.is_ascii().then(|| text.as_bytes().to_vec()),
        }
    }
}

impl FromStr for Encoding {
    type Err = IfxError;

    fn from_str(name: &str) -> Result<Self> {
        let normalized = name.trim().to_ascii_lowercase().replace('_', "-");
        match normalized.as_str() {
            "utf-8" | "utf8" => Ok(Encoding::Utf8),
            "utf-16-be" | "utf-16be" | "utf16be" => Ok(Encoding::Utf16Be),
            "cp1252" | "windows-1252" => Ok(Encoding::Cp1252),
            "iso-8859-1" | "iso8859-1" | "latin-1" | "latin1" => Ok(Encoding::Latin1),
            "ascii" | "us-ascii" => Ok(Encoding::Ascii),
            _ => Err(IfxError::Configuration(format!("unsupported encoding: {name}"))),
        }
    }
}

impl fmt::Display for Encoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Parse a list of encoding names, keeping their order
pub fn parse_encodings<S: AsRef<str>>(names: &[S]) -> Result<Vec<Encoding>> {
    names.iter().map(|n| n.as_ref().parse()).collect()
}

/// Undo the driver's escaping of embedded newlines.
///
/// The Informix CLI returns a newline inside character data as the two
/// bytes `\` `n`. Only that sequence is touched.
pub fn unescape(raw: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(raw.len());
    let mut i = 0;
    while i < raw.len() {
        if raw[i] == b'\\' && raw.get(i + 1) == Some(&b'n') {
            out.push(b'\n');
            i += 2;
        } else {
            out.push(raw[i]);
            i += 1;
        }
    }
    out
}

/// Decode with the first encoding that accepts the bytes
pub fn decode(raw: &[u8], encodings: &[Encoding]) -> std::result::Result<String, DecodeError> {
    encodings
        .iter()
        .find_map(|encoding| encoding.decode(raw))
        .ok_or_else(|| DecodeError {
            len: raw.len(),
            encodings: encodings.iter().map(|e| e.name().to_string()).collect(),
        })
}

/// Per-SQL-type decode hook applied to raw bytes from the driver
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputConverter {
    /// Constraint names in catalog results, always UTF-8
    Constraint,
    /// Integrity error text, always UTF-16 big endian
    IntegrityError,
    /// Character columns: unescape, then multi-encoding decode
    Text,
}

impl OutputConverter {
    pub fn convert(
        &self,
        raw: &[u8],
        encodings: &[Encoding],
    ) -> std::result::Result<String, DecodeError> {
        match self {
            OutputConverter::Constraint => decode(raw, &[Encoding::Utf8]),
            OutputConverter::IntegrityError => decode(raw, &[Encoding::Utf16Be]),
            OutputConverter::Text => decode(&unescape(raw), encodings),
        }
    }
}

/// Output converters keyed by SQL type code
#[derive(Debug, Clone, Default)]
pub struct OutputConverters {
    encodings: Vec<Encoding>,
    by_type: HashMap<i16, OutputConverter>,
}

impl OutputConverters {
    pub fn new(encodings: Vec<Encoding>) -> Self {
        Self {
            encodings,
            by_type: HashMap::new(),
        }
    }

    /// The converter set installed on every Informix connection
    pub fn informix(encodings: Vec<Encoding>) -> Self {
        let mut converters = Self::new(encodings);
        converters.register(sql_type::INFX_CONSTRAINT_TEXT, OutputConverter::Constraint);
        converters.register(sql_type::INFX_INTEGRITY_TEXT, OutputConverter::IntegrityError);
        for code in sql_type::CHARACTER_TYPES {
            converters.register(code, OutputConverter::Text);
        }
        converters
    }

    pub fn register(&mut self, sql_type: i16, converter: OutputConverter) {
        self.by_type.insert(sql_type, converter);
    }

    pub fn get(&self, sql_type: i16) -> Option<OutputConverter> {
        self.by_type.get(&sql_type).copied()
    }

    pub fn encodings(&self) -> &[Encoding] {
        &self.encodings
    }

    /// Convert a `Bytes` cell of the given type; other values pass through
    pub fn apply(&self, sql_type: i16, value: Value) -> std::result::Result<Value, DecodeError> {
        match (value, self.get(sql_type)) {
            (Value::Bytes(raw), Some(converter)) => {
                converter.convert(&raw, &self.encodings).map(Value::String)
            }
            (value, _) => Ok(value),
        }
    }
}

/// Everything needed to turn parameters and rows into their wire and
/// application shapes for one connection.
#[derive(Debug, Clone, Default)]
pub struct ValueCodec {
    converters: OutputConverters,
    driver_charset: Option<Encoding>,
}

impl ValueCodec {
    pub fn new(converters: OutputConverters) -> Self {
        Self {
            converters,
            driver_charset: None,
        }
    }

    pub fn with_driver_charset(mut self, charset: Option<Encoding>) -> Self {
        self.driver_charset = charset;
        self
    }

    pub fn converters(&self) -> &OutputConverters {
        &self.converters
    }

    pub fn driver_charset(&self) -> Option<Encoding> {
        self.driver_charset
    }

    /// Normalise one statement parameter.
    ///
    /// Booleans become 1/0. Text is re-encoded when a driver charset is
    /// configured. Everything else is sent unchanged.
    pub fn encode_param(&self, value: &Value) -> Result<Value> {
        match value {
            Value::Bool(b) => Ok(Value::Int32(i32::from(*b))),
            Value::String(text) => match self.driver_charset {
                Some(charset) => charset.encode(text).map(Value::Bytes).ok_or_else(|| {
                    IfxError::Conversion(format!("text parameter is not representable in {charset}"))
                }),
                None => Ok(value.clone()),
            },
            other => Ok(other.clone()),
        }
    }

    pub fn encode_params(&self, params: &[Value]) -> Result<Vec<Value>> {
        params.iter().map(|p| self.encode_param(p)).collect()
    }

    /// Apply output converters and the driver charset to a fetched row
    pub fn decode_row(&self, description: &[ColumnDescription], row: RawRow) -> Result<Vec<Value>> {
        row.into_iter()
            .enumerate()
            .map(|(index, value)| {
                let Some(column) = description.get(index) else {
                    return Ok(value);
                };
                let value = self.converters.apply(column.sql_type, value)?;
                match (value, self.driver_charset) {
                    (Value::Bytes(raw), Some(charset)) if !sql_type::is_binary(column.sql_type) => {
                        decode(&raw, &[charset]).map(Value::String).map_err(IfxError::from)
                    }
                    (value, _) => Ok(value),
                }
            })
            .collect()
    }
}
