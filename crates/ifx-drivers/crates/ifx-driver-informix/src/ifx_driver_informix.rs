//! Informix driver for IFX
//!
//! This crate provides the Informix-specific layer on top of the raw
//! call-level interface: settings validation, the connection wrapper, the
//! statement executor, SQL dialect translation and value decoding.

mod codec;
mod config;
mod connection;
mod cursor;
mod dialect;
mod fields;
pub mod introspection;
pub mod schema;
mod types;

#[cfg(test)]
mod test_support;

#[cfg(test)]
mod codec_tests;
#[cfg(test)]
mod config_tests;
#[cfg(test)]
mod cursor_tests;
#[cfg(test)]
mod dialect_tests;
#[cfg(test)]
mod fields_tests;
#[cfg(test)]
mod introspection_tests;
#[cfg(test)]
mod schema_tests;

pub use codec::{
    Encoding, OutputConverter, OutputConverters, ValueCodec, decode, parse_encodings, unescape,
};
pub use config::{
    ConnectionOptions, ConnectionParams, ConnectionSettings, MAX_WRITE, Platform, SQLHOSTS_ENV,
};
pub use connection::InformixConnection;
pub use cursor::Cursor;
pub use dialect::{InformixDialect, LAST_INSERT_ID_SQL, SessionIsolation};
pub use fields::{FieldType, adapt_datetime, normalize_decimal};
pub use schema::SchemaEditor;
pub use types::InformixType;
