//! Call-level interface traits
//!
//! The physical transport to the database server is a black box: a
//! synchronous request/response boundary that opens connections, runs SQL
//! text with positional parameters and hands back rows or errors. Adapters
//! for a concrete driver manager implement these traits; everything above
//! them (retry, health checks, dialect translation, decoding) is written
//! against the traits only.

use std::time::Duration;

use serde::Deserialize;

use crate::{CliResult, ColumnDescription, RawRow, Value};

/// Transaction isolation levels settable as a connection attribute
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
pub enum IsolationLevel {
    #[serde(rename = "READ_COMMITED", alias = "READ_COMMITTED")]
    ReadCommitted,
    /// Dirty read
    #[serde(rename = "READ_UNCOMMITTED")]
    ReadUncommitted,
    #[serde(rename = "REPEATABLE_READ")]
    RepeatableRead,
    #[serde(rename = "SERIALIZABLE")]
    Serializable,
}

impl IsolationLevel {
    /// Value of `SQL_ATTR_TXN_ISOLATION` for this level
    pub fn odbc_code(&self) -> u32 {
        match self {
            IsolationLevel::ReadUncommitted => 1,
            IsolationLevel::ReadCommitted => 2,
            IsolationLevel::RepeatableRead => 4,
            IsolationLevel::Serializable => 8,
        }
    }
}

/// Connection-level attributes applied once after connecting
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionAttribute {
    /// Encoding used for SQL text and text parameters
    Encoding(String),
    /// `SQL_ATTR_TXN_ISOLATION`
    TxnIsolation(IsolationLevel),
    /// Maximum size of character and binary parameters sent in one write
    MaxWrite(usize),
}

/// The connect primitive.
///
/// `connection_string` is a semicolon-joined `key=value` list. `timeout` is
/// forwarded to the driver as its login timeout when present.
pub trait Connector: Send + Sync {
    fn connect(
        &self,
        connection_string: &str,
        autocommit: bool,
        timeout: Option<Duration>,
    ) -> CliResult<Box<dyn RawConnection>>;
}

/// A physical connection handle
pub trait RawConnection: Send {
    /// Open a statement handle on this connection
    fn cursor(&mut self) -> CliResult<Box<dyn RawCursor + '_>>;

    fn autocommit(&self) -> bool;

    fn set_autocommit(&mut self, autocommit: bool) -> CliResult<()>;

    fn set_attribute(&mut self, attribute: ConnectionAttribute) -> CliResult<()>;

    /// Release the handle. Further use is undefined.
    fn close(&mut self) -> CliResult<()>;
}

/// A statement handle
pub trait RawCursor: Send {
    fn execute(&mut self, sql: &str, params: &[Value]) -> CliResult<()>;

    fn execute_many(&mut self, sql: &str, param_sets: &[Vec<Value>]) -> CliResult<()>;

    /// Columns of the current result set (empty when there is none)
    fn description(&self) -> &[ColumnDescription];

    /// Rows affected by the last statement, -1 when unknown
    fn row_count(&self) -> i64;

    fn fetch_one(&mut self) -> CliResult<Option<RawRow>>;

    fn fetch_many(&mut self, size: usize) -> CliResult<Vec<RawRow>>;

    fn fetch_all(&mut self) -> CliResult<Vec<RawRow>>;

    /// Skip to the next result set. Returns false when there is none.
    fn next_set(&mut self) -> CliResult<bool>;

    fn close(&mut self) -> CliResult<()>;
}
