//! Error types for IFX

use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

static NATIVE_CODE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\((-?\d+)\)").expect("native error code pattern is valid")
});

/// Error reported by the call-level interface.
///
/// `state` is the SQLSTATE, `message` the driver text. Informix embeds its
/// native error code in the message in round brackets, e.g.
/// `"Attempt to connect to database server (dev) failed. (-908) (SQLDriverConnect)"`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("[{state}] {message}")]
pub struct CliError {
    /// SQLSTATE reported by the driver manager
    pub state: String,
    /// Driver message text
    pub message: String,
}

impl CliError {
    pub fn new(state: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            state: state.into(),
            message: message.into(),
        }
    }

    /// First parenthesised integer in the message, if any.
    pub fn native_code(&self) -> Option<i32> {
        NATIVE_CODE
            .captures(&self.message)
            .and_then(|caps| caps.get(1))
            .and_then(|m| m.as_str().parse().ok())
    }
}

/// Result type for raw call-level interface operations
pub type CliResult<T> = std::result::Result<T, CliError>;

/// Failure to open a physical connection.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("connection failed after {attempts} attempt(s): {source}")]
pub struct ConnectionError {
    /// The error of the last attempt
    pub source: CliError,
    /// Number of connect attempts made
    pub attempts: u32,
    /// Whether the last error matched the retryable error set
    pub retryable: bool,
}

impl ConnectionError {
    pub fn code(&self) -> Option<i32> {
        self.source.native_code()
    }

    pub fn is_retryable(&self) -> bool {
        self.retryable
    }
}

/// None of the configured encodings could decode a value.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unable to decode {len} bytes using any of [{}]", .encodings.join(", "))]
pub struct DecodeError {
    /// Length of the undecodable input
    pub len: usize,
    /// Encodings that were tried, in order
    pub encodings: Vec<String>,
}

/// Core error type for IFX operations
#[derive(Error, Debug)]
pub enum IfxError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Connection error: {0}")]
    Connection(#[from] ConnectionError),

    #[error("Decode error: {0}")]
    Decode(#[from] DecodeError),

    #[error("Cursor is not active")]
    CursorInactive,

    #[error("Database error: {0}")]
    Database(#[from] CliError),

    #[error("Conversion error: {0}")]
    Conversion(String),

    #[error("Not connected")]
    NotConnected,
}

impl IfxError {
    /// Native Informix error code carried by database and connection errors
    pub fn native_code(&self) -> Option<i32> {
        match self {
            IfxError::Database(err) => err.native_code(),
            IfxError::Connection(err) => err.code(),
            _ => None,
        }
    }
}

/// Result type alias for IFX operations
pub type Result<T> = std::result::Result<T, IfxError>;
