//! Probe statement execution
//!
//! Executes a minimal query and measures how long the round trip took.

use std::time::{Duration, Instant};

use ifx_core::{CliError, RawConnection};
use thiserror::Error;

/// Statement used to probe a connection
pub const PING_QUERY: &str = "SELECT 1";

/// Result of a ping operation
pub type PingResult = Result<Duration, PingError>;

/// Error that can occur during a ping operation
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PingError {
    #[error("Could not open a statement handle: {0}")]
    CursorUnavailable(CliError),
    #[error("Ping query failed: {0}")]
    QueryFailed(CliError),
}

/// Execute [`PING_QUERY`] and return the round-trip time.
pub fn ping(conn: &mut dyn RawConnection) -> PingResult {
    let start = Instant::now();
    let mut cursor = conn.cursor().map_err(PingError::CursorUnavailable)?;
    let outcome = cursor
        .execute(PING_QUERY, &[])
        .map_err(PingError::QueryFailed);
    // close errors do not affect the outcome
    let _ = cursor.close();
    outcome.map(|()| start.elapsed())
}

/// Whether the connection can still run statements.
///
/// Errors are logged and reported as `false`, never returned.
pub fn is_usable(conn: &mut dyn RawConnection) -> bool {
    match ping(conn) {
        Ok(latency) => {
            tracing::trace!(latency_us = latency.as_micros() as u64, "connection usable");
            true
        }
        Err(err) => {
            tracing::debug!(error = %err, "connection is not usable");
            false
        }
    }
}
