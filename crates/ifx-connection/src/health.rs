//! Connection health checking
//!
//! [`is_usable`] runs a trivial probe statement and never fails; the
//! [`HealthMonitor`] decides whether a probe is due at all, so connections
//! reused in a tight loop are not probed on every checkout.
//!
//! # Example
//!
//! ```ignore
//! use ifx_connection::health::{HealthMonitor, is_usable};
//! use std::time::Duration;
//!
//! let monitor = HealthMonitor::new(Duration::from_secs(300));
//! if !monitor.validate(|| is_usable(conn.as_mut())) {
//!     // discard the connection
//! }
//! ```

mod monitor;
mod ping;


pub use monitor::HealthMonitor;
pub use ping::{PING_QUERY, PingError, PingResult, is_usable, ping};
