//! IFX Connection - Connection retry and health checking
//!
//! This crate opens physical connections with retry and backoff, and
//! decides when an open connection needs to be re-validated before reuse.

pub mod health;
pub mod retry;

#[cfg(test)]
mod test_support;

pub use health::{HealthMonitor, PingError, PingResult, is_usable, ping};
pub use retry::{Jitter, RetryEngine, RetryPolicy, RetryState, ThreadRngJitter};
