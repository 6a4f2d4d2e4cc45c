//! Connection retry with exponential backoff
//!
//! Failed connect attempts are classified by the native error code the
//! driver embeds in its message. Codes listed in the policy are retried
//! after a jittered, exponentially growing delay; anything else fails on
//! the spot.
//!
//! # Example
//!
//! ```ignore
//! use ifx_connection::retry::{RetryEngine, RetryPolicy};
//!
//! let policy = RetryPolicy::default().with_max_attempts(3);
//! let mut engine = RetryEngine::new(policy);
//! let conn = engine.open(&connector, "Driver={...};Server=dev", false, None)?;
//! ```

mod engine;
mod policy;


pub use engine::{Jitter, RetryEngine, RetryState, ThreadRngJitter};
pub use policy::RetryPolicy;
