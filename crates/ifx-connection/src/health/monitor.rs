//! Rate-limited connection validation
//!
//! A validation younger than the configured interval is trusted without
//! probing again. Within that window a dead connection goes unnoticed; the
//! interval bounds how long.

use std::sync::Arc;
use std::time::{Duration, Instant};

use ifx_core::{Clock, SystemClock};
use parking_lot::Mutex;

/// Tracks when a connection was last known to be usable.
pub struct HealthMonitor {
    interval: Duration,
    last_validated: Mutex<Option<Instant>>,
    clock: Arc<dyn Clock>,
}

impl HealthMonitor {
    pub fn new(interval: Duration) -> Self {
        Self::with_clock(interval, Arc::new(SystemClock))
    }

    pub fn with_clock(interval: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            interval,
            last_validated: Mutex::new(None),
            clock,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Instant of the last successful probe
    pub fn last_validated(&self) -> Option<Instant> {
        *self.last_validated.lock()
    }

    /// Whether the next `validate` call will run the probe
    pub fn is_due(&self) -> bool {
        match *self.last_validated.lock() {
            Some(at) => self.clock.now().saturating_duration_since(at) >= self.interval,
            None => true,
        }
    }

    /// Run `probe` unless the connection was validated within the interval.
    ///
    /// Returns `true` without probing inside the window. A successful probe
    /// restarts the window; a failed one clears it.
    pub fn validate(&self, probe: impl FnOnce() -> bool) -> bool {
        let mut last = self.last_validated.lock();
        let now = self.clock.now();
        if let Some(at) = *last {
            let since = now.saturating_duration_since(at);
            if since < self.interval {
                tracing::trace!(since_ms = since.as_millis() as u64, "skipping validation");
                return true;
            }
        }

        let usable = probe();
        *last = usable.then_some(now);
        tracing::debug!(usable, "connection validated");
        usable
    }

    /// Forget the last validation, e.g. after the connection was replaced
    pub fn reset(&self) {
        *self.last_validated.lock() = None;
    }
}

impl std::fmt::Debug for HealthMonitor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HealthMonitor")
            .field("interval", &self.interval)
            .field("last_validated", &self.last_validated())
            .finish()
    }
}
