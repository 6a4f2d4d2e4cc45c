//! Retry state machine around the connect primitive

use std::sync::Arc;
use std::time::Duration;

use ifx_core::{CliError, Clock, ConnectionError, Connector, RawConnection, SystemClock};
use rand::Rng;
use regex::Regex;

use super::RetryPolicy;

/// Source of the random component of retry delays.
///
/// Returns a value in `[low, high]` (milliseconds).
pub trait Jitter: Send {
    fn sample(&mut self, low: f64, high: f64) -> f64;
}

impl<F> Jitter for F
where
    F: FnMut(f64, f64) -> f64 + Send,
{
    fn sample(&mut self, low: f64, high: f64) -> f64 {
        self(low, high)
    }
}

/// Uniform jitter from the thread-local RNG
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadRngJitter;

impl Jitter for ThreadRngJitter {
    fn sample(&mut self, low: f64, high: f64) -> f64 {
        if high <= low {
            return low;
        }
        rand::thread_rng().gen_range(low..=high)
    }
}

/// States of one `open` call.
///
/// `Idle -> Attempting -> {Success, RetryWait -> Attempting, Failed}`
#[derive(Debug, Clone, PartialEq)]
pub enum RetryState {
    Idle,
    Attempting { attempt: u32 },
    RetryWait { attempt: u32, delay: Duration },
    Success { attempt: u32 },
    Failed { attempt: u32, retryable: bool },
}

impl RetryState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, RetryState::Success { .. } | RetryState::Failed { .. })
    }
}

/// Opens physical connections according to a [`RetryPolicy`].
pub struct RetryEngine {
    policy: RetryPolicy,
    matcher: Option<Regex>,
    clock: Arc<dyn Clock>,
    jitter: Box<dyn Jitter>,
    transitions: Vec<RetryState>,
}

impl RetryEngine {
    pub fn new(policy: RetryPolicy) -> Self {
        let matcher = policy.retryable_matcher();
        Self {
            policy,
            matcher,
            clock: Arc::new(SystemClock),
            jitter: Box::new(ThreadRngJitter),
            transitions: Vec::new(),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.set_clock(clock);
        self
    }

    pub fn with_jitter(mut self, jitter: impl Jitter + 'static) -> Self {
        self.set_jitter(jitter);
        self
    }

    pub fn set_clock(&mut self, clock: Arc<dyn Clock>) {
        self.clock = clock;
    }

    pub fn set_jitter(&mut self, jitter: impl Jitter + 'static) {
        self.jitter = Box::new(jitter);
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// States visited by the most recent `open` call, starting with `Idle`
    pub fn transitions(&self) -> &[RetryState] {
        &self.transitions
    }

    /// Whether `error` carries one of the configured codes in brackets
    pub fn is_retryable(&self, error: &CliError) -> bool {
        self.matcher
            .as_ref()
            .is_some_and(|re| re.is_match(&error.message))
    }

    /// Connect, retrying transient failures.
    ///
    /// Returns as soon as an attempt succeeds. A non-retryable error, or a
    /// retryable one on the last permitted attempt, is returned wrapped in a
    /// [`ConnectionError`].
    #[tracing::instrument(skip(self, connector, connection_string, timeout))]
    pub fn open(
        &mut self,
        connector: &dyn Connector,
        connection_string: &str,
        autocommit: bool,
        timeout: Option<Duration>,
    ) -> Result<Box<dyn RawConnection>, ConnectionError> {
        let max_attempts = self.policy.max_attempts();
        self.transitions.clear();

        let mut state = RetryState::Idle;
        loop {
            self.transitions.push(state.clone());
            state = match state {
                RetryState::Idle => RetryState::Attempting { attempt: 1 },
                RetryState::Attempting { attempt } => {
                    match connector.connect(connection_string, autocommit, timeout) {
                        Ok(conn) => {
                            self.transitions.push(RetryState::Success { attempt });
                            tracing::debug!(attempt, "connected");
                            return Ok(conn);
                        }
                        Err(err) => {
                            let retryable = self.is_retryable(&err);
                            if retryable && attempt < max_attempts {
                                let delay = self.policy.delay(attempt, self.jitter.as_mut());
                                let wait_ms = delay.as_secs_f64() * 1000.0;
                                tracing::info!(
                                    attempt,
                                    wait_ms,
                                    error = %err,
                                    "failed to connect to db on attempt {attempt}: \"{err}\"; waiting {wait_ms:.1} ms before trying again"
                                );
                                RetryState::RetryWait { attempt, delay }
                            } else {
                                self.transitions
                                    .push(RetryState::Failed { attempt, retryable });
                                return Err(ConnectionError {
                                    source: err,
                                    attempts: attempt,
                                    retryable,
                                });
                            }
                        }
                    }
                }
                RetryState::RetryWait { attempt, delay } => {
                    self.clock.sleep(delay);
                    RetryState::Attempting {
                        attempt: attempt + 1,
                    }
                }
                RetryState::Success { .. } | RetryState::Failed { .. } => {
                    unreachable!("terminal states return from open")
                }
            };
        }
    }
}

impl Default for RetryEngine {
    fn default() -> Self {
        Self::new(RetryPolicy::default())
    }
}
