//! Retry policy and error classification

use std::time::Duration;

use regex::Regex;
use serde::Deserialize;

use super::Jitter;

/// Native error codes retried by default: -908 (connect attempt failed)
/// and -27001 (read error during connect).
const DEFAULT_RETRYABLE_ERRORS: [&str; 2] = ["-908", "-27001"];

/// How many times to try connecting and how long to wait in between.
///
/// Delays are in milliseconds. The delay before attempt `n + 1` is sampled
/// uniformly from `[wait_min, upper_bound(n)]` where
/// `upper_bound(n) = max(wait_min, min(wait_max, multiplier * exp_base^(n-1)))`.
///
/// Deserialises from the `CONNECTION_RETRY` settings object:
///
/// ```
/// use ifx_connection::RetryPolicy;
///
/// let policy: RetryPolicy = serde_json::from_str(r#"{"MAX_ATTEMPTS": 4, "WAIT_MAX": 250}"#).unwrap();
/// assert_eq!(policy.max_attempts(), 4);
/// assert_eq!(policy.wait_min, 0.0);
/// assert_eq!(policy.errors, vec!["-908", "-27001"]);
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    #[serde(rename = "MAX_ATTEMPTS")]
    max_attempts: u32,
    #[serde(rename = "WAIT_MIN")]
    pub wait_min: f64,
    #[serde(rename = "WAIT_MAX")]
    pub wait_max: f64,
    #[serde(rename = "WAIT_MULTIPLIER")]
    pub wait_multiplier: f64,
    #[serde(rename = "WAIT_EXP_BASE")]
    pub wait_exp_base: f64,
    /// Native error codes, as they appear between the brackets
    #[serde(rename = "ERRORS")]
    pub errors: Vec<String>,
}

impl RetryPolicy {
    /// A single attempt, no retry
    pub fn new() -> Self {
        Self {
            max_attempts: 1,
            wait_min: 0.0,
            wait_max: 1000.0,
            wait_multiplier: 25.0,
            wait_exp_base: 2.0,
            errors: DEFAULT_RETRYABLE_ERRORS.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// Set the attempt cap. Zero is treated as one.
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    /// Set the delay window in milliseconds
    pub fn with_wait(mut self, wait_min: f64, wait_max: f64) -> Self {
        self.wait_min = wait_min;
        self.wait_max = wait_max;
        self
    }

    pub fn with_growth(mut self, multiplier: f64, exp_base: f64) -> Self {
        self.wait_multiplier = multiplier;
        self.wait_exp_base = exp_base;
        self
    }

    /// Replace the retryable error codes
    pub fn with_errors<I, S>(mut self, errors: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.errors = errors.into_iter().map(Into::into).collect();
        self
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts.max(1)
    }

    /// Regex matching any configured code inside round brackets, e.g.
    /// `\((-908|-27001)\)`. `None` when no codes are configured.
    pub fn retryable_matcher(&self) -> Option<Regex> {
        if self.errors.is_empty() {
            return None;
        }
        let alternatives = self
            .errors
            .iter()
            .map(|code| regex::escape(code))
            .collect::<Vec<_>>()
            .join("|");
        Regex::new(&format!(r"\(({alternatives})\)")).ok()
    }

    /// Upper end of the delay window after failed attempt `attempt` (1-based), in ms
    pub fn upper_bound(&self, attempt: u32) -> f64 {
        let exponent = attempt.saturating_sub(1).min(i32::MAX as u32) as i32;
        let grown = self.wait_multiplier * self.wait_exp_base.powi(exponent);
        let min = self.floor();
        min.max(self.wait_max.min(grown))
    }

    /// `wait_min`, never negative
    fn floor(&self) -> f64 {
        self.wait_min.max(0.0)
    }

    /// Sample the delay after failed attempt `attempt`
    pub fn delay(&self, attempt: u32, jitter: &mut dyn Jitter) -> Duration {
        let low = self.floor();
        let high = self.upper_bound(attempt);
        let wait_ms = jitter.sample(low, high).clamp(low, high);
        Duration::from_nanos((wait_ms * 1_000_000.0).round() as u64)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new()
    }
}
