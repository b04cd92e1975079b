//! Bounded retry decision for vendor requests
//!
//! The decision is a pure function of the attempt index, the configured
//! bound and the failure that just happened. The executor owns the side
//! effects (discarding the token, sleeping, re-sending).

use crate::error::RingoError;
use std::time::Duration;

/// What the executor should do after a failed attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Send the request again
    Retry {
        /// Discard the current token first so the next attempt reauthenticates
        reauthenticate: bool,
        /// Pause before the next attempt
        delay: Duration,
    },
    /// Give up and surface the failure
    Stop,
}

/// Retry policy configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries beyond the first attempt
    pub max_retries: u32,
    /// Linear backoff unit; retry `n` waits `n * backoff`
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 2,
            backoff: Duration::ZERO,
        }
    }
}

impl RetryPolicy {
    /// Create a policy with the given bound and no backoff
    pub fn new(max_retries: u32) -> Self {
        Self {
            max_retries,
            ..Default::default()
        }
    }

    /// Set the linear backoff unit
    pub fn with_backoff(mut self, backoff: Duration) -> Self {
        self.backoff = backoff;
        self
    }

    /// Total attempts including the first one
    pub fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }

    /// Decide what follows the failure of attempt `attempt` (0-based)
    pub fn decide(&self, attempt: u32, error: &RingoError) -> RetryDecision {
        if !error.is_retryable() || attempt >= self.max_retries {
            return RetryDecision::Stop;
        }

        RetryDecision::Retry {
            reauthenticate: matches!(error, RingoError::TokenExpired(_)),
            delay: self.delay_for(attempt + 1),
        }
    }

    /// Delay before retry number `retry` (1-based)
    pub fn delay_for(&self, retry: u32) -> Duration {
        self.backoff.saturating_mul(retry)
    }
}
