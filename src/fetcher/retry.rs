// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Bounded retry with exponential backoff

use std::time::Duration;

/// What to do after a failed attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Sleep, then run the next attempt
    Retry { attempt: u32, backoff: Duration },
    /// Budget spent
    Exhausted { attempts: u32 },
}

/// Attempt counter for `retries + 1` total attempts.
///
/// Independent of any async runtime: the caller does the sleeping.
#[derive(Debug, Clone)]
pub struct RetryState {
    attempt: u32,
    retries: u32,
    base: Duration,
    failures: u32,
    total_backoff: Duration,
}

impl RetryState {
    pub fn new(retries: u32, base: Duration) -> Self {
        Self {
            attempt: 0,
            retries,
            base,
            failures: 0,
            total_backoff: Duration::ZERO,
        }
    }

    /// Zero-based index of the current attempt
    pub fn attempt(&self) -> u32 {
        self.attempt
    }

    pub fn total_attempts(&self) -> u32 {
        self.retries + 1
    }

    pub fn failures(&self) -> u32 {
        self.failures
    }

    /// Sum of backoff handed out so far
    pub fn total_backoff(&self) -> Duration {
        self.total_backoff
    }

    /// Backoff after failed attempt `attempt`: `base * 2^attempt`
    pub fn backoff_for(&self, attempt: u32) -> Duration {
        self.base.saturating_mul(2u32.saturating_pow(attempt))
    }

    /// Record a failure of the current attempt
    pub fn record_failure(&mut self) -> RetryDecision {
        self.failures += 1;
        if self.attempt >= self.retries {
            return RetryDecision::Exhausted {
                attempts: self.attempt + 1,
            };
        }

        let backoff = self.backoff_for(self.attempt);
        self.total_backoff += backoff;
        self.attempt += 1;
        RetryDecision::Retry {
            attempt: self.attempt,
            backoff,
        }
    }
}
