//! Retry configuration shared by producers and consumers.

use std::time::Duration;

/// Retry policy configuration.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Maximum retries for transient errors
    pub max_transient_retries: u32,

    /// Maximum retries for rate limited errors
    pub max_rate_limit_retries: u32,

    /// Backoff strategy
    pub backoff: BackoffStrategy,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_transient_retries: 3,
            max_rate_limit_retries: 5,
            backoff: BackoffStrategy::Exponential {
                base: Duration::from_secs(1),
                max: Duration::from_secs(30),
            },
        }
    }
}

impl RetryPolicy {
    /// A policy that never retries.
    pub fn none() -> Self {
        Self {
            max_transient_retries: 0,
            max_rate_limit_retries: 0,
            ..Default::default()
        }
    }

    pub fn with_max_transient_retries(mut self, retries: u32) -> Self {
        self.max_transient_retries = retries;
        self
    }

    pub fn with_backoff(mut self, backoff: BackoffStrategy) -> Self {
        self.backoff = backoff;
        self
    }
}

/// Backoff strategy for retries.
#[derive(Debug, Clone)]
pub enum BackoffStrategy {
    /// Fixed delay between retries
    Fixed(Duration),

    /// Exponential backoff (base * 2^retry_count, capped at max)
    Exponential { base: Duration, max: Duration },
}

impl BackoffStrategy {
    /// Calculate the delay for a given retry count.
    pub fn delay(&self, retry_count: u32) -> Duration {
        match self {
            BackoffStrategy::Fixed(d) => *d,
            BackoffStrategy::Exponential { base, max } => {
                let delay = base.saturating_mul(2u32.saturating_pow(retry_count));
                delay.min(*max)
            }
        }
    }
}
