use std::thread;
use std::time::Duration;

use tracing::warn;

use crate::error::Result;

/// Bounded exponential backoff around a fallible step. Only errors reported
/// as retryable are attempted again.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub initial_delay: Duration,
    pub backoff_factor: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_delay: Duration::from_millis(500),
            backoff_factor: 2,
        }
    }
}

impl RetryPolicy {
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            initial_delay: Duration::ZERO,
            backoff_factor: 1,
        }
    }

    pub fn delay_for(&self, retry: u32) -> Duration {
        let factor = self.backoff_factor.max(1).saturating_pow(retry);
        self.initial_delay.saturating_mul(factor)
    }

    pub fn run<T, F>(&self, label: &str, mut op: F) -> Result<T>
    where
        F: FnMut() -> Result<T>,
    {
        let attempts = self.max_retries.saturating_add(1);
        let mut retry = 0;
        loop {
            match op() {
                Ok(value) => return Ok(value),
                Err(err) if err.is_retryable() && retry < self.max_retries => {
                    let delay = self.delay_for(retry);
                    retry += 1;
                    warn!(
                        "{label}: attempt {retry}/{attempts} failed: {err}; retrying in {delay:?}"
                    );
                    if !delay.is_zero() {
                        thread::sleep(delay);
                    }
                }
                Err(err) => return Err(err),
            }
        }
    }
}
