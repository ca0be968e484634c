//! Bounded retry with a fixed delay
//!
//! Wraps a whole per-locale operation. Only upstream failures
//! ([`Error::is_retryable`]) are retried; anything else is returned on the spot.

use log::{error, info, warn};
use std::thread;
use std::time::Duration;

use crate::config::Config;
use crate::error::{Error, Result};

/// Attempt budget and wait between attempts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one
    pub max_attempts: u32,

    /// Fixed wait after each failed attempt
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            delay: Duration::from_secs(10),
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts,
            delay,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.max_attempts, config.retry_delay())
    }
}

/// Run `operation` until it succeeds, fails terminally, or the attempts run out
///
/// On exhaustion the error of the last attempt is returned. A policy with zero
/// attempts yields [`Error::NoAttempts`].
pub fn run_with_retry<T, F>(policy: &RetryPolicy, label: &str, mut operation: F) -> Result<T>
where
    F: FnMut() -> Result<T>,
{
    let mut last_error = None;

    for attempt in 1..=policy.max_attempts {
        match operation() {
            Ok(value) => {
                if attempt > 1 {
                    info!(
                        "{}: attempt {}/{} succeeded",
                        label, attempt, policy.max_attempts
                    );
                }
                return Ok(value);
            }
            Err(e) if !e.is_retryable() => return Err(e),
            Err(e) => {
                if attempt < policy.max_attempts {
                    warn!(
                        "{}: attempt {}/{} failed: {}. Retrying in {} seconds...",
                        label,
                        attempt,
                        policy.max_attempts,
                        e,
                        policy.delay.as_secs()
                    );
                    if !policy.delay.is_zero() {
                        thread::sleep(policy.delay);
                    }
                } else {
                    error!("{}: all {} attempts failed", label, policy.max_attempts);
                }
                last_error = Some(e);
            }
        }
    }

    Err(last_error.unwrap_or(Error::NoAttempts))
}
