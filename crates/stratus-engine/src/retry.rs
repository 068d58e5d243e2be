//! Retry policy for file transfers.
//!
//! Transient errors back off exponentially with jitter. Quota exhaustion
//! backs off aggressively and gets a single long-delay retry. Permission,
//! argument, and not-found errors never retry.

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use stratus_providers::AdapterErrorKind;

/// Backoff configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Total attempts per file, including the first.
    pub max_attempts: u32,

    pub initial_delay_ms: u64,

    pub multiplier: f64,

    pub max_delay_ms: u64,

    /// Randomize delays to avoid thundering herds.
    pub jitter: bool,

    /// The one long delay granted after quota exhaustion.
    pub quota_delay_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay_ms: 200,
            multiplier: 2.0,
            max_delay_ms: 30_000,
            jitter: true,
            quota_delay_ms: 10_000,
        }
    }
}

impl RetryPolicy {
    /// Delay before the next attempt, or `None` when the error class or the
    /// attempt limit forbids another try. `attempts` counts attempts already
    /// made.
    pub fn next_delay(&self, attempts: u32, kind: AdapterErrorKind) -> Option<Duration> {
        match kind {
            AdapterErrorKind::Transient => {
                if attempts >= self.max_attempts {
                    return None;
                }
                let exp = self.initial_delay_ms as f64
                    * self.multiplier.powi(attempts.saturating_sub(1) as i32);
                let capped = exp.min(self.max_delay_ms as f64);
                let delayed = if self.jitter {
                    // Jitter in [0.5, 1.5) of the computed delay.
                    capped * (0.5 + rand::thread_rng().gen::<f64>())
                } else {
                    capped
                };
                Some(Duration::from_millis(delayed as u64))
            }
            // One retry after a long pause; further quota errors are final.
            AdapterErrorKind::QuotaExceeded => {
                if attempts == 1 && self.max_attempts > 1 {
                    Some(Duration::from_millis(self.quota_delay_ms))
                } else {
                    None
                }
            }
            _ => None,
        }
    }
}
