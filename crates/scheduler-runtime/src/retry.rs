//! Retry backoff policy for Agent execution failures (§4.8.1).
//!
//! Unlike an in-process retry loop, a failed execution here is rescheduled:
//! the task goes back to `active` with `next_run_at` pushed out by
//! [`RetryPolicy::delay_for`] and is picked back up by the Poller on a later
//! tick, rather than being retried inline by the Executor.

use chrono::Duration;
use rand::Rng;

/// Delay strategy between retry attempts, keyed by `retry_count` (1-indexed:
/// the delay before the first retry is `delay_for(1)`).
#[derive(Debug, Clone, Copy, serde::Serialize, serde::Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RetryPolicy {
    Fixed {
        delay_ms: u64,
    },
    /// Exponential backoff capped at `max_ms`, factor 2, with uniform jitter
    /// in `[1 - jitter_fraction, 1 + jitter_fraction]` of the capped delay.
    ExponentialBackoff {
        base_ms: u64,
        max_ms: u64,
        jitter_fraction: f64,
    },
}

impl RetryPolicy {
    /// The default per §4.8.1: base 60s, factor 2, cap 1h, ±20% jitter.
    pub fn default_agent_backoff() -> Self {
        Self::ExponentialBackoff {
            base_ms: 60_000,
            max_ms: 3_600_000,
            jitter_fraction: 0.2,
        }
    }

    /// Delay before retry attempt `retry_count` (1 = first retry).
    pub fn delay_for(&self, retry_count: u32) -> Duration {
        let attempt = retry_count.saturating_sub(1);
        let ms = match self {
            RetryPolicy::Fixed { delay_ms } => *delay_ms,
            RetryPolicy::ExponentialBackoff {
                base_ms,
                max_ms,
                jitter_fraction,
            } => {
                let exp = 1u64
                    .checked_shl(attempt)
                    .and_then(|s| base_ms.checked_mul(s))
                    .unwrap_or(*max_ms);
                let capped = exp.min(*max_ms);
                if *jitter_fraction > 0.0 {
                    let lower = (capped as f64 * (1.0 - jitter_fraction)).max(0.0);
                    let upper = (capped as f64 * (1.0 + jitter_fraction)).min(*max_ms as f64);
                    let upper = upper.max(lower);
                    rand::thread_rng().gen_range(lower..=upper).round() as u64
                } else {
                    capped
                }
            }
        };
        Duration::milliseconds(ms as i64)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::default_agent_backoff()
    }
}
