//! Bounded retry with exponential backoff for retryable remote failures.
//!
//! Formula: `min(base * multiplier^attempt, max) + jitter`, where the
//! jitter is a deterministic pseudo-random spread derived from the attempt
//! number (avoids a `rand` dependency for a cosmetic stagger).

use std::future::Future;
use std::time::Duration;

use crate::remote::RemoteError;

/// Backoff shape and attempt bound.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total attempts, including the first one.
    pub max_attempts: u32,
    /// Initial backoff in milliseconds.
    pub base_ms: u64,
    /// Backoff cap in milliseconds.
    pub max_ms: u64,
    /// Exponential growth per attempt.
    pub multiplier: f64,
    /// Jitter as a fraction of the computed backoff (0.0–1.0).
    pub jitter_fraction: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_ms: 200,
            max_ms: 5_000,
            multiplier: 2.0,
            jitter_fraction: 0.2,
        }
    }
}

/// Backoff duration before retry number `attempt + 1` (0-indexed).
pub fn backoff_delay(attempt: u32, policy: &RetryPolicy) -> Duration {
    let raw = policy.base_ms as f64 * policy.multiplier.powi(attempt as i32);
    let capped = raw.min(policy.max_ms as f64);
    let jitter = pseudo_rand(attempt) * capped * policy.jitter_fraction;
    Duration::from_millis((capped + jitter).max(0.0) as u64)
}

/// Runs `op` until it succeeds, fails non-retryably, or exhausts the
/// attempt budget. The closure receives the 0-indexed attempt number.
pub async fn with_backoff<T, F, Fut>(policy: &RetryPolicy, mut op: F) -> Result<T, RemoteError>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, RemoteError>>,
{
    let mut attempt = 0;
    loop {
        match op(attempt).await {
            Ok(value) => return Ok(value),
            Err(err) if err.is_retryable() && attempt + 1 < policy.max_attempts => {
                let delay = backoff_delay(attempt, policy);
                tracing::warn!(%err, attempt, ?delay, "retryable remote failure, backing off");
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(err) => return Err(err),
        }
    }
}

/// Maps `attempt` to a float in [-0.5, 0.5) via one LCG step.
fn pseudo_rand(attempt: u32) -> f64 {
    // LCG parameters (Numerical Recipes).
    const A: u64 = 1_664_525;
    const C: u64 = 1_013_904_223;
    const M: u64 = 1u64 << 32;
    let state = A.wrapping_mul(attempt as u64).wrapping_add(C) % M;
    (state as f64 / M as f64) - 0.5
}
