// src/error_recovery.rs
//! Retry delays and a bounded retry loop for source requests.

use crate::algebras::FetchError;
use crate::constants::{BACKOFF_JITTER_MS, BACKOFF_MAX_DELAY_MS, BACKOFF_TABLE_MS};
use rand::Rng;
use std::time::Duration;

/// How long to wait before re-issuing a request.
///
/// Delays come from a fixed table indexed by attempt (the last entry repeats
/// once the table runs out), plus a random jitter, never exceeding the cap.
#[derive(Debug, Clone, PartialEq)]
pub struct BackoffPolicy {
    table: Vec<Duration>,
    jitter: Duration,
    max_delay: Duration,
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self::standard()
    }
}

impl BackoffPolicy {
    /// 1s, 2s, 4s, 8s, 16s with up to 1s of jitter, capped at 30s.
    pub fn standard() -> Self {
        Self {
            table: BACKOFF_TABLE_MS
                .iter()
                .map(|ms| Duration::from_millis(*ms))
                .collect(),
            jitter: Duration::from_millis(BACKOFF_JITTER_MS),
            max_delay: Duration::from_millis(BACKOFF_MAX_DELAY_MS),
        }
    }

    /// Never waits. Used for listing retries and in tests.
    pub fn immediate() -> Self {
        Self {
            table: Vec::new(),
            jitter: Duration::ZERO,
            max_delay: Duration::ZERO,
        }
    }

    /// A policy with a custom table and no jitter.
    pub fn fixed(table: Vec<Duration>, max_delay: Duration) -> Self {
        Self {
            table,
            jitter: Duration::ZERO,
            max_delay,
        }
    }

    pub fn max_delay(&self) -> Duration {
        self.max_delay
    }

    /// Delay before retry number `attempt` (1-based).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let index = attempt.saturating_sub(1) as usize;
        let Some(base) = self.table.get(index).or_else(|| self.table.last()) else {
            return Duration::ZERO;
        };
        (*base + self.random_jitter()).min(self.max_delay)
    }

    /// Delay after a 429: the server's hint when it gave one, otherwise the table.
    pub fn rate_limit_delay(&self, retry_after: Option<Duration>, attempt: u32) -> Duration {
        match retry_after {
            Some(hint) => hint.min(self.max_delay),
            None => self.delay_for(attempt),
        }
    }

    fn random_jitter(&self) -> Duration {
        let jitter_ms = self.jitter.as_millis() as u64;
        if jitter_ms == 0 {
            return Duration::ZERO;
        }
        Duration::from_millis(rand::rng().random_range(0..=jitter_ms))
    }
}

/// Retries an async source operation on the same input.
///
/// The first attempt plus up to `max_retries` retries are made; after that
/// the last error is wrapped in [`FetchError::Permanent`].
pub async fn retry_with_backoff<F, T, Fut>(
    mut operation: F,
    max_retries: u32,
    policy: &BackoffPolicy,
) -> Result<T, FetchError>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T, FetchError>>,
{
    let mut retries = 0;

    loop {
        match operation().await {
            Ok(result) => return Ok(result),
            Err(e) if !e.is_transient() => return Err(e),
            Err(e) => {
                if retries >= max_retries {
                    return Err(FetchError::exhausted(retries + 1, e));
                }
                retries += 1;
                let delay = policy.delay_for(retries);
                log::warn!(
                    "Attempt {} failed ({}), retrying after {:?}",
                    retries,
                    e,
                    delay
                );
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }
}
