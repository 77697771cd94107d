//! Retry logic with exponential backoff.
//!
//! Wraps the `backon` crate. Applied only to read-only ledger calls, which
//! are side-effect free and therefore safe to repeat; state-changing calls
//! go out exactly once.

use std::future::Future;

use backon::{ExponentialBuilder, Retryable};

use result_registry_types::{RegistryError, Result};

use crate::config::RetryPolicy;

/// Executes an async operation with retry under the given policy.
///
/// Retries only while the error is classified retryable by
/// [`RegistryError::is_retryable`]; permanent errors are returned
/// immediately. When attempts are exhausted the last error is returned
/// unchanged (for read-only calls this is `LedgerUnavailable`).
pub async fn with_retry<F, Fut, T>(policy: &RetryPolicy, operation: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    // backon's max_times counts retries, not total attempts.
    let max_retries = policy.max_attempts.saturating_sub(1) as usize;

    let backoff = ExponentialBuilder::new()
        .with_min_delay(policy.initial_backoff)
        .with_max_delay(policy.max_backoff)
        .with_factor(policy.multiplier as f32)
        .with_max_times(max_retries)
        .with_jitter();

    operation
        .retry(backoff)
        .sleep(tokio::time::sleep)
        .when(|e: &RegistryError| e.is_retryable())
        .notify(|err: &RegistryError, dur: std::time::Duration| {
            tracing::debug!(
                backoff_ms = dur.as_millis() as u64,
                error = %err,
                "retrying read-only call after backoff"
            );
        })
        .await
}
