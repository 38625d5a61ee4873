//! Retry loop driven by the classifier
//!
//! The classifier only advises. This module owns the loop: it re-invokes the
//! operation, waits out the classifier's requested delay (or an exponential
//! backoff), and stops on a terminal fault, the operation timeout, the
//! attempt budget, or cancellation.

use backon::BackoffBuilder;
use backon::ExponentialBuilder;
use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::RetryError;
use crate::classifier::RetryClassifier;
use crate::fault::Fault;

/// Bounds and backoff shape for one retried operation.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryConfig {
    /// Retries after the first call. `None` means bounded by time only.
    pub max_attempts: Option<usize>,
    pub initial_backoff_ms: u64,
    pub max_backoff_ms: u64,
    pub backoff_multiplier: f32,
    pub jitter: bool,
    /// Total time budget for the operation, usually the resource timeout.
    pub max_elapsed_ms: Option<u64>,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: None,
            initial_backoff_ms: 500,
            max_backoff_ms: 10_000,
            backoff_multiplier: 2.0,
            jitter: true,
            max_elapsed_ms: Some(5 * 60 * 1000),
        }
    }
}

impl RetryConfig {
    fn backoff(&self) -> ExponentialBuilder {
        let builder = ExponentialBuilder::default()
            .with_min_delay(Duration::from_millis(self.initial_backoff_ms))
            .with_max_delay(Duration::from_millis(self.max_backoff_ms))
            .with_factor(self.backoff_multiplier);
        let builder = match self.max_attempts {
            Some(max) => builder.with_max_times(max),
            None => builder.without_max_times(),
        };
        if self.jitter {
            builder.with_jitter()
        } else {
            builder
        }
    }
}

/// Progress report emitted before each wait.
#[derive(Debug, Clone)]
pub struct RetryStatus {
    /// Attempt that just failed (1-indexed).
    pub attempt: u32,
    pub elapsed: Duration,
    pub sleep: Duration,
    /// Classifier reason for retrying.
    pub reason: String,
    /// True when the wait was requested by the classifier rather than
    /// computed from the backoff.
    pub is_rate_limit: bool,
}

/// Runs `operation` until it succeeds or the classifier, the budget or the
/// cancellation token says stop.
///
/// # Example
/// ```ignore
/// let cancel = CancellationToken::new();
/// let group = execute_with_retry(
///     || groups.get(&name),
///     &RetryClassifier::default(),
///     &RetryConfig::default(),
///     &cancel,
///     |status| tracing::info!("retry {}: {}", status.attempt, status.reason),
/// )
/// .await?;
/// ```
pub async fn execute_with_retry<F, Fut, T, StatusCb>(
    mut operation: F,
    classifier: &RetryClassifier,
    config: &RetryConfig,
    cancel: &CancellationToken,
    mut status_cb: StatusCb,
) -> crate::Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, Fault>>,
    StatusCb: FnMut(RetryStatus),
{
    let start_time = Instant::now();
    let max_elapsed = config.max_elapsed_ms.map(Duration::from_millis);
    let mut backoff = config.backoff().build();
    let mut attempt: u32 = 0;

    loop {
        if cancel.is_cancelled() {
            return Err(RetryError::Aborted);
        }

        attempt = attempt.saturating_add(1);
        let outcome = match max_elapsed {
            Some(max) => {
                let remaining = max.saturating_sub(start_time.elapsed());
                match tokio::time::timeout(remaining, operation()).await {
                    Ok(outcome) => outcome,
                    Err(_) => {
                        let elapsed = start_time.elapsed();
                        return Err(RetryError::Timeout {
                            elapsed,
                            reason: format!("attempt {attempt} still running at the deadline"),
                            last: Fault::network(
                                format!("attempt {attempt} timed out after {elapsed:?}"),
                                false,
                                true,
                            ),
                        });
                    }
                }
            }
            None => operation().await,
        };
        let fault = match outcome {
            Ok(value) => return Ok(value),
            Err(fault) => fault,
        };

        let decision = classifier.classify(&fault);
        if !decision.should_retry {
            tracing::debug!(attempt, "Not retrying: {fault}");
            return Err(RetryError::Permanent(fault));
        }

        let Some(backoff_delay) = backoff.next() else {
            return Err(RetryError::Exhausted {
                attempts: attempt,
                reason: decision.reason,
                last: fault,
            });
        };

        let (sleep, is_rate_limit) = match decision.delay {
            Some(requested) => (requested, true),
            None => (backoff_delay, false),
        };

        // The next attempt must start before the deadline.
        let elapsed = start_time.elapsed();
        if let Some(max) = max_elapsed
            && elapsed.saturating_add(sleep) >= max
        {
            return Err(RetryError::Timeout {
                elapsed,
                reason: decision.reason,
                last: fault,
            });
        }

        tracing::info!(
            attempt,
            ?sleep,
            is_rate_limit,
            "Retrying after error ({}): {fault}",
            decision.reason
        );
        status_cb(RetryStatus {
            attempt,
            elapsed,
            sleep,
            reason: decision.reason,
            is_rate_limit,
        });

        if wait_with_cancel(cancel, sleep).await.is_err() {
            return Err(RetryError::Aborted);
        }
    }
}

async fn wait_with_cancel(cancel: &CancellationToken, duration: Duration) -> Result<(), ()> {
    if duration.is_zero() {
        return Ok(());
    }

    tokio::select! {
        _ = tokio::time::sleep(duration) => Ok(()),
        _ = cancel.cancelled() => Err(()),
    }
}
