use crate::config::{CallConfig, RetryConfig};
use crate::error::CallError;
use std::future::Future;
use std::time::Duration;
use tokio::time::{sleep, timeout};
use tracing::warn;

/// Execute an async operation with jittered exponential backoff
pub async fn retry_with_backoff<F, Fut, T, E>(
    config: &RetryConfig,
    mut operation: F,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
{
    let mut attempts = 0;
    let mut backoff_ms = config.backoff_base_ms;

    loop {
        attempts += 1;

        match operation().await {
            Ok(result) => return Ok(result),
            Err(e) if attempts >= config.max_attempts => {
                warn!("All {} attempts failed: {}", attempts, e);
                return Err(e);
            }
            Err(e) => {
                // Jittered backoff: base * 2^attempt + random(0..base)
                let jitter = if config.backoff_base_ms > 0 {
                    rand::random::<u64>() % config.backoff_base_ms
                } else {
                    0
                };
                let delay = Duration::from_millis(backoff_ms + jitter);

                warn!(
                    "Attempt {} failed: {}. Retrying in {:?}...",
                    attempts, e, delay
                );

                sleep(delay).await;
                backoff_ms = backoff_ms.saturating_mul(2);
            }
        }
    }
}

/// Run one capability call under a per-attempt deadline, retrying per config
pub async fn guarded_call<F, Fut, T, E>(
    config: &CallConfig,
    mut operation: F,
) -> Result<T, CallError<E>>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::error::Error + 'static,
{
    let limit = Duration::from_millis(config.timeout_ms);
    retry_with_backoff(&config.retry, || {
        let attempt = operation();
        async move {
            match timeout(limit, attempt).await {
                Ok(Ok(value)) => Ok(value),
                Ok(Err(e)) => Err(CallError::Failed(e)),
                Err(_) => Err(CallError::Timeout(limit)),
            }
        }
    })
    .await
}
