//! Exponential backoff with jitter. Only `SignalError::Transient` is
//! retried; every other variant is returned to the caller on first sight.

use rand::Rng;
use signal_core::SignalError;
use std::future::Future;
use std::time::Duration;

const MAX_ATTEMPTS: u32 = 3;
const INITIAL_DELAY_MS: u64 = 500;
const MAX_DELAY: Duration = Duration::from_secs(8);

pub async fn with_retry<T, F, Fut>(mut op: F) -> Result<T, SignalError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, SignalError>>,
{
    let mut attempt = 0;
    loop {
        attempt += 1;
        match op().await {
            Ok(value) => return Ok(value),
            Err(err) if err.is_retryable() && attempt < MAX_ATTEMPTS => {
                let delay = backoff_delay(attempt);
                tracing::debug!(attempt, ?delay, "retrying after transient error: {err}");
                tokio::time::sleep(delay).await;
            }
            Err(err) => return Err(err),
        }
    }
}

fn backoff_delay(attempt: u32) -> Duration {
    let base_ms = INITIAL_DELAY_MS * 2u64.pow(attempt.saturating_sub(1));
    let jittered_ms = rand::thread_rng().gen_range(INITIAL_DELAY_MS..=base_ms.max(INITIAL_DELAY_MS));
    Duration::from_millis(jittered_ms).min(MAX_DELAY)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test]
    async fn succeeds_without_retry() {
        let result = with_retry(|| async { Ok::<_, SignalError>(1) }).await;
        assert_eq!(result.unwrap(), 1);
    }

    #[tokio::test]
    async fn retries_transient_then_succeeds() {
        let calls = AtomicU32::new(0);
        let result = with_retry(|| async {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            if n < 2 {
                Err(SignalError::Transient("flaky".into()))
            } else {
                Ok(99)
            }
        })
        .await;
        assert_eq!(result.unwrap(), 99);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn gives_up_non_retryable_immediately() {
        let calls = AtomicU32::new(0);
        let result: Result<(), SignalError> = with_retry(|| async {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(SignalError::BadInput("nope".into()))
        })
        .await;
        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn exhausts_attempts_on_persistent_transient() {
        let calls = AtomicU32::new(0);
        let result: Result<(), SignalError> = with_retry(|| async {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(SignalError::Transient("down".into()))
        })
        .await;
        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), MAX_ATTEMPTS);
    }
}
