//! Timeout wrapper around `tokio::time::timeout` with a crate-local error.

use std::future::Future;
use std::time::Duration;
use thiserror::Error;

/// Raised when a future does not complete within the allotted duration.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("operation timed out after {0:?}")]
pub struct Elapsed(pub Duration);

/// Run `future`, failing with [`Elapsed`] if it does not complete within
/// `duration`.
pub async fn with_timeout<F, T>(duration: Duration, future: F) -> Result<T, Elapsed>
where
    F: Future<Output = T>,
{
    tokio::time::timeout(duration, future)
        .await
        .map_err(|_| Elapsed(duration))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn completes_within_budget() {
        let result = with_timeout(Duration::from_millis(50), async { 1 + 1 }).await;
        assert_eq!(result, Ok(2));
    }

    #[tokio::test(start_paused = true)]
    async fn times_out_when_too_slow() {
        let result = with_timeout(Duration::from_millis(10), async {
            tokio::time::sleep(Duration::from_secs(1)).await;
            1
        })
        .await;
        assert!(result.is_err());
    }
}
