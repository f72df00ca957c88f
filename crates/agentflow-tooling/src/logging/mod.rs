//! Structured logging helpers built on `tracing`.

use std::future::Future;
use std::time::Instant;
use tracing::{debug, error, info, warn};

/// Log level used by [`timed_with_level`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// `tracing::debug!`
    Debug,
    /// `tracing::info!`
    Info,
    /// `tracing::warn!`
    Warn,
    /// `tracing::error!`
    Error,
}

/// Run `future`, logging start/elapsed at debug level.
pub async fn timed<F, T>(name: &str, future: F) -> T
where
    F: Future<Output = T>,
{
    timed_with_level(name, LogLevel::Debug, future).await
}

/// Run `future`, logging start/elapsed at the given level.
pub async fn timed_with_level<F, T>(name: &str, level: LogLevel, future: F) -> T
where
    F: Future<Output = T>,
{
    let start = Instant::now();
    log_at(level, &format!("starting: {name}"));

    let result = future.await;

    let elapsed = start.elapsed();
    log_at(level, &format!("completed: {name} in {elapsed:?}"));
    result
}

fn log_at(level: LogLevel, message: &str) {
    match level {
        LogLevel::Debug => debug!("{message}"),
        LogLevel::Info => info!("{message}"),
        LogLevel::Warn => warn!("{message}"),
        LogLevel::Error => error!("{message}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn timed_returns_inner_value() {
        let value = timed("noop", async { 42 }).await;
        assert_eq!(value, 42);
    }
}
