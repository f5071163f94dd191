// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Retry policy port for transient storage failures

use crate::repository::RepositoryError;
use async_trait::async_trait;
use std::future::Future;
use std::time::Duration;

/// Runs a storage operation, retrying transient failures
#[async_trait]
pub trait RetryPolicy: Clone + Send + Sync + 'static {
    /// Run `operation` until it succeeds, fails non-transiently, or the
    /// policy gives up; the last error is returned.
    async fn execute<T, F, Fut>(&self, operation: F) -> Result<T, RepositoryError>
    where
        T: Send,
        F: Fn() -> Fut + Send + Sync,
        Fut: Future<Output = Result<T, RepositoryError>> + Send;
}

/// Exponential backoff with a cap on attempts and delay
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BackoffRetry {
    /// Total attempts including the first
    pub max_attempts: u32,
    pub initial_delay: Duration,
    pub max_delay: Duration,
}

impl Default for BackoffRetry {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            initial_delay: Duration::from_millis(50),
            max_delay: Duration::from_secs(2),
        }
    }
}

impl BackoffRetry {
    pub fn new(max_attempts: u32, initial_delay: Duration, max_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            initial_delay,
            max_delay,
        }
    }

    /// Delay before retry number `retry` (1-based)
    pub fn delay_for(&self, retry: u32) -> Duration {
        let factor = 2u32.saturating_pow(retry.saturating_sub(1));
        self.initial_delay
            .saturating_mul(factor)
            .min(self.max_delay)
    }
}

#[async_trait]
impl RetryPolicy for BackoffRetry {
    async fn execute<T, F, Fut>(&self, operation: F) -> Result<T, RepositoryError>
    where
        T: Send,
        F: Fn() -> Fut + Send + Sync,
        Fut: Future<Output = Result<T, RepositoryError>> + Send,
    {
        let mut attempt = 1;
        loop {
            match operation().await {
                Ok(value) => return Ok(value),
                Err(e) if e.is_transient() && attempt < self.max_attempts => {
                    let delay = self.delay_for(attempt);
                    tracing::warn!(
                        attempt,
                        max_attempts = self.max_attempts,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "transient storage failure, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

/// Policy that runs every operation exactly once
#[derive(Clone, Copy, Debug, Default)]
pub struct NoRetry;

#[async_trait]
impl RetryPolicy for NoRetry {
    async fn execute<T, F, Fut>(&self, operation: F) -> Result<T, RepositoryError>
    where
        T: Send,
        F: Fn() -> Fut + Send + Sync,
        Fut: Future<Output = Result<T, RepositoryError>> + Send,
    {
        operation().await
    }
}

#[cfg(test)]
#[path = "retry_tests.rs"]
mod tests;
