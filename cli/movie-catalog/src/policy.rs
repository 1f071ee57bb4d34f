//! Request policy applied to every catalog call.

use std::future::Future;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, trace};

use crate::error::CatalogClientError;

/// Verbosity of the per-request log line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestLogging {
    /// Only `trace` level events.
    #[default]
    None,
    /// One `info` event per attempt with the operation, outcome and duration.
    Basic,
}

/// Retries a failed request once if the catalog was rate limiting or failing.
///
/// There is no backoff: the second attempt is made after a fixed delay,
/// and its outcome is returned as is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 1,
            delay: Duration::from_millis(500),
        }
    }
}

impl RetryPolicy {
    /// A policy that never retries.
    pub fn never() -> Self {
        Self {
            max_retries: 0,
            delay: Duration::ZERO,
        }
    }

    /// Run `attempt` until it succeeds, fails with a non retryable error,
    /// or the retry budget is used up.
    ///
    /// `attempt` receives the 1-based attempt number.
    pub async fn run<T, F, Fut>(&self, mut attempt: F) -> Result<T, CatalogClientError>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, CatalogClientError>>,
    {
        let mut attempt_number = 1;
        loop {
            match attempt(attempt_number).await {
                Err(e) if e.is_retryable() && attempt_number <= self.max_retries => {
                    debug!(
                        attempt = attempt_number,
                        delay_ms = self.delay.as_millis() as u64,
                        error = %e,
                        "retrying request"
                    );
                    tokio::time::sleep(self.delay).await;
                    attempt_number += 1;
                },
                result => return result,
            }
        }
    }
}

impl RequestLogging {
    /// Log the outcome of a single attempt.
    pub(crate) fn log_attempt<T>(
        &self,
        operation: &str,
        attempt: u32,
        started: Instant,
        result: &Result<T, CatalogClientError>,
    ) {
        let elapsed_ms = started.elapsed().as_millis() as u64;
        let outcome = match result {
            Ok(_) => "ok".to_string(),
            Err(CatalogClientError::HttpStatus { code, .. }) => code.to_string(),
            Err(e) => e.to_string(),
        };
        match self {
            RequestLogging::None => {
                trace!(operation, attempt, %outcome, elapsed_ms, "catalog request");
            },
            RequestLogging::Basic => {
                info!(operation, attempt, %outcome, elapsed_ms, "catalog request");
            },
        }
    }
}
