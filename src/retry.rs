//! Fixed-budget, fixed-backoff retry combinator.
//!
//! The crawl retries at two levels: a single HTTP retrieval (retry on 404
//! only) and a whole index page (retry on any failure). Both go through
//! [`FixedRetry::run`], which takes the operation plus a classifier that maps
//! each error to a [`Verdict`].
//!
//! # Retry Strategy
//!
//! - A budget of attempts, reset on every call (3 by default)
//! - A constant delay between attempts (1 second by default)
//! - No delay after the final attempt
//! - [`CrawlError::RetryExhausted`] once the budget is spent

use crate::error::{CrawlError, Result};
use std::fmt;
use std::future::Future;
use std::time::{Duration, Instant};
use tokio::time::sleep;
use tracing::{error, warn};

/// What to do with a failed attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// Sleep the backoff and try again, budget permitting.
    Retry,
    /// Give up now and hand the error to the caller.
    Fatal,
}

/// Classifier for the HTTP level: only a 404 earns another attempt.
pub fn retry_not_found(e: &CrawlError) -> Verdict {
    if e.is_retryable() {
        Verdict::Retry
    } else {
        Verdict::Fatal
    }
}

/// Classifier for the page level: every failure earns another attempt.
pub fn retry_any(_: &CrawlError) -> Verdict {
    Verdict::Retry
}

/// Retry policy with a fixed attempt budget and a constant backoff.
#[derive(Clone, Copy)]
pub struct FixedRetry {
    /// Label used in log lines ("fetch", "page").
    scope: &'static str,
    /// Maximum number of attempts, including the first.
    max_attempts: usize,
    /// Delay between two attempts.
    backoff: Duration,
}

impl FixedRetry {
    pub fn new(scope: &'static str, max_attempts: usize, backoff: Duration) -> Self {
        Self {
            scope,
            max_attempts: max_attempts.max(1),
            backoff,
        }
    }

    pub fn max_attempts(&self) -> usize {
        self.max_attempts
    }

    /// Run `op` until it succeeds, fails fatally, or the budget is spent.
    ///
    /// `op` receives the 1-based attempt number. `classify` decides whether a
    /// failure is retried.
    pub async fn run<T, F, Fut, C>(&self, mut op: F, classify: C) -> Result<T>
    where
        F: FnMut(usize) -> Fut,
        Fut: Future<Output = Result<T>>,
        C: Fn(&CrawlError) -> Verdict,
    {
        let total_t0 = Instant::now();

        for attempt in 1..=self.max_attempts {
            match op(attempt).await {
                Ok(value) => return Ok(value),
                Err(e) => {
                    if classify(&e) == Verdict::Fatal {
                        return Err(e);
                    }
                    warn!(
                        scope = self.scope,
                        attempt,
                        max = self.max_attempts,
                        error = %e,
                        "attempt failed; retrying"
                    );
                    if attempt < self.max_attempts {
                        sleep(self.backoff).await;
                    }
                }
            }
        }

        error!(
            scope = self.scope,
            max = self.max_attempts,
            elapsed_ms_total = total_t0.elapsed().as_millis() as u64,
            "retry budget exhausted"
        );
        Err(CrawlError::RetryExhausted {
            attempts: self.max_attempts,
        })
    }
}

impl fmt::Debug for FixedRetry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FixedRetry")
            .field("scope", &self.scope)
            .field("max_attempts", &self.max_attempts)
            .field("backoff", &self.backoff)
            .finish()
    }
}
