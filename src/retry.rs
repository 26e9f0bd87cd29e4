//! Unbounded exponential backoff for batch deletes
//!
//! A failed delete is retried until it succeeds. The delay starts at the
//! configured initial backoff and doubles after every failure with no cap, so
//! a persistent failure (revoked credentials, for instance) keeps the run
//! waiting instead of skipping messages.

use async_trait::async_trait;
use chrono::Local;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use crate::deleter::DeletionObserver;
use crate::error::Result;

/// Default delay before the first retry
pub const DEFAULT_INITIAL_BACKOFF: Duration = Duration::from_millis(1000);

/// Something that can pause the retry loop
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

/// Sleeper backed by the tokio timer
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

#[async_trait]
impl<T: Sleeper + ?Sized> Sleeper for Arc<T> {
    async fn sleep(&self, duration: Duration) {
        (**self).sleep(duration).await;
    }
}

/// Retry policy for delete calls
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub initial_backoff: Duration,
}

impl RetryPolicy {
    pub fn new(initial_backoff: Duration) -> Self {
        Self { initial_backoff }
    }

    pub fn backoff(&self) -> Backoff {
        Backoff {
            next: self.initial_backoff,
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_INITIAL_BACKOFF)
    }
}

/// Doubling delay sequence
///
/// Saturates at `Duration::MAX` instead of overflowing.
#[derive(Debug, Clone)]
pub struct Backoff {
    next: Duration,
}

impl Backoff {
    /// Delay to wait now; the following call returns twice as much
    pub fn next_delay(&mut self) -> Duration {
        let current = self.next;
        self.next = current.checked_mul(2).unwrap_or(Duration::MAX);
        current
    }
}

impl Iterator for Backoff {
    type Item = Duration;

    fn next(&mut self) -> Option<Duration> {
        Some(self.next_delay())
    }
}

/// Run `operation` until it succeeds, sleeping with exponential backoff between attempts
///
/// Every failure is reported to the observer (sanitized, with a local
/// timestamp) before sleeping. Returns the number of failed attempts.
pub async fn retry_until_success<F, Fut, S, O>(
    policy: &RetryPolicy,
    sleeper: &S,
    observer: &O,
    operation_name: &str,
    mut operation: F,
) -> u32
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<()>>,
    S: Sleeper + ?Sized,
    O: DeletionObserver + ?Sized,
{
    let mut backoff = policy.backoff();
    let mut failures: u32 = 0;

    loop {
        match operation().await {
            Ok(()) => return failures,
            Err(e) => {
                failures = failures.saturating_add(1);
                let delay = backoff.next_delay();
                let message = sanitize_message(&e.to_string());

                warn!(
                    "{} failed (attempt {}): {}. Retrying in {:?}...",
                    operation_name, failures, message, delay
                );
                if !e.is_transient() {
                    debug!("{} error is not transient, retrying anyway", operation_name);
                }
                observer.on_retryable_error(&message, Local::now());

                sleeper.sleep(delay).await;
            }
        }
    }
}

/// Strip control characters and console markup brackets from an error message
pub fn sanitize_message(message: &str) -> String {
    message
        .chars()
        .filter(|c| !c.is_control())
        .map(|c| match c {
            '[' | ']' => ' ',
            other => other,
        })
        .collect()
}
