//! Bounded calls to collaborators.
//!
//! Every external call goes through [`CallPolicy::with_timeout`]. Calls whose side effects are idempotent (order
//! creation keyed on the watch, label generation, notifications) may also be retried with
//! [`CallPolicy::with_retry`], which backs off exponentially between attempts.
use std::{fmt::Display, future::Future, time::Duration};

use backoff::{backoff::Backoff, ExponentialBackoff, ExponentialBackoffBuilder};
use log::*;

use crate::traits::{CollaboratorError, StoreError};

/// Errors that can say whether another attempt is worth making.
pub trait RetryableError: Display {
    fn is_transient(&self) -> bool;

    fn timed_out(after: Duration) -> Self;
}

impl RetryableError for CollaboratorError {
    fn is_transient(&self) -> bool {
        CollaboratorError::is_transient(self)
    }

    fn timed_out(after: Duration) -> Self {
        CollaboratorError::Timeout(after)
    }
}

impl RetryableError for StoreError {
    fn is_transient(&self) -> bool {
        matches!(self, StoreError::Backend(_))
    }

    fn timed_out(after: Duration) -> Self {
        StoreError::Backend(format!("storage call timed out after {after:?}"))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallPolicy {
    pub call_timeout: Duration,
    pub max_attempts: u32,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
}

impl Default for CallPolicy {
    fn default() -> Self {
        Self {
            call_timeout: Duration::from_secs(5),
            max_attempts: 3,
            initial_backoff: Duration::from_millis(100),
            max_backoff: Duration::from_secs(2),
        }
    }
}

impl CallPolicy {
    pub fn with_call_timeout(mut self, call_timeout: Duration) -> Self {
        self.call_timeout = call_timeout;
        self
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    fn backoff(&self) -> ExponentialBackoff {
        ExponentialBackoffBuilder::new()
            .with_initial_interval(self.initial_backoff)
            .with_max_interval(self.max_backoff)
            .with_max_elapsed_time(None)
            .build()
    }

    /// Runs `fut` once, giving up after `call_timeout`. Dropping the timed-out future cancels the call.
    pub async fn with_timeout<T, E, F>(&self, fut: F) -> Result<T, E>
    where
        E: RetryableError,
        F: Future<Output = Result<T, E>>,
    {
        match tokio::time::timeout(self.call_timeout, fut).await {
            Ok(result) => result,
            Err(_) => Err(E::timed_out(self.call_timeout)),
        }
    }

    /// Runs `op` up to `max_attempts` times, each bounded by `call_timeout`. Non-transient errors are returned
    /// immediately.
    pub async fn with_retry<T, E, F, Fut>(&self, what: &str, mut op: F) -> Result<T, E>
    where
        E: RetryableError,
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let mut backoff = self.backoff();
        let mut attempts = 0;
        loop {
            match self.with_timeout(op()).await {
                Ok(result) => return Ok(result),
                Err(e) => {
                    attempts += 1;
                    if !e.is_transient() {
                        debug!("{what} failed permanently on attempt {attempts}: {e}");
                        return Err(e);
                    }
                    if attempts >= self.max_attempts {
                        warn!("{what} failed after {attempts} attempts, giving up: {e}");
                        return Err(e);
                    }
                    match backoff.next_backoff() {
                        Some(delay) => {
                            debug!("{what} failed, attempt {attempts}/{}, retrying in {delay:?}: {e}", self.max_attempts);
                            tokio::time::sleep(delay).await;
                        },
                        None => {
                            warn!("{what} failed, backoff exhausted after {attempts} attempts: {e}");
                            return Err(e);
                        },
                    }
                },
            }
        }
    }
}
