//! Per-call cancellation and deadline context
//!
//! Every transport operation receives a [`RequestContext`]. Racing the
//! network future against the context means a cancelled caller abandons the
//! in-flight request and issues nothing further.

use std::future::Future;
use std::time::Duration;

use storectl_domain::{ApiError, Result};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Cancellation token plus optional deadline
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    token: CancellationToken,
    deadline: Option<Instant>,
    timeout: Option<Duration>,
}

impl RequestContext {
    /// Context that is never cancelled and has no deadline
    pub fn background() -> Self {
        Self::default()
    }

    /// Context driven by an existing cancellation token
    pub fn with_token(token: CancellationToken) -> Self {
        Self { token, ..Self::default() }
    }

    /// Set the deadline to `timeout` from now
    ///
    /// A timeout too large to represent as an instant leaves the context
    /// without a deadline.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        if let Some(deadline) = Instant::now().checked_add(timeout) {
            self.deadline = Some(deadline);
            self.timeout = Some(timeout);
        }
        self
    }

    #[must_use]
    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.timeout = Some(deadline.saturating_duration_since(Instant::now()));
        self.deadline = Some(deadline);
        self
    }

    /// Derive a context cancelled together with this one
    ///
    /// Cancelling the child does not cancel the parent.
    pub fn child(&self) -> Self {
        Self { token: self.token.child_token(), deadline: self.deadline, timeout: self.timeout }
    }

    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled() || self.deadline.is_some_and(|d| Instant::now() >= d)
    }

    /// Fail if the context is already cancelled or past its deadline
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Cancelled` or `ApiError::Timeout`.
    pub fn check(&self) -> Result<()> {
        if self.token.is_cancelled() {
            return Err(ApiError::Cancelled);
        }
        if self.deadline.is_some_and(|d| Instant::now() >= d) {
            return Err(self.timeout_error());
        }
        Ok(())
    }

    /// Drive `fut` to completion unless the context ends first
    ///
    /// A context that has already ended returns immediately without
    /// polling `fut`.
    ///
    /// # Errors
    ///
    /// Returns the error of `fut`, or `ApiError::Cancelled` /
    /// `ApiError::Timeout` if the context wins the race.
    pub async fn run<T, F>(&self, fut: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        self.check()?;

        match self.deadline {
            Some(deadline) => tokio::select! {
                biased;
                () = self.token.cancelled() => Err(ApiError::Cancelled),
                () = tokio::time::sleep_until(deadline) => Err(self.timeout_error()),
                result = fut => result,
            },
            None => tokio::select! {
                biased;
                () = self.token.cancelled() => Err(ApiError::Cancelled),
                result = fut => result,
            },
        }
    }

    fn timeout_error(&self) -> ApiError {
        ApiError::Timeout(self.timeout.unwrap_or_default())
    }
}
