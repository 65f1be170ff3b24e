//! Operation control: cancellation and deadlines
//!
//! Every blocking point in the store and the scanner consults an
//! `OpControl` so that no operation waits indefinitely.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use super::errors::{StoreError, StoreResult};

/// A cloneable cancellation flag shared between a caller and an operation.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests cancellation. Idempotent.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// Cancellation token and deadline for one operation.
#[derive(Debug, Clone, Default)]
pub struct OpControl {
    cancel: Option<CancellationToken>,
    deadline: Option<Instant>,
}

impl OpControl {
    /// No cancellation, no deadline.
    pub fn none() -> Self {
        Self::default()
    }

    pub fn with_cancel(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// Sets the deadline to `now + timeout`.
    pub fn with_timeout(self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    /// Keeps the earlier of the existing and the new deadline.
    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(match self.deadline {
            Some(existing) => existing.min(deadline),
            None => deadline,
        });
        self
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// True when the operation may block forever.
    pub fn is_unbounded(&self) -> bool {
        self.cancel.is_none() && self.deadline.is_none()
    }

    /// Fails if the token was cancelled or the deadline has passed.
    pub fn check(&self) -> StoreResult<()> {
        if self.cancel.as_ref().is_some_and(|c| c.is_cancelled()) {
            return Err(StoreError::Cancelled);
        }
        if self.deadline.is_some_and(|d| Instant::now() >= d) {
            return Err(StoreError::TimedOut);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_none_never_trips() {
        let ctl = OpControl::none();
        assert!(ctl.is_unbounded());
        assert!(ctl.check().is_ok());
    }

    #[test]
    fn test_cancel_is_shared_between_clones() {
        let token = CancellationToken::new();
        let ctl = OpControl::none().with_cancel(token.clone());
        assert!(ctl.check().is_ok());

        token.cancel();
        assert_eq!(ctl.check(), Err(StoreError::Cancelled));
    }

    #[test]
    fn test_expired_deadline() {
        let ctl = OpControl::none().with_deadline(Instant::now() - Duration::from_millis(1));
        assert_eq!(ctl.check(), Err(StoreError::TimedOut));
    }

    #[test]
    fn test_earliest_deadline_wins() {
        let soon = Instant::now() + Duration::from_secs(1);
        let later = soon + Duration::from_secs(60);
        let ctl = OpControl::none().with_deadline(soon).with_deadline(later);
        assert_eq!(ctl.deadline(), Some(soon));
    }
}
