//! Cancellation and deadlines.
//!
//! Every long-running operation accepts a `CancelToken` (spec.md §5).
//! Cancellation is cooperative: a token is a shared flag plus an optional
//! absolute deadline, consulted at the checkpoints spec.md §5 names per
//! component (match boundaries in C1, between files in C4/C6).

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

#[derive(Debug)]
struct Inner {
    cancelled: AtomicBool,
    deadline: Option<Instant>,
}

/// A cheaply cloneable cancellation handle.
#[derive(Debug, Clone)]
pub struct CancelToken {
    inner: Arc<Inner>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Inner {
                cancelled: AtomicBool::new(false),
                deadline: None,
            }),
        }
    }

    pub fn with_deadline(deadline: Instant) -> Self {
        Self {
            inner: Arc::new(Inner {
                cancelled: AtomicBool::new(false),
                deadline: Some(deadline),
            }),
        }
    }

    /// Request cancellation. Idempotent.
    pub fn cancel(&self) {
        self.inner.cancelled.store(true, Ordering::SeqCst);
    }

    /// True if cancellation was requested or the deadline has passed.
    /// This is the single check every checkpoint in spec.md §5 makes.
    pub fn is_cancelled(&self) -> bool {
        if self.inner.cancelled.load(Ordering::SeqCst) {
            return true;
        }
        match self.inner.deadline {
            Some(deadline) => Instant::now() >= deadline,
            None => false,
        }
    }
}

impl Default for CancelToken {
    fn default() -> Self {
        Self::new()
    }
}

/// Progress reported to a caller-supplied callback: `(stage_name,
/// fraction_complete)` per spec.md §6.
pub type ProgressCallback<'a> = dyn FnMut(&str, f32) + Send + 'a;

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn fresh_token_is_not_cancelled() {
        let token = CancelToken::new();
        assert!(!token.is_cancelled());
    }

    #[test]
    fn cancel_is_observed() {
        let token = CancelToken::new();
        token.cancel();
        assert!(token.is_cancelled());
    }

    #[test]
    fn past_deadline_counts_as_cancelled() {
        let token = CancelToken::with_deadline(Instant::now() - Duration::from_secs(1));
        assert!(token.is_cancelled());
    }

    #[test]
    fn clone_shares_cancellation_state() {
        let token = CancelToken::new();
        let clone = token.clone();
        clone.cancel();
        assert!(token.is_cancelled());
    }
}
