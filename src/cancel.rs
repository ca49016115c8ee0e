use std::sync::{Arc, Condvar, Mutex, PoisonError};
use std::time::Duration;

use crate::utils::lock;

/// Cooperative cancellation signal shared between a task and its work.
///
/// Cancelling wakes every thread blocked in [`CancelToken::wait`] or
/// [`CancelToken::wait_timeout`], so work which sleeps or polls can return
/// early instead of running to the end.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    inner: Arc<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    cancelled: Mutex<bool>,
    cond: Condvar,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_cancelled(&self) -> bool {
        *lock(&self.inner.cancelled)
    }

    /// Trips the token. Returns `true` only for the call which tripped it.
    pub fn cancel(&self) -> bool {
        let mut cancelled = lock(&self.inner.cancelled);
        if *cancelled {
            return false;
        }

        *cancelled = true;
        self.inner.cond.notify_all();
        true
    }

    /// Blocks until the token is cancelled or `timeout` elapses. Returns
    /// whether the token is cancelled.
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        let guard = lock(&self.inner.cancelled);
        let (guard, _) = self
            .inner
            .cond
            .wait_timeout_while(guard, timeout, |cancelled| !*cancelled)
            .unwrap_or_else(PoisonError::into_inner);

        *guard
    }

    /// Blocks until the token is cancelled.
    pub fn wait(&self) {
        let guard = lock(&self.inner.cancelled);
        let _guard = self
            .inner
            .cond
            .wait_while(guard, |cancelled| !*cancelled)
            .unwrap_or_else(PoisonError::into_inner);
    }
}
