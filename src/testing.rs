//! Shared fixtures for unit tests.
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::{CancelToken, Work};

/// Content used by the fixtures, one variant per state a slot can show.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Shade {
    Loading,
    Cancelled,
    Failed,
    Loaded(u32),
    Cached(u32),
}

#[derive(Debug, Default)]
pub(crate) struct Counters {
    runs: AtomicUsize,
    cancels: AtomicUsize,
    updates: Mutex<Vec<Shade>>,
}

impl Counters {
    pub(crate) fn runs(&self) -> usize {
        self.runs.load(Ordering::SeqCst)
    }

    pub(crate) fn cancels(&self) -> usize {
        self.cancels.load(Ordering::SeqCst)
    }

    pub(crate) fn updates(&self) -> Vec<Shade> {
        self.updates.lock().unwrap().clone()
    }
}

/// Work with scripted behavior.
///
/// Loads `Shade::Loaded(key)`. A blocking script waits in `execute` until
/// either [`Scripted::release`] is called or the task is cancelled.
#[derive(Debug)]
pub(crate) struct Scripted {
    key: Option<u32>,
    cached: bool,
    failing: bool,
    blocking: bool,
    started: CancelToken,
    gate: CancelToken,
    counters: Arc<Counters>,
}

impl Scripted {
    pub(crate) fn new(key: Option<u32>) -> Self {
        Self {
            key,
            cached: false,
            failing: false,
            blocking: false,
            started: CancelToken::new(),
            gate: CancelToken::new(),
            counters: Arc::default(),
        }
    }

    /// Completes on bind with `Shade::Cached(key)`.
    pub(crate) fn cached(mut self) -> Self {
        self.cached = true;
        self
    }

    pub(crate) fn failing(mut self) -> Self {
        self.failing = true;
        self
    }

    pub(crate) fn blocking(mut self) -> Self {
        self.blocking = true;
        self
    }

    pub(crate) fn counters(&self) -> &Counters {
        &self.counters
    }

    /// Tripped once `execute` has started.
    pub(crate) fn started(&self) -> CancelToken {
        self.started.clone()
    }

    /// Lets a blocking `execute` finish.
    pub(crate) fn release(&self) {
        self.gate.cancel();
    }

    fn value(&self) -> u32 {
        self.key.unwrap_or_default()
    }
}

impl Work for Scripted {
    type Key = u32;
    type Content = Shade;

    fn key(&self) -> Option<&u32> {
        self.key.as_ref()
    }

    fn loading(&self) -> Shade {
        Shade::Loading
    }

    fn cancelled(&self) -> Shade {
        Shade::Cancelled
    }

    fn failed(&self, _: &anyhow::Error) -> Shade {
        Shade::Failed
    }

    fn on_bind(&self) -> Option<Shade> {
        self.cached.then(|| Shade::Cached(self.value()))
    }

    fn execute(&self, token: &CancelToken) -> anyhow::Result<Shade> {
        self.counters.runs.fetch_add(1, Ordering::SeqCst);
        self.started.cancel();

        if self.blocking {
            while !self.gate.wait_timeout(Duration::from_millis(5)) {
                if token.is_cancelled() {
                    break;
                }
            }
        }

        if self.failing {
            anyhow::bail!("scripted failure");
        }

        Ok(Shade::Loaded(self.value()))
    }

    fn on_cancel(&self) {
        self.counters.cancels.fetch_add(1, Ordering::SeqCst);
    }

    fn on_updated(&self, value: &Shade) {
        self.counters.updates.lock().unwrap().push(value.clone());
    }
}
