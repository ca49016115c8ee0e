//! All the generic task-related abstractions.
mod base;
mod binding;

use std::fmt;
use std::num::NonZeroU64;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::CancelToken;
use crate::error::{TaskError, WorkFailure};

pub use crate::task::base::Task;
pub use crate::task::binding::{Binding, cancel_existing_work, task_of};

/// An opaque id, unique among all tasks created by this process.
#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq, PartialOrd, Ord)]
pub struct TaskId(NonZeroU64);

impl TaskId {
    pub(crate) fn next() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(1);

        let id = COUNTER.fetch_add(1, Ordering::Relaxed);
        let Some(id) = NonZeroU64::new(id) else {
            Self::exhausted();
        };

        Self(id)
    }

    #[cold]
    fn exhausted() -> ! {
        panic!("failed to generate unique task ID: bitspace exhausted")
    }

    pub fn as_u64(&self) -> u64 {
        self.0.get()
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A task as seen from the slot it occupies.
///
/// This is the capability recovered from a [`Tagged`](crate::Tagged) value,
/// and everything the replacement protocol needs to decide whether a new
/// task should run.
pub trait Occupant<K>: Send + Sync {
    fn id(&self) -> TaskId;

    /// The key for the work of this task. `None` never matches any other key.
    fn key(&self) -> Option<&K>;

    fn is_cancelled(&self) -> bool;

    fn is_completed(&self) -> bool;

    /// Cancels this task. Calling it more than once has no further effect.
    fn cancel(&self);
}

/// A keyed unit of work which loads content for a single slot.
pub trait AsyncTask<K>: Occupant<K> {
    /// Binds this task to its slot.
    ///
    /// Returns `false` if the slot is already bound to a live task doing the
    /// same work, or the element is gone. The caller should then drop this
    /// task instead of executing it.
    fn bind(&self) -> bool;

    /// Synchronously runs the work of this task. Call this on a background
    /// thread, once, after a successful [`AsyncTask::bind`].
    fn execute(&self) -> Result<Outcome, TaskError>;
}

/// The work behind a [`Task`]: what to compute and what to show meanwhile.
pub trait Work: Send + Sync + 'static {
    /// Identity of the work, deciding whether two tasks do the same thing.
    type Key: PartialEq + Send + Sync + 'static;
    /// The value placed into a slot.
    type Content: Clone + Send + Sync + 'static;

    fn key(&self) -> Option<&Self::Key>;

    /// Content shown while the work is running.
    fn loading(&self) -> Self::Content;

    /// Content shown once the task is cancelled.
    fn cancelled(&self) -> Self::Content;

    /// Performs the long running work. Runs on a background thread.
    ///
    /// Long waits should go through `token` so that cancelling the task can
    /// wake them up.
    fn execute(&self, token: &CancelToken) -> anyhow::Result<Self::Content>;

    /// Called on the binding thread right after the slot was claimed. A
    /// value returned here completes the task immediately, e.g. when the
    /// content is already cached.
    fn on_bind(&self) -> Option<Self::Content> {
        None
    }

    /// Called once, after the task has been cancelled.
    fn on_cancel(&self) {}

    /// Called on the UI thread whenever content from this task has been
    /// placed into the slot.
    fn on_updated(&self, _: &Self::Content) {}

    /// Content shown when [`Work::execute`] fails.
    fn failed(&self, _: &anyhow::Error) -> Self::Content {
        self.cancelled()
    }
}

/// Why a task stopped without delivering anything.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AbortReason {
    /// The element was dropped.
    Released,
    /// Another task took over the slot.
    Replaced,
}

/// Terminal result of [`AsyncTask::execute`].
#[derive(Debug, Clone)]
pub enum Outcome {
    /// The task was already completed, nothing ran.
    Skipped,
    /// The task lost its slot and delivered nothing.
    Aborted(AbortReason),
    /// The work finished and its result was delivered.
    Completed,
    /// The task was cancelled and the cancelled placeholder was delivered.
    Cancelled,
    /// The work failed and the failure placeholder was delivered.
    Failed(WorkFailure),
}

impl Outcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, Outcome::Completed)
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Outcome::Cancelled)
    }

    pub fn is_aborted(&self) -> bool {
        matches!(self, Outcome::Aborted(_))
    }
}

/// Listener called after a task delivered its final content.
pub trait LoadedListener<K, C>: Send + Sync {
    fn on_loaded(&self, task: &dyn Occupant<K>, value: &C, outcome: &Outcome);
}

impl<K, C, F> LoadedListener<K, C> for F
where
    F: Fn(&dyn Occupant<K>, &C, &Outcome) + Send + Sync,
{
    fn on_loaded(&self, task: &dyn Occupant<K>, value: &C, outcome: &Outcome) {
        self(task, value, outcome)
    }
}
