use std::fmt::{self, Debug};
use std::sync::{Arc, Mutex, Weak};

use crate::dispatch::Dispatcher;
use crate::element::{Element, Producer, SlotKind, Tagged};
use crate::error::{TaskError, WorkFailure};
use crate::task::{AbortReason, AsyncTask, Binding, LoadedListener, Occupant, Outcome, TaskId, Work};
use crate::utils::lock;
use crate::CancelToken;

type Listener<W> = Arc<dyn LoadedListener<<W as Work>::Key, <W as Work>::Content>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    /// Created, not bound yet.
    Idle,
    /// Claimed its slot, waiting for `execute`.
    Bound,
    Running,
    Finished,
}

#[derive(Debug)]
struct State {
    phase: Phase,
    cancelled: bool,
    completed: bool,
}

/// A task which loads content for one slot of an element using `W`.
///
/// The task shows [`Work::loading`] while the work runs, replaces it with the
/// result when done, and shows [`Work::cancelled`] if it gets cancelled
/// first. All slot mutations go through the injected [`Dispatcher`], and each
/// one is checked against the slot's current occupant right before it is
/// applied, so a task which lost its slot can never overwrite it.
///
/// ```rust
/// # use std::sync::Arc;
/// # use musubi::{CancelToken, Element, Immediate, Task, Work, AsyncTask};
/// struct Square(u32);
///
/// impl Work for Square {
///     type Key = u32;
///     type Content = u32;
///
///     fn key(&self) -> Option<&u32> { Some(&self.0) }
///     fn loading(&self) -> u32 { 0 }
///     fn cancelled(&self) -> u32 { u32::MAX }
///     fn execute(&self, _: &CancelToken) -> anyhow::Result<u32> { Ok(self.0 * self.0) }
/// }
///
/// let element = Arc::new(Element::new());
/// let task = Task::image(Square(7), &element, Arc::new(Immediate));
///
/// assert!(task.bind());
/// assert_eq!(element.image(), Some(0));
///
/// task.execute()?;
/// assert_eq!(element.image(), Some(49));
/// # Ok::<(), musubi::TaskError>(())
/// ```
pub struct Task<W: Work> {
    id: TaskId,
    work: W,
    binding: Binding<W::Key, W::Content>,
    dispatcher: Arc<dyn Dispatcher>,
    token: CancelToken,
    state: Mutex<State>,
    listener: Mutex<Option<Listener<W>>>,
    this: Weak<Self>,
}

impl<W: Work> Task<W> {
    pub fn new(
        work: W,
        element: &Arc<Element<W::Key, W::Content>>,
        kind: SlotKind,
        dispatcher: Arc<dyn Dispatcher>,
    ) -> Arc<Self> {
        Arc::new_cyclic(|this| Self {
            id: TaskId::next(),
            work,
            binding: Binding::new(element, kind),
            dispatcher,
            token: CancelToken::new(),
            state: Mutex::new(State {
                phase: Phase::Idle,
                cancelled: false,
                completed: false,
            }),
            listener: Mutex::new(None),
            this: this.clone(),
        })
    }

    /// A task bound to the image slot of `element`.
    pub fn image(
        work: W,
        element: &Arc<Element<W::Key, W::Content>>,
        dispatcher: Arc<dyn Dispatcher>,
    ) -> Arc<Self> {
        Self::new(work, element, SlotKind::Image, dispatcher)
    }

    /// A task bound to the background slot of `element`.
    pub fn background(
        work: W,
        element: &Arc<Element<W::Key, W::Content>>,
        dispatcher: Arc<dyn Dispatcher>,
    ) -> Arc<Self> {
        Self::new(work, element, SlotKind::Background, dispatcher)
    }

    /// Sets the listener called after this task delivered its final content.
    pub fn set_listener(&self, listener: impl LoadedListener<W::Key, W::Content> + 'static) {
        *lock(&self.listener) = Some(Arc::new(listener));
    }

    pub fn work(&self) -> &W {
        &self.work
    }

    pub fn token(&self) -> &CancelToken {
        &self.token
    }

    pub fn kind(&self) -> SlotKind {
        self.binding.kind()
    }

    /// The bound element, unless it has been dropped.
    pub fn element(&self) -> Option<Arc<Element<W::Key, W::Content>>> {
        self.binding.element()
    }

    /// Whether the slot currently shows content produced by this task.
    pub fn is_bound(&self) -> bool {
        self.binding.is_bound(self.id)
    }

    /// Completes the task with a value obtained outside of
    /// [`AsyncTask::execute`], e.g. from a callback. Only a bound task which
    /// is neither cancelled nor finished accepts a value, and only once.
    /// Returns whether the value was accepted.
    pub fn deliver(&self, value: W::Content) -> bool {
        {
            let mut state = lock(&self.state);
            let open = matches!(state.phase, Phase::Bound | Phase::Running);
            if !open || state.cancelled || state.completed {
                tracing::debug!(task = %self.id, phase = ?state.phase, "refusing delivery");
                return false;
            }
            state.completed = true;
            state.phase = Phase::Finished;
        }

        self.update(value.clone(), true);
        self.notify(&value, &Outcome::Completed);
        true
    }

    /// Pushes `value` into the slot through the dispatcher, tagged with this
    /// task. With `check_if_bound`, the update only happens while this task
    /// still owns the slot, checked both now and when the update is applied.
    fn update(&self, value: W::Content, check_if_bound: bool) -> bool {
        let Some(element) = self.binding.element() else {
            return false;
        };

        if check_if_bound && element.producer_id(self.binding.kind()) != Some(self.id) {
            tracing::trace!(task = %self.id, "not bound, skipping update");
            return false;
        }
        drop(element);

        let id = self.id;
        let binding = self.binding.clone();
        let this = self.this.clone();
        let occupant: Weak<dyn Occupant<W::Key>> = self.this.clone();
        let producer = Producer::new(id, occupant);

        self.dispatcher.run(Box::new(move || {
            let Some(element) = binding.element() else {
                return;
            };

            let tagged = Tagged::new(value.clone(), producer);
            let applied = if check_if_bound {
                element.put_if_owned(binding.kind(), tagged, id)
            } else {
                element.put(binding.kind(), tagged);
                true
            };
            drop(element);

            if !applied {
                tracing::trace!(task = %id, "slot changed hands, dropping stale update");
                return;
            }

            if let Some(task) = this.upgrade() {
                task.work.on_updated(&value);
            }
        }));

        true
    }

    fn notify(&self, value: &W::Content, outcome: &Outcome) {
        let listener = lock(&self.listener).clone();
        if let Some(listener) = listener {
            listener.on_loaded(self, value, outcome);
        }
    }

    fn run(&self) -> Outcome {
        if self.binding.element().is_none() {
            tracing::debug!(task = %self.id, "element released, aborting");
            return Outcome::Aborted(AbortReason::Released);
        }

        if !self.is_bound() {
            tracing::debug!(task = %self.id, "lost the slot, aborting");
            return Outcome::Aborted(AbortReason::Replaced);
        }

        let result = match self.is_cancelled() {
            true => None,
            false => Some(self.work.execute(&self.token)),
        };

        // cancellation may have happened while the work was running
        let cancelled = {
            let mut state = lock(&self.state);
            if !state.cancelled && matches!(result, Some(Ok(_))) {
                state.completed = true;
            }
            state.cancelled
        };

        let (value, outcome) = match result {
            Some(Ok(value)) if !cancelled => (value, Outcome::Completed),
            Some(Err(err)) if !cancelled => {
                tracing::warn!(task = %self.id, "work failed: {err:#}");
                let value = self.work.failed(&err);
                (value, Outcome::Failed(WorkFailure::new(self.id, err)))
            }
            _ => (self.work.cancelled(), Outcome::Cancelled),
        };

        self.update(value.clone(), true);
        self.notify(&value, &outcome);
        outcome
    }
}

impl<W: Work> Occupant<W::Key> for Task<W> {
    fn id(&self) -> TaskId {
        self.id
    }

    fn key(&self) -> Option<&W::Key> {
        self.work.key()
    }

    fn is_cancelled(&self) -> bool {
        lock(&self.state).cancelled
    }

    fn is_completed(&self) -> bool {
        lock(&self.state).completed
    }

    fn cancel(&self) {
        let repaint = {
            let mut state = lock(&self.state);
            if state.cancelled {
                return;
            }
            state.cancelled = true;
            !state.completed
        };

        tracing::debug!(task = %self.id, "cancelled");
        self.token.cancel();

        // `completed` can no longer flip once `cancelled` is set
        if repaint && self.binding.element().is_some() {
            self.update(self.work.cancelled(), true);
        }

        self.work.on_cancel();
    }
}

impl<W: Work> AsyncTask<W::Key> for Task<W> {
    fn bind(&self) -> bool {
        if lock(&self.state).phase != Phase::Idle {
            tracing::debug!(task = %self.id, "already bound once, refusing to rebind");
            return false;
        }

        // the claim has to be visible before `execute` checks it
        if !self.dispatcher.is_ui_thread() {
            tracing::debug!(task = %self.id, "bind called off the UI thread, refusing");
            return false;
        }

        if !self.binding.cancel_existing_work(self.key()) {
            return false;
        }

        let fast = self.work.on_bind();
        {
            let mut state = lock(&self.state);
            state.completed = fast.is_some();
            state.phase = match fast {
                Some(_) => Phase::Finished,
                None => Phase::Bound,
            };
        }

        match fast {
            Some(value) => {
                tracing::debug!(task = %self.id, "bound, completed on the fast path");
                self.update(value, false);
            }
            None => {
                tracing::debug!(task = %self.id, "bound, loading");
                self.update(self.work.loading(), false);
            }
        }

        true
    }

    fn execute(&self) -> Result<Outcome, TaskError> {
        let span = tracing::debug_span!("execute", task = %self.id);
        let _enter = span.enter();

        {
            let mut state = lock(&self.state);
            if state.completed {
                return Ok(Outcome::Skipped);
            }
            match state.phase {
                Phase::Idle => return Err(TaskError::NotBound(self.id)),
                Phase::Running | Phase::Finished => {
                    return Err(TaskError::AlreadyExecuted(self.id));
                }
                Phase::Bound => state.phase = Phase::Running,
            }
        }

        let outcome = self.run();
        lock(&self.state).phase = Phase::Finished;

        tracing::debug!(?outcome, "finished");
        Ok(outcome)
    }
}

impl<W: Work> Debug for Task<W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = lock(&self.state);
        f.debug_struct("Task")
            .field("id", &self.id)
            .field("kind", &self.binding.kind())
            .field("phase", &state.phase)
            .field("cancelled", &state.cancelled)
            .field("completed", &state.completed)
            .finish()
    }
}
