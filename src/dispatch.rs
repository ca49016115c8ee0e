//! Delivery of slot mutations onto the single UI thread.
//!
//! Every mutation of an [`Element`](crate::Element) made by a task goes
//! through a [`Dispatcher`]. If the caller already is on the UI thread the
//! mutation runs inline, otherwise it is queued and applied when the UI loop
//! gets to it.
use std::io;
use std::thread::{self, JoinHandle, ThreadId};
use std::time::Duration;

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, TryRecvError, bounded, unbounded};

/// A unit of work to be run on the UI thread.
pub type Job = Box<dyn FnOnce() + Send + 'static>;

/// Capability to run jobs on the UI thread.
pub trait Dispatcher: Send + Sync {
    /// Whether the calling thread is the UI thread.
    fn is_ui_thread(&self) -> bool;

    /// Queues a job to be run on the UI thread later.
    fn post(&self, job: Job);

    /// Runs the job immediately if called on the UI thread, otherwise posts
    /// it. Returns `true` when the job already ran before returning.
    fn run(&self, job: Job) -> bool {
        if self.is_ui_thread() {
            job();
            true
        } else {
            self.post(job);
            false
        }
    }
}

/// Dispatcher which treats every thread as the UI thread and runs each job
/// inline.
#[derive(Debug, Default, Clone, Copy)]
pub struct Immediate;

impl Dispatcher for Immediate {
    #[inline]
    fn is_ui_thread(&self) -> bool {
        true
    }

    #[inline]
    fn post(&self, job: Job) {
        job()
    }
}

/// The receiving end of a UI thread queue, owned by the UI thread.
#[derive(Debug)]
pub struct UiLoop {
    thread: ThreadId,
    sender: Sender<Job>,
    receiver: Receiver<Job>,
}

/// Cloneable handle to a [`UiLoop`], usable from any thread.
#[derive(Debug, Clone)]
pub struct UiHandle {
    thread: ThreadId,
    sender: Sender<Job>,
}

impl UiLoop {
    /// Creates a loop which adopts the calling thread as the UI thread.
    pub fn new() -> Self {
        let (sender, receiver) = unbounded();
        Self {
            thread: thread::current().id(),
            sender,
            receiver,
        }
    }

    /// Spawns a dedicated UI thread running a loop until every handle is
    /// dropped.
    pub fn spawn(name: impl Into<String>) -> io::Result<(UiHandle, JoinHandle<usize>)> {
        let (tx, rx) = bounded(1);

        let join = thread::Builder::new().name(name.into()).spawn(move || {
            let ui = UiLoop::new();
            if tx.send(ui.handle()).is_err() {
                return 0;
            }
            drop(tx);
            ui.run()
        })?;

        let handle = rx
            .recv()
            .map_err(|_| io::Error::other("UI thread exited before handing out its handle"))?;

        Ok((handle, join))
    }

    pub fn handle(&self) -> UiHandle {
        UiHandle {
            thread: self.thread,
            sender: self.sender.clone(),
        }
    }

    /// Number of jobs waiting to be run.
    pub fn pending(&self) -> usize {
        self.receiver.len()
    }

    /// Runs every job queued so far without blocking. Returns how many ran.
    pub fn pump(&self) -> usize {
        self.debug_assert_ui_thread();

        let mut count = 0;
        loop {
            match self.receiver.try_recv() {
                Ok(job) => {
                    job();
                    count += 1;
                }
                Err(TryRecvError::Empty | TryRecvError::Disconnected) => break,
            }
        }

        if count > 0 {
            tracing::trace!(count, "pumped UI jobs");
        }
        count
    }

    /// Waits up to `timeout` for at least one job, then drains the queue.
    pub fn pump_timeout(&self, timeout: Duration) -> usize {
        self.debug_assert_ui_thread();

        match self.receiver.recv_timeout(timeout) {
            Ok(job) => {
                job();
                1 + self.pump()
            }
            Err(RecvTimeoutError::Timeout | RecvTimeoutError::Disconnected) => 0,
        }
    }

    /// Runs jobs until every [`UiHandle`] has been dropped. Returns how many
    /// jobs ran in total.
    pub fn run(self) -> usize {
        self.debug_assert_ui_thread();

        let UiLoop {
            sender, receiver, ..
        } = self;
        drop(sender);

        let mut count = 0;
        while let Ok(job) = receiver.recv() {
            job();
            count += 1;
        }

        tracing::debug!(count, "UI loop finished");
        count
    }

    fn debug_assert_ui_thread(&self) {
        debug_assert_eq!(
            thread::current().id(),
            self.thread,
            "UI loop driven from a foreign thread"
        );
    }
}

impl Default for UiLoop {
    fn default() -> Self {
        Self::new()
    }
}

impl Dispatcher for UiHandle {
    fn is_ui_thread(&self) -> bool {
        thread::current().id() == self.thread
    }

    fn post(&self, job: Job) {
        if self.sender.send(job).is_err() {
            tracing::trace!("UI loop is gone, dropping job");
        }
    }
}

impl Dispatcher for UiLoop {
    fn is_ui_thread(&self) -> bool {
        thread::current().id() == self.thread
    }

    fn post(&self, job: Job) {
        // the loop holds its own receiver, so this cannot disconnect
        let _ = self.sender.send(job);
    }
}
