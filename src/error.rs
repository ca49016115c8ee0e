use std::sync::Arc;

use thiserror::Error;

use crate::task::TaskId;

/// Failure returned by the work function of a task. Cheap to clone, so the
/// listener and the returned [`Outcome`](crate::Outcome) can both hold it.
#[derive(Debug, Error, Clone)]
#[error("Work of task {task} failed: {error:#}")]
pub struct WorkFailure {
    task: TaskId,
    error: Arc<anyhow::Error>,
}

impl WorkFailure {
    pub(crate) fn new(task: TaskId, error: anyhow::Error) -> Self {
        Self {
            task,
            error: Arc::new(error),
        }
    }

    /// The task whose work failed.
    pub fn task(&self) -> TaskId {
        self.task
    }

    pub fn error(&self) -> &anyhow::Error {
        &self.error
    }
}

/// Misuse of a task's lifecycle.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum TaskError {
    #[error("Task {0} was executed without a successful bind")]
    NotBound(TaskId),

    #[error("Task {0} has already been executed")]
    AlreadyExecuted(TaskId),
}

#[derive(Debug, Error)]
pub enum PoolError {
    #[error("Failed to build worker pool:\n{0}")]
    Build(#[from] rayon::ThreadPoolBuildError),
}

#[derive(Debug, Error)]
pub enum MusubiError {
    #[error(transparent)]
    Task(#[from] TaskError),

    #[error(transparent)]
    Pool(#[from] PoolError),

    #[cfg(feature = "logging")]
    #[error("Error while installing the log subscriber:\n{0}")]
    Logging(#[from] tracing_subscriber::util::TryInitError),
}
