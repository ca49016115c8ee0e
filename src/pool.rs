use std::sync::Arc;

use crate::error::PoolError;
use crate::task::AsyncTask;

/// Worker pool running [`AsyncTask::execute`] off the UI thread.
#[derive(Debug)]
pub struct Pool {
    pool: rayon::ThreadPool,
}

/// A builder for configuring the worker pool.
#[derive(Debug, Clone)]
pub struct PoolBuilder {
    threads: usize,
    name: String,
}

impl PoolBuilder {
    fn new() -> Self {
        Self {
            threads: 0,
            name: "musubi-worker".into(),
        }
    }

    /// Number of worker threads. Zero picks one per logical CPU.
    pub fn threads(mut self, threads: usize) -> Self {
        self.threads = threads;
        self
    }

    /// Prefix of the worker thread names.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn build(self) -> Result<Pool, PoolError> {
        let name = self.name;
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.threads)
            .thread_name(move |i| format!("{name}-{i}"))
            .build()?;

        tracing::debug!(threads = pool.current_num_threads(), "worker pool ready");
        Ok(Pool { pool })
    }
}

impl Pool {
    pub fn builder() -> PoolBuilder {
        PoolBuilder::new()
    }

    /// Binds `task` on the calling thread, which must be the UI thread, and
    /// schedules its execution unless the bind already completed it. Returns
    /// whether the bind succeeded.
    pub fn submit<K, T>(&self, task: Arc<T>) -> bool
    where
        T: AsyncTask<K> + ?Sized + 'static,
    {
        if !task.bind() {
            tracing::debug!(task = %task.id(), "not bound, dropping");
            return false;
        }

        if task.is_completed() {
            tracing::trace!(task = %task.id(), "completed on bind, nothing to run");
            return true;
        }

        self.spawn(task);
        true
    }

    /// Schedules the execution of an already bound task.
    pub fn spawn<K, T>(&self, task: Arc<T>)
    where
        T: AsyncTask<K> + ?Sized + 'static,
    {
        self.pool.spawn(move || {
            if let Err(err) = task.execute() {
                tracing::error!("{err}");
            }
        });
    }

    pub fn threads(&self) -> usize {
        self.pool.current_num_threads()
    }
}
