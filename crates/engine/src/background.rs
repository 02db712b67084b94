//! Background operation scheduler.
//!
//! A bounded FIFO queue drained by a fixed pool of worker threads. Every
//! accepted operation becomes exactly one task; the task owns that
//! operation's lifecycle until it finishes. Submitting returns a
//! [`TaskHandle`] the caller may keep to wait on the task, or drop.

use parking_lot::{Condvar, Mutex};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::error;

/// Why a task was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum BackpressureError {
    /// Queue holds `max_queue_depth` tasks already.
    #[error("background queue is full ({0} pending)")]
    QueueFull(usize),
    /// `shutdown()` has been called.
    #[error("background scheduler is shut down")]
    ShutDown,
}

/// Scheduler metrics snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchedulerStats {
    /// Number of tasks waiting in the queue.
    pub queue_depth: usize,
    /// Number of tasks currently being executed by workers.
    pub active_tasks: usize,
    /// Total number of tasks finished since scheduler creation.
    pub tasks_completed: u64,
    /// Number of worker threads.
    pub worker_count: usize,
}

#[derive(Default)]
struct Completion {
    finished: Mutex<bool>,
    cond: Condvar,
}

impl Completion {
    fn finish(&self) {
        let mut finished = self.finished.lock();
        *finished = true;
        self.cond.notify_all();
    }
}

/// Handle to one submitted task.
///
/// Dropping the handle does not affect the task.
#[derive(Clone)]
pub struct TaskHandle {
    completion: Arc<Completion>,
}

impl TaskHandle {
    /// Whether the task has run to the end (or panicked).
    pub fn is_finished(&self) -> bool {
        *self.completion.finished.lock()
    }

    /// Block until the task has finished.
    pub fn wait(&self) {
        let mut finished = self.completion.finished.lock();
        while !*finished {
            self.completion.cond.wait(&mut finished);
        }
    }

    /// Block up to `timeout`; returns whether the task finished.
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut finished = self.completion.finished.lock();
        while !*finished {
            if self
                .completion
                .cond
                .wait_until(&mut finished, deadline)
                .timed_out()
            {
                return *finished;
            }
        }
        true
    }
}

impl std::fmt::Debug for TaskHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskHandle")
            .field("finished", &self.is_finished())
            .finish()
    }
}

struct TaskEnvelope {
    work: Box<dyn FnOnce() + Send>,
    completion: Arc<Completion>,
}

struct SchedulerInner {
    queue: Mutex<VecDeque<TaskEnvelope>>,
    work_ready: Condvar,
    drain_cond: Condvar,
    shutdown: AtomicBool,
    active_tasks: AtomicUsize,
    max_queue_depth: usize,
    tasks_completed: AtomicU64,
}

/// Fixed pool of worker threads fed by a bounded FIFO queue.
pub struct BackgroundScheduler {
    inner: Arc<SchedulerInner>,
    workers: Mutex<Vec<JoinHandle<()>>>,
    num_threads: usize,
}

impl BackgroundScheduler {
    /// Create a new scheduler with the given number of worker threads.
    ///
    /// Workers are named `bulkops-worker-0`, `bulkops-worker-1`, etc.
    pub fn new(num_threads: usize, max_queue_depth: usize) -> Self {
        let inner = Arc::new(SchedulerInner {
            queue: Mutex::new(VecDeque::new()),
            work_ready: Condvar::new(),
            drain_cond: Condvar::new(),
            shutdown: AtomicBool::new(false),
            active_tasks: AtomicUsize::new(0),
            max_queue_depth,
            tasks_completed: AtomicU64::new(0),
        });

        let mut workers = Vec::with_capacity(num_threads);
        for i in 0..num_threads {
            let inner_clone = Arc::clone(&inner);
            let handle = std::thread::Builder::new()
                .name(format!("bulkops-worker-{}", i))
                .spawn(move || worker_loop(&inner_clone))
                .expect("failed to spawn background worker thread");
            workers.push(handle);
        }

        Self {
            inner,
            workers: Mutex::new(workers),
            num_threads,
        }
    }

    /// Queue a task.
    ///
    /// Returns `Err` if the queue is at capacity or the scheduler has been
    /// shut down; the task is then dropped without running.
    pub fn submit(&self, work: impl FnOnce() + Send + 'static) -> Result<TaskHandle, BackpressureError> {
        let completion = Arc::new(Completion::default());
        {
            let mut queue = self.inner.queue.lock();
            // Checked under the lock so shutdown cannot slip in between
            if self.inner.shutdown.load(Ordering::Acquire) {
                return Err(BackpressureError::ShutDown);
            }
            if queue.len() >= self.inner.max_queue_depth {
                return Err(BackpressureError::QueueFull(queue.len()));
            }
            queue.push_back(TaskEnvelope {
                work: Box::new(work),
                completion: Arc::clone(&completion),
            });
        }

        self.inner.work_ready.notify_one();
        Ok(TaskHandle { completion })
    }

    /// Block until all queued and in-flight tasks have finished.
    ///
    /// Workers remain running after drain completes.
    pub fn drain(&self) {
        let mut queue = self.inner.queue.lock();
        while !queue.is_empty() || self.inner.active_tasks.load(Ordering::Acquire) > 0 {
            self.inner.drain_cond.wait(&mut queue);
        }
    }

    /// Refuse new tasks, let workers finish everything queued, join them.
    ///
    /// Idempotent.
    pub fn shutdown(&self) {
        {
            // Lock before notifying so a worker between its shutdown check
            // and wait() cannot miss the wakeup
            let _queue = self.inner.queue.lock();
            self.inner.shutdown.store(true, Ordering::Release);
            self.inner.work_ready.notify_all();
        }

        let mut workers = self.workers.lock();
        for handle in workers.drain(..) {
            let _ = handle.join();
        }
    }

    /// Whether `shutdown()` has been called.
    pub fn is_shut_down(&self) -> bool {
        self.inner.shutdown.load(Ordering::Acquire)
    }

    /// Return a snapshot of scheduler metrics.
    pub fn stats(&self) -> SchedulerStats {
        SchedulerStats {
            queue_depth: self.inner.queue.lock().len(),
            active_tasks: self.inner.active_tasks.load(Ordering::Relaxed),
            tasks_completed: self.inner.tasks_completed.load(Ordering::Relaxed),
            worker_count: self.num_threads,
        }
    }
}

impl Drop for BackgroundScheduler {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Finishes the task's handle and decrements `active_tasks` on drop, so the
/// bookkeeping holds even if the task panics.
struct ActiveTaskGuard<'a> {
    inner: &'a SchedulerInner,
    completion: Arc<Completion>,
}

impl Drop for ActiveTaskGuard<'_> {
    fn drop(&mut self) {
        self.completion.finish();
        let prev_active = self.inner.active_tasks.fetch_sub(1, Ordering::Release);
        self.inner.tasks_completed.fetch_add(1, Ordering::Relaxed);

        // Lock before notifying: drain() checks its condition under this lock
        let queue = self.inner.queue.lock();
        if prev_active == 1 && queue.is_empty() {
            self.inner.drain_cond.notify_all();
        }
    }
}

fn worker_loop(inner: &SchedulerInner) {
    loop {
        let task = {
            let mut queue = inner.queue.lock();
            loop {
                if let Some(task) = queue.pop_front() {
                    inner.active_tasks.fetch_add(1, Ordering::Release);
                    break task;
                }
                if inner.shutdown.load(Ordering::Acquire) {
                    return;
                }
                inner.work_ready.wait(&mut queue);
            }
        };

        let _guard = ActiveTaskGuard {
            inner,
            completion: task.completion,
        };

        // catch_unwind keeps a panicking task from killing the worker
        if let Err(e) = std::panic::catch_unwind(std::panic::AssertUnwindSafe(task.work)) {
            error!(
                target: "bulkops::scheduler",
                "background task panicked: {:?}",
                e.downcast_ref::<&str>().copied().unwrap_or("(non-string panic)")
            );
        }
    }
}
