//! A bounded pool of asynchronous workers.
//!
//! The pool keeps two limits apart: the queue capacity bounds how much work can be waiting
//! (callers feel backpressure once it fills), and the worker count bounds how much work runs
//! at once.  A single dispatcher task moves work from the queue to the workers, holding one
//! semaphore permit per running task.
//!
//! Every task that makes it into the queue runs exactly once, including while the pool shuts
//! down.  During shutdown the remaining tasks run one after another on the dispatcher, each
//! receiving an already-cancelled token so that it can notice and finish quickly.
//!
//! **NOTE**: tasks *must* watch the `CancellationToken` they are handed.  The pool never kills
//! a task, so a task that ignores cancellation holds up `stop` for as long as it runs.

use futures::future::{BoxFuture, FutureExt};
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::{mpsc, Semaphore};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

/// A unit of work for the pool
pub type Task = Box<dyn FnOnce(CancellationToken) -> BoxFuture<'static, ()> + Send>;

#[derive(Debug)]
pub struct WorkerPool {
    queue: mpsc::Sender<Task>,
    pending: Mutex<Option<mpsc::Receiver<Task>>>,
    tokens: Arc<Semaphore>,
    workers: usize,
    in_flight: TaskTracker,
    cancel: CancellationToken,
    dispatcher: Mutex<Option<JoinHandle<()>>>,
}

impl WorkerPool {
    /// Create a pool that runs up to `workers` tasks at once and queues up to `queue` more.
    ///
    /// Nothing is processed until [`WorkerPool::start`] is called, but tasks may already be
    /// queued.  Zero values are raised to one.
    pub fn new(workers: usize, queue: usize) -> Self {
        let (workers, queue) = (workers.max(1), queue.max(1));
        let (tx, rx) = mpsc::channel(queue);
        Self {
            queue: tx,
            pending: Mutex::new(Some(rx)),
            tokens: Arc::new(Semaphore::new(workers)),
            workers,
            in_flight: TaskTracker::new(),
            cancel: CancellationToken::new(),
            dispatcher: Mutex::new(None),
        }
    }

    /// Spawn the dispatcher onto the current tokio runtime.
    ///
    /// Returns `false` when called outside a runtime, or when the pool has already been
    /// started or stopped.
    pub fn start(&self) -> bool {
        let runtime = match tokio::runtime::Handle::try_current() {
            Ok(handle) => handle,
            Err(e) => {
                log::error!("Cannot start worker pool: {}", e);
                return false;
            }
        };
        if self.cancel.is_cancelled() {
            return false;
        }
        let rx = match self.lock_pending().take() {
            Some(rx) => rx,
            None => return false,
        };

        let dispatcher = Dispatcher {
            tokens: self.tokens.clone(),
            in_flight: self.in_flight.clone(),
            cancel: self.cancel.clone(),
        };
        *self.lock_dispatcher() = Some(runtime.spawn(dispatcher.run(rx)));
        log::info!(
            "Worker pool started with {} workers and a queue of {}",
            self.workers,
            self.queue.max_capacity()
        );
        true
    }

    /// Cancel the pool and wait for it to drain.
    ///
    /// Resolves once every queued task has been run (with a cancelled token) and every
    /// running task has returned.  Returns `false` if the pool was never started or has
    /// already been stopped.
    pub async fn stop(&self) -> bool {
        let dispatcher = match self.lock_dispatcher().take() {
            Some(handle) => handle,
            None => return false,
        };
        self.cancel.cancel();
        match dispatcher.await {
            Ok(()) => {
                log::info!("Worker pool stopped");
                true
            }
            Err(e) => {
                log::error!("Worker pool dispatcher failed: {}", e);
                false
            }
        }
    }

    /// Whether the dispatcher is running and has not been asked to stop
    pub fn running(&self) -> bool {
        !self.cancel.is_cancelled() && self.lock_dispatcher().is_some()
    }

    /// Queue `task`, waiting for space if the queue is full.
    ///
    /// If the pool stops before space frees up the task is dropped without running, and
    /// `false` is returned.  A task for which this returns `true` is guaranteed to run.
    pub async fn enqueue<F, Fut>(&self, task: F) -> bool
    where
        F: FnOnce(CancellationToken) -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        if self.cancel.is_cancelled() {
            return false;
        }
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => false,
            sent = self.queue.send(boxed(task)) => sent.is_ok(),
        }
    }

    /// Queue `task` only if that is possible right now.
    ///
    /// Returns `false` without waiting when the queue is full or the pool is stopped.
    pub fn enqueue_non_blocking<F, Fut>(&self, task: F) -> bool
    where
        F: FnOnce(CancellationToken) -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        if self.cancel.is_cancelled() {
            return false;
        }
        self.queue.try_send(boxed(task)).is_ok()
    }

    /// Number of tasks currently waiting in the queue (best effort)
    pub fn queue_depth(&self) -> usize {
        self.queue.max_capacity() - self.queue.capacity()
    }

    /// Number of tasks currently running (best effort)
    pub fn active_workers(&self) -> usize {
        self.workers - self.tokens.available_permits()
    }

    fn lock_pending(&self) -> std::sync::MutexGuard<'_, Option<mpsc::Receiver<Task>>> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_dispatcher(&self) -> std::sync::MutexGuard<'_, Option<JoinHandle<()>>> {
        self.dispatcher.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn boxed<F, Fut>(task: F) -> Task
where
    F: FnOnce(CancellationToken) -> Fut + Send + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    Box::new(move |cancel| task(cancel).boxed())
}

struct Dispatcher {
    tokens: Arc<Semaphore>,
    in_flight: TaskTracker,
    cancel: CancellationToken,
}

impl Dispatcher {
    async fn run(self, mut rx: mpsc::Receiver<Task>) {
        loop {
            let task = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => break,
                task = rx.recv() => match task {
                    Some(task) => task,
                    None => break,
                },
            };

            let token = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => {
                    // Already dequeued, so it still has to run
                    run_guarded(task, self.cancel.clone()).await;
                    break;
                }
                token = self.tokens.clone().acquire_owned() => token,
            };
            let token = match token {
                Ok(token) => token,
                Err(e) => {
                    log::error!("Worker tokens unavailable: {}", e);
                    run_guarded(task, self.cancel.clone()).await;
                    break;
                }
            };

            let cancel = self.cancel.clone();
            self.in_flight.spawn(async move {
                run_guarded(task, cancel).await;
                drop(token);
            });
        }
        self.drain(rx).await;
    }

    async fn drain(self, mut rx: mpsc::Receiver<Task>) {
        rx.close();
        let mut drained = 0_usize;
        while let Some(task) = rx.recv().await {
            run_guarded(task, self.cancel.clone()).await;
            drained += 1;
        }
        if drained > 0 {
            log::info!("Ran {} queued tasks during shutdown", drained);
        }
        self.in_flight.close();
        self.in_flight.wait().await;
    }
}

/// Run a task, logging rather than propagating a panic.
///
/// The permit held by the caller is released when it goes out of scope, so it is returned
/// whether the task finishes or panics.
async fn run_guarded(task: Task, cancel: CancellationToken) {
    if let Err(panic) = AssertUnwindSafe(task(cancel)).catch_unwind().await {
        let msg = panic
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .or_else(|| panic.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "unknown panic payload".to_string());
        log::error!("Worker task panicked: {}", msg);
    }
}
