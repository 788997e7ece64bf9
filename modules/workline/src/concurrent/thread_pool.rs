
use std::{
  any::Any,
  panic::{catch_unwind, AssertUnwindSafe},
  sync::{
    atomic::{AtomicUsize, Ordering},
    Arc, Mutex,
  },
  thread,
  time::Duration,
};

use crossbeam_channel::{unbounded, Receiver, RecvTimeoutError, Sender, TryRecvError};

/// Boxed unit of work accepted by the pool.
pub(crate) type Task = Box<dyn FnOnce() + Send + 'static>;

/// Shared handler invoked for every task failure the pool captures.
pub type FailureHandler = Arc<dyn Fn(TaskFailure) + Send + Sync>;

/// Description of a task that panicked inside the pool.
///
/// The panic never crosses a thread boundary; it is captured at the worker and handed to the
/// configured [`FailureHandler`], and the worker keeps serving subsequent tasks.
#[derive(Debug, Clone)]
pub struct TaskFailure {
  pool:    String,
  worker:  String,
  message: String,
}

impl TaskFailure {
  pub(crate) fn new(pool: String, worker: String, message: String) -> Self {
    Self { pool, worker, message }
  }

  pub(crate) fn from_panic(pool: String, payload: &(dyn Any + Send)) -> Self {
    let worker = thread::current().name().unwrap_or("unnamed").to_string();
    Self::new(pool, worker, panic_message(payload))
  }

  /// Name of the pool the task was submitted to.
  #[must_use]
  pub fn pool(&self) -> &str {
    &self.pool
  }

  /// Name of the thread the task panicked on.
  #[must_use]
  pub fn worker(&self) -> &str {
    &self.worker
  }

  /// Panic message, when the payload carried one.
  #[must_use]
  pub fn message(&self) -> &str {
    &self.message
  }
}

impl std::fmt::Display for TaskFailure {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "task on `{}` (pool `{}`) panicked: {}", self.worker, self.pool, self.message)
  }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
  if let Some(message) = payload.downcast_ref::<&'static str>() {
    (*message).to_string()
  } else if let Some(message) = payload.downcast_ref::<String>() {
    message.clone()
  } else {
    "non-string panic payload".to_string()
  }
}

/// Errors returned by pool submission.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PoolError {
  /// The pool has been shut down and accepts no further tasks.
  #[error("thread pool `{name}` is shut down")]
  Closed {
    /// Name of the rejecting pool.
    name: String,
  },
}

/// Configuration for a [`ThreadPool`].
pub struct PoolConfig {
  name:         String,
  min_threads:  usize,
  max_threads:  usize,
  idle_timeout: Duration,
  on_failure:   FailureHandler,
}

impl PoolConfig {
  /// Creates a configuration with defaults: no reserved threads, up to eight workers, a
  /// 30-second idle retirement, and a failure handler that logs through `tracing`.
  #[must_use]
  pub fn new(name: impl Into<String>) -> Self {
    Self {
      name:         name.into(),
      min_threads:  0,
      max_threads:  8,
      idle_timeout: Duration::from_secs(30),
      on_failure:   default_failure_handler(),
    }
  }

  /// Number of threads kept alive even when idle.
  #[must_use]
  pub fn with_min_threads(mut self, min_threads: usize) -> Self {
    self.min_threads = min_threads;
    self
  }

  /// Upper bound on concurrently live worker threads.
  #[must_use]
  pub fn with_max_threads(mut self, max_threads: usize) -> Self {
    self.max_threads = max_threads;
    self
  }

  /// How long a non-reserved worker may sit idle before it terminates.
  #[must_use]
  pub fn with_idle_timeout(mut self, idle_timeout: Duration) -> Self {
    self.idle_timeout = idle_timeout;
    self
  }

  /// Handler invoked for every captured task failure.
  #[must_use]
  pub fn with_failure_handler(mut self, handler: impl Fn(TaskFailure) + Send + Sync + 'static) -> Self {
    self.on_failure = Arc::new(handler);
    self
  }
}

fn default_failure_handler() -> FailureHandler {
  Arc::new(|failure: TaskFailure| {
    tracing::error!(
      pool = %failure.pool(),
      worker = %failure.worker(),
      reason = %failure.message(),
      "task panicked"
    );
  })
}

struct PoolShared {
  name:         String,
  min_threads:  usize,
  max_threads:  usize,
  idle_timeout: Duration,
  on_failure:   FailureHandler,
  sender:       Mutex<Option<Sender<Task>>>,
  receiver:     Receiver<Task>,
  live:         AtomicUsize,
  idle:         AtomicUsize,
  next_worker:  AtomicUsize,
}

/// Elastic pool of worker threads executing submitted tasks.
///
/// Tasks run on an existing idle thread when one is available; otherwise a new thread is spawned
/// up to the configured maximum, and beyond that tasks queue until a worker frees. Workers above
/// the reserved minimum retire after the idle timeout. Handles are cheap to clone and share the
/// same pool.
pub struct ThreadPool {
  shared: Arc<PoolShared>,
}

impl ThreadPool {
  /// Creates a pool and pre-spawns its reserved threads.
  ///
  /// # Panics
  /// Panics when `max_threads` is zero or smaller than `min_threads`.
  #[must_use]
  pub fn new(config: PoolConfig) -> Self {
    assert!(config.max_threads >= 1, "thread pool requires max_threads >= 1");
    assert!(
      config.max_threads >= config.min_threads,
      "thread pool requires max_threads >= min_threads"
    );
    let (sender, receiver) = unbounded();
    let shared = Arc::new(PoolShared {
      name: config.name,
      min_threads: config.min_threads,
      max_threads: config.max_threads,
      idle_timeout: config.idle_timeout,
      on_failure: config.on_failure,
      sender: Mutex::new(Some(sender)),
      receiver,
      live: AtomicUsize::new(0),
      idle: AtomicUsize::new(0),
      next_worker: AtomicUsize::new(0),
    });
    for _ in 0..shared.min_threads {
      shared.live.fetch_add(1, Ordering::SeqCst);
      Self::spawn_worker(&shared);
    }
    Self { shared }
  }

  /// Submits a task for execution.
  ///
  /// # Errors
  /// Returns [`PoolError::Closed`] when the pool has been shut down.
  pub fn execute(&self, task: impl FnOnce() + Send + 'static) -> Result<(), PoolError> {
    self
      .submit(Box::new(task))
      .map_err(|_task| PoolError::Closed { name: self.shared.name.clone() })
  }

  /// Closes the submission side; workers drain remaining tasks and exit.
  pub fn shutdown(&self) {
    let closed = {
      let mut sender = self.shared.sender.lock().unwrap_or_else(|err| err.into_inner());
      sender.take().is_some()
    };
    if closed {
      tracing::debug!(pool = %self.shared.name, "pool shut down");
    }
  }

  /// Pool name used for worker thread names and failure reports.
  #[must_use]
  pub fn name(&self) -> &str {
    &self.shared.name
  }

  /// Number of currently live worker threads.
  #[must_use]
  pub fn live_threads(&self) -> usize {
    self.shared.live.load(Ordering::SeqCst)
  }

  pub(crate) fn failure_handler(&self) -> FailureHandler {
    Arc::clone(&self.shared.on_failure)
  }

  pub(crate) fn submit(&self, task: Task) -> Result<(), Task> {
    {
      let sender = self.shared.sender.lock().unwrap_or_else(|err| err.into_inner());
      match sender.as_ref() {
        Some(tx) => {
          if let Err(err) = tx.send(task) {
            return Err(err.into_inner());
          }
        }
        None => return Err(task),
      }
    }
    self.spawn_if_needed();
    Ok(())
  }

  fn spawn_if_needed(&self) {
    loop {
      if self.shared.idle.load(Ordering::SeqCst) > 0 {
        return;
      }
      let live = self.shared.live.load(Ordering::SeqCst);
      if live >= self.shared.max_threads {
        return;
      }
      if self
        .shared
        .live
        .compare_exchange(live, live + 1, Ordering::SeqCst, Ordering::SeqCst)
        .is_ok()
      {
        Self::spawn_worker(&self.shared);
        return;
      }
    }
  }

  fn spawn_worker(shared: &Arc<PoolShared>) {
    let id = shared.next_worker.fetch_add(1, Ordering::SeqCst);
    let worker_name = format!("{}-{}", shared.name, id);
    let worker_shared = Arc::clone(shared);
    let spawned = thread::Builder::new()
      .name(worker_name.clone())
      .spawn(move || Self::worker_loop(&worker_shared, &worker_name));
    if let Err(err) = spawned {
      shared.live.fetch_sub(1, Ordering::SeqCst);
      tracing::error!(pool = %shared.name, error = %err, "failed to spawn worker thread");
    }
  }

  fn worker_loop(shared: &Arc<PoolShared>, worker: &str) {
    tracing::debug!(pool = %shared.name, worker, "worker started");
    loop {
      shared.idle.fetch_add(1, Ordering::SeqCst);
      let reserved = shared.live.load(Ordering::SeqCst) <= shared.min_threads;
      let received = if reserved {
        shared.receiver.recv().map_err(|_| RecvTimeoutError::Disconnected)
      } else {
        shared.receiver.recv_timeout(shared.idle_timeout)
      };
      shared.idle.fetch_sub(1, Ordering::SeqCst);
      match received {
        Ok(task) => Self::run_task(shared, worker, task),
        Err(RecvTimeoutError::Timeout) => {
          // A submitter may have enqueued a task while this worker still counted as
          // idle and declined to spawn for it. Drain once before retiring so that
          // task is never stranded in the channel with no worker to take it.
          match shared.receiver.try_recv() {
            Ok(task) => Self::run_task(shared, worker, task),
            Err(TryRecvError::Empty) => {
              if Self::try_retire(shared) {
                tracing::debug!(pool = %shared.name, worker, "idle worker retired");
                return;
              }
            }
            Err(TryRecvError::Disconnected) => {
              shared.live.fetch_sub(1, Ordering::SeqCst);
              tracing::debug!(pool = %shared.name, worker, "worker exiting on shutdown");
              return;
            }
          }
        }
        Err(RecvTimeoutError::Disconnected) => {
          shared.live.fetch_sub(1, Ordering::SeqCst);
          tracing::debug!(pool = %shared.name, worker, "worker exiting on shutdown");
          return;
        }
      }
    }
  }

  fn run_task(shared: &PoolShared, worker: &str, task: Task) {
    if let Err(payload) = catch_unwind(AssertUnwindSafe(task)) {
      (shared.on_failure.as_ref())(TaskFailure::new(
        shared.name.clone(),
        worker.to_string(),
        panic_message(payload.as_ref()),
      ));
    }
  }

  // A worker may retire only while the live count stays above the reserved minimum.
  fn try_retire(shared: &PoolShared) -> bool {
    loop {
      let live = shared.live.load(Ordering::SeqCst);
      if live <= shared.min_threads {
        return false;
      }
      if shared
        .live
        .compare_exchange(live, live - 1, Ordering::SeqCst, Ordering::SeqCst)
        .is_ok()
      {
        return true;
      }
    }
  }
}

impl Clone for ThreadPool {
  fn clone(&self) -> Self {
    Self { shared: Arc::clone(&self.shared) }
  }
}

impl std::fmt::Debug for ThreadPool {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("ThreadPool")
      .field("name", &self.shared.name)
      .field("live", &self.live_threads())
      .finish()
  }
}
