//! Explicit runtime context.
//!
//! Instead of process-wide pools and an implicit exit hook, a [`Runtime`] is a constructible
//! object owning its thread pool and its registry of active [`Breakable`] loops; callers pass it
//! around, and its shutdown is an explicit call. Hosts that want shutdown tied to a process exit
//! signal register [`Runtime::shutdown`] with their signal handling themselves.


use std::sync::Arc;

use crate::{
  concurrent::{ActionQueue, Completion, PoolConfig, ThreadPool},
  schedule::{Breakable, DailyTasksLoop, LoopHandle, StaticIntervalLoop},
  sync::Volatile,
};

struct RuntimeInner {
  pool:       ThreadPool,
  breakables: Volatile<Vec<Arc<dyn Breakable>>>,
}

/// Context owning a [`ThreadPool`] and the loops spawned through it.
///
/// Handles are cheap to clone and share the same context. Loops spawned via
/// [`Runtime::spawn_interval`] and [`Runtime::spawn_daily`] are registered automatically and
/// stopped by [`Runtime::shutdown`].
pub struct Runtime {
  inner: Arc<RuntimeInner>,
}

impl Runtime {
  /// Creates a runtime with a pool built from `config`.
  #[must_use]
  pub fn new(config: PoolConfig) -> Self {
    Self {
      inner: Arc::new(RuntimeInner {
        pool:       ThreadPool::new(config),
        breakables: Volatile::new(Vec::new()),
      }),
    }
  }

  /// The runtime's thread pool.
  #[must_use]
  pub fn pool(&self) -> &ThreadPool {
    &self.inner.pool
  }

  /// Creates an [`ActionQueue`] executing on this runtime's pool.
  #[must_use]
  pub fn action_queue(&self, max_concurrent: usize) -> ActionQueue {
    ActionQueue::new(self.inner.pool.clone(), max_concurrent)
  }

  /// Spawns and registers a fixed-interval loop.
  pub fn spawn_interval(&self, name: impl Into<String>, strategy: StaticIntervalLoop) -> LoopHandle {
    let handle = LoopHandle::spawn(name, &self.inner.pool, strategy);
    self.register(Arc::new(handle.clone()));
    handle
  }

  /// Spawns and registers a daily-tasks loop with an empty schedule.
  pub fn spawn_daily(&self, name: impl Into<String>) -> DailyTasksLoop {
    let daily = DailyTasksLoop::spawn(name, &self.inner.pool);
    self.register(Arc::new(daily.handle().clone()));
    daily
  }

  /// Adds `breakable` to the set stopped by [`Runtime::shutdown`].
  pub fn register(&self, breakable: Arc<dyn Breakable>) {
    self.inner.breakables.with(|registry| registry.push(breakable));
  }

  /// Stops every registered loop, waits for each to exit, then shuts the pool down.
  ///
  /// Must not be called from a task running on this runtime's own pool while the pool is at its
  /// thread limit; the call blocks until all loops have exited.
  pub fn shutdown(&self) {
    tracing::info!(pool = %self.inner.pool.name(), "runtime shutting down");
    let active = self.inner.breakables.get_and_set(Vec::new());
    let completions: Vec<Completion> = active.iter().map(|breakable| breakable.stop()).collect();
    for completion in &completions {
      completion.wait_for();
    }
    self.inner.pool.shutdown();
  }
}

impl Clone for Runtime {
  fn clone(&self) -> Self {
    Self { inner: Arc::clone(&self.inner) }
  }
}

impl std::fmt::Debug for Runtime {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Runtime").field("pool", &self.inner.pool).finish()
  }
}
