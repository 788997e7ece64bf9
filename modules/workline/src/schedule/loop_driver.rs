
use std::{
  panic::{catch_unwind, AssertUnwindSafe},
  sync::Arc,
};

use super::Breakable;
use crate::{
  concurrent::{Completion, FailureHandler, Future, TaskFailure, ThreadPool},
  sync::{VolatileFlag, VolatileOption},
  timing::Monitor,
};

/// Scheduling policy injected into the generic loop driver.
///
/// New policies are added by supplying a new strategy value, not a new loop type.
pub trait LoopStrategy: Send + 'static {
  /// Runs the loop body once.
  fn run_once(&mut self);

  /// Computes how the loop should wait before the next cycle.
  fn next_target(&mut self) -> crate::timing::WaitTarget;

  /// Asked after every wait; returning `false` ends the loop.
  fn should_continue(&mut self) -> bool {
    true
  }
}

struct LoopInner {
  name:           String,
  monitor:        Arc<Monitor>,
  stop_requested: VolatileFlag,
  done:           Completion,
}

/// Handle to a running background loop.
///
/// The driver repeatedly runs the strategy's body, exits if a stop was requested, waits
/// according to the strategy's target on the loop's own [`Monitor`], and exits when a stop
/// arrived during the wait or the strategy declines to continue. The body always runs at least
/// once, even if the continuation check would have returned `false` from the start. Handles are
/// cheap to clone and control the same loop.
pub struct LoopHandle {
  inner: Arc<LoopInner>,
}

impl LoopHandle {
  /// Spawns a loop driving `strategy` on `pool`.
  ///
  /// The loop occupies one pool task for its whole lifetime; the pool is elastic, so
  /// long-running loops raise the live thread count rather than starving short tasks.
  pub fn spawn(name: impl Into<String>, pool: &ThreadPool, strategy: impl LoopStrategy) -> Self {
    Self::spawn_with_monitor(name, pool, Arc::new(Monitor::new()), strategy)
  }

  pub(crate) fn spawn_with_monitor(
    name: impl Into<String>,
    pool: &ThreadPool,
    monitor: Arc<Monitor>,
    mut strategy: impl LoopStrategy,
  ) -> Self {
    let name = name.into();
    let (done, done_promise) = Future::create();
    let stop_requested = VolatileFlag::new(false);
    let inner = Arc::new(LoopInner {
      name: name.clone(),
      monitor: Arc::clone(&monitor),
      stop_requested: stop_requested.clone(),
      done,
    });

    let handler = pool.failure_handler();
    let pool_name = pool.name().to_string();
    let slot = VolatileOption::with_value(done_promise);
    let worker_slot = slot.clone();
    let work: crate::concurrent::Task = Box::new(move || {
      let outcome = catch_unwind(AssertUnwindSafe(|| {
        Self::drive(&name, &mut strategy, &monitor, &stop_requested, &handler, &pool_name);
      }));
      if let Some(promise) = worker_slot.pop() {
        promise.fulfill(());
      }
      if let Err(payload) = outcome {
        (handler.as_ref())(TaskFailure::from_panic(pool_name.clone(), payload.as_ref()));
      }
    });
    if pool.submit(work).is_err() {
      tracing::warn!(pool = %pool.name(), name = %inner.name, "pool is shut down; loop never started");
      if let Some(promise) = slot.pop() {
        promise.fulfill(());
      }
    }

    Self { inner }
  }

  /// Name given to this loop at spawn time.
  #[must_use]
  pub fn name(&self) -> &str {
    &self.inner.name
  }

  fn drive(
    name: &str,
    strategy: &mut impl LoopStrategy,
    monitor: &Monitor,
    stop_requested: &VolatileFlag,
    handler: &FailureHandler,
    pool_name: &str,
  ) {
    tracing::debug!(name = %name, "loop started");
    loop {
      // Body failures are captured so one failing iteration never halts the loop.
      if let Err(payload) = catch_unwind(AssertUnwindSafe(|| strategy.run_once())) {
        (handler.as_ref())(TaskFailure::from_panic(pool_name.to_string(), payload.as_ref()));
      }
      // The notification baseline is taken before the stop check and the target
      // computation. A stop or schedule change that notifies after this point is
      // seen by the wait; one that notified earlier is seen by the checks below.
      let wait_baseline = monitor.current_epoch();
      if stop_requested.get() {
        break;
      }
      let target = strategy.next_target();
      target.wait_with_from(monitor, wait_baseline);
      if stop_requested.get() || !strategy.should_continue() {
        break;
      }
    }
    tracing::debug!(name = %name, "loop stopped");
  }
}

impl Breakable for LoopHandle {
  fn stop(&self) -> Completion {
    self.inner.stop_requested.set(true);
    self.inner.monitor.notify_all();
    self.inner.done.clone()
  }
}

impl Clone for LoopHandle {
  fn clone(&self) -> Self {
    Self { inner: Arc::clone(&self.inner) }
  }
}

impl std::fmt::Debug for LoopHandle {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("LoopHandle")
      .field("name", &self.inner.name)
      .field("stop_requested", &self.inner.stop_requested.get())
      .finish()
  }
}
