#[cfg(test)]
mod tests;

use std::{
  collections::VecDeque,
  panic::{catch_unwind, AssertUnwindSafe},
  sync::Arc,
};

use super::{Completion, Future, Promise, TaskFailure, ThreadPool};
use crate::sync::{Volatile, VolatileOption};

struct PendingAction {
  action:  Box<dyn FnOnce() + Send>,
  promise: Promise<()>,
}

struct QueueState {
  pending: VecDeque<PendingAction>,
  running: usize,
}

struct QueueInner {
  pool:           ThreadPool,
  max_concurrent: usize,
  state:          Volatile<QueueState>,
}

/// FIFO submission queue running at most a configured number of actions concurrently.
///
/// Pending actions are started in submission order; completion order is unconstrained. Each
/// pushed action gets its own [`Completion`], fulfilled when that action has finished, even by
/// panicking: a panicking action still releases its concurrency slot and fulfills its completion
/// (its panic is routed to the pool's failure handler), so dependents are never left waiting on
/// a failed action. Handles are cheap to clone and share the same queue.
pub struct ActionQueue {
  inner: Arc<QueueInner>,
}

impl ActionQueue {
  /// Creates a queue executing on `pool` with the given concurrency limit.
  ///
  /// # Panics
  /// Panics when `max_concurrent` is zero.
  #[must_use]
  pub fn new(pool: ThreadPool, max_concurrent: usize) -> Self {
    assert!(max_concurrent >= 1, "action queue requires max_concurrent >= 1");
    let state = Volatile::new(QueueState { pending: VecDeque::new(), running: 0 });
    Self { inner: Arc::new(QueueInner { pool, max_concurrent, state }) }
  }

  /// Appends `action` and returns the completion for this specific action, regardless of
  /// whether it starts immediately or waits for a free slot.
  pub fn push(&self, action: impl FnOnce() + Send + 'static) -> Completion {
    let (completion, promise) = Future::create();
    self
      .inner
      .state
      .with(|state| state.pending.push_back(PendingAction { action: Box::new(action), promise }));
    Self::pump(&self.inner);
    completion
  }

  /// Number of actions currently executing.
  #[must_use]
  pub fn running(&self) -> usize {
    self.inner.state.with(|state| state.running)
  }

  /// Number of actions waiting for a free slot.
  #[must_use]
  pub fn pending(&self) -> usize {
    self.inner.state.with(|state| state.pending.len())
  }

  // Starts queued actions while slots are free. Pool submissions happen outside
  // the queue lock.
  fn pump(inner: &Arc<QueueInner>) {
    loop {
      let next = inner.state.with(|state| {
        if state.running >= inner.max_concurrent {
          return None;
        }
        let entry = state.pending.pop_front()?;
        state.running += 1;
        Some(entry)
      });
      let Some(PendingAction { action, promise }) = next else {
        return;
      };

      let slot = VolatileOption::with_value(promise);
      let worker_slot = slot.clone();
      let queue = Arc::clone(inner);
      let submitted = inner.pool.submit(Box::new(move || {
        let outcome = catch_unwind(AssertUnwindSafe(action));
        // The slot is released before the completion fires, so a waiter woken by
        // the fulfillment already sees the updated running count.
        queue.state.with(|state| state.running -= 1);
        if let Some(promise) = worker_slot.pop() {
          promise.fulfill(());
        }
        Self::pump(&queue);
        if let Err(payload) = outcome {
          let handler = queue.pool.failure_handler();
          (handler.as_ref())(TaskFailure::from_panic(queue.pool.name().to_string(), payload.as_ref()));
        }
      }));

      if submitted.is_err() {
        tracing::warn!(
          pool = %inner.pool.name(),
          "pool is shut down; completing queued action without running it"
        );
        inner.state.with(|state| state.running -= 1);
        if let Some(promise) = slot.pop() {
          promise.fulfill(());
        }
      }
    }
  }
}

impl Clone for ActionQueue {
  fn clone(&self) -> Self {
    Self { inner: Arc::clone(&self.inner) }
  }
}

impl std::fmt::Debug for ActionQueue {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("ActionQueue")
      .field("max_concurrent", &self.inner.max_concurrent)
      .field("running", &self.running())
      .field("pending", &self.pending())
      .finish()
  }
}
