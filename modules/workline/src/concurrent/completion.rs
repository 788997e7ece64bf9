
use std::panic::{catch_unwind, AssertUnwindSafe};

use super::{Future, TaskFailure, ThreadPool};

/// A [`Future`] whose value carries no information; it signals "done" only.
pub type Completion = Future<()>;

impl Future<()> {
  /// Returns an already-fulfilled completion.
  #[must_use]
  pub fn fulfilled() -> Completion {
    Future::ready(())
  }

  /// Runs `op` on the pool and returns a completion fulfilled once it has finished.
  ///
  /// A panicking `op` is captured, routed to the pool's failure handler, and still fulfills the
  /// completion so that dependents are never left waiting.
  pub fn of_asynchronous(pool: &ThreadPool, op: impl FnOnce() + Send + 'static) -> Completion {
    let (completion, promise) = Future::create();
    let handler = pool.failure_handler();
    let pool_name = pool.name().to_string();
    let work: super::Task = Box::new(move || {
      let outcome = catch_unwind(AssertUnwindSafe(op));
      promise.fulfill(());
      if let Err(payload) = outcome {
        (handler.as_ref())(TaskFailure::from_panic(pool_name, payload.as_ref()));
      }
    });
    run_detached(pool, work);
    completion
  }

  /// Returns a completion fulfilled when every input future is fulfilled.
  ///
  /// When all inputs are already fulfilled the result is an already-fulfilled completion
  /// produced synchronously, with no pool task. Otherwise one background task blocks on each
  /// input in turn and fulfills the result once all are done.
  #[must_use]
  pub fn of_many(pool: &ThreadPool, futures: Vec<Completion>) -> Completion {
    if futures.iter().all(|future| future.is_fulfilled()) {
      return Future::ready(());
    }
    let (completion, promise) = Future::create();
    let work: super::Task = Box::new(move || {
      for future in &futures {
        future.wait_for();
      }
      promise.fulfill(());
    });
    run_detached(pool, work);
    completion
  }
}

// A shut-down pool must not leave a completion pending forever; fall back to a
// dedicated thread so the promise is still fulfilled.
fn run_detached(pool: &ThreadPool, work: super::Task) {
  if let Err(work) = pool.submit(work) {
    tracing::warn!(pool = %pool.name(), "pool is shut down; running completion task on a dedicated thread");
    drop(std::thread::spawn(move || work()));
  }
}
