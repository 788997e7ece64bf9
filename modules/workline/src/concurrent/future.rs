#[cfg(test)]
mod tests;

use std::{
  mem,
  sync::{Arc, Condvar, Mutex, MutexGuard},
  time::{Duration, Instant},
};

use super::ThreadPool;

type Callback<T> = Box<dyn FnOnce(T) + Send>;

struct FutureState<T> {
  value:     Option<T>,
  callbacks: Vec<Callback<T>>,
}

struct FutureShared<T> {
  state: Mutex<FutureState<T>>,
  cvar:  Condvar,
}

impl<T> FutureShared<T> {
  fn lock_state(&self) -> MutexGuard<'_, FutureState<T>> {
    self.state.lock().unwrap_or_else(|err| err.into_inner())
  }
}

/// Handle to a value produced by at most one fulfillment event.
///
/// A future starts pending and transitions to fulfilled exactly once, through the [`Promise`]
/// returned by [`Future::create`]. Readers either block ([`Future::wait_for`]) or register a
/// callback invoked exactly once, after fulfillment, on an unspecified thread
/// ([`Future::when_fulfilled`]). Fulfillment happens-before the resumption of every blocked or
/// callback-registered reader; any write performed before the fulfilling call is visible to any
/// thread that observes the value. Handles are cheap to clone and observe the same state.
pub struct Future<T> {
  shared: Arc<FutureShared<T>>,
}

/// Fulfillment capability for a [`Future`], held separately from its readers.
pub struct Promise<T> {
  shared: Arc<FutureShared<T>>,
}

impl<T> Future<T> {
  /// Creates a pending future together with its fulfillment capability.
  #[must_use]
  pub fn create() -> (Future<T>, Promise<T>) {
    let shared = Arc::new(FutureShared {
      state: Mutex::new(FutureState { value: None, callbacks: Vec::new() }),
      cvar:  Condvar::new(),
    });
    (Future { shared: Arc::clone(&shared) }, Promise { shared })
  }

  /// Creates a future that is already fulfilled with `value`.
  #[must_use]
  pub fn ready(value: T) -> Self {
    let shared = Arc::new(FutureShared {
      state: Mutex::new(FutureState { value: Some(value), callbacks: Vec::new() }),
      cvar:  Condvar::new(),
    });
    Self { shared }
  }

  /// Returns whether the future has been fulfilled.
  #[must_use]
  pub fn is_fulfilled(&self) -> bool {
    self.shared.lock_state().value.is_some()
  }
}

impl<T: Clone> Future<T> {
  /// Returns a copy of the value when fulfilled, without blocking.
  #[must_use]
  pub fn try_get(&self) -> Option<T> {
    self.shared.lock_state().value.clone()
  }

  /// Blocks the calling thread until the future is fulfilled and returns the value.
  pub fn wait_for(&self) -> T {
    let mut state = self.shared.lock_state();
    loop {
      if let Some(value) = state.value.as_ref() {
        return value.clone();
      }
      state = self.shared.cvar.wait(state).unwrap_or_else(|err| err.into_inner());
    }
  }

  /// As [`Future::wait_for`], but gives up after `timeout`.
  ///
  /// A timeout is not an error and does not cancel the underlying operation; the future may
  /// still be fulfilled later.
  #[must_use]
  pub fn wait_for_timeout(&self, timeout: Duration) -> Option<T> {
    let deadline = Instant::now() + timeout;
    let mut state = self.shared.lock_state();
    loop {
      if let Some(value) = state.value.as_ref() {
        return Some(value.clone());
      }
      let now = Instant::now();
      if now >= deadline {
        return None;
      }
      let (guard, _) = self
        .shared
        .cvar
        .wait_timeout(state, deadline - now)
        .unwrap_or_else(|err| err.into_inner());
      state = guard;
    }
  }
}

impl<T: Clone + Send + 'static> Future<T> {
  /// Registers `callback` to run exactly once, after fulfillment, on an unspecified thread.
  ///
  /// When the future is already fulfilled the callback runs synchronously on the calling
  /// thread; otherwise it runs on the fulfilling thread.
  pub fn when_fulfilled(&self, callback: impl FnOnce(T) + Send + 'static) {
    let mut state = self.shared.lock_state();
    if let Some(value) = state.value.clone() {
      drop(state);
      callback(value);
    } else {
      state.callbacks.push(Box::new(callback));
    }
  }

  /// Returns a future fulfilled with `f(value)` once this one is fulfilled.
  ///
  /// When this future is already fulfilled and `force_async` is `false`, `f` runs synchronously
  /// on the calling thread and the returned future is fulfilled on return. Otherwise the
  /// continuation is scheduled on `pool`. Should the pool be shut down by the time the
  /// continuation fires, it runs on the fulfilling thread instead of being dropped.
  #[must_use]
  pub fn map<U: Clone + Send + 'static>(
    &self,
    pool: &ThreadPool,
    force_async: bool,
    f: impl FnOnce(T) -> U + Send + 'static,
  ) -> Future<U> {
    if !force_async {
      if let Some(value) = self.try_get() {
        return Future::ready(f(value));
      }
    }
    let (future, promise) = Future::create();
    let pool = pool.clone();
    self.when_fulfilled(move |value| {
      let work: super::Task = Box::new(move || promise.fulfill(f(value)));
      if let Err(work) = pool.submit(work) {
        work();
      }
    });
    future
  }

  /// Monadic composition: as [`Future::map`], but `f` itself returns a future and the result is
  /// fulfilled with that inner future's value.
  #[must_use]
  pub fn flat_map<U: Clone + Send + 'static>(
    &self,
    pool: &ThreadPool,
    force_async: bool,
    f: impl FnOnce(T) -> Future<U> + Send + 'static,
  ) -> Future<U> {
    if !force_async {
      if let Some(value) = self.try_get() {
        return f(value);
      }
    }
    let (future, promise) = Future::create();
    let pool = pool.clone();
    self.when_fulfilled(move |value| {
      let work: super::Task = Box::new(move || {
        f(value).when_fulfilled(move |inner| promise.fulfill(inner));
      });
      if let Err(work) = pool.submit(work) {
        work();
      }
    });
    future
  }
}

impl<T: Clone> Promise<T> {
  /// Transitions the future from pending to fulfilled, waking all blocked readers and running
  /// all registered callbacks.
  ///
  /// # Panics
  /// Panics when the future is already fulfilled. Double fulfillment indicates a logic bug and
  /// fails fast rather than being silently ignored.
  pub fn fulfill(&self, value: T) {
    let callbacks = {
      let mut state = self.shared.lock_state();
      assert!(state.value.is_none(), "single-assignment future fulfilled twice");
      state.value = Some(value.clone());
      mem::take(&mut state.callbacks)
    };
    self.shared.cvar.notify_all();
    for callback in callbacks {
      callback(value.clone());
    }
  }
}

impl<T> Clone for Future<T> {
  fn clone(&self) -> Self {
    Self { shared: Arc::clone(&self.shared) }
  }
}

impl<T> std::fmt::Debug for Future<T> {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    let state = if self.is_fulfilled() { "fulfilled" } else { "pending" };
    f.debug_tuple("Future").field(&state).finish()
  }
}

impl<T> std::fmt::Debug for Promise<T> {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Promise").finish()
  }
}
