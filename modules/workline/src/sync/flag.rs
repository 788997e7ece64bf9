
use super::Volatile;

/// Boolean [`Volatile`] cell with an atomic run-once transition.
#[derive(Clone)]
pub struct VolatileFlag {
  inner: Volatile<bool>,
}

impl VolatileFlag {
  /// Creates a new flag with the given initial state.
  #[must_use]
  pub fn new(initial: bool) -> Self {
    Self { inner: Volatile::new(initial) }
  }

  /// Returns the current state.
  #[must_use]
  pub fn get(&self) -> bool {
    self.inner.get()
  }

  /// Sets the flag state.
  pub fn set(&self, value: bool) {
    self.inner.set(value);
  }

  /// Atomically tests the flag; if it is clear, sets it and then runs `action`.
  ///
  /// Returns `true` when this caller performed the transition and `action` ran, `false` when the
  /// flag was already set. Across any number of concurrent callers an action wrapped this way
  /// executes at most once. `action` runs while the flag's lock is held and must not touch the
  /// same flag.
  pub fn run_and_set(&self, action: impl FnOnce()) -> bool {
    let mut guard = self.inner.lock();
    if *guard {
      return false;
    }
    *guard = true;
    action();
    true
  }
}

impl std::fmt::Debug for VolatileFlag {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_tuple("VolatileFlag").field(&self.get()).finish()
  }
}
