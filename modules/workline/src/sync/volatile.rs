
use std::{
  mem,
  sync::{Arc, Mutex, MutexGuard},
};

/// Mutable cell whose every access is serialized through one lock.
///
/// Handles are cheap to clone and share the same cell. Closures passed to [`Volatile::update`]
/// or [`Volatile::with`] run while the cell's lock is held and must not touch the same cell
/// again; that re-entrancy is a contract, not something the type system enforces.
pub struct Volatile<T> {
  cell: Arc<Mutex<T>>,
}

impl<T> Volatile<T> {
  /// Creates a new cell holding `value`.
  #[must_use]
  pub fn new(value: T) -> Self {
    Self { cell: Arc::new(Mutex::new(value)) }
  }

  /// Replaces the cell's value.
  pub fn set(&self, value: T) {
    *self.lock() = value;
  }

  /// Replaces the cell's value and returns the previous one in a single locked step.
  pub fn get_and_set(&self, value: T) -> T {
    mem::replace(&mut *self.lock(), value)
  }

  /// Runs `f` with exclusive access to the cell's value and returns its result.
  pub fn with<R>(&self, f: impl FnOnce(&mut T) -> R) -> R {
    f(&mut self.lock())
  }

  pub(crate) fn lock(&self) -> MutexGuard<'_, T> {
    self.cell.lock().unwrap_or_else(|err| err.into_inner())
  }
}

impl<T: Clone> Volatile<T> {
  /// Returns a copy of the current value.
  #[must_use]
  pub fn get(&self) -> T {
    self.lock().clone()
  }

  /// Atomically replaces the cell's value with `f(old)` and returns the new value.
  pub fn update(&self, f: impl FnOnce(&T) -> T) -> T {
    let mut guard = self.lock();
    let next = f(&guard);
    *guard = next.clone();
    next
  }
}

impl<T> Clone for Volatile<T> {
  fn clone(&self) -> Self {
    Self { cell: Arc::clone(&self.cell) }
  }
}

impl<T: std::fmt::Debug> std::fmt::Debug for Volatile<T> {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_tuple("Volatile").field(&*self.lock()).finish()
  }
}
