#[cfg(test)]
mod tests;

use super::Volatile;

/// Optional-value [`Volatile`] cell with an atomic read-and-clear step.
pub struct VolatileOption<T> {
  inner: Volatile<Option<T>>,
}

impl<T> VolatileOption<T> {
  /// Creates a new empty cell.
  #[must_use]
  pub fn new() -> Self {
    Self { inner: Volatile::new(None) }
  }

  /// Creates a cell already holding `value`.
  #[must_use]
  pub fn with_value(value: T) -> Self {
    Self { inner: Volatile::new(Some(value)) }
  }

  /// Stores `value`, replacing any previous one.
  pub fn set(&self, value: T) {
    self.inner.set(Some(value));
  }

  /// Atomically reads and clears the cell in one locked step.
  pub fn pop(&self) -> Option<T> {
    self.inner.lock().take()
  }

  /// Returns whether the cell currently holds a value.
  #[must_use]
  pub fn is_some(&self) -> bool {
    self.inner.lock().is_some()
  }
}

impl<T: Clone> VolatileOption<T> {
  /// Returns a copy of the current value without clearing it.
  #[must_use]
  pub fn get(&self) -> Option<T> {
    self.inner.get()
  }
}

// Clones share the cell; `T` itself need not be `Clone`.
impl<T> Clone for VolatileOption<T> {
  fn clone(&self) -> Self {
    Self { inner: self.inner.clone() }
  }
}

impl<T> Default for VolatileOption<T> {
  fn default() -> Self {
    Self::new()
  }
}
