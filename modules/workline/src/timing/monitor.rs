use std::sync::{Condvar, Mutex, MutexGuard};

/// Explicit mutex + condition-variable pair owned by the component that waits on it.
///
/// Notifications are broadcast: [`Monitor::notify_all`] wakes every thread currently blocked in
/// [`WaitTarget::wait_with`](crate::timing::WaitTarget::wait_with) on this monitor. Whether a
/// given wait actually ends is governed by that wait's own `break_on_notify` flag. Each
/// notification advances an epoch counter so waiters can tell a real signal apart from a
/// spurious wakeup.
pub struct Monitor {
  epoch: Mutex<u64>,
  cvar:  Condvar,
}

impl Monitor {
  /// Creates a new monitor with no pending notification.
  #[must_use]
  pub fn new() -> Self {
    Self { epoch: Mutex::new(0), cvar: Condvar::new() }
  }

  /// Wakes all threads currently waiting on this monitor.
  pub fn notify_all(&self) {
    {
      let mut epoch = self.lock_epoch();
      *epoch = epoch.wrapping_add(1);
    }
    self.cvar.notify_all();
  }

  pub(crate) fn lock_epoch(&self) -> MutexGuard<'_, u64> {
    self.epoch.lock().unwrap_or_else(|err| err.into_inner())
  }

  /// Snapshot of the notification counter, usable as a wait baseline taken before
  /// other work runs between the snapshot and the wait itself.
  pub(crate) fn current_epoch(&self) -> u64 {
    *self.lock_epoch()
  }

  pub(crate) fn condvar(&self) -> &Condvar {
    &self.cvar
  }
}

impl Default for Monitor {
  fn default() -> Self {
    Self::new()
  }
}
