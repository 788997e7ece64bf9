
use std::time::{Duration, Instant};

use super::Monitor;

/// Why a wait on a [`Monitor`] ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WakeReason {
  /// The target duration or deadline elapsed.
  Elapsed,
  /// A notification arrived and the target had `break_on_notify` set.
  Notified,
}

#[derive(Debug, Clone, Copy)]
enum TargetKind {
  Duration(Duration),
  Until(Instant),
  Indefinite,
}

/// Immutable description of a single blocking wait.
///
/// A target is either a duration measured from the moment the wait starts, an absolute deadline,
/// or indefinite. The `break_on_notify` flag decides whether a [`Monitor::notify_all`] may end
/// the wait early; a target with the flag cleared survives notifications and waits out its full
/// duration or deadline. Spurious wakeups never end a wait.
#[derive(Debug, Clone, Copy)]
pub struct WaitTarget {
  kind:            TargetKind,
  break_on_notify: bool,
}

impl WaitTarget {
  /// Wait for `duration`, counted from when [`WaitTarget::wait_with`] is entered.
  #[must_use]
  pub const fn with_duration(duration: Duration, break_on_notify: bool) -> Self {
    Self { kind: TargetKind::Duration(duration), break_on_notify }
  }

  /// Wait until the absolute instant `deadline`.
  #[must_use]
  pub const fn with_end_time(deadline: Instant, break_on_notify: bool) -> Self {
    Self { kind: TargetKind::Until(deadline), break_on_notify }
  }

  /// Wait until notified, ignoring spurious wake signals.
  #[must_use]
  pub const fn until_notified() -> Self {
    Self { kind: TargetKind::Indefinite, break_on_notify: true }
  }

  /// Returns whether a notification may end this wait early.
  #[must_use]
  pub const fn break_on_notify(&self) -> bool {
    self.break_on_notify
  }

  /// Blocks the calling thread on `monitor` until this target is satisfied.
  ///
  /// Notifications that happened before the wait started are not observed; only waiters present
  /// at the moment of [`Monitor::notify_all`] are woken by it.
  pub fn wait_with(&self, monitor: &Monitor) -> WakeReason {
    let start_epoch = monitor.current_epoch();
    self.wait_with_from(monitor, start_epoch)
  }

  // As `wait_with`, but with the notification baseline taken earlier by the caller.
  // A `notify_all` that landed between taking `start_epoch` and entering the wait
  // counts as a notification instead of being lost.
  pub(crate) fn wait_with_from(&self, monitor: &Monitor, start_epoch: u64) -> WakeReason {
    let mut epoch = monitor.lock_epoch();

    let deadline = match self.kind {
      TargetKind::Duration(duration) => Some(Instant::now() + duration),
      TargetKind::Until(instant) => Some(instant),
      TargetKind::Indefinite => None,
    };

    match deadline {
      Some(deadline) => loop {
        if self.break_on_notify && *epoch != start_epoch {
          return WakeReason::Notified;
        }
        let now = Instant::now();
        if now >= deadline {
          return WakeReason::Elapsed;
        }
        let (guard, _) = monitor
          .condvar()
          .wait_timeout(epoch, deadline - now)
          .unwrap_or_else(|err| err.into_inner());
        epoch = guard;
      },
      None => loop {
        if *epoch != start_epoch {
          return WakeReason::Notified;
        }
        epoch = monitor.condvar().wait(epoch).unwrap_or_else(|err| err.into_inner());
      },
    }
  }
}
