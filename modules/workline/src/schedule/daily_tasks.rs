#[cfg(test)]
mod tests;

use std::{
  collections::BTreeMap,
  sync::Arc,
  time::{Duration, Instant},
};

use chrono::{Local, NaiveDateTime, NaiveTime};

use super::{Breakable, LoopHandle, LoopStrategy};
use crate::{
  concurrent::{Completion, ThreadPool},
  sync::Volatile,
  timing::{Monitor, WaitTarget},
};

// A task is considered due when the loop wakes within this window after its occurrence.
const DUE_TOLERANCE: Duration = Duration::from_secs(1);

type ScheduledTask = Box<dyn FnMut() + Send>;
type ScheduleMap = BTreeMap<NaiveTime, Vec<ScheduledTask>>;

/// Background loop running tasks at wall-clock times of day, every day.
///
/// The schedule maps a time-of-day to the tasks that run then. Each cycle the loop computes the
/// next occurrence of every entry (today at that time if that instant is still in the future,
/// otherwise tomorrow) and sleeps until the earliest one. [`DailyTasksLoop::schedule`] may be
/// called while the loop sleeps; inserting an entry notifies the loop's monitor so an earlier
/// occurrence pre-empts the current wait.
pub struct DailyTasksLoop {
  handle:  LoopHandle,
  monitor: Arc<Monitor>,
  entries: Volatile<ScheduleMap>,
}

impl DailyTasksLoop {
  /// Spawns a daily-tasks loop with an empty schedule on `pool`.
  #[must_use]
  pub fn spawn(name: impl Into<String>, pool: &ThreadPool) -> Self {
    let monitor = Arc::new(Monitor::new());
    let entries = Volatile::new(ScheduleMap::new());
    let strategy = DailyStrategy { entries: entries.clone() };
    let handle = LoopHandle::spawn_with_monitor(name, pool, Arc::clone(&monitor), strategy);
    Self { handle, monitor, entries }
  }

  /// Adds `task` to the set run at `time_of_day`.
  ///
  /// A time-of-day that already passed today first fires tomorrow. Tasks run on the loop thread
  /// while the schedule lock is held; they must not call [`DailyTasksLoop::schedule`] on the
  /// same loop.
  pub fn schedule(&self, time_of_day: NaiveTime, task: impl FnMut() + Send + 'static) {
    self
      .entries
      .with(|map| map.entry(time_of_day).or_default().push(Box::new(task)));
    self.monitor.notify_all();
  }

  /// Handle controlling the underlying loop.
  #[must_use]
  pub fn handle(&self) -> &LoopHandle {
    &self.handle
  }
}

impl Breakable for DailyTasksLoop {
  fn stop(&self) -> Completion {
    self.handle.stop()
  }
}

impl std::fmt::Debug for DailyTasksLoop {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("DailyTasksLoop")
      .field("name", &self.handle.name())
      .field("entries", &self.entries.with(|map| map.len()))
      .finish()
  }
}

struct DailyStrategy {
  entries: Volatile<ScheduleMap>,
}

impl LoopStrategy for DailyStrategy {
  fn run_once(&mut self) {
    let now = Local::now().naive_local();
    self.entries.with(|map| {
      for (time_of_day, tasks) in map.iter_mut() {
        if is_due(now, *time_of_day) {
          for task in tasks.iter_mut() {
            task();
          }
        }
      }
    });
  }

  fn next_target(&mut self) -> WaitTarget {
    let now = Local::now().naive_local();
    let next = self
      .entries
      .with(|map| map.keys().map(|time_of_day| next_occurrence(now, *time_of_day)).min());
    match next {
      Some(at) => {
        let delta = (at - now).to_std().unwrap_or(Duration::ZERO);
        WaitTarget::with_end_time(Instant::now() + delta, true)
      }
      // Empty schedule: sleep until an insertion notifies the monitor.
      None => WaitTarget::until_notified(),
    }
  }
}

/// Next absolute occurrence of `time_of_day` relative to `now`: today when that instant is
/// still in the future, otherwise tomorrow.
pub(crate) fn next_occurrence(now: NaiveDateTime, time_of_day: NaiveTime) -> NaiveDateTime {
  let today = now.date().and_time(time_of_day);
  if today > now {
    today
  } else {
    today + chrono::Duration::days(1)
  }
}

fn is_due(now: NaiveDateTime, time_of_day: NaiveTime) -> bool {
  let today = now.date().and_time(time_of_day);
  now >= today && (now - today).to_std().map_or(false, |since| since <= DUE_TOLERANCE)
}
