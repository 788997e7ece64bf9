use std::{
  sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
  },
  thread,
  time::{Duration, Instant},
};

use chrono::{Local, NaiveDate, NaiveTime};

use super::{next_occurrence, DailyTasksLoop};
use crate::{
  concurrent::{PoolConfig, ThreadPool},
  schedule::Breakable,
};

fn test_pool(name: &str) -> ThreadPool {
  ThreadPool::new(PoolConfig::new(name).with_max_threads(2))
}

fn time(h: u32, m: u32, s: u32) -> NaiveTime {
  NaiveTime::from_hms_opt(h, m, s).unwrap()
}

#[test]
fn next_occurrence_is_today_when_still_ahead() {
  let now = NaiveDate::from_ymd_opt(2024, 3, 10).unwrap().and_time(time(8, 0, 0));
  let next = next_occurrence(now, time(14, 30, 0));
  assert_eq!(next, NaiveDate::from_ymd_opt(2024, 3, 10).unwrap().and_time(time(14, 30, 0)));
}

#[test]
fn next_occurrence_rolls_to_tomorrow_when_passed() {
  let now = NaiveDate::from_ymd_opt(2024, 3, 10).unwrap().and_time(time(14, 30, 5));
  let next = next_occurrence(now, time(14, 30, 0));
  assert_eq!(next, NaiveDate::from_ymd_opt(2024, 3, 11).unwrap().and_time(time(14, 30, 0)));
  let until = next - now;
  assert!(until > chrono::Duration::hours(23));
  assert!(until < chrono::Duration::hours(24));
}

#[test]
fn next_occurrence_at_exactly_now_is_tomorrow() {
  let now = NaiveDate::from_ymd_opt(2024, 3, 10).unwrap().and_time(time(14, 30, 0));
  let next = next_occurrence(now, time(14, 30, 0));
  assert_eq!(next.date(), NaiveDate::from_ymd_opt(2024, 3, 11).unwrap());
}

#[test]
fn scheduled_task_fires_at_its_time_of_day() {
  let pool = test_pool("daily-fire");
  let daily = DailyTasksLoop::spawn("daily-fire", &pool);
  let runs = Arc::new(AtomicUsize::new(0));
  let task_runs = runs.clone();

  // Schedule two seconds ahead; the insertion wakes the idle loop.
  let at = (Local::now() + chrono::Duration::seconds(2)).naive_local().time();
  daily.schedule(at, move || {
    task_runs.fetch_add(1, Ordering::SeqCst);
  });

  let start = Instant::now();
  while runs.load(Ordering::SeqCst) == 0 && start.elapsed() < Duration::from_secs(10) {
    thread::sleep(Duration::from_millis(20));
  }
  assert_eq!(runs.load(Ordering::SeqCst), 1);
  assert!(start.elapsed() >= Duration::from_millis(900));

  assert_eq!(daily.stop().wait_for_timeout(Duration::from_secs(2)), Some(()));
  pool.shutdown();
}

#[test]
fn task_for_a_passed_time_waits_until_tomorrow() {
  let pool = test_pool("daily-passed");
  let daily = DailyTasksLoop::spawn("daily-passed", &pool);
  let runs = Arc::new(AtomicUsize::new(0));
  let task_runs = runs.clone();

  let at = (Local::now() - chrono::Duration::seconds(90)).naive_local().time();
  daily.schedule(at, move || {
    task_runs.fetch_add(1, Ordering::SeqCst);
  });

  thread::sleep(Duration::from_millis(300));
  assert_eq!(runs.load(Ordering::SeqCst), 0);

  assert_eq!(daily.stop().wait_for_timeout(Duration::from_secs(2)), Some(()));
  pool.shutdown();
}

#[test]
fn stop_wakes_a_loop_with_an_empty_schedule() {
  let pool = test_pool("daily-stop");
  let daily = DailyTasksLoop::spawn("daily-stop", &pool);

  thread::sleep(Duration::from_millis(50));
  let start = Instant::now();
  assert_eq!(daily.stop().wait_for_timeout(Duration::from_secs(2)), Some(()));
  assert!(start.elapsed() < Duration::from_secs(1));
  pool.shutdown();
}
