use std::{
  sync::{
    atomic::{AtomicUsize, Ordering},
    Arc, Mutex,
  },
  thread,
  time::{Duration, Instant},
};

use super::ActionQueue;
use crate::concurrent::{Completion, PoolConfig, ThreadPool};

fn wide_pool(name: &str) -> ThreadPool {
  ThreadPool::new(PoolConfig::new(name).with_max_threads(8))
}

#[test]
fn respects_the_concurrency_limit() {
  let pool = wide_pool("queue-limit");
  let queue = ActionQueue::new(pool.clone(), 2);
  let current = Arc::new(AtomicUsize::new(0));
  let peak = Arc::new(AtomicUsize::new(0));

  let completions: Vec<Completion> = (0..5)
    .map(|_| {
      let current = current.clone();
      let peak = peak.clone();
      queue.push(move || {
        let in_flight = current.fetch_add(1, Ordering::SeqCst) + 1;
        peak.fetch_max(in_flight, Ordering::SeqCst);
        thread::sleep(Duration::from_millis(100));
        current.fetch_sub(1, Ordering::SeqCst);
      })
    })
    .collect();

  let start = Instant::now();
  for completion in completions {
    assert_eq!(completion.wait_for_timeout(Duration::from_secs(5)), Some(()));
  }
  let elapsed = start.elapsed();

  assert!(peak.load(Ordering::SeqCst) <= 2);
  // Five 100ms actions two at a time need three batches.
  assert!(elapsed >= Duration::from_millis(250), "elapsed {elapsed:?}");
  assert!(elapsed < Duration::from_millis(800), "elapsed {elapsed:?}");
  assert_eq!(queue.running(), 0);
  assert_eq!(queue.pending(), 0);
  pool.shutdown();
}

#[test]
fn starts_actions_in_submission_order() {
  let pool = wide_pool("queue-fifo");
  let queue = ActionQueue::new(pool.clone(), 1);
  let order = Arc::new(Mutex::new(Vec::new()));

  let completions: Vec<Completion> = (0..5)
    .map(|index| {
      let order = order.clone();
      queue.push(move || {
        order.lock().unwrap().push(index);
      })
    })
    .collect();
  for completion in completions {
    completion.wait_for();
  }

  assert_eq!(*order.lock().unwrap(), vec![0, 1, 2, 3, 4]);
  pool.shutdown();
}

#[test]
fn panicking_action_fulfills_and_releases_its_slot() {
  let failures = Arc::new(AtomicUsize::new(0));
  let observed = failures.clone();
  let pool = ThreadPool::new(PoolConfig::new("queue-panic").with_failure_handler(move |_failure| {
    observed.fetch_add(1, Ordering::SeqCst);
  }));
  let queue = ActionQueue::new(pool.clone(), 1);
  let ran_after = Arc::new(AtomicUsize::new(0));
  let follower = ran_after.clone();

  let failed = queue.push(|| panic!("bad action"));
  let next = queue.push(move || {
    follower.fetch_add(1, Ordering::SeqCst);
  });

  assert_eq!(failed.wait_for_timeout(Duration::from_secs(2)), Some(()));
  assert_eq!(next.wait_for_timeout(Duration::from_secs(2)), Some(()));
  assert_eq!(ran_after.load(Ordering::SeqCst), 1);
  assert_eq!(failures.load(Ordering::SeqCst), 1);
  assert_eq!(queue.running(), 0);
  pool.shutdown();
}

#[test]
fn each_completion_tracks_its_own_action() {
  let pool = wide_pool("queue-own");
  let queue = ActionQueue::new(pool.clone(), 1);

  let slow = queue.push(|| thread::sleep(Duration::from_millis(100)));
  let fast = queue.push(|| {});

  // The second action cannot finish before the first with a single slot.
  assert!(!fast.is_fulfilled());
  slow.wait_for();
  fast.wait_for();
  pool.shutdown();
}
