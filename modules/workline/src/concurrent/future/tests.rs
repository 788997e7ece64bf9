use std::{
  sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
  },
  thread,
  time::{Duration, Instant},
};

use super::{Future, Promise};
use crate::concurrent::{PoolConfig, ThreadPool};

fn test_pool(name: &str) -> ThreadPool {
  ThreadPool::new(PoolConfig::new(name).with_max_threads(2))
}

#[test]
fn wait_for_blocks_until_fulfilled() {
  let (future, promise) = Future::create();
  let fulfiller = thread::spawn(move || {
    thread::sleep(Duration::from_millis(50));
    promise.fulfill(42_u32);
  });

  let start = Instant::now();
  assert_eq!(future.wait_for(), 42);
  assert!(start.elapsed() >= Duration::from_millis(40));
  fulfiller.join().unwrap();
}

#[test]
fn all_readers_observe_the_same_value() {
  let (future, promise) = Future::create();
  let readers: Vec<_> = (0..4)
    .map(|_| {
      let future = future.clone();
      thread::spawn(move || future.wait_for())
    })
    .collect();
  promise.fulfill("done".to_string());

  for reader in readers {
    assert_eq!(reader.join().unwrap(), "done");
  }
  assert_eq!(future.wait_for(), "done");
}

#[test]
#[should_panic(expected = "fulfilled twice")]
fn second_fulfill_fails_fast() {
  let (_future, promise) = Future::create();
  promise.fulfill(1_u32);
  promise.fulfill(2_u32);
}

#[test]
fn timeout_returns_empty_without_cancelling() {
  let (future, promise) = Future::<u32>::create();

  assert_eq!(future.wait_for_timeout(Duration::from_millis(50)), None);

  promise.fulfill(7);
  assert_eq!(future.wait_for_timeout(Duration::from_millis(50)), Some(7));
  assert_eq!(future.wait_for(), 7);
}

#[test]
fn callback_registered_before_fulfillment_runs_once() {
  let (future, promise) = Future::create();
  let runs = Arc::new(AtomicUsize::new(0));
  let observed = runs.clone();
  future.when_fulfilled(move |value: u32| {
    assert_eq!(value, 9);
    observed.fetch_add(1, Ordering::SeqCst);
  });

  assert_eq!(runs.load(Ordering::SeqCst), 0);
  promise.fulfill(9);
  assert_eq!(runs.load(Ordering::SeqCst), 1);
}

#[test]
fn callback_on_fulfilled_future_runs_immediately() {
  let future = Future::ready(3_u32);
  let runs = Arc::new(AtomicUsize::new(0));
  let observed = runs.clone();
  future.when_fulfilled(move |value| {
    assert_eq!(value, 3);
    observed.fetch_add(1, Ordering::SeqCst);
  });

  assert_eq!(runs.load(Ordering::SeqCst), 1);
}

#[test]
fn map_on_fulfilled_future_runs_synchronously() {
  let pool = test_pool("map-sync");
  let caller = thread::current().id();
  let future = Future::ready(10_u32);

  let mapped = future.map(&pool, false, move |value| {
    assert_eq!(thread::current().id(), caller);
    value * 2
  });

  assert_eq!(mapped.try_get(), Some(20));
  pool.shutdown();
}

#[test]
fn map_with_force_async_runs_on_the_pool() {
  let pool = test_pool("map-async");
  let future = Future::ready(10_u32);

  let mapped = future.map(&pool, true, |value| {
    let worker = thread::current().name().map(str::to_string);
    assert!(worker.is_some_and(|name| name.starts_with("map-async")));
    value + 1
  });

  assert_eq!(mapped.wait_for(), 11);
  pool.shutdown();
}

#[test]
fn map_on_pending_future_fires_after_fulfillment() {
  let pool = test_pool("map-pending");
  let (future, promise) = Future::create();
  let mapped = future.map(&pool, false, |value: u32| value + 5);

  assert!(!mapped.is_fulfilled());
  promise.fulfill(1);
  assert_eq!(mapped.wait_for(), 6);
  pool.shutdown();
}

#[test]
fn flat_map_chains_futures() {
  let pool = test_pool("flat-map");
  let (outer, outer_promise) = Future::create();
  let (inner, inner_promise): (Future<u32>, Promise<u32>) = Future::create();

  let chained = outer.flat_map(&pool, false, move |value: u32| {
    assert_eq!(value, 1);
    inner
  });

  outer_promise.fulfill(1);
  assert!(!chained.is_fulfilled());
  inner_promise.fulfill(2);
  assert_eq!(chained.wait_for(), 2);
  pool.shutdown();
}

#[test]
fn flat_map_on_fulfilled_future_short_circuits() {
  let pool = test_pool("flat-map-sync");
  let chained = Future::ready(4_u32).flat_map(&pool, false, |value| Future::ready(value * 3));

  assert_eq!(chained.try_get(), Some(12));
  pool.shutdown();
}
