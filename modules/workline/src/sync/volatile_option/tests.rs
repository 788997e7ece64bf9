use std::thread;

use super::VolatileOption;

#[test]
fn pop_clears_the_cell() {
  let cell = VolatileOption::with_value(42_u32);

  assert_eq!(cell.pop(), Some(42));
  assert_eq!(cell.pop(), None);
  assert!(!cell.is_some());
}

#[test]
fn set_replaces_previous_value() {
  let cell = VolatileOption::new();
  cell.set(1_u32);
  cell.set(2);

  assert_eq!(cell.pop(), Some(2));
}

#[test]
fn clones_share_the_cell_without_requiring_clone_values() {
  struct Token(u32);

  let cell = VolatileOption::with_value(Token(5));
  let other = cell.clone();

  let taken = other.pop().map(|token| token.0);
  assert_eq!(taken, Some(5));
  assert!(!cell.is_some());
}

#[test]
fn concurrent_pop_yields_a_single_winner() {
  let cell = VolatileOption::with_value(7_u32);
  let threads: Vec<_> = (0..4)
    .map(|_| {
      let cell = cell.clone();
      thread::spawn(move || cell.pop())
    })
    .collect();
  let taken: Vec<Option<u32>> = threads.into_iter().map(|t| t.join().unwrap()).collect();

  assert_eq!(taken.iter().filter(|v| v.is_some()).count(), 1);
}
