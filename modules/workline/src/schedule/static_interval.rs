
use std::time::Duration;

use super::LoopStrategy;
use crate::timing::WaitTarget;

type Body = Box<dyn FnMut() + Send>;
type ContinueCheck = Box<dyn FnMut() -> bool + Send>;

/// Strategy repeating its body at a fixed interval.
///
/// The wait between repeats has `break_on_notify` set, so a stop request wakes a sleeping loop
/// immediately. An absent continuation check means the loop runs until stopped.
pub struct StaticIntervalLoop {
  interval: Duration,
  body:     Body,
  check:    Option<ContinueCheck>,
}

impl StaticIntervalLoop {
  /// Strategy that repeats `body` every `interval` until stopped.
  #[must_use]
  pub fn forever(interval: Duration, body: impl FnMut() + Send + 'static) -> Self {
    Self { interval, body: Box::new(body), check: None }
  }

  /// Strategy that repeats `body` every `interval` while `check` returns `true`.
  ///
  /// The body still runs at least once even if `check` would have returned `false` from the
  /// start; the check is only consulted after each wait.
  #[must_use]
  pub fn new(interval: Duration, body: impl FnMut() + Send + 'static, check: impl FnMut() -> bool + Send + 'static) -> Self {
    Self { interval, body: Box::new(body), check: Some(Box::new(check)) }
  }

  /// Composes the existing continuation check with `check` using short-circuit AND.
  #[must_use]
  pub fn with_additional_check(mut self, check: impl FnMut() -> bool + Send + 'static) -> Self {
    self.check = Some(match self.check.take() {
      None => Box::new(check),
      Some(mut existing) => {
        let mut additional = check;
        Box::new(move || existing() && additional())
      }
    });
    self
  }
}

impl LoopStrategy for StaticIntervalLoop {
  fn run_once(&mut self) {
    (self.body)();
  }

  fn next_target(&mut self) -> WaitTarget {
    WaitTarget::with_duration(self.interval, true)
  }

  fn should_continue(&mut self) -> bool {
    self.check.as_mut().map_or(true, |check| check())
  }
}

impl std::fmt::Debug for StaticIntervalLoop {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("StaticIntervalLoop")
      .field("interval", &self.interval)
      .field("has_check", &self.check.is_some())
      .finish()
  }
}
