use crate::concurrent::Completion;

/// A component supporting a cooperative, awaitable stop request.
pub trait Breakable: Send + Sync {
  /// Requests termination after the current iteration; never preempts mid-iteration.
  ///
  /// Returns a [`Completion`] fulfilled once the component has actually exited. Calling `stop`
  /// more than once is harmless and returns the same completion.
  fn stop(&self) -> Completion;
}
