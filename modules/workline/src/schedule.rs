//! Cancellable repeating background loops.
//!
//! One generic driver ([`LoopHandle::spawn`]) repeatedly runs a body, waits, and checks whether
//! to continue; the scheduling policy is an injected [`LoopStrategy`] value rather than a
//! subclass. [`StaticIntervalLoop`] waits a fixed interval between repeats; [`DailyTasksLoop`]
//! runs tasks at wall-clock times of day. Stopping is cooperative through [`Breakable`].

mod breakable;
mod daily_tasks;
mod loop_driver;
mod static_interval;

pub use breakable::Breakable;
pub use daily_tasks::DailyTasksLoop;
pub use loop_driver::{LoopHandle, LoopStrategy};
pub use static_interval::StaticIntervalLoop;
