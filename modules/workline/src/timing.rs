//! Blocking-wait primitives.
//!
//! [`Monitor`] is an explicit mutex + condition-variable pair with broadcast notification;
//! [`WaitTarget`] describes how long (or until when) a blocking wait should last and whether an
//! external signal may end it early.

mod monitor;
mod wait_target;

pub use monitor::Monitor;
pub use wait_target::{WaitTarget, WakeReason};
