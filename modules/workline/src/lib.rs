#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(clippy::missing_errors_doc)]
#![deny(clippy::missing_panics_doc)]
#![deny(clippy::redundant_clone)]
#![deny(clippy::redundant_field_names)]
#![deny(clippy::redundant_pattern)]
#![deny(clippy::redundant_static_lifetimes)]
#![deny(clippy::unnecessary_to_owned)]
#![deny(clippy::needless_borrow)]
#![deny(clippy::manual_ok_or)]
#![deny(clippy::manual_map)]
#![deny(clippy::manual_let_else)]
#![deny(clippy::unused_self)]
#![deny(clippy::empty_enum)]
#![deny(clippy::no_effect)]
#![deny(dropping_copy_types)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::todo)]
#![deny(clippy::unimplemented)]
#![deny(clippy::print_stdout)]
#![deny(clippy::dbg_macro)]
#![deny(clippy::must_use_candidate)]
#![deny(clippy::clone_on_copy)]
#![deny(clippy::from_over_into)]
#![deny(clippy::eq_op)]
#![deny(clippy::bool_comparison)]
#![deny(clippy::needless_bool)]
#![deny(clippy::match_like_matches_macro)]
#![deny(clippy::if_same_then_else)]
#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used, clippy::redundant_clone))]

//! Blocking execution primitives for coordinating OS threads within one process.
//!
//! The crate provides single-assignment futures with blocking waits
//! ([`Future`](concurrent::Future) / [`Completion`](concurrent::Completion)), an elastic
//! [`ThreadPool`](concurrent::ThreadPool), a bounded-concurrency
//! [`ActionQueue`](concurrent::ActionQueue), cancellable repeating loops
//! ([`StaticIntervalLoop`](schedule::StaticIntervalLoop),
//! [`DailyTasksLoop`](schedule::DailyTasksLoop)), lock-guarded mutable cells
//! ([`Volatile`](sync::Volatile) and friends), and a unified blocking-wait description
//! ([`WaitTarget`](timing::WaitTarget)).
//!
//! All components coordinate real parallel worker threads; there is no async runtime. Every
//! piece of cross-thread mutable state is guarded by exactly one lock, fulfillment establishes a
//! happens-before edge for its waiters, and cross-thread failures are captured and routed to an
//! explicit handler instead of unwinding across thread boundaries.

/// Future, thread pool, and action queue primitives.
pub mod concurrent;
/// Explicit runtime context owning the pool and active loops.
pub mod runtime;
/// Cancellable repeating background loops.
pub mod schedule;
/// Lock-guarded mutable cells for cross-thread state.
pub mod sync;
/// Wait descriptions and the monitor they wait on.
pub mod timing;

pub use concurrent::{
  ActionQueue, Completion, Future, PoolConfig, PoolError, Promise, TaskFailure, ThreadPool,
};
pub use runtime::Runtime;
pub use schedule::{Breakable, DailyTasksLoop, LoopHandle, LoopStrategy, StaticIntervalLoop};
pub use sync::{Volatile, VolatileFlag, VolatileOption};
pub use timing::{Monitor, WaitTarget, WakeReason};

/// Prelude module that re-exports commonly used types and traits.
pub mod prelude {
  pub use crate::{
    concurrent::{
      ActionQueue, Completion, Future, PoolConfig, PoolError, Promise, TaskFailure, ThreadPool,
    },
    runtime::Runtime,
    schedule::{Breakable, DailyTasksLoop, LoopHandle, LoopStrategy, StaticIntervalLoop},
    sync::{Volatile, VolatileFlag, VolatileOption},
    timing::{Monitor, WaitTarget, WakeReason},
  };
}
