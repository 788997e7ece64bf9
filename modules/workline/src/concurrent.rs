//! Future, thread pool, and action queue primitives.
//!
//! [`Future`] is a single-assignment value observable by blocking or callback; [`Completion`] is
//! its payload-free variant. [`ThreadPool`] executes submitted tasks on an elastic set of worker
//! threads, and [`ActionQueue`] runs at most a configured number of actions concurrently on top
//! of the pool.

mod action_queue;
mod completion;
mod future;
mod thread_pool;

pub use action_queue::ActionQueue;
pub use completion::Completion;
pub use future::{Future, Promise};
pub use thread_pool::{FailureHandler, PoolConfig, PoolError, TaskFailure, ThreadPool};
pub(crate) use thread_pool::Task;
