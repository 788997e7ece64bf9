//! Lock-guarded mutable cells.
//!
//! Every read and write of a [`Volatile`] cell is serialized through one mutex, giving safe
//! cross-thread mutation with atomic read-modify-write. [`VolatileFlag`] and [`VolatileOption`]
//! are the boolean and optional-value variants.

mod flag;
mod volatile;
mod volatile_option;

pub use flag::VolatileFlag;
pub use volatile::Volatile;
pub use volatile_option::VolatileOption;
