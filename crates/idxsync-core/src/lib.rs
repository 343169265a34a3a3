//! # idxsync-core
//!
//! Core synchronization primitives for the idxsync substrate.
//!
//! This crate is platform-agnostic: everything here is built on `core`
//! atomics and `std::sync`. The worker pool that consumes these primitives
//! lives in `idxsync-pool`.
//!
//! ## Modules
//!
//! - `lockable` - Common lock capability and scoped (RAII) acquisition
//! - `spin` - Busy-wait mutex for very short critical sections
//! - `rwlock` - Reader/writer lock with writer-starvation prevention
//! - `iprint` - Leveled stderr logging macros
//! - `env` - Environment variable utilities

pub mod env;
pub mod iprint;
pub mod lockable;
pub mod rwlock;
pub mod spin;

// Re-exports for convenience
pub use env::{env_get, env_get_bool, env_get_opt};
pub use iprint::LogLevel;
pub use lockable::{Lockable, ScopedLock};
pub use rwlock::{FairRwLock, ReadLock, WriteLock};
pub use spin::SpinMutex;
