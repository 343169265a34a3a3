//! # idxsync - synchronization substrate for index engines
//!
//! The in-process concurrency core underneath a document-indexing/search
//! engine: the primitives that guard reader-snapshot swaps and drive
//! background work (segment merges, refreshes).
//!
//! ## Features
//!
//! - **SpinMutex**: busy-wait, non-recursive exclusion for critical sections
//!   of a few instructions
//! - **FairRwLock**: concurrent readers or one writer, with pending writers
//!   blocking new readers so a continuous read stream cannot starve a swap
//! - **ThreadPool**: lazily-spawned, dynamically resizable OS worker threads
//!   over a FIFO task queue, with idle reaping and drain-or-discard shutdown
//! - **Scoped acquisition**: every lock (and each side of the rwlock via its
//!   `ReadLock`/`WriteLock` views) implements `Lockable` and composes with
//!   the `ScopedLock` RAII helper
//!
//! ## Quick Start
//!
//! ```ignore
//! use idxsync::{FairRwLock, ReadLock, ScopedLock, ThreadPool};
//! use std::sync::Arc;
//!
//! let readers = Arc::new(FairRwLock::new());
//! let pool = ThreadPool::new(4, 1);
//!
//! // Background merge holding the snapshot exclusively.
//! let lock = Arc::clone(&readers);
//! pool.run(move || {
//!     lock.write_lock();
//!     // swap the reader snapshot...
//!     lock.write_unlock();
//! });
//!
//! // Searches share the snapshot.
//! let view = ReadLock::new(&readers);
//! {
//!     let _scope = ScopedLock::new(&view);
//!     // read from the snapshot...
//! }
//!
//! pool.stop(false); // drain queued work, join every worker
//! ```

// Re-export core primitives
pub use idxsync_core::{FairRwLock, Lockable, ReadLock, ScopedLock, SpinMutex, WriteLock};

// Re-export logging macros and controls
pub use idxsync_core::iprint::{init as init_logging, set_flush_enabled, set_log_level, LogLevel};
pub use idxsync_core::{idebug, ierror, iinfo, itrace, iwarn};

// Re-export env utilities
pub use idxsync_core::{env_get, env_get_bool, env_get_opt};

// Re-export the worker pool
pub use idxsync_pool::ThreadPool;
