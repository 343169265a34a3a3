//! # idxsync-pool
//!
//! Bounded, dynamically resizable pool of OS worker threads consuming a FIFO
//! task queue. This is the background-work engine of the idxsync substrate:
//! segment merges, reader refreshes and similar deferred jobs are submitted
//! as opaque tasks and executed by lazily-spawned workers.
//!
//! Sizing is live: the thread ceiling and the idle-retention ceiling can both
//! be raised or lowered while tasks are in flight. Raising the thread ceiling
//! spawns workers to absorb queued work; lowering either ceiling lets idle
//! workers retire on their own, never killing a task mid-run.

pub mod pool;

pub use pool::ThreadPool;
