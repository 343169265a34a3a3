//! Worker pool with a FIFO task queue and live resizing
//!
//! All queue and counter state lives behind one internal mutex; spawn and
//! retire decisions are recomputed under that lock after every mutation. The
//! lock is never held across task execution, so a running task cannot block
//! pool bookkeeping. Two condition variables drive the protocol: one wakes
//! workers for new work (or to re-check retirement after a ceiling change),
//! the other wakes `stop` once the last worker has exited.

use std::collections::VecDeque;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};

use idxsync_core::{itrace, iwarn};

type Task = Box<dyn FnOnce() + Send + 'static>;

struct PoolState {
    /// Queued-but-not-started tasks, FIFO.
    queue: VecDeque<Task>,
    /// Handles of live workers; a worker retiring on idle shrink removes its
    /// own handle (detach), shutdown leaves it for `stop` to join.
    handles: Vec<JoinHandle<()>>,
    /// Live worker threads.
    threads: usize,
    /// Workers currently executing a task.
    active: usize,
    /// Ceiling on live workers.
    max_threads: usize,
    /// Ceiling on idle workers retained between tasks.
    max_idle: usize,
    /// Monotonic id source for worker thread names.
    next_worker: usize,
    /// Terminal; no submissions or spawns once set.
    stopped: bool,
    /// When stopping, discard queued tasks instead of draining them.
    skip_pending: bool,
}

struct PoolInner {
    state: Mutex<PoolState>,
    /// Task available, or a worker should re-check retirement/shutdown.
    task_available: Condvar,
    /// Last worker exited.
    quiesced: Condvar,
}

impl PoolInner {
    // The state lock is never held across user task code; a panic that
    // poisons it can only have happened between consistent mutations.
    fn state(&self) -> MutexGuard<'_, PoolState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn wait<'a>(cond: &Condvar, guard: MutexGuard<'a, PoolState>) -> MutexGuard<'a, PoolState> {
        cond.wait(guard).unwrap_or_else(PoisonError::into_inner)
    }
}

/// A bounded, dynamically resizable pool of OS worker threads.
///
/// Workers spawn lazily on submission pressure and retire on their own when
/// the live count exceeds either ceiling. Created with
/// `ThreadPool::new(max_threads, max_idle)`; zero is valid for both (a
/// zero-thread pool queues work without executing it until the ceiling is
/// raised).
pub struct ThreadPool {
    inner: Arc<PoolInner>,
}

impl ThreadPool {
    /// Create a pool with the given worker and idle-retention ceilings. No
    /// threads are started until work arrives.
    pub fn new(max_threads: usize, max_idle: usize) -> Self {
        ThreadPool {
            inner: Arc::new(PoolInner {
                state: Mutex::new(PoolState {
                    queue: VecDeque::new(),
                    handles: Vec::new(),
                    threads: 0,
                    active: 0,
                    max_threads,
                    max_idle,
                    next_worker: 0,
                    stopped: false,
                    skip_pending: false,
                }),
                task_available: Condvar::new(),
                quiesced: Condvar::new(),
            }),
        }
    }

    /// Submit a task for execution.
    ///
    /// Returns `false` (and drops the task) iff the pool is stopped. A live
    /// pool always accepts: the task is queued FIFO and workers are spawned
    /// while the ceiling allows and queued work exceeds what the currently
    /// idle workers can absorb.
    pub fn run<F>(&self, task: F) -> bool
    where
        F: FnOnce() + Send + 'static,
    {
        let mut state = self.inner.state();
        if state.stopped {
            return false;
        }
        state.queue.push_back(Box::new(task));
        spawn_workers(&self.inner, &mut state);
        self.inner.task_available.notify_one();
        true
    }

    /// Stop the pool and block until every worker thread has exited.
    ///
    /// Idempotent: the first call decides `skip_pending`, later calls only
    /// wait for quiescence. With `skip_pending == false` queued tasks are
    /// drained by the existing workers first; with `true` they are discarded
    /// and only already-started tasks finish. After `stop` returns, `run`
    /// always fails.
    pub fn stop(&self, skip_pending: bool) {
        let mut state = self.inner.state();
        if !state.stopped {
            state.stopped = true;
            state.skip_pending = skip_pending;
            if skip_pending {
                let dropped = state.queue.len();
                state.queue.clear();
                if dropped > 0 {
                    itrace!("pool stop discarded {} pending tasks", dropped);
                }
            }
        }
        self.inner.task_available.notify_all();
        while state.threads > 0 {
            state = PoolInner::wait(&self.inner.quiesced, state);
        }
        let handles = std::mem::take(&mut state.handles);
        drop(state);
        for handle in handles {
            let _ = handle.join();
        }
    }

    /// Current worker-thread ceiling.
    pub fn max_threads(&self) -> usize {
        self.inner.state().max_threads
    }

    /// Set the worker-thread ceiling. Raising it spawns workers to absorb
    /// pending work; lowering it never interrupts an active worker, it only
    /// stops spawning and lets idle reaping shrink toward the new ceiling.
    pub fn set_max_threads(&self, value: usize) {
        let mut state = self.inner.state();
        state.max_threads = value;
        spawn_workers(&self.inner, &mut state);
        self.inner.task_available.notify_all();
    }

    /// Adjust the worker-thread ceiling by `delta`, saturating at zero and
    /// `usize::MAX`. Returns the new ceiling.
    pub fn max_threads_delta(&self, delta: isize) -> usize {
        let mut state = self.inner.state();
        state.max_threads = state.max_threads.saturating_add_signed(delta);
        spawn_workers(&self.inner, &mut state);
        self.inner.task_available.notify_all();
        state.max_threads
    }

    /// Current idle-retention ceiling.
    pub fn max_idle(&self) -> usize {
        self.inner.state().max_idle
    }

    /// Set the idle-retention ceiling and wake idle workers to re-check it.
    pub fn set_max_idle(&self, value: usize) {
        let mut state = self.inner.state();
        state.max_idle = value;
        self.inner.task_available.notify_all();
    }

    /// Adjust the idle-retention ceiling by `delta`, saturating at zero and
    /// `usize::MAX`. Returns the new ceiling.
    pub fn max_idle_delta(&self, delta: isize) -> usize {
        let mut state = self.inner.state();
        state.max_idle = state.max_idle.saturating_add_signed(delta);
        self.inner.task_available.notify_all();
        state.max_idle
    }

    /// Live worker threads right now. Racy by nature; diagnostics only.
    pub fn threads(&self) -> usize {
        self.inner.state().threads
    }

    /// Tasks currently executing. Racy by nature; diagnostics only.
    pub fn tasks_active(&self) -> usize {
        self.inner.state().active
    }

    /// Tasks queued but not yet started. Racy by nature; diagnostics only.
    pub fn tasks_pending(&self) -> usize {
        self.inner.state().queue.len()
    }
}

impl Drop for ThreadPool {
    fn drop(&mut self) {
        self.stop(true);
    }
}

/// Spawn workers while the ceiling allows and queued work exceeds what the
/// idle workers can absorb. Called under the state lock after every mutation
/// that could warrant growth.
fn spawn_workers(inner: &Arc<PoolInner>, state: &mut PoolState) {
    while !state.stopped
        && state.threads < state.max_threads
        && state.queue.len() > state.threads - state.active
    {
        let id = state.next_worker;
        state.next_worker += 1;
        let worker_inner = Arc::clone(inner);
        let handle = thread::Builder::new()
            .name(format!("idxsync-pool-{}", id))
            .spawn(move || worker(&worker_inner))
            .expect("failed to spawn pool worker");
        state.threads += 1;
        state.handles.push(handle);
        itrace!("pool worker {} spawned ({} live)", id, state.threads);
    }
}

fn worker(inner: &Arc<PoolInner>) {
    let mut state = inner.state();
    loop {
        if state.stopped && (state.skip_pending || state.queue.is_empty()) {
            break;
        }

        if let Some(task) = state.queue.pop_front() {
            state.active += 1;
            drop(state);
            // Task failure stays local to the task: it is reported and
            // discarded, never killing the worker or the pool.
            if catch_unwind(AssertUnwindSafe(task)).is_err() {
                iwarn!("pool task panicked; worker continues");
            }
            state = inner.state();
            state.active -= 1;
            continue;
        }

        // Idle. Retire when over either ceiling, else wait for work.
        if state.threads - state.active > state.max_idle || state.threads > state.max_threads {
            let me = thread::current().id();
            state.handles.retain(|h| h.thread().id() != me);
            state.threads -= 1;
            itrace!("pool worker retiring idle ({} live)", state.threads);
            if state.threads == 0 {
                inner.quiesced.notify_all();
            }
            return;
        }
        state = PoolInner::wait(&inner.task_available, state);
    }

    // Shutdown exit: the handle stays behind for stop() to join.
    state.threads -= 1;
    itrace!("pool worker exiting on stop ({} live)", state.threads);
    if state.threads == 0 {
        inner.quiesced.notify_all();
    }
}
