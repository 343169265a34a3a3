//! Busy-wait mutex for very short critical sections
//!
//! `SpinMutex` never parks the calling thread: acquisition polls an atomic
//! flag with a pause-instruction hint, yielding the processor between rounds.
//! That keeps uncontended lock/unlock down to a couple of instructions, which
//! is what the engine wants around reader-snapshot swaps and other critical
//! sections held for mere nanoseconds.
//!
//! The lock is non-recursive. In checked builds (`debug_assertions`, or the
//! `strict-checks` feature in release) a recursive `lock` and an `unlock`
//! from a non-owning thread both panic with a diagnostic. In unchecked builds
//! a recursive `lock` spins forever and a stray `unlock` silently releases
//! the lock out from under its owner; both are documented caller errors, not
//! conditions the mutex recovers from.

use core::sync::atomic::{AtomicBool, Ordering};

use crate::lockable::Lockable;

cfg_if::cfg_if! {
    if #[cfg(any(debug_assertions, feature = "strict-checks"))] {
        use core::sync::atomic::AtomicUsize;

        std::thread_local! {
            static THREAD_MARK: u8 = const { 0 };
        }

        /// Stable nonzero address identifying the calling thread.
        fn thread_mark() -> usize {
            THREAD_MARK.with(|m| m as *const u8 as usize)
        }
    }
}

/// A busy-wait, non-recursive mutual exclusion flag.
///
/// Unlike `std::sync::Mutex` this carries no data and no poisoning; it is a
/// raw flag intended to guard a critical section of a few instructions. For
/// scoped acquisition use [`ScopedLock`](crate::lockable::ScopedLock).
///
/// Dropping the mutex while locked is caller error, like the other misuse
/// cases; nothing is torn down on behalf of a thread still inside.
pub struct SpinMutex {
    locked: AtomicBool,

    /// Thread mark of the current holder, 0 when unheld. Checked builds only.
    #[cfg(any(debug_assertions, feature = "strict-checks"))]
    owner: AtomicUsize,
}

impl SpinMutex {
    /// Create a new, unlocked mutex.
    pub const fn new() -> Self {
        SpinMutex {
            locked: AtomicBool::new(false),
            #[cfg(any(debug_assertions, feature = "strict-checks"))]
            owner: AtomicUsize::new(0),
        }
    }

    /// Acquire the lock, spinning until it is available.
    ///
    /// Spins with a pause hint and escalates to `yield_now` once the lock
    /// stays contended, so a long-held lock does not monopolize a core.
    pub fn lock(&self) {
        self.check_not_held_here();

        let mut rounds = 0u32;
        while self
            .locked
            .compare_exchange_weak(false, true, Ordering::Acquire, Ordering::Relaxed)
            .is_err()
        {
            while self.locked.load(Ordering::Relaxed) {
                rounds = rounds.wrapping_add(1);
                for _ in 0..rounds.min(32) {
                    core::hint::spin_loop();
                }
                if rounds > 32 {
                    std::thread::yield_now();
                }
            }
        }

        self.mark_held_here();
    }

    /// Single non-blocking acquisition attempt.
    pub fn try_lock(&self) -> bool {
        let acquired = self
            .locked
            .compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
            .is_ok();
        if acquired {
            self.mark_held_here();
        }
        acquired
    }

    /// Release the lock.
    pub fn unlock(&self) {
        self.check_held_here();
        self.locked.store(false, Ordering::Release);
    }

    /// Whether the flag is currently set. Racy by nature; diagnostics only.
    #[inline]
    pub fn is_locked(&self) -> bool {
        self.locked.load(Ordering::Relaxed)
    }
}

cfg_if::cfg_if! {
    if #[cfg(any(debug_assertions, feature = "strict-checks"))] {
        impl SpinMutex {
            fn check_not_held_here(&self) {
                assert!(
                    self.owner.load(Ordering::Relaxed) != thread_mark(),
                    "recursive lock of SpinMutex by {:?}",
                    std::thread::current().id()
                );
            }

            fn mark_held_here(&self) {
                self.owner.store(thread_mark(), Ordering::Relaxed);
            }

            fn check_held_here(&self) {
                assert!(
                    self.owner.load(Ordering::Relaxed) == thread_mark(),
                    "SpinMutex::unlock by {:?}, which does not hold it",
                    std::thread::current().id()
                );
                self.owner.store(0, Ordering::Relaxed);
            }
        }
    } else {
        impl SpinMutex {
            #[inline(always)]
            fn check_not_held_here(&self) {}

            #[inline(always)]
            fn mark_held_here(&self) {}

            #[inline(always)]
            fn check_held_here(&self) {}
        }
    }
}

impl Default for SpinMutex {
    fn default() -> Self {
        SpinMutex::new()
    }
}

impl Lockable for SpinMutex {
    fn lock(&self) {
        SpinMutex::lock(self)
    }

    fn try_lock(&self) -> bool {
        SpinMutex::try_lock(self)
    }

    fn unlock(&self) {
        SpinMutex::unlock(self)
    }
}

impl std::fmt::Debug for SpinMutex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpinMutex")
            .field("locked", &self.is_locked())
            .finish()
    }
}
