//! # SpinLock
//!
//! A test-and-set spinlock built on a single compare-and-swap.
//!
//! The lock is one machine word that only ever holds [`FREE`] or [`HELD`].
//! [`SpinLock::acquire`] retries `CAS(FREE -> HELD)` until it wins, and
//! [`SpinLock::release`] stores [`FREE`] back. There is no backoff, no yield
//! and no queue: a waiting thread burns its core until the holder lets go.
//!
//! ## Memory ordering
//! The successful CAS uses `Acquire` and the release store uses `Release`.
//! Everything the holder wrote inside the critical section is therefore
//! visible to the next thread whose CAS observes `FREE`. A failed CAS
//! publishes nothing, so it is `Relaxed`.
//!
//! ## Footguns
//! - The lock is **not reentrant**. Acquiring it twice from the same thread
//!   hangs forever.
//! - [`SpinLock::release`] does not check the caller. Releasing a lock you do
//!   not hold frees it for its real holder. Releasing twice is harmless.
//! - The lock is **not fair**. Whichever waiter wins the next CAS goes next.
//! - There is no timeout. Keep critical sections short.
//!
//! ## Example
//! ```rust
//! use cas_spinlock::{Lock, SpinLock};
//!
//! let lock = SpinLock::new();
//! lock.acquire();
//! assert!(!lock.try_acquire());
//! lock.release();
//! assert!(lock.try_acquire());
//! lock.release();
//! ```
//!
//! For a lock that owns its data, use [`SpinMutex`]:
//! ```rust
//! use cas_spinlock::SpinMutex;
//!
//! let m = SpinMutex::new(0u32);
//! *m.lock() += 1;
//! assert_eq!(*m.lock(), 1);
//! ```

use core::fmt;

use crate::lock::Lock;
use crate::sync::{spin_loop, AtomicUsize, Ordering::{Acquire, Relaxed, Release}};

/// State word value of an available lock.
pub const FREE: usize = 0;

/// State word value of a taken lock.
pub const HELD: usize = 1;

/// A busy-waiting mutual exclusion lock.
///
/// See the [module-level documentation](self) for ordering and caveats.
pub struct SpinLock {
    state: AtomicUsize,
}

impl SpinLock {
    /// Creates a lock in the [`FREE`] state.
    #[cfg(not(loom))]
    #[inline(always)]
    pub const fn new() -> Self {
        SpinLock {
            state: AtomicUsize::new(FREE),
        }
    }

    /// Creates a lock in the [`FREE`] state.
    #[cfg(loom)]
    pub fn new() -> Self {
        SpinLock {
            state: AtomicUsize::new(FREE),
        }
    }

    /// Spins until the lock is taken by the calling thread.
    ///
    /// On return the state word reads [`HELD`].
    #[inline]
    pub fn acquire(&self) {
        while self
            .state
            .compare_exchange_weak(FREE, HELD, Acquire, Relaxed)
            .is_err()
        {
            spin_loop();
        }
    }

    /// Attempts the `FREE -> HELD` transition exactly once.
    #[inline]
    pub fn try_acquire(&self) -> bool {
        self.state
            .compare_exchange(FREE, HELD, Acquire, Relaxed)
            .is_ok()
    }

    /// Stores [`FREE`] unconditionally.
    ///
    /// Only the holder should call this; nothing stops anyone else.
    #[inline]
    pub fn release(&self) {
        self.state.store(FREE, Release);
    }

    /// Checks whether the lock is currently held.
    #[inline(always)]
    pub fn is_locked(&self) -> bool {
        self.state() == HELD
    }

    /// Snapshot of the raw state word. Always [`FREE`] or [`HELD`].
    #[inline(always)]
    pub fn state(&self) -> usize {
        self.state.load(Relaxed)
    }
}

impl Default for SpinLock {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for SpinLock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = match self.state() {
            FREE => "FREE",
            _ => "HELD",
        };
        f.debug_struct("SpinLock").field("state", &state).finish()
    }
}

impl Lock for SpinLock {
    #[inline]
    fn acquire(&self) {
        SpinLock::acquire(self)
    }

    #[inline]
    fn release(&self) {
        SpinLock::release(self)
    }

    #[inline]
    fn try_acquire(&self) -> bool {
        SpinLock::try_acquire(self)
    }
}

// `lock_api` guards hand out `&mut T`, so unlocking is unsafe there even
// though the plain `release` above is not.
#[cfg(not(loom))]
unsafe impl lock_api::RawMutex for SpinLock {
    #[allow(clippy::declare_interior_mutable_const)]
    const INIT: Self = SpinLock::new();

    type GuardMarker = lock_api::GuardSend;

    #[inline]
    fn lock(&self) {
        self.acquire();
    }

    #[inline]
    fn try_lock(&self) -> bool {
        self.try_acquire()
    }

    #[inline]
    unsafe fn unlock(&self) {
        self.release();
    }

    #[inline]
    fn is_locked(&self) -> bool {
        SpinLock::is_locked(self)
    }
}

/// A [`SpinLock`] that owns the data it protects.
#[cfg(not(loom))]
pub type SpinMutex<T> = lock_api::Mutex<SpinLock, T>;

/// RAII guard returned by [`SpinMutex::lock`](lock_api::Mutex::lock).
#[cfg(not(loom))]
pub type SpinMutexGuard<'a, T> = lock_api::MutexGuard<'a, SpinLock, T>;
