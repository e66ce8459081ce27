//! # SharedCounter
//!
//! An integer that many threads bump at once, optionally behind a lock.
//!
//! [`SharedCounter::increment`] with `protect = true` runs the
//! read-modify-write inside a [`LockGuard`](crate::LockGuard) on the
//! counter's own lock, so no update is lost. With `protect = false` the same
//! code runs under a [`NoopLock`] and concurrent callers overwrite each
//! other.
//!
//! The value is kept in an atomic word but only ever read and written with
//! separate `Relaxed` operations, never `fetch_add`. That makes the
//! unprotected path a genuine lost-update race without being undefined
//! behaviour. All cross-thread visibility on the protected path comes from
//! the lock.
//!
//! ```rust
//! use cas_spinlock::SharedCounter;
//!
//! let c = SharedCounter::new();
//! c.increment(true);
//! c.increment(true);
//! assert_eq!(c.get(), 2);
//! ```

use crate::lock::{Lock, NoopLock};
use crate::spinlock::SpinLock;
use crate::sync::{AtomicUsize, Ordering::Relaxed};

/// A counter composed with the lock that guards it.
pub struct SharedCounter<L: Lock = SpinLock> {
    value: AtomicUsize,
    lock: L,
}

impl SharedCounter<SpinLock> {
    /// A zeroed counter guarded by a fresh [`SpinLock`].
    pub fn new() -> Self {
        Self::with_lock(SpinLock::new())
    }
}

impl Default for SharedCounter<SpinLock> {
    fn default() -> Self {
        Self::new()
    }
}

impl<L: Lock> SharedCounter<L> {
    /// A zeroed counter guarded by `lock`.
    pub fn with_lock(lock: L) -> Self {
        SharedCounter {
            value: AtomicUsize::new(0),
            lock,
        }
    }

    /// Adds one to the counter.
    ///
    /// When `protect` is false no synchronization happens and concurrent
    /// increments may be lost.
    #[inline]
    pub fn increment(&self, protect: bool) {
        if protect {
            self.increment_with(&self.lock);
        } else {
            self.increment_with(&NoopLock);
        }
    }

    /// Adds one to the counter while holding `lock`.
    #[inline]
    pub fn increment_with<M: Lock + ?Sized>(&self, lock: &M) {
        let _held = lock.guard();
        let current = self.value.load(Relaxed);
        self.value.store(current.wrapping_add(1), Relaxed);
    }

    /// Current value.
    ///
    /// Only meaningful once every incrementing thread has been joined.
    #[inline]
    pub fn get(&self) -> usize {
        self.value.load(Relaxed)
    }

    /// The lock guarding this counter.
    #[inline]
    pub fn lock(&self) -> &L {
        &self.lock
    }

    /// Consumes the counter, returning the final value.
    pub fn into_inner(self) -> usize {
        self.get()
    }
}

#[cfg(all(test, not(loom)))]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_starts_at_zero() {
        assert_eq!(SharedCounter::new().get(), 0);
    }

    #[test]
    fn test_single_thread_both_modes() {
        let c = SharedCounter::new();
        for _ in 0..10 {
            c.increment(true);
        }
        for _ in 0..5 {
            c.increment(false);
        }
        assert_eq!(c.get(), 15);
        assert!(!c.lock().is_locked(), "Lock must be released after each increment");
    }

    #[test]
    fn test_protected_increments_are_not_lost() {
        let c = Arc::new(SharedCounter::new());

        let handles: Vec<_> = (0..1_000)
            .map(|_| {
                let c = Arc::clone(&c);
                thread::spawn(move || c.increment(true))
            })
            .collect();

        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(c.get(), 1_000);
    }

    #[cfg(feature = "std")]
    #[test]
    fn test_external_lock_instance() {
        let lock = Arc::new(SpinLock::new());
        let c = Arc::new(SharedCounter::with_lock(Arc::clone(&lock)));

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let c = Arc::clone(&c);
                thread::spawn(move || {
                    for _ in 0..5_000 {
                        c.increment(true);
                    }
                })
            })
            .collect();

        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(c.get(), 20_000);
        assert!(!lock.is_locked());
    }

    #[test]
    fn test_noop_counter_single_thread() {
        let c = SharedCounter::with_lock(NoopLock);
        c.increment(true);
        c.increment(false);
        assert_eq!(c.into_inner(), 2);
    }

    #[test]
    fn test_increment_releases_on_panic_elsewhere() {
        let c = SharedCounter::new();
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            c.increment(true);
            let _g = c.lock().guard();
            panic!("boom");
        }));
        assert!(result.is_err());
        assert!(!c.lock().is_locked());
        c.increment(true);
        assert_eq!(c.get(), 2);
    }
}
