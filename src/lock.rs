//! # Lock
//!
//! The capability every lock in this crate offers: `acquire` and `release`.
//!
//! Consumers such as [`SharedCounter`](crate::counter::SharedCounter) are
//! generic over [`Lock`], so the locking strategy can be swapped without
//! touching the caller. [`NoopLock`] is the strategy that does nothing and is
//! what the unprotected path of the counter runs with.
//!
//! Pairing is the caller's job. The trait does not track owners:
//!
//! - acquiring a lock you already hold deadlocks against yourself;
//! - releasing a lock you do not hold frees it for whoever *does* hold it.
//!
//! Use [`Lock::guard`] to get a [`LockGuard`], which releases exactly once on
//! every exit path, unwinding included.
//!
//! ## Example
//! ```rust
//! use cas_spinlock::{Lock, SpinLock};
//!
//! let lock = SpinLock::new();
//! {
//!     let _held = lock.guard();
//!     assert!(lock.is_locked());
//! } // released here
//! assert!(!lock.is_locked());
//! ```

/// Mutual exclusion capability: `{acquire, release}`.
pub trait Lock {
    /// Blocks the calling thread until it holds the lock.
    fn acquire(&self);

    /// Gives the lock up.
    ///
    /// The caller must currently hold it. This is not checked.
    fn release(&self);

    /// Makes a single attempt to take the lock.
    ///
    /// Returns `true` if the calling thread now holds it.
    fn try_acquire(&self) -> bool;

    /// Acquires the lock and returns a guard that releases it on drop.
    #[inline]
    fn guard(&self) -> LockGuard<'_, Self> {
        self.acquire();
        LockGuard { lock: self }
    }

    /// Like [`guard`](Lock::guard) but gives up after one failed attempt.
    #[inline]
    fn try_guard(&self) -> Option<LockGuard<'_, Self>> {
        if self.try_acquire() {
            Some(LockGuard { lock: self })
        } else {
            None
        }
    }
}

/// Scoped acquisition of a [`Lock`].
///
/// Created by [`Lock::guard`] and [`Lock::try_guard`].
#[must_use = "if unused the lock is released immediately"]
pub struct LockGuard<'a, L: Lock + ?Sized> {
    lock: &'a L,
}

impl<L: Lock + ?Sized> LockGuard<'_, L> {
    /// The lock this guard holds.
    #[inline]
    pub fn lock(&self) -> &L {
        self.lock
    }
}

impl<L: Lock + ?Sized> Drop for LockGuard<'_, L> {
    #[inline]
    fn drop(&mut self) {
        self.lock.release();
    }
}

/// A lock that never excludes anyone.
///
/// Every method returns immediately. Wrapping a critical section in it is the
/// same as not locking at all.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopLock;

impl Lock for NoopLock {
    #[inline(always)]
    fn acquire(&self) {}

    #[inline(always)]
    fn release(&self) {}

    #[inline(always)]
    fn try_acquire(&self) -> bool {
        true
    }
}

impl<L: Lock + ?Sized> Lock for &L {
    #[inline]
    fn acquire(&self) {
        (**self).acquire()
    }

    #[inline]
    fn release(&self) {
        (**self).release()
    }

    #[inline]
    fn try_acquire(&self) -> bool {
        (**self).try_acquire()
    }
}

#[cfg(feature = "std")]
impl<L: Lock + ?Sized> Lock for std::sync::Arc<L> {
    #[inline]
    fn acquire(&self) {
        (**self).acquire()
    }

    #[inline]
    fn release(&self) {
        (**self).release()
    }

    #[inline]
    fn try_acquire(&self) -> bool {
        (**self).try_acquire()
    }
}

#[cfg(feature = "std")]
impl<L: Lock + ?Sized> Lock for Box<L> {
    #[inline]
    fn acquire(&self) {
        (**self).acquire()
    }

    #[inline]
    fn release(&self) {
        (**self).release()
    }

    #[inline]
    fn try_acquire(&self) -> bool {
        (**self).try_acquire()
    }
}
