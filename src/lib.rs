//! # cas-spinlock
//!
//! A **compare-and-swap spinlock** and a harness that hammers it.
//!
//! The crate includes:
//!
//! - [`SpinLock`]: one atomic word, `FREE` or `HELD`, taken by CAS and
//!   released by a plain store.
//! - [`Lock`]: the `{acquire, release}` capability, with [`LockGuard`] for
//!   scoped acquisition and [`NoopLock`] for no locking at all.
//! - [`SharedCounter`]: an integer whose `increment(protect)` either takes
//!   the lock or deliberately races.
//! - `harness` (with `std`): spawns workers, waits on a completion barrier
//!   and reports the final count.
//!
//! The lock never parks, never yields and never backs off. A waiting thread
//! spins on its CPU until the CAS succeeds. That is only sensible for short
//! critical sections on preemptive, multi-threaded schedulers.
//!
//! ## Quick Example
//!
//! ```rust
//! use std::sync::Arc;
//! use std::thread;
//! use cas_spinlock::SharedCounter;
//!
//! let counter = Arc::new(SharedCounter::new());
//! let handles: Vec<_> = (0..4)
//!     .map(|_| {
//!         let c = Arc::clone(&counter);
//!         thread::spawn(move || {
//!             for _ in 0..250 {
//!                 c.increment(true);
//!             }
//!         })
//!     })
//!     .collect();
//! for h in handles {
//!     h.join().unwrap();
//! }
//! assert_eq!(counter.get(), 1000);
//! ```
//!
//! ## Safety & Usage Notes
//!
//! - `SpinLock` is **not reentrant**; a second `acquire` on the same thread
//!   hangs.
//! - `release` trusts the caller. Prefer [`Lock::guard`] over manual pairs.
//! - No fairness, no timeout, no poisoning.
//!
//! ## Feature flags
//!
//! - **`std`** (default): enables `config`, `harness` and the
//!   `cas-spinlock` binary. Without it the lock core is `no_std`.
//! - **`--cfg loom`**: swaps the atomics for loom's so `tests/loom.rs` can
//!   model-check the lock.

#![cfg_attr(not(any(feature = "std", test)), no_std)]

mod sync;

pub mod counter;
pub mod lock;
pub mod spinlock;

#[cfg(feature = "std")]
pub mod config;
#[cfg(feature = "std")]
pub mod harness;

pub use counter::SharedCounter;
pub use lock::{Lock, LockGuard, NoopLock};
pub use spinlock::{SpinLock, FREE, HELD};
#[cfg(not(loom))]
pub use spinlock::{SpinMutex, SpinMutexGuard};
