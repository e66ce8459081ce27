//! Atomics used by the lock, with optional loom support.
//!
//! Regular builds use `core` atomics. Building with `RUSTFLAGS="--cfg loom"`
//! swaps in loom's instrumented types so the model tests in `tests/loom.rs`
//! can explore every interleaving.

#[cfg(not(loom))]
pub(crate) use core::sync::atomic::{AtomicUsize, Ordering};

#[cfg(loom)]
pub(crate) use loom::sync::atomic::{AtomicUsize, Ordering};

/// Hint emitted between failed CAS attempts.
///
/// This is a CPU pause instruction, not a yield: the thread keeps the core.
/// Loom cannot preempt a spinning thread, so under loom it yields instead.
#[cfg(not(loom))]
#[inline(always)]
pub(crate) fn spin_loop() {
    core::hint::spin_loop();
}

#[cfg(loom)]
#[inline(always)]
pub(crate) fn spin_loop() {
    loom::thread::yield_now();
}
