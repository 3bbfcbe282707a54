//! Atomic Utilities
//!
//! Helper functions for atomic reference counters.

use super::constants::MAX_REFCOUNT;
use std::sync::atomic::{AtomicUsize, Ordering};

/// AtomicUtils - utility for atomic counter operations
pub struct AtomicUtils;

impl AtomicUtils {
    /// Atomic increment that aborts on overflow
    ///
    /// Returns the previous value. A counter near `usize::MAX` means
    /// handles are being leaked in a loop, and there is no safe way to
    /// continue once it wraps.
    #[inline]
    pub fn increment(atomic: &AtomicUsize) -> usize {
        let previous = atomic.fetch_add(1, Ordering::Relaxed);
        if previous > MAX_REFCOUNT {
            std::process::abort();
        }
        previous
    }

    /// Increment only while the counter is non-zero
    ///
    /// Returns `false` without touching the counter once it has reached
    /// zero. Success uses `Acquire` so the caller observes everything the
    /// other owners wrote before the count was last raised.
    pub fn increment_if_nonzero(atomic: &AtomicUsize) -> bool {
        let mut current = atomic.load(Ordering::Relaxed);

        loop {
            if current == 0 {
                return false;
            }
            if current > MAX_REFCOUNT {
                std::process::abort();
            }

            match atomic.compare_exchange_weak(
                current,
                current + 1,
                Ordering::Acquire,
                Ordering::Relaxed,
            ) {
                Ok(_) => return true,
                Err(actual) => current = actual,
            }
        }
    }

    /// Increment unless the counter holds `sentinel`
    ///
    /// Spins while the counter equals `sentinel`, then increments from the
    /// value it observed. Success uses `Acquire` to pair with the `Release`
    /// store that clears the sentinel.
    pub fn increment_unless(atomic: &AtomicUsize, sentinel: usize) {
        let mut current = atomic.load(Ordering::Relaxed);

        loop {
            if current == sentinel {
                std::hint::spin_loop();
                current = atomic.load(Ordering::Relaxed);
                continue;
            }
            if current > MAX_REFCOUNT {
                std::process::abort();
            }

            match atomic.compare_exchange_weak(
                current,
                current + 1,
                Ordering::Acquire,
                Ordering::Relaxed,
            ) {
                Ok(_) => return,
                Err(actual) => current = actual,
            }
        }
    }
}
