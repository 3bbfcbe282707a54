//! Test Utilities for the fshared Test Suite
//!
//! Fixtures that make object destruction observable: values that count
//! their own drops, and deleters that record every pointer they destroy.

#![allow(dead_code)]

use fshared::SharedPtr;
use std::ptr::NonNull;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Default thread count for concurrency tests
pub const THREAD_COUNT: usize = 8;

/// Default copy/destroy cycles per thread
pub const CYCLES_PER_THREAD: usize = 10_000;

/// ============================================================================
/// DROP TRACKING
/// ============================================================================

/// Value that bumps a shared counter when dropped
#[derive(Debug)]
pub struct Tracked {
    pub value: u64,
    drops: Arc<AtomicUsize>,
}

impl Tracked {
    pub fn new(value: u64, drops: &Arc<AtomicUsize>) -> Self {
        Self {
            value,
            drops: Arc::clone(drops),
        }
    }
}

impl Drop for Tracked {
    fn drop(&mut self) {
        self.drops.fetch_add(1, Ordering::SeqCst);
    }
}

/// ============================================================================
/// COUNTING DELETER
/// ============================================================================

/// Records every pointer a deleter was invoked with
///
/// Lets a test assert both how many times the deleter ran and which object
/// it was given.
#[derive(Clone, Default)]
pub struct DeleteLog {
    deleted: Arc<Mutex<Vec<usize>>>,
}

impl DeleteLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of deleter invocations so far
    pub fn count(&self) -> usize {
        self.deleted.lock().expect("Lock should not be poisoned").len()
    }

    /// Addresses passed to the deleter, in invocation order
    pub fn addresses(&self) -> Vec<usize> {
        self.deleted.lock().expect("Lock should not be poisoned").clone()
    }

    /// Box `value` and hand it to a `SharedPtr` whose deleter logs here
    ///
    /// Returns the handle and the object's address.
    pub fn share<T: Send + 'static>(&self, value: T) -> (SharedPtr<T>, usize) {
        let raw = Box::into_raw(Box::new(value));
        let deleted = Arc::clone(&self.deleted);

        let handle = unsafe {
            SharedPtr::from_raw_with(raw, move |ptr: NonNull<T>| {
                deleted
                    .lock()
                    .expect("Lock should not be poisoned")
                    .push(ptr.as_ptr() as usize);
                drop(Box::from_raw(ptr.as_ptr()));
            })
        };

        (handle, raw as usize)
    }
}

/// Assert the deleter ran exactly once, with `address`
pub fn assert_deleted_once(log: &DeleteLog, address: usize) {
    let addresses = log.addresses();
    assert_eq!(
        addresses,
        vec![address],
        "deleter should run exactly once with {:#x}, saw {:x?}",
        address,
        addresses
    );
}
