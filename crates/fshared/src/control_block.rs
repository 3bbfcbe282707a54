//! Control Block - shared bookkeeping for one managed object
//!
//! Every `SharedPtr` and `WeakPtr` derived from the same allocation points
//! at one `ControlBlock`. It carries:
//!
//! - `strong`: number of live owning handles
//! - `weak`: number of live observing handles, plus one unit held jointly
//!   by the owners for as long as `strong > 0`
//! - the deleter, taken and run exactly once when `strong` reaches zero
//!
//! Teardown order:
//!
//! ```text
//! strong 1 -> 0   (unique winner by fetch_sub result)
//!     │
//!     ├── run deleter on the object pointer
//!     │
//!     └── release owners' weak unit
//!             │
//!             weak 1 -> 0   (unique winner by fetch_sub result)
//!                 │
//!                 └── free the block
//! ```
//!
//! Because the owners hold a weak unit, the block outlives the object
//! while any observer remains, and an observer dropping concurrently with
//! the last owner cannot free the block twice.

use crate::logging::{log_event, LifecycleEvent};
use crate::stats;
use crate::util::constants::WEAK_LOCKED;
use crate::util::AtomicUtils;
use parking_lot::Mutex;
use std::ptr::NonNull;
use std::sync::atomic::{self, AtomicUsize, Ordering};

/// How the managed object is destroyed
pub(crate) enum Deleter<T> {
    /// The object came from `Box::into_raw`
    Boxed,
    /// Plain function pointer supplied at construction
    Function(fn(*mut T)),
    /// Arbitrary destruction closure supplied at construction
    Closure(Box<dyn FnOnce(NonNull<T>) + Send>),
}

impl<T> Deleter<T> {
    /// Destroy `object`
    ///
    /// # Safety
    /// `object` must be the pointer this deleter was registered for, and no
    /// handle may dereference it afterwards.
    unsafe fn invoke(self, object: NonNull<T>) {
        match self {
            Deleter::Boxed => drop(unsafe { Box::from_raw(object.as_ptr()) }),
            Deleter::Function(delete) => delete(object.as_ptr()),
            Deleter::Closure(delete) => delete(object),
        }
    }
}

pub(crate) struct ControlBlock<T> {
    strong: AtomicUsize,
    weak: AtomicUsize,
    deleter: Mutex<Option<Deleter<T>>>,
}

impl<T> ControlBlock<T> {
    /// Allocate a block for a freshly adopted object
    ///
    /// Starts with one owner and no observers.
    pub(crate) fn allocate(deleter: Deleter<T>) -> NonNull<Self> {
        let block = Box::new(Self {
            strong: AtomicUsize::new(1),
            weak: AtomicUsize::new(1),
            deleter: Mutex::new(Some(deleter)),
        });
        let block = NonNull::from(Box::leak(block));

        stats::record_block_allocated();
        log_event(LifecycleEvent::BlockAllocated {
            block: block.as_ptr() as usize,
            type_name: std::any::type_name::<T>(),
        });

        block
    }

    /// Current number of owners
    #[inline]
    pub(crate) fn strong(&self) -> usize {
        self.strong.load(Ordering::Acquire)
    }

    /// Raw weak counter, including the owners' unit
    #[inline]
    pub(crate) fn weak(&self) -> usize {
        self.weak.load(Ordering::Acquire)
    }

    /// Current number of observers
    pub(crate) fn observers(&self) -> usize {
        let weak = self.weak();
        if weak == WEAK_LOCKED {
            // Held by `is_unique`, which only succeeds from a count of one.
            0
        } else if self.strong() > 0 {
            weak.saturating_sub(1)
        } else {
            weak
        }
    }

    #[inline]
    pub(crate) fn increment_strong(&self) {
        AtomicUtils::increment(&self.strong);
    }

    /// Add an owner only if the object is still alive
    #[inline]
    pub(crate) fn increment_strong_if_nonzero(&self) -> bool {
        AtomicUtils::increment_if_nonzero(&self.strong)
    }

    /// Add an observer derived from another observer
    #[inline]
    pub(crate) fn increment_weak(&self) {
        AtomicUtils::increment(&self.weak);
    }

    /// Add an observer derived from an owner
    ///
    /// Waits out a concurrent `is_unique` check so that no observer can
    /// appear between its two loads.
    #[inline]
    pub(crate) fn downgrade(&self) {
        AtomicUtils::increment_unless(&self.weak, WEAK_LOCKED);
    }

    /// True when the caller's owner is the only handle of any kind
    ///
    /// Briefly locks the weak counter so a concurrent `downgrade` from
    /// another owner cannot slip in between the loads.
    pub(crate) fn is_unique(&self) -> bool {
        if self
            .weak
            .compare_exchange(1, WEAK_LOCKED, Ordering::Acquire, Ordering::Relaxed)
            .is_err()
        {
            return false;
        }

        let unique = self.strong.load(Ordering::Acquire) == 1;
        self.weak.store(1, Ordering::Release);
        unique
    }

    /// Give up one owner
    ///
    /// The caller whose decrement observes the 1 -> 0 transition runs the
    /// deleter on `object` (when present) and then releases the owners'
    /// weak unit.
    ///
    /// # Safety
    /// `block` must be live and the caller must own one strong unit, which
    /// is consumed. `object` must be the pointer the deleter was
    /// registered for, or `None`.
    pub(crate) unsafe fn release_strong(block: NonNull<Self>, object: Option<NonNull<T>>) {
        let inner = unsafe { block.as_ref() };
        if inner.strong.fetch_sub(1, Ordering::Release) != 1 {
            return;
        }
        atomic::fence(Ordering::Acquire);

        // Releases the owners' weak unit even if the deleter panics.
        let _owners_unit = OwnersWeakUnit(block);

        let deleter = inner.deleter.lock().take();
        if let (Some(object), Some(deleter)) = (object, deleter) {
            unsafe { deleter.invoke(object) };

            stats::record_object_destroyed();
            log_event(LifecycleEvent::ObjectDestroyed {
                block: block.as_ptr() as usize,
                type_name: std::any::type_name::<T>(),
            });
        }
    }

    /// Give up one weak unit, freeing the block on the last one
    ///
    /// # Safety
    /// `block` must be live and the caller must own one weak unit, which is
    /// consumed. `block` must not be used afterwards.
    pub(crate) unsafe fn release_weak(block: NonNull<Self>) {
        if unsafe { block.as_ref() }.weak.fetch_sub(1, Ordering::Release) != 1 {
            return;
        }
        atomic::fence(Ordering::Acquire);

        let addr = block.as_ptr() as usize;
        drop(unsafe { Box::from_raw(block.as_ptr()) });

        stats::record_block_freed();
        log_event(LifecycleEvent::BlockFreed {
            block: addr,
            type_name: std::any::type_name::<T>(),
        });
    }
}

struct OwnersWeakUnit<T>(NonNull<ControlBlock<T>>);

impl<T> Drop for OwnersWeakUnit<T> {
    fn drop(&mut self) {
        unsafe { ControlBlock::release_weak(self.0) };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn counting_deleter(count: &Arc<AtomicUsize>) -> Deleter<u64> {
        let count = Arc::clone(count);
        Deleter::Closure(Box::new(move |ptr: NonNull<u64>| {
            count.fetch_add(1, Ordering::SeqCst);
            drop(unsafe { Box::from_raw(ptr.as_ptr()) });
        }))
    }

    #[test]
    fn test_fresh_block_counts() {
        let count = Arc::new(AtomicUsize::new(0));
        let object = NonNull::from(Box::leak(Box::new(5u64)));
        let block = ControlBlock::allocate(counting_deleter(&count));

        let inner = unsafe { block.as_ref() };
        assert_eq!(inner.strong(), 1);
        assert_eq!(inner.weak(), 1);
        assert_eq!(inner.observers(), 0);

        unsafe { ControlBlock::release_strong(block, Some(object)) };
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_observer_keeps_block_after_object() {
        let count = Arc::new(AtomicUsize::new(0));
        let object = NonNull::from(Box::leak(Box::new(9u64)));
        let block = ControlBlock::allocate(counting_deleter(&count));

        unsafe { block.as_ref() }.increment_weak();
        assert_eq!(unsafe { block.as_ref() }.observers(), 1);

        unsafe { ControlBlock::release_strong(block, Some(object)) };
        assert_eq!(count.load(Ordering::SeqCst), 1);

        let inner = unsafe { block.as_ref() };
        assert_eq!(inner.strong(), 0);
        assert_eq!(inner.observers(), 1);
        assert!(!inner.increment_strong_if_nonzero());

        unsafe { ControlBlock::release_weak(block) };
    }

    #[test]
    fn test_is_unique() {
        let count = Arc::new(AtomicUsize::new(0));
        let object = NonNull::from(Box::leak(Box::new(3u64)));
        let block = ControlBlock::allocate(counting_deleter(&count));
        let inner = unsafe { block.as_ref() };

        assert!(inner.is_unique());
        assert_eq!(inner.weak(), 1);

        inner.downgrade();
        assert!(!inner.is_unique());
        assert_eq!(inner.observers(), 1);
        unsafe { ControlBlock::release_weak(block) };

        inner.increment_strong();
        assert!(!inner.is_unique());
        unsafe { ControlBlock::release_strong(block, Some(object)) };
        assert_eq!(count.load(Ordering::SeqCst), 0);

        assert!(inner.is_unique());
        unsafe { ControlBlock::release_strong(block, Some(object)) };
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_deleter_skipped_without_object() {
        let count = Arc::new(AtomicUsize::new(0));
        let object = Box::into_raw(Box::new(1u64));
        let block = ControlBlock::allocate(counting_deleter(&count));

        unsafe { ControlBlock::release_strong(block, None) };
        assert_eq!(count.load(Ordering::SeqCst), 0);

        drop(unsafe { Box::from_raw(object) });
    }
}
