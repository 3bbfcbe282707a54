//! Observing Handle
//!
//! `WeakPtr<T>` shares a `SharedPtr`'s control block without keeping the
//! object alive. It only moves the weak count, and turns back into an
//! owner through [`WeakPtr::lock`], which fails once the object is gone.
//!
//! Use Cases:
//! - Caches that must not extend the lifetime of their entries
//! - Back-references from children to parents
//! - Observer lists whose subscribers can disappear

use crate::control_block::ControlBlock;
use crate::error::{PtrError, Result};
use crate::logging::{log_event, LifecycleEvent};
use crate::shared::SharedPtr;
use crate::stats;
use std::fmt;
use std::marker::PhantomData;
use std::mem;
use std::ptr::NonNull;

/// Non-owning observer of a `SharedPtr`'s object
///
/// # Examples
///
/// ```rust
/// use fshared::{SharedPtr, WeakPtr};
///
/// let owner = SharedPtr::new(String::from("cache entry"));
/// let observer = WeakPtr::from(&owner);
/// assert_eq!(observer.lock().try_get().map(String::as_str), Some("cache entry"));
///
/// drop(owner);
/// assert!(observer.expired());
/// assert!(observer.lock().is_null());
/// ```
pub struct WeakPtr<T> {
    ptr: Option<NonNull<T>>,
    block: Option<NonNull<ControlBlock<T>>>,
    _marker: PhantomData<T>,
}

unsafe impl<T: Send + Sync> Send for WeakPtr<T> {}
unsafe impl<T: Send + Sync> Sync for WeakPtr<T> {}

impl<T> WeakPtr<T> {
    /// Empty observer
    pub const fn new() -> Self {
        Self {
            ptr: None,
            block: None,
            _marker: PhantomData,
        }
    }

    fn inner(&self) -> Option<&ControlBlock<T>> {
        self.block.map(|block| unsafe { block.as_ref() })
    }

    fn release_current(&mut self) {
        self.ptr = None;
        if let Some(block) = self.block.take() {
            unsafe { ControlBlock::release_weak(block) };
        }
    }

    /// Number of owners of the observed object, 0 when empty
    ///
    /// Counts strong references, not observers; see [`WeakPtr::weak_count`].
    pub fn use_count(&self) -> usize {
        self.inner().map_or(0, ControlBlock::strong)
    }

    /// Number of observers, including this one, 0 when empty
    pub fn weak_count(&self) -> usize {
        self.inner().map_or(0, ControlBlock::observers)
    }

    /// True when empty or when the object has been destroyed
    pub fn expired(&self) -> bool {
        self.use_count() == 0
    }

    /// True when the handle observes nothing
    pub fn is_null(&self) -> bool {
        self.block.is_none()
    }

    /// Try to become an owner of the object
    ///
    /// Succeeds only while at least one owner is still alive; otherwise, or
    /// when empty, the returned handle is empty.
    pub fn lock(&self) -> SharedPtr<T> {
        let (Some(ptr), Some(block)) = (self.ptr, self.block) else {
            return SharedPtr::empty();
        };

        if unsafe { block.as_ref() }.increment_strong_if_nonzero() {
            return unsafe { SharedPtr::from_parts(ptr, block) };
        }

        stats::record_upgrade_failed();
        log_event(LifecycleEvent::UpgradeFailed {
            block: block.as_ptr() as usize,
            type_name: std::any::type_name::<T>(),
        });
        SharedPtr::empty()
    }

    /// Checked form of [`WeakPtr::lock`]
    pub fn upgrade(&self) -> Result<SharedPtr<T>> {
        if self.is_null() {
            return Err(PtrError::Empty);
        }

        let owner = self.lock();
        if owner.is_null() {
            Err(PtrError::Expired)
        } else {
            Ok(owner)
        }
    }

    /// Stop observing and become empty
    pub fn reset(&mut self) {
        self.release_current();
    }

    /// Leave an empty observer in place and return the previous contents
    pub fn take(&mut self) -> Self {
        mem::take(self)
    }

    /// True when both observers share one control block
    pub fn ptr_eq(this: &Self, other: &Self) -> bool {
        this.block == other.block
    }
}

impl<T> From<&SharedPtr<T>> for WeakPtr<T> {
    fn from(owner: &SharedPtr<T>) -> Self {
        let (Some(ptr), Some(block)) = (owner.ptr(), owner.block()) else {
            return Self::new();
        };

        unsafe { block.as_ref() }.downgrade();
        Self {
            ptr: Some(ptr),
            block: Some(block),
            _marker: PhantomData,
        }
    }
}

impl<T> Clone for WeakPtr<T> {
    fn clone(&self) -> Self {
        if let Some(inner) = self.inner() {
            inner.increment_weak();
        }

        Self {
            ptr: self.ptr,
            block: self.block,
            _marker: PhantomData,
        }
    }

    /// Copy-assign
    ///
    /// Same four cases as `SharedPtr::clone_from`, applied to the weak
    /// count. Never touches the object or its deleter.
    fn clone_from(&mut self, source: &Self) {
        if self.block == source.block {
            return;
        }

        self.release_current();
        if let Some(inner) = source.inner() {
            inner.increment_weak();
        }
        self.ptr = source.ptr;
        self.block = source.block;
    }
}

impl<T> Drop for WeakPtr<T> {
    fn drop(&mut self) {
        self.release_current();
    }
}

impl<T> Default for WeakPtr<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for WeakPtr<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WeakPtr")
            .field("use_count", &self.use_count())
            .field("weak_count", &self.weak_count())
            .field("expired", &self.expired())
            .finish()
    }
}
