//! Owning Handle
//!
//! `SharedPtr<T>` keeps the managed object alive. Every copy adds one to
//! the strong count, every drop removes one, and the drop that takes the
//! count to zero runs the deleter.
//!
//! The handle stores the object pointer next to the control block pointer
//! rather than inside the block. The deleter is invoked on the pointer
//! held by the last owner, which is what gives `release` its documented
//! semantics.

use crate::control_block::{ControlBlock, Deleter};
use crate::error::{PtrError, Result};
use crate::weak::WeakPtr;
use std::fmt;
use std::marker::PhantomData;
use std::mem;
use std::ops::Deref;
use std::ptr::{self, NonNull};

/// Reference-counted owning handle
///
/// # Examples
///
/// ```rust
/// use fshared::SharedPtr;
///
/// let first = SharedPtr::new(42);
/// let second = first.clone();
/// assert_eq!(first.use_count(), 2);
///
/// drop(first);
/// assert_eq!(second.use_count(), 1);
/// assert_eq!(*second, 42);
/// ```
pub struct SharedPtr<T> {
    ptr: Option<NonNull<T>>,
    block: Option<NonNull<ControlBlock<T>>>,
    _marker: PhantomData<T>,
}

unsafe impl<T: Send + Sync> Send for SharedPtr<T> {}
unsafe impl<T: Send + Sync> Sync for SharedPtr<T> {}

impl<T> SharedPtr<T> {
    /// Empty handle: no object, no control block
    pub const fn empty() -> Self {
        Self {
            ptr: None,
            block: None,
            _marker: PhantomData,
        }
    }

    /// Move `value` to the heap and take ownership of it
    pub fn new(value: T) -> Self {
        let ptr = NonNull::from(Box::leak(Box::new(value)));
        Self::adopt(ptr, Deleter::Boxed)
    }

    /// Take ownership of a raw pointer
    ///
    /// A null pointer yields an empty handle and allocates nothing.
    ///
    /// # Safety
    /// A non-null `ptr` must come from `Box::into_raw` and must not be owned
    /// by anything else.
    pub unsafe fn from_raw(ptr: *mut T) -> Self {
        match NonNull::new(ptr) {
            Some(ptr) => Self::adopt(ptr, Deleter::Boxed),
            None => Self::empty(),
        }
    }

    /// Take ownership of a raw pointer destroyed by `deleter`
    ///
    /// `deleter` runs exactly once, after the last owner is gone. For a null
    /// pointer it is never called.
    ///
    /// # Safety
    /// A non-null `ptr` must be valid for reads until `deleter` runs, and
    /// `deleter` must be a correct way to destroy it.
    pub unsafe fn from_raw_with_deleter(ptr: *mut T, deleter: fn(*mut T)) -> Self {
        match NonNull::new(ptr) {
            Some(ptr) => Self::adopt(ptr, Deleter::Function(deleter)),
            None => Self::empty(),
        }
    }

    /// Take ownership of a raw pointer destroyed by a closure
    ///
    /// # Safety
    /// Same contract as [`SharedPtr::from_raw_with_deleter`].
    pub unsafe fn from_raw_with<F>(ptr: *mut T, deleter: F) -> Self
    where
        F: FnOnce(NonNull<T>) + Send + 'static,
    {
        match NonNull::new(ptr) {
            Some(ptr) => Self::adopt(ptr, Deleter::Closure(Box::new(deleter))),
            None => Self::empty(),
        }
    }

    /// Checked form of [`SharedPtr::from_raw`]
    ///
    /// # Safety
    /// Same contract as [`SharedPtr::from_raw`].
    pub unsafe fn try_from_raw(ptr: *mut T) -> Result<Self> {
        match NonNull::new(ptr) {
            Some(ptr) => Ok(Self::adopt(ptr, Deleter::Boxed)),
            None => Err(PtrError::NullPointer),
        }
    }

    fn adopt(ptr: NonNull<T>, deleter: Deleter<T>) -> Self {
        Self {
            ptr: Some(ptr),
            block: Some(ControlBlock::allocate(deleter)),
            _marker: PhantomData,
        }
    }

    /// Wrap pointers whose strong unit the caller already holds
    pub(crate) unsafe fn from_parts(ptr: NonNull<T>, block: NonNull<ControlBlock<T>>) -> Self {
        Self {
            ptr: Some(ptr),
            block: Some(block),
            _marker: PhantomData,
        }
    }

    pub(crate) fn ptr(&self) -> Option<NonNull<T>> {
        self.ptr
    }

    pub(crate) fn block(&self) -> Option<NonNull<ControlBlock<T>>> {
        self.block
    }

    fn inner(&self) -> Option<&ControlBlock<T>> {
        self.block.map(|block| unsafe { block.as_ref() })
    }

    /// Run the release protocol on the current target and become empty
    fn release_current(&mut self) {
        let ptr = self.ptr.take();
        if let Some(block) = self.block.take() {
            unsafe { ControlBlock::release_strong(block, ptr) };
        }
    }

    /// Number of owners sharing the object, 0 when empty
    ///
    /// Advisory: other threads may change it right after it is read.
    pub fn use_count(&self) -> usize {
        self.inner().map_or(0, ControlBlock::strong)
    }

    /// Number of observers of the object, 0 when empty
    pub fn weak_count(&self) -> usize {
        self.inner().map_or(0, ControlBlock::observers)
    }

    /// True when the handle holds no object
    pub fn is_null(&self) -> bool {
        self.ptr.is_none()
    }

    /// Raw object pointer, null when empty
    pub fn get(&self) -> *mut T {
        self.ptr.map_or(ptr::null_mut(), NonNull::as_ptr)
    }

    /// Shared reference to the object, `None` when empty
    ///
    /// Non-panicking counterpart of `Deref`.
    pub fn try_get(&self) -> Option<&T> {
        self.ptr.map(|ptr| unsafe { &*ptr.as_ptr() })
    }

    /// Exclusive reference to the object
    ///
    /// Only succeeds while this handle is the single owner and no observer
    /// exists, so nothing else can reach the object for the duration of
    /// the borrow.
    pub fn get_mut(&mut self) -> Result<&mut T> {
        let (Some(ptr), Some(inner)) = (self.ptr, self.inner()) else {
            return Err(PtrError::Empty);
        };

        if !inner.is_unique() {
            return Err(PtrError::NotUnique {
                strong: inner.strong(),
                weak: inner.observers(),
            });
        }

        Ok(unsafe { &mut *ptr.as_ptr() })
    }

    /// True when both handles point at the same object
    pub fn ptr_eq(this: &Self, other: &Self) -> bool {
        this.ptr == other.ptr
    }

    /// Create an observer of this handle's object
    pub fn downgrade(&self) -> WeakPtr<T> {
        WeakPtr::from(self)
    }

    /// Leave an empty handle in place and return the previous contents
    pub fn take(&mut self) -> Self {
        mem::take(self)
    }

    /// Move-assign from `source`
    ///
    /// Same cases as `clone_from`, but `source` is emptied instead of the
    /// count being raised. When both already point at the same object
    /// neither handle changes.
    pub fn move_assign(&mut self, source: &mut Self) {
        if self.ptr == source.ptr {
            return;
        }

        self.release_current();
        self.ptr = source.ptr.take();
        self.block = source.block.take();
    }

    /// Give up this owner's reference and become empty
    pub fn reset(&mut self) {
        self.release_current();
    }

    /// Give up this owner's reference and take ownership of `ptr`
    ///
    /// # Safety
    /// Same contract as [`SharedPtr::from_raw`].
    pub unsafe fn reset_with(&mut self, ptr: *mut T) {
        self.release_current();
        *self = unsafe { Self::from_raw(ptr) };
    }

    /// Detach the object pointer without touching the counts
    ///
    /// The handle keeps its control block and its strong unit, which it
    /// still gives up on drop; if it is the last owner at that point no
    /// deleter runs. Every other owner still points at the object and
    /// will run the deleter if it drops last.
    ///
    /// # Safety
    /// The caller takes on destroying the object, and must do so only when
    /// no remaining owner can also destroy or dereference it.
    pub unsafe fn release(&mut self) -> *mut T {
        self.ptr.take().map_or(ptr::null_mut(), NonNull::as_ptr)
    }

    /// Destroy the current object directly and store `ptr` in its place
    ///
    /// The current object is dropped as a `Box<T>` straight away, without
    /// consulting the counts or the custom deleter. The control block is
    /// kept and will later be applied to `ptr`. A handle without a block
    /// gets a fresh one, so a non-null `ptr` is always owned.
    ///
    /// # Safety
    /// The current object must have come from `Box::into_raw` and no other
    /// owner may use it again. A non-null `ptr` must satisfy
    /// [`SharedPtr::from_raw`], and if the block carries a custom deleter,
    /// that deleter must be able to destroy `ptr` too.
    pub unsafe fn reset_unchecked(&mut self, ptr: *mut T) {
        if let Some(old) = self.ptr.take() {
            drop(unsafe { Box::from_raw(old.as_ptr()) });
        }

        let ptr = NonNull::new(ptr);
        if ptr.is_some() && self.block.is_none() {
            self.block = Some(ControlBlock::allocate(Deleter::Boxed));
        }
        self.ptr = ptr;
    }
}

impl<T> Clone for SharedPtr<T> {
    fn clone(&self) -> Self {
        if let Some(inner) = self.inner() {
            inner.increment_strong();
        }

        Self {
            ptr: self.ptr,
            block: self.block,
            _marker: PhantomData,
        }
    }

    /// Copy-assign
    ///
    /// - Both empty or same object: nothing happens
    /// - Self empty: adopt `source`, one more owner
    /// - `source` empty: release self, become empty
    /// - Different objects: release self, then adopt `source`
    fn clone_from(&mut self, source: &Self) {
        if self.ptr == source.ptr {
            return;
        }

        self.release_current();
        if let Some(inner) = source.inner() {
            inner.increment_strong();
        }
        self.ptr = source.ptr;
        self.block = source.block;
    }
}

impl<T> Drop for SharedPtr<T> {
    fn drop(&mut self) {
        self.release_current();
    }
}

impl<T> Default for SharedPtr<T> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<T> Deref for SharedPtr<T> {
    type Target = T;

    fn deref(&self) -> &T {
        match self.ptr {
            Some(ptr) => unsafe { &*ptr.as_ptr() },
            None => panic!("dereferenced an empty SharedPtr<{}>", std::any::type_name::<T>()),
        }
    }
}

impl<T> From<Box<T>> for SharedPtr<T> {
    fn from(value: Box<T>) -> Self {
        Self::adopt(NonNull::from(Box::leak(value)), Deleter::Boxed)
    }
}

impl<T> PartialEq for SharedPtr<T> {
    fn eq(&self, other: &Self) -> bool {
        Self::ptr_eq(self, other)
    }
}

impl<T> Eq for SharedPtr<T> {}

impl<T: fmt::Debug> fmt::Debug for SharedPtr<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SharedPtr")
            .field("value", &self.try_get())
            .field("use_count", &self.use_count())
            .field("weak_count", &self.weak_count())
            .finish()
    }
}

impl<T> fmt::Pointer for SharedPtr<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Pointer::fmt(&self.get(), f)
    }
}
