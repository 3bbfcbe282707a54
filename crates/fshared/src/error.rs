//! Error Module - fshared Error Types
//!
//! The handle operations themselves are total: copying, dropping and
//! `lock()` never fail. The errors below come from the checked companions
//! (`try_from_raw`, `get_mut`, `upgrade`) that report what the unchecked
//! forms would silently turn into an empty handle.
//!
//! # Error Categories
//!
//! ## Pointer Errors
//! - `NullPointer` - Null passed where an object was required
//! - `Empty` - Handle holds no object
//!
//! ## Lifetime Errors
//! - `Expired` - Managed object already destroyed
//! - `NotUnique` - Exclusive access requested on a shared object

use thiserror::Error;

/// Main error type for all checked fshared operations
///
/// # Examples
///
/// ```rust
/// use fshared::{PtrError, SharedPtr, WeakPtr};
///
/// let weak: WeakPtr<u32> = {
///     let owner = SharedPtr::new(7);
///     owner.downgrade()
/// };
///
/// match weak.upgrade() {
///     Err(PtrError::Expired) => {}
///     other => panic!("expected expiry, got {:?}", other),
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PtrError {
    /// Null pointer passed to a checked constructor
    ///
    /// **When returned:** `SharedPtr::try_from_raw(null)`
    ///
    /// **Recovery strategy:** Use `from_raw` if an empty handle is acceptable
    #[error("Null pointer: a non-null object pointer is required")]
    NullPointer,

    /// Handle is empty
    ///
    /// **When returned:** `get_mut` or `upgrade` on a handle that never held
    /// an object, or one that was reset
    #[error("Handle is empty")]
    Empty,

    /// Managed object already destroyed
    ///
    /// **When returned:** `WeakPtr::upgrade` after the last owner dropped
    ///
    /// **Recovery strategy:** Recreate the object; the observer can be reset
    #[error("Managed object already destroyed")]
    Expired,

    /// Object is shared
    ///
    /// **When returned:** `SharedPtr::get_mut` while other owners or
    /// observers exist
    ///
    /// **Recovery strategy:** Drop the other handles, or clone the value
    #[error("Object is not uniquely owned: {strong} owners, {weak} observers")]
    NotUnique { strong: usize, weak: usize },
}

impl PtrError {
    /// Check if retrying later can succeed
    ///
    /// `NotUnique` clears once the other handles go away. The rest describe
    /// a state that will not change by itself.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, PtrError::NotUnique { .. })
    }
}

/// Result type alias for fshared operations
pub type Result<T> = std::result::Result<T, PtrError>;
