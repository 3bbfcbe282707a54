//! Util Module - Shared Utilities
//!
//! Counter helpers used by the control block.

pub mod atomic;

pub use atomic::AtomicUtils;

/// Constants for reference counting
pub mod constants {
    /// Highest count a handle may produce before the process aborts
    ///
    /// Leaves headroom below `usize::MAX` so racing increments past the
    /// check cannot wrap the counter to zero.
    pub const MAX_REFCOUNT: usize = isize::MAX as usize;

    /// Sentinel stored in the weak counter while uniqueness is checked
    pub const WEAK_LOCKED: usize = usize::MAX;
}
