//! # fshared - Atomic Shared-Ownership Pointers
//!
//! fshared provides a reference-counted owning handle, [`SharedPtr`], and a
//! non-owning observer, [`WeakPtr`], over a single heap-allocated object of
//! any type.
//!
//! ## Overview
//!
//! - **Owning handle**: copies raise the strong count; the last drop runs
//!   the deleter
//! - **Observing handle**: tracks the object through the weak count and
//!   upgrades with [`WeakPtr::lock`] only while the object is alive
//! - **Control block**: one per managed object, holding both counters and
//!   the deleter; freed once neither owners nor observers remain
//! - **Custom deleters**: function pointers or closures, fixed at
//!   construction
//!
//! ## Quick Start
//!
//! ```rust
//! use fshared::{SharedPtr, WeakPtr};
//!
//! let owner = SharedPtr::new(42);
//! let observer: WeakPtr<i32> = owner.downgrade();
//!
//! let copy = observer.lock();
//! assert_eq!(*copy, 42);
//! assert_eq!(owner.use_count(), 2);
//!
//! drop(copy);
//! drop(owner);
//! assert!(observer.lock().is_null());
//! ```
//!
//! ## Layout
//!
//! ```text
//! SharedPtr ──┐             ┌──────────────────────┐
//! SharedPtr ──┼── ptr ────► │   managed object T   │
//! WeakPtr   ──┘             └──────────────────────┘
//!     │
//!     └────────── block ──► ┌──────────────────────┐
//!                           │ strong: AtomicUsize  │
//!                           │ weak:   AtomicUsize  │
//!                           │ deleter              │
//!                           └──────────────────────┘
//! ```
//!
//! ## Thread Safety
//!
//! - Both handles are `Send + Sync` when `T: Send + Sync`
//! - Every counter update is an atomic read-modify-write; exactly one
//!   thread runs the deleter and exactly one frees the control block
//! - The managed object itself is not synchronized; shared access goes
//!   through `&T`, so mutation needs interior mutability or
//!   [`SharedPtr::get_mut`]
//!
//! ## Unsafe Alternates
//!
//! [`SharedPtr::release`] and [`SharedPtr::reset_unchecked`] keep the
//! historical semantics of detaching or replacing the object pointer
//! without running the release protocol. They are `unsafe` because the
//! counts no longer describe what the handle holds. Prefer
//! [`SharedPtr::reset`] and [`SharedPtr::reset_with`].
//!
//! ## Modules
//!
//! - [`config`]: Tracing and statistics configuration
//! - [`error`]: Error types for the checked operations
//! - [`logging`]: Lifecycle events emitted through `log`
//! - [`shared`]: The owning handle
//! - [`stats`]: Process-wide lifecycle counters
//! - [`util`]: Atomic counter helpers
//! - [`weak`]: The observing handle

// Core handle modules
pub mod shared;
pub mod weak;
mod control_block;

// Ambient support
pub mod config;
pub mod error;
pub mod logging;
pub mod stats;

// Utilities
pub mod util;

// Re-export main types for convenience
pub use config::TraceConfig;
pub use error::{PtrError, Result};
pub use logging::LifecycleEvent;
pub use shared::SharedPtr;
pub use stats::RefStats;
pub use weak::WeakPtr;

/// fshared version string from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
