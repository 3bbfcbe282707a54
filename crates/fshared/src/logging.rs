//! Lifecycle Logging and Tracing
//!
//! Records go through the `log` facade under the `fshared` target, so the
//! application's logger decides where they end up.
//!
//! Log Levels:
//! - DEBUG: Object destroyed, upgrade refused
//! - TRACE: Control block allocated or freed

use serde::Serialize;

/// Target used for every record emitted by this crate
pub const LOG_TARGET: &str = "fshared";

/// Lifecycle event types
///
/// `block` is the control block address, which identifies one managed
/// allocation across its events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LifecycleEvent {
    /// First owner created, control block allocated
    BlockAllocated { block: usize, type_name: &'static str },

    /// Last owner dropped, deleter invoked
    ObjectDestroyed { block: usize, type_name: &'static str },

    /// Last reference of any kind dropped, control block freed
    BlockFreed { block: usize, type_name: &'static str },

    /// `lock()` on an observer whose object is gone
    UpgradeFailed { block: usize, type_name: &'static str },
}

impl LifecycleEvent {
    /// Get log level for event
    pub fn level(&self) -> log::Level {
        match self {
            LifecycleEvent::ObjectDestroyed { .. } | LifecycleEvent::UpgradeFailed { .. } => {
                log::Level::Debug
            },
            LifecycleEvent::BlockAllocated { .. } | LifecycleEvent::BlockFreed { .. } => {
                log::Level::Trace
            },
        }
    }

    /// Human-readable rendering
    pub fn to_human(&self) -> String {
        match self {
            LifecycleEvent::BlockAllocated { block, type_name } => {
                format!("[fshared] block {:#x} allocated for {}", block, type_name)
            },
            LifecycleEvent::ObjectDestroyed { block, type_name } => {
                format!("[fshared] block {:#x}: {} destroyed", block, type_name)
            },
            LifecycleEvent::BlockFreed { block, type_name } => {
                format!("[fshared] block {:#x} freed ({})", block, type_name)
            },
            LifecycleEvent::UpgradeFailed { block, type_name } => {
                format!(
                    "[fshared] block {:#x}: upgrade refused, {} already destroyed",
                    block, type_name
                )
            },
        }
    }

    /// JSON rendering
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| self.to_human())
    }
}

/// Emit a lifecycle event if tracing is enabled
#[inline]
pub fn log_event(event: LifecycleEvent) {
    if !crate::config::trace_enabled() {
        return;
    }

    let level = event.level();
    if !log::log_enabled!(target: LOG_TARGET, level) {
        return;
    }

    if crate::config::json_enabled() {
        log::log!(target: LOG_TARGET, level, "{}", event.to_json());
    } else {
        log::log!(target: LOG_TARGET, level, "{}", event.to_human());
    }
}
