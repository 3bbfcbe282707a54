//! Lifecycle Statistics
//!
//! Process-wide counters for the events that cross a zero boundary:
//! control blocks allocated and freed, managed objects destroyed, and
//! upgrades refused because the object was already gone. Plain copies and
//! drops are not counted.
//!
//! Counting can be switched off with [`crate::TraceConfig::stats`].

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

static BLOCKS_ALLOCATED: AtomicU64 = AtomicU64::new(0);
static BLOCKS_FREED: AtomicU64 = AtomicU64::new(0);
static OBJECTS_DESTROYED: AtomicU64 = AtomicU64::new(0);
static UPGRADES_FAILED: AtomicU64 = AtomicU64::new(0);

/// Snapshot of the lifecycle counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RefStats {
    pub blocks_allocated: u64,
    pub blocks_freed: u64,
    pub objects_destroyed: u64,
    pub upgrades_failed: u64,
}

impl RefStats {
    /// Control blocks allocated but not yet freed
    pub fn live_blocks(&self) -> u64 {
        self.blocks_allocated.saturating_sub(self.blocks_freed)
    }

    /// Export as a JSON object
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }
}

/// Read all counters
///
/// Each counter is read independently, so a snapshot taken while other
/// threads allocate or free is only approximately consistent.
pub fn snapshot() -> RefStats {
    RefStats {
        blocks_allocated: BLOCKS_ALLOCATED.load(Ordering::Relaxed),
        blocks_freed: BLOCKS_FREED.load(Ordering::Relaxed),
        objects_destroyed: OBJECTS_DESTROYED.load(Ordering::Relaxed),
        upgrades_failed: UPGRADES_FAILED.load(Ordering::Relaxed),
    }
}

/// Zero all counters
pub fn reset() {
    BLOCKS_ALLOCATED.store(0, Ordering::Relaxed);
    BLOCKS_FREED.store(0, Ordering::Relaxed);
    OBJECTS_DESTROYED.store(0, Ordering::Relaxed);
    UPGRADES_FAILED.store(0, Ordering::Relaxed);
}

#[inline]
fn bump(counter: &AtomicU64) {
    if crate::config::stats_enabled() {
        counter.fetch_add(1, Ordering::Relaxed);
    }
}

pub(crate) fn record_block_allocated() {
    bump(&BLOCKS_ALLOCATED);
}

pub(crate) fn record_block_freed() {
    bump(&BLOCKS_FREED);
}

pub(crate) fn record_object_destroyed() {
    bump(&OBJECTS_DESTROYED);
}

pub(crate) fn record_upgrade_failed() {
    bump(&UPGRADES_FAILED);
}
