//! Configuration Module - Lifecycle Tracing Parameters
//!
//! The pointer types have no tuning knobs. What is configurable is how much
//! the library reports about itself: lifecycle tracing through `log`, the
//! output format of those traces, and the process-wide counters in
//! [`crate::stats`].
//!
//! The installed configuration lives in a global. The flags consulted on
//! hot paths are mirrored into atomics so a disabled tracer costs one
//! relaxed load.

use parking_lot::RwLock;
use std::sync::atomic::{AtomicBool, Ordering};

/// Tracing and statistics configuration
///
/// # Examples
///
/// ```rust
/// use fshared::TraceConfig;
///
/// // Trace block allocation and teardown as JSON
/// let config = TraceConfig {
///     trace: true,
///     json: true,
///     ..Default::default()
/// };
/// fshared::config::install(config);
/// # fshared::config::install(TraceConfig::default());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraceConfig {
    /// Emit a `log` record for every lifecycle event
    ///
    /// Events are block allocation, object destruction, block
    /// deallocation and failed upgrades. Copies and drops that do not
    /// cross a zero boundary are never traced.
    ///
    /// Default: false
    pub trace: bool,

    /// Render traced events as JSON instead of a human-readable line
    ///
    /// Default: false
    pub json: bool,

    /// Maintain the process-wide counters in [`crate::stats`]
    ///
    /// Default: true
    pub stats: bool,
}

impl Default for TraceConfig {
    fn default() -> Self {
        Self {
            trace: false,
            json: false,
            stats: true,
        }
    }
}

impl TraceConfig {
    /// Build configuration from environment variables
    ///
    /// Overrides defaults with environment variables:
    /// - FSHARED_TRACE
    /// - FSHARED_TRACE_JSON
    /// - FSHARED_STATS
    ///
    /// Unrecognized values are ignored with a warning.
    ///
    /// # Examples
    ///
    /// ```bash
    /// export FSHARED_TRACE=1
    /// export FSHARED_TRACE_JSON=true
    /// export FSHARED_STATS=0
    /// ```
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Some(value) = env_flag("FSHARED_TRACE") {
            config.trace = value;
        }

        if let Some(value) = env_flag("FSHARED_TRACE_JSON") {
            config.json = value;
        }

        if let Some(value) = env_flag("FSHARED_STATS") {
            config.stats = value;
        }

        config
    }
}

fn env_flag(name: &str) -> Option<bool> {
    let raw = std::env::var(name).ok()?;
    match parse_flag(&raw) {
        Some(value) => Some(value),
        None => {
            log::warn!("ignoring {}={:?}: expected 1/0/true/false", name, raw);
            None
        },
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    let raw = raw.trim();
    if raw == "1" || raw.eq_ignore_ascii_case("true") {
        Some(true)
    } else if raw == "0" || raw.eq_ignore_ascii_case("false") {
        Some(false)
    } else {
        None
    }
}

lazy_static::lazy_static! {
    static ref GLOBAL_CONFIG: RwLock<TraceConfig> = RwLock::new(TraceConfig::default());
}

static TRACE_ENABLED: AtomicBool = AtomicBool::new(false);
static JSON_ENABLED: AtomicBool = AtomicBool::new(false);
static STATS_ENABLED: AtomicBool = AtomicBool::new(true);

/// Install a configuration for the whole process
///
/// Takes effect for events raised after the call returns.
pub fn install(config: TraceConfig) {
    let mut global = GLOBAL_CONFIG.write();
    TRACE_ENABLED.store(config.trace, Ordering::Relaxed);
    JSON_ENABLED.store(config.json, Ordering::Relaxed);
    STATS_ENABLED.store(config.stats, Ordering::Relaxed);
    *global = config;
}

/// Install the configuration described by the environment
pub fn install_from_env() {
    install(TraceConfig::from_env());
}

/// Currently installed configuration
pub fn current() -> TraceConfig {
    GLOBAL_CONFIG.read().clone()
}

#[inline]
pub(crate) fn trace_enabled() -> bool {
    TRACE_ENABLED.load(Ordering::Relaxed)
}

#[inline]
pub(crate) fn json_enabled() -> bool {
    JSON_ENABLED.load(Ordering::Relaxed)
}

#[inline]
pub(crate) fn stats_enabled() -> bool {
    STATS_ENABLED.load(Ordering::Relaxed)
}
