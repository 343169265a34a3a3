//! Leveled stderr logging macros
//!
//! Thread-safe, optionally-flushing diagnostic output for the synchronization
//! substrate. The pool uses this to report worker churn and contained task
//! failures without pulling a logging framework into a leaf crate.
//!
//! # Environment Variables
//!
//! - `IDX_LOG_LEVEL=<level>` - off, error, warn, info, debug, trace (or 0-5)
//! - `IDX_FLUSH_EPRINT=1` - flush stderr after each line (crash debugging)
//!
//! # Usage
//!
//! ```ignore
//! use idxsync_core::{iwarn, idebug};
//!
//! idebug!("worker {} spawned", id);
//! iwarn!("task panicked; worker continues");
//! ```

use std::io::Write;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::Once;

use crate::env::{env_get_bool, env_get_opt};

/// Log levels, ordered by verbosity.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Off = 0,
    Error = 1,
    Warn = 2,
    Info = 3,
    Debug = 4,
    Trace = 5,
}

impl LogLevel {
    fn from_u8(v: u8) -> Self {
        match v {
            0 => LogLevel::Off,
            1 => LogLevel::Error,
            2 => LogLevel::Warn,
            3 => LogLevel::Info,
            4 => LogLevel::Debug,
            _ => LogLevel::Trace,
        }
    }

    fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "off" | "0" => Some(LogLevel::Off),
            "error" | "1" => Some(LogLevel::Error),
            "warn" | "2" => Some(LogLevel::Warn),
            "info" | "3" => Some(LogLevel::Info),
            "debug" | "4" => Some(LogLevel::Debug),
            "trace" | "5" => Some(LogLevel::Trace),
            _ => None,
        }
    }

    fn prefix(self) -> &'static str {
        match self {
            LogLevel::Off => "",
            LogLevel::Error => "[ERROR]",
            LogLevel::Warn => "[WARN] ",
            LogLevel::Info => "[INFO] ",
            LogLevel::Debug => "[DEBUG]",
            LogLevel::Trace => "[TRACE]",
        }
    }
}

static LOG_LEVEL: AtomicU8 = AtomicU8::new(LogLevel::Warn as u8);
static FLUSH_ENABLED: AtomicBool = AtomicBool::new(false);
static INIT: Once = Once::new();

/// Read `IDX_LOG_LEVEL` / `IDX_FLUSH_EPRINT` once. Runs automatically on the
/// first log call; call explicitly for deterministic startup.
pub fn init() {
    INIT.call_once(|| {
        if let Some(level) = env_get_opt::<String>("IDX_LOG_LEVEL").and_then(|v| LogLevel::parse(&v))
        {
            LOG_LEVEL.store(level as u8, Ordering::Relaxed);
        }
        FLUSH_ENABLED.store(env_get_bool("IDX_FLUSH_EPRINT", false), Ordering::Relaxed);
    });
}

/// Current log level.
#[inline]
pub fn log_level() -> LogLevel {
    init();
    LogLevel::from_u8(LOG_LEVEL.load(Ordering::Relaxed))
}

/// Override the log level at runtime.
pub fn set_log_level(level: LogLevel) {
    init();
    LOG_LEVEL.store(level as u8, Ordering::Relaxed);
}

/// Override the flush-per-line behavior at runtime.
pub fn set_flush_enabled(enabled: bool) {
    init();
    FLUSH_ENABLED.store(enabled, Ordering::Relaxed);
}

/// Whether a message at `level` would currently be emitted.
#[inline]
pub fn level_enabled(level: LogLevel) -> bool {
    level as u8 <= log_level() as u8
}

/// Internal: leveled write with one stderr lock per line.
#[doc(hidden)]
pub fn _ilog_impl(level: LogLevel, args: std::fmt::Arguments<'_>) {
    if !level_enabled(level) {
        return;
    }
    let stderr = std::io::stderr();
    let mut handle = stderr.lock();
    let _ = write!(handle, "{} ", level.prefix());
    let _ = handle.write_fmt(args);
    let _ = handle.write_all(b"\n");
    if FLUSH_ENABLED.load(Ordering::Relaxed) {
        let _ = handle.flush();
    }
}

// ============================================================================
// Public Macros
// ============================================================================

/// Error level log.
#[macro_export]
macro_rules! ierror {
    ($($arg:tt)*) => {{
        $crate::iprint::_ilog_impl($crate::iprint::LogLevel::Error, format_args!($($arg)*));
    }};
}

/// Warning level log.
#[macro_export]
macro_rules! iwarn {
    ($($arg:tt)*) => {{
        $crate::iprint::_ilog_impl($crate::iprint::LogLevel::Warn, format_args!($($arg)*));
    }};
}

/// Info level log.
#[macro_export]
macro_rules! iinfo {
    ($($arg:tt)*) => {{
        $crate::iprint::_ilog_impl($crate::iprint::LogLevel::Info, format_args!($($arg)*));
    }};
}

/// Debug level log.
#[macro_export]
macro_rules! idebug {
    ($($arg:tt)*) => {{
        $crate::iprint::_ilog_impl($crate::iprint::LogLevel::Debug, format_args!($($arg)*));
    }};
}

/// Trace level log (most verbose).
#[macro_export]
macro_rules! itrace {
    ($($arg:tt)*) => {{
        $crate::iprint::_ilog_impl($crate::iprint::LogLevel::Trace, format_args!($($arg)*));
    }};
}
