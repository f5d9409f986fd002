// SPDX-License-Identifier: MIT

//! The application-level TaskTonic log stream: a pluggable
//! [`LoggerCollector`] sink distinct from `tracing`'s ambient diagnostic
//! logging (see [`crate::tracing_init`]). Grounded in
//! `original_source/TaskTonic/ttLogger.py`'s `ttLog` level enum and
//! `ttEssence.py`'s `_log_full`/`_log_quiet`/`_log_off` entry-building.

use serde_json::{Map, Value};
use std::time::Duration;
use tasktonic_ledger::EntityId;

/// Logging verbosity, ordered exactly as `ttLog`'s `IntEnum` (`STEALTH=0` ..
/// `FULL=3`): each level is a strict superset of the one before it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(i32)]
pub enum LogLevel {
    /// No logging at all — forced onto the logger service itself to avoid
    /// the bootstrap cycle (spec.md §9, "Logger as a service").
    Stealth = 0,
    /// Lifecycle only: entity creation and finish.
    Off = 1,
    /// Lifecycle plus sparkles, but only entries that actually logged a line.
    Quiet = 2,
    /// Lifecycle plus every sparkle, unconditionally.
    Full = 3,
}

impl LogLevel {
    /// Parses a level from a Formula string value, case-insensitively.
    /// Mirrors `ttLog.from_any`'s string branch.
    pub fn from_str_loose(value: &str) -> Option<Self> {
        match value.to_ascii_uppercase().as_str() {
            "STEALTH" => Some(Self::Stealth),
            "OFF" => Some(Self::Off),
            "QUIET" => Some(Self::Quiet),
            "FULL" => Some(Self::Full),
            _ => None,
        }
    }

    /// Parses a level from its ordinal, mirroring `ttLog.from_any`'s int branch.
    pub fn from_i32(value: i32) -> Option<Self> {
        match value {
            0 => Some(Self::Stealth),
            1 => Some(Self::Off),
            2 => Some(Self::Quiet),
            3 => Some(Self::Full),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Stealth => "stealth",
            Self::Off => "off",
            Self::Quiet => "quiet",
            Self::Full => "full",
        }
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One completed log entry, the typed port of the dict `ttEssence._log_push`
/// hands to `logger.put_log(log)` (spec.md §6, "Logger collector contract").
#[derive(Debug, Clone, PartialEq)]
pub struct LogRecord {
    pub id: EntityId,
    pub start_timestamp: u64,
    pub duration: Option<Duration>,
    pub log: Vec<String>,
    pub sys: Map<String, Value>,
}

impl LogRecord {
    pub fn new(id: EntityId, start_timestamp: u64) -> Self {
        Self { id, start_timestamp, duration: None, log: Vec::new(), sys: Map::new() }
    }
}

/// The pluggable sink a logger service tonic forwards completed
/// [`LogRecord`]s to. Spec.md §6 specifies only this single-method contract
/// and treats output formatting as external; see `crate` docs for why one
/// concrete implementation ([`ScreenCollector`]) is still provided here.
pub trait LoggerCollector: Send + Sync {
    fn put_log(&self, record: &LogRecord);
}

/// Formats each [`LogRecord`] as one summary line plus indented log lines to
/// stdout. Grounded in `original_source/TaskTonic/ttLoggers/ttScreenLogger.py`
/// (the file as retrieved is truncated mid-definition; the summary-line +
/// indented-body shape below follows the same fields `_log_push` hands the
/// original collector: `id`, `start@`, `duration`, `log`, `sys`).
#[derive(Debug, Default)]
pub struct ScreenCollector;

impl ScreenCollector {
    pub fn new() -> Self {
        Self
    }
}

impl LoggerCollector for ScreenCollector {
    fn put_log(&self, record: &LogRecord) {
        let duration = record.duration.map(|d| format!("{:.3}s", d.as_secs_f64())).unwrap_or_else(|| "-".to_string());
        println!("[{}] entity={} duration={}", record.start_timestamp, record.id, duration);
        for flag in &record.sys {
            println!("  sys.{}={}", flag.0, flag.1);
        }
        for line in &record.log {
            println!("  {line}");
        }
    }
}

#[cfg(test)]
#[path = "log_tests.rs"]
mod tests;
