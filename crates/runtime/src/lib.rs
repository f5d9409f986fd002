// SPDX-License-Identifier: MIT

#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
#![cfg_attr(test, allow(clippy::panic))]

//! tasktonic-runtime: the peripheral bootstrap crate.
//!
//! Owns the `Formula` startup sequence (spec.md §6), ambient `tracing`
//! diagnostics, and the application-level [`LoggerCollector`] log stream —
//! none of which the four kernel crates (`tasktonic-ledger`,
//! `tasktonic-store`, `tasktonic-catalyst`, `tasktonic-tonic`) know
//! anything about. This crate depends on all four; none of them depend on
//! it.

mod bootstrap;
mod config;
mod error;
mod log;
mod tracing_init;

pub use bootstrap::Runtime;
pub use config::RuntimeConfig;
pub use error::RuntimeError;
pub use log::{LogLevel, LogRecord, LoggerCollector, ScreenCollector};
pub use tracing_init::{init_file_logging, init_stderr_logging};
