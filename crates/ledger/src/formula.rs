// SPDX-License-Identifier: MIT

//! Well-known [`crate::Ledger::formula`] paths, mirroring the keys read by
//! `original_source/TaskTonic/ttEssence.py` and `ttFormula.py` (log routing,
//! project identity, test-mode switches). Kept as named constants instead of
//! parsed through the formula store reflectively, since the bootstrap
//! sequence (spec.md §6) wires these up explicitly.

/// Human-readable project name, surfaced in diagnostics.
pub const PROJECT_NAME: &str = "tasktonic/project/name";

/// Free-form project status string, for external dashboards.
pub const PROJECT_STATUS: &str = "tasktonic/project/status";

/// Which log collector service the main catalyst should start
/// (`"screen"`, `"off"`, or a custom service name registered under
/// `tasktonic/log/service#<n>`).
pub const LOG_TO: &str = "tasktonic/log/to";

/// Default [`LogLevel`](tasktonic-runtime) name for entities that don't set
/// their own.
pub const LOG_DEFAULT: &str = "tasktonic/log/default";

/// When set truthy, the bootstrap sequence skips starting catalyst worker
/// threads — used by integration tests that drive dispatch manually via
/// `Catalyst::loop_body_once`.
pub const TESTING_DONT_START_CATALYSTS: &str = "tasktonic/testing/dont_start_catalysts";

/// Path for the `n`th registered log service descriptor
/// (`tasktonic/log/service#<n>`).
pub fn log_service(n: usize) -> String {
    format!("tasktonic/log/service#{n}")
}
