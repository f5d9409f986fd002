// SPDX-License-Identifier: MIT

//! Seeds for the ledger's [`tasktonic_ledger::Ledger::formula`] Store, read
//! at bootstrap (spec.md §6 "Formula keys"). Grounded in
//! `original_source/TaskTonic/ttFormula.py`'s constructor, which hardcodes
//! `tasktonic/log/to = screen` before applying any user overrides.

use crate::error::RuntimeError;
use serde::Deserialize;
use tasktonic_ledger::formula_keys;
use tasktonic_ledger::Ledger;

/// User-facing overrides applied on top of the built-in defaults during
/// bootstrap step 3 (spec.md §6, "apply user formula overrides"). The
/// original has no file format of its own; `toml` is this expansion's
/// natural, idiomatic supplement for a Rust CLI entry point (SPEC_FULL.md
/// §1).
#[derive(Debug, Clone, Deserialize, Default)]
pub struct RuntimeConfig {
    #[serde(default)]
    pub project_name: Option<String>,
    /// `"screen"`, `"off"`, or a custom log-service name registered under
    /// `tasktonic/log/service#<n>`.
    #[serde(default)]
    pub log_to: Option<String>,
    /// One of `stealth`, `off`, `quiet`, `full`.
    #[serde(default)]
    pub log_default: Option<String>,
    /// Test-harness hook (spec.md §6): when set, the bootstrap sequence
    /// skips spawning worker-catalyst threads so a test can drive dispatch
    /// manually via `Catalyst::loop_body_once`.
    #[serde(default)]
    pub dont_start_catalysts: bool,
}

impl RuntimeConfig {
    /// Parses a `RuntimeConfig` from a TOML document.
    pub fn from_toml_str(text: &str) -> Result<Self, RuntimeError> {
        toml::from_str(text).map_err(RuntimeError::InvalidConfig)
    }

    /// Bootstrap step 2 ("install default formula"): the built-in defaults,
    /// independent of any user config — `ttFormula.py`'s hardcoded
    /// `tasktonic/log/to = screen` plus this expansion's own default log
    /// level and test-mode switch.
    pub(crate) fn install_defaults(ledger: &Ledger) -> Result<(), RuntimeError> {
        ledger
            .update_formula(formula_keys::PROJECT_STATUS, serde_json::json!("starting"))
            .map_err(RuntimeError::Formula)?;
        ledger
            .update_formula(formula_keys::LOG_TO, serde_json::json!("screen"))
            .map_err(RuntimeError::Formula)?;
        ledger
            .update_formula(formula_keys::LOG_DEFAULT, serde_json::json!("off"))
            .map_err(RuntimeError::Formula)?;
        ledger
            .update_formula(formula_keys::TESTING_DONT_START_CATALYSTS, serde_json::json!(false))
            .map_err(RuntimeError::Formula)?;
        Ok(())
    }

    /// Bootstrap step 3 ("apply user formula overrides"): layers this
    /// config's non-default fields on top of [`RuntimeConfig::install_defaults`].
    pub(crate) fn apply_overrides(&self, ledger: &Ledger) -> Result<(), RuntimeError> {
        if let Some(name) = &self.project_name {
            ledger
                .update_formula(formula_keys::PROJECT_NAME, serde_json::json!(name))
                .map_err(RuntimeError::Formula)?;
        }
        if let Some(log_to) = &self.log_to {
            ledger
                .update_formula(formula_keys::LOG_TO, serde_json::json!(log_to))
                .map_err(RuntimeError::Formula)?;
        }
        if let Some(log_default) = &self.log_default {
            ledger
                .update_formula(formula_keys::LOG_DEFAULT, serde_json::json!(log_default))
                .map_err(RuntimeError::Formula)?;
        }
        if self.dont_start_catalysts {
            ledger
                .update_formula(formula_keys::TESTING_DONT_START_CATALYSTS, serde_json::json!(true))
                .map_err(RuntimeError::Formula)?;
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
