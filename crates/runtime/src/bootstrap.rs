// SPDX-License-Identifier: MIT

//! Assembles the four kernel crates per spec.md §6's nine-step startup
//! ordering. Grounded in `original_source/TaskTonic/ttFormula.py`'s
//! constructor (install defaults, then apply overrides, then hand off to
//! the rest of bootstrap) and `ttEssence.py`'s "logger is itself a service,
//! started before ordinary tonics" framing.

use crate::config::RuntimeConfig;
use crate::error::RuntimeError;
use crate::log::{LoggerCollector, ScreenCollector};
use parking_lot::Mutex;
use std::sync::Arc;
use std::thread::JoinHandle;
use tasktonic_catalyst::{Catalyst, SystemClock};
use tasktonic_ledger::{formula_keys, Ledger};

/// A fully assembled instance of Ledger + Catalyst(s), wired up per the
/// nine ordering steps named in spec.md §6 / SPEC_FULL.md §6. Tonic
/// construction (step 6, "create user's starting tonics") is the caller's
/// responsibility — this type has no opinion on what tonics an application
/// needs, only on the order in which the kernel crates come up around them.
pub struct Runtime {
    ledger: &'static Ledger,
    main_catalyst: Arc<Catalyst<SystemClock>>,
    worker_catalysts: Vec<Arc<Catalyst<SystemClock>>>,
    worker_threads: Mutex<Vec<JoinHandle<()>>>,
    logger: Option<Arc<dyn LoggerCollector>>,
}

impl Runtime {
    /// Step 4: claims the main catalyst's well-known id (0) via
    /// [`Ledger::reserve_fixed`]/[`Ledger::claim_fixed`] so later steps can
    /// enqueue onto it before the rest of bootstrap completes, and so any
    /// tonic can name it by a stable id regardless of registration order.
    fn create_main_catalyst(ledger: &'static Ledger) -> Result<Arc<Catalyst<SystemClock>>, RuntimeError> {
        let reserved = ledger.reserve_fixed("MainCatalyst");
        let id = ledger.claim_fixed(reserved, "Catalyst", Some("00.MainCatalyst".to_string()))?;
        Ok(Arc::new(Catalyst::new(id)))
    }

    /// Step 5: resolves which [`LoggerCollector`] should receive completed
    /// log entries, per `tasktonic/log/to`. `"off"` (or the key being
    /// unset) disables logging entirely; `"screen"` selects
    /// [`ScreenCollector`]; any other name is assumed to be a custom
    /// service an application's `starting_tonics` step registers itself
    /// under `tasktonic/log/service#<n>` (spec.md §6 "Formula keys") — this
    /// expansion ships no registry-driven dynamic loader for those, so an
    /// unrecognized name simply leaves logging off rather than erroring
    /// (see DESIGN.md).
    fn maybe_start_logger(ledger: &'static Ledger) -> Result<Option<Arc<dyn LoggerCollector>>, RuntimeError> {
        let log_to = ledger.formula().get(formula_keys::LOG_TO).map_err(RuntimeError::Formula)?;
        match log_to.as_ref().and_then(|v| v.as_str()) {
            Some("screen") => Ok(Some(Arc::new(ScreenCollector::new()) as Arc<dyn LoggerCollector>)),
            _ => Ok(None),
        }
    }

    /// Runs bootstrap steps 1–7 and returns a [`Runtime`] ready for
    /// [`Runtime::run`]. `worker_count` is the number of non-main catalysts
    /// to spawn (step 7); `starting_tonics` is step 6, handed the ledger,
    /// the main catalyst, and the resolved logger so it can register
    /// whatever application tonics it needs before any catalyst starts
    /// consuming jobs. A construction failure there (e.g. a registration
    /// error) aborts the whole bootstrap.
    pub fn bootstrap(
        ledger: &'static Ledger,
        config: &RuntimeConfig,
        worker_count: usize,
        starting_tonics: impl FnOnce(
            &'static Ledger,
            &Arc<Catalyst<SystemClock>>,
            Option<&Arc<dyn LoggerCollector>>,
        ) -> Result<(), RuntimeError>,
    ) -> Result<Self, RuntimeError> {
        RuntimeConfig::install_defaults(ledger)?;
        config.apply_overrides(ledger)?;

        let main_catalyst = Self::create_main_catalyst(ledger)?;
        let logger = Self::maybe_start_logger(ledger)?;

        starting_tonics(ledger, &main_catalyst, logger.as_ref())?;

        let dont_start = ledger
            .formula()
            .get(formula_keys::TESTING_DONT_START_CATALYSTS)
            .map_err(RuntimeError::Formula)?
            .and_then(|v| v.as_bool())
            .unwrap_or(false);

        let worker_catalysts: Vec<Arc<Catalyst<SystemClock>>> = if dont_start {
            Vec::new()
        } else {
            (0..worker_count)
                .map(|_| {
                    let id = ledger.register("Catalyst", None, None)?;
                    Ok::<_, RuntimeError>(Arc::new(Catalyst::new(id)))
                })
                .collect::<Result<_, RuntimeError>>()?
        };

        let worker_threads = worker_catalysts.iter().cloned().map(Catalyst::spawn_worker).collect();

        ledger
            .update_formula(formula_keys::PROJECT_STATUS, serde_json::json!("start_catalysts"))
            .map_err(RuntimeError::Formula)?;

        Ok(Self {
            ledger,
            main_catalyst,
            worker_catalysts,
            worker_threads: Mutex::new(worker_threads),
            logger,
        })
    }

    /// Steps 8–9: drives the main catalyst's loop on the calling thread
    /// until it has no tonics left attached, then signals every worker
    /// catalyst to stop and joins their threads so a caller can rely on
    /// the whole runtime having quiesced once this returns.
    pub fn run(&self) {
        let _ = self
            .ledger
            .update_formula(formula_keys::PROJECT_STATUS, serde_json::json!("main_running"));

        self.main_catalyst.run();

        let _ = self
            .ledger
            .update_formula(formula_keys::PROJECT_STATUS, serde_json::json!("main_finished"));

        for worker in &self.worker_catalysts {
            worker.request_finish();
        }
        for handle in self.worker_threads.lock().drain(..) {
            let _ = handle.join();
        }
    }

    pub fn ledger(&self) -> &'static Ledger {
        self.ledger
    }

    pub fn main_catalyst(&self) -> &Arc<Catalyst<SystemClock>> {
        &self.main_catalyst
    }

    pub fn worker_catalysts(&self) -> &[Arc<Catalyst<SystemClock>>] {
        &self.worker_catalysts
    }

    pub fn logger(&self) -> Option<&Arc<dyn LoggerCollector>> {
        self.logger.as_ref()
    }
}

#[cfg(test)]
#[path = "bootstrap_tests.rs"]
mod tests;
