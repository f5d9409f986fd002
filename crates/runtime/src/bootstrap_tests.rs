// SPDX-License-Identifier: MIT

use super::*;
use tasktonic_ledger::Ledger;
use tasktonic_tonic::{reserved, HandlerTableBuilder, Prefix, TonicHandle, TonicSpec};

fn leaked_ledger() -> &'static Ledger {
    Box::leak(Box::new(Ledger::new()))
}

/// A tonic that finishes itself the instant its startup sparkle runs, so a
/// driven main catalyst's loop terminates on its own without needing a
/// background thread.
fn self_finishing_tonic(
    ledger: &'static Ledger,
    catalyst: &Arc<Catalyst<SystemClock>>,
) -> TonicHandle<(), SystemClock> {
    let handlers = HandlerTableBuilder::new()
        .on(Prefix::InternalSystem, reserved::ON_START, |_body, handle, _args| handle.finish())
        .on(Prefix::UserEvent, reserved::ON_START, |_body, _handle, _args| {})
        .build();
    TonicHandle::new(ledger, Arc::clone(catalyst), TonicSpec::new("Probe", handlers, ())).unwrap()
}

#[test]
fn bootstrap_seeds_formula_and_claims_main_catalyst_as_id_zero() {
    let ledger = leaked_ledger();
    let config = RuntimeConfig { dont_start_catalysts: true, ..RuntimeConfig::default() };

    let runtime = Runtime::bootstrap(ledger, &config, 0, |ledger, catalyst, _logger| {
        let _ = self_finishing_tonic(ledger, catalyst);
        Ok(())
    })
    .unwrap();

    assert_eq!(runtime.main_catalyst().id().index(), 0);
    assert!(runtime.worker_catalysts().is_empty());
    assert_eq!(
        ledger.formula().get(tasktonic_ledger::formula_keys::PROJECT_STATUS).unwrap(),
        Some(serde_json::json!("start_catalysts"))
    );
}

#[test]
fn dont_start_catalysts_skips_spawning_worker_threads() {
    let ledger = leaked_ledger();
    let config = RuntimeConfig { dont_start_catalysts: true, ..RuntimeConfig::default() };

    let runtime = Runtime::bootstrap(ledger, &config, 3, |ledger, catalyst, _logger| {
        let _ = self_finishing_tonic(ledger, catalyst);
        Ok(())
    })
    .unwrap();

    assert!(runtime.worker_catalysts().is_empty());
}

#[test]
fn run_drives_main_catalyst_to_completion_and_updates_project_status() {
    let ledger = leaked_ledger();
    let config = RuntimeConfig { dont_start_catalysts: true, ..RuntimeConfig::default() };

    let runtime = Runtime::bootstrap(ledger, &config, 0, |ledger, catalyst, _logger| {
        let _ = self_finishing_tonic(ledger, catalyst);
        Ok(())
    })
    .unwrap();

    runtime.run();

    assert_eq!(
        ledger.formula().get(tasktonic_ledger::formula_keys::PROJECT_STATUS).unwrap(),
        Some(serde_json::json!("main_finished"))
    );
}

#[test]
fn log_to_screen_resolves_a_logger_collector() {
    let ledger = leaked_ledger();
    let config = RuntimeConfig { dont_start_catalysts: true, ..RuntimeConfig::default() };

    let runtime = Runtime::bootstrap(ledger, &config, 0, |ledger, catalyst, logger| {
        assert!(logger.is_some());
        let _ = self_finishing_tonic(ledger, catalyst);
        Ok(())
    })
    .unwrap();

    assert!(runtime.logger().is_some());
}

#[test]
fn log_to_off_resolves_no_logger_collector() {
    let ledger = leaked_ledger();
    let config =
        RuntimeConfig { dont_start_catalysts: true, log_to: Some("off".to_string()), ..RuntimeConfig::default() };

    let runtime = Runtime::bootstrap(ledger, &config, 0, |ledger, catalyst, logger| {
        assert!(logger.is_none());
        let _ = self_finishing_tonic(ledger, catalyst);
        Ok(())
    })
    .unwrap();

    assert!(runtime.logger().is_none());
}
