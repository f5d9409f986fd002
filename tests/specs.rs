// SPDX-License-Identifier: MIT

//! End-to-end re-run of spec.md §8 scenarios 1 ("hello chain"), 2
//! ("traffic light"), and 6 ("service singleton") against a fully
//! bootstrapped [`Runtime`], rather than against the kernel crates in
//! isolation the way each crate's own unit tests do.

use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tasktonic_catalyst::{Catalyst, LoopStep, SystemClock};
use tasktonic_demos::{hello_chain, traffic_light};
use tasktonic_ledger::{formula_keys, Ledger, ServiceKey};
use tasktonic_runtime::{Runtime, RuntimeConfig};
use tasktonic_tonic::{reserved, HandlerTableBuilder, Prefix, ServiceTonic, TonicSpec};

fn leaked_ledger() -> &'static Ledger {
    Box::leak(Box::new(Ledger::new()))
}

#[test]
fn scenario_1_hello_chain_runs_to_completion_under_a_bootstrapped_runtime() {
    let ledger = leaked_ledger();
    let config = RuntimeConfig::default();
    let log_slot: Arc<Mutex<Option<hello_chain::HelloChainLog>>> = Arc::new(Mutex::new(None));
    let id_slot: Arc<Mutex<Option<tasktonic_ledger::EntityId>>> = Arc::new(Mutex::new(None));

    let runtime = {
        let log_slot = Arc::clone(&log_slot);
        let id_slot = Arc::clone(&id_slot);
        Runtime::bootstrap(ledger, &config, 0, move |ledger, catalyst, _logger| {
            let (handle, log) = hello_chain::spawn(ledger, Arc::clone(catalyst))?;
            *id_slot.lock() = Some(handle.id());
            *log_slot.lock() = Some(log);
            Ok(())
        })
        .unwrap()
    };

    runtime.run();

    assert_eq!(log_slot.lock().as_ref().unwrap().snapshot(), vec!["a", "b", "c"]);

    let tonic_id = id_slot.lock().unwrap();
    assert!(ledger.get_entity_by_id(tonic_id).is_none());
    assert!(ledger.get_entity_by_id(runtime.main_catalyst().id()).is_some());
    assert_eq!(
        ledger.formula().get(formula_keys::PROJECT_STATUS).unwrap(),
        Some(serde_json::json!("main_finished"))
    );
}

#[test]
fn scenario_2_traffic_light_cycles_under_a_bootstrapped_runtime() {
    let ledger = leaked_ledger();
    let config = RuntimeConfig { dont_start_catalysts: true, ..RuntimeConfig::default() };
    let log_slot: Arc<Mutex<Option<traffic_light::TrafficLightLog>>> = Arc::new(Mutex::new(None));

    // Short enough that the real-SystemClock cycle below costs the suite
    // well under a second, while still exercising the same state machine
    // and timer plumbing a production run would use.
    let red = Duration::from_millis(30);
    let green = Duration::from_millis(30);
    let yellow = Duration::from_millis(15);

    let runtime = {
        let log_slot = Arc::clone(&log_slot);
        Runtime::bootstrap(ledger, &config, 0, move |ledger, catalyst, _logger| {
            let (_handle, log) = traffic_light::spawn_with_durations(ledger, Arc::clone(catalyst), red, green, yellow)?;
            *log_slot.lock() = Some(log);
            Ok(())
        })
        .unwrap()
    };

    // The traffic light never finishes on its own, so this drives the
    // bootstrapped main catalyst's loop body directly instead of
    // `Runtime::run`, which would block forever waiting for it to empty.
    let main_catalyst: &Arc<Catalyst<SystemClock>> = runtime.main_catalyst();
    let mut observed = Vec::new();
    for _ in 0..32 {
        assert_eq!(main_catalyst.loop_body_once(), LoopStep::Continue);
        let snapshot = log_slot.lock().as_ref().unwrap().snapshot();
        if snapshot.len() > observed.len() {
            observed = snapshot;
        }
        if observed.len() >= 4 {
            break;
        }
    }

    assert_eq!(observed, vec!["red", "green", "yellow", "red"]);
}

#[test]
fn scenario_6_service_singleton_under_a_bootstrapped_runtime() {
    let ledger = leaked_ledger();
    let config = RuntimeConfig { dont_start_catalysts: true, ..RuntimeConfig::default() };
    let key: ServiceKey = ServiceKey::new("svc.shared");

    let ids = Arc::new(Mutex::new(None));
    let runtime = {
        let key = key.clone();
        let ids = Arc::clone(&ids);
        Runtime::bootstrap(ledger, &config, 0, move |ledger, catalyst, _logger| {
            let ctx1 = ledger.register("Owner", None, None)?;
            let ctx2 = ledger.register("Owner", None, None)?;

            let build_spec = || {
                let handlers = HandlerTableBuilder::new()
                    .on(Prefix::InternalSystem, reserved::ON_START, |_body, _handle, _args| {})
                    .on(Prefix::UserEvent, reserved::ON_START, |_body, _handle, _args| {})
                    .build();
                TonicSpec::new("Shared", handlers, ())
            };

            let first = ServiceTonic::get_or_create(
                ledger,
                Arc::clone(catalyst),
                key.clone(),
                ctx1,
                "Shared",
                None,
                build_spec,
                |_handle, _ctx| panic!("first caller must not take the rebind path"),
            )?;
            let second = ServiceTonic::get_or_create(
                ledger,
                Arc::clone(catalyst),
                key.clone(),
                ctx2,
                "Shared",
                None,
                build_spec,
                |_handle, _ctx| {},
            )?;
            assert_eq!(first.id(), second.id());

            *ids.lock() = Some((first, ctx1, ctx2));
            Ok(())
        })
        .unwrap()
    };
    let _ = runtime;

    let (service, ctx1, ctx2) = ids.lock().take().unwrap();

    assert_eq!(ledger.get_entity_by_service(&key).unwrap().service_contexts.len(), 2);

    service.release_service_context(ctx1);
    assert_eq!(ledger.get_entity_by_service(&key).unwrap().service_contexts.len(), 1);

    service.release_service_context(ctx2);
    assert!(ledger.get_entity_by_id(service.id()).is_none());
}
