// SPDX-License-Identifier: MIT

use super::*;
use crate::handler::HandlerTableBuilder;
use crate::prefix::Prefix;
use parking_lot::Mutex as PlMutex;
use serde_json::json;
use std::sync::Arc;
use tasktonic_catalyst::{Catalyst, FakeClock};
use tasktonic_ledger::Ledger;

/// Shared append-only log handlers push into, captured by `move` closures —
/// the tonic's own body carries no state worth reading back out, matching
/// how `tasktonic-store`'s tests capture side effects externally rather than
/// reaching back into the thing under test.
type Log = Arc<PlMutex<Vec<String>>>;

fn fixture() -> (&'static Ledger, Arc<Catalyst<FakeClock>>) {
    let ledger: &'static Ledger = Box::leak(Box::new(Ledger::new()));
    let catalyst_id = ledger.register("Catalyst", None, None).unwrap();
    let catalyst = Arc::new(Catalyst::with_clock(catalyst_id, FakeClock::new()));
    (ledger, catalyst)
}

fn run_until_idle(catalyst: &Catalyst<FakeClock>, steps: usize) {
    for _ in 0..steps {
        catalyst.enqueue(Box::new(|| {}));
        assert_eq!(catalyst.loop_body_once(), LoopStep::Continue);
    }
}

fn run_to_finish(catalyst: &Catalyst<FakeClock>) {
    loop {
        if catalyst.loop_body_once() == LoopStep::Finished {
            break;
        }
    }
}

fn plain_handlers(log: Log) -> HandlerTable<(), FakeClock> {
    HandlerTableBuilder::new()
        .on(Prefix::UserTick, "a", {
            let log = Arc::clone(&log);
            move |_body, handle, _args| {
                log.lock().push("a".into());
                handle.dispatch(Prefix::UserTick, "b", Args::none());
            }
        })
        .on(Prefix::UserTick, "b", {
            let log = Arc::clone(&log);
            move |_body, handle, _args| {
                log.lock().push("b".into());
                handle.dispatch(Prefix::UserTick, "c", Args::none());
            }
        })
        .on(Prefix::UserTick, "c", {
            let log = Arc::clone(&log);
            move |_body, handle, _args| {
                log.lock().push("c".into());
                handle.finish();
            }
        })
        .on(Prefix::InternalSystem, "on_start", {
            let log = Arc::clone(&log);
            move |_body, handle, _args| {
                log.lock().push("_ttss__on_start".into());
                handle.dispatch(Prefix::UserTick, "a", Args::none());
            }
        })
        .on(Prefix::UserEvent, "on_start", {
            let log = Arc::clone(&log);
            move |_body, _handle, _args| log.lock().push("ttse__on_start".into())
        })
        .on(Prefix::UserEvent, "on_finished", {
            let log = Arc::clone(&log);
            move |_body, _handle, _args| log.lock().push("ttse__on_finished".into())
        })
        .on(Prefix::InternalSystem, "on_finished", move |_body, _handle, _args| {
            log.lock().push("_ttss__on_finished".into())
        })
        .build()
}

#[test]
fn hello_chain_runs_in_order_then_finishes() {
    let (ledger, catalyst) = fixture();
    let log: Log = Arc::new(PlMutex::new(Vec::new()));
    let spec = TonicSpec::new("HelloChain", plain_handlers(Arc::clone(&log)), ());
    let tonic = TonicHandle::new(ledger, Arc::clone(&catalyst), spec).unwrap();
    assert!(ledger.get_entity_by_id(tonic.id()).is_some());

    // Construction enqueues two sparkles (system on_start, user on_start);
    // the user one kicks off `a`, which chains into `b`, then `c` — four
    // queued sparkles run and keep the loop going. The fifth step runs `c`,
    // which calls `finish()`; with no children that finalizes synchronously
    // within the same step. `on_finished`/`on_finished_system` run inline,
    // strictly before `finalize()` detaches the tonic from the catalyst, so
    // both still appear in the log even though the catalyst has nothing
    // left to dequeue afterward.
    for _ in 0..4 {
        assert_eq!(catalyst.loop_body_once(), LoopStep::Continue);
    }
    assert_eq!(catalyst.loop_body_once(), LoopStep::Finished);
    assert_eq!(
        *log.lock(),
        ["_ttss__on_start", "ttse__on_start", "a", "b", "c", "ttse__on_finished", "_ttss__on_finished"]
    );
    assert!(ledger.get_entity_by_id(tonic.id()).is_none());
}

#[test]
fn dispatch_moves_args_without_cloning() {
    let (ledger, catalyst) = fixture();
    let log: Log = Arc::new(PlMutex::new(Vec::new()));
    let handlers: HandlerTable<(), FakeClock> = HandlerTableBuilder::new()
        .on(Prefix::UserEvent, "on_start", |_b, _h, _a| {})
        .on(Prefix::UserCommand, "set", {
            let log = Arc::clone(&log);
            move |_body, _handle, args| {
                if let Some(value) = args.get(0) {
                    log.lock().push(value.to_string());
                }
            }
        })
        .build();
    let spec = TonicSpec::new("Setter", handlers, ());
    let tonic = TonicHandle::new(ledger, Arc::clone(&catalyst), spec).unwrap();

    tonic.dispatch(Prefix::UserCommand, "set", Args::from([json!(42)]));
    // Construction's two on_start sparkles, plus the "set" dispatch above.
    run_until_idle(&catalyst, 3);
    assert_eq!(*log.lock(), ["42"]);

    tonic.finish();
    assert_eq!(catalyst.loop_body_once(), LoopStep::Finished);
}

fn traffic_light_handlers(log: Log) -> HandlerTable<(), FakeClock> {
    HandlerTableBuilder::new()
        .on(Prefix::UserEvent, "on_start", |_b, handle, _a| {
            handle.to_state_named("red").unwrap();
        })
        .on(Prefix::UserCommand, "go_green", |_b, handle, _a| {
            handle.to_state_named("green").unwrap();
        })
        .on_state(Prefix::InternalSystem, "red", "on_enter", {
            let log = Arc::clone(&log);
            move |_body, _h, _a| log.lock().push("enter:red".into())
        })
        .on_state(Prefix::InternalSystem, "red", "on_exit", {
            let log = Arc::clone(&log);
            move |_body, _h, _a| log.lock().push("exit:red".into())
        })
        .on_state(Prefix::InternalSystem, "green", "on_enter", {
            let log = Arc::clone(&log);
            move |_body, handle, _a| {
                log.lock().push("enter:green".into());
                handle.finish();
            }
        })
        .build()
}

#[test]
fn to_state_runs_exit_assign_enter_in_order_before_next_sparkle() {
    let (ledger, catalyst) = fixture();
    let log: Log = Arc::new(PlMutex::new(Vec::new()));
    let spec = TonicSpec::new("Light", traffic_light_handlers(Arc::clone(&log)), ());
    let tonic = TonicHandle::new(ledger, Arc::clone(&catalyst), spec).unwrap();

    // System on_start (no-op), user on_start (requests to_state("red")):
    // the transition's extras (assign, on_enter) drain within that same
    // step, strictly before anything queued after it.
    assert_eq!(catalyst.loop_body_once(), LoopStep::Continue);
    assert_eq!(catalyst.loop_body_once(), LoopStep::Continue);
    assert_eq!(*log.lock(), ["enter:red"]);
    assert_eq!(tonic.state_name(tonic.current_state()).as_deref(), Some("red"));

    // Drive the second transition through a dispatched command rather than
    // calling `to_state_named` directly from the test thread — it must run
    // from a job already executing on the catalyst's own thread so its
    // extras land on that catalyst's stack.
    tonic.dispatch(Prefix::UserCommand, "go_green", Args::none());
    run_to_finish(&catalyst);
    assert_eq!(*log.lock(), ["enter:red", "exit:red", "enter:green"]);
    assert!(ledger.get_entity_by_id(tonic.id()).is_none());
}

fn plain_handlers_no_op() -> HandlerTable<(), FakeClock> {
    HandlerTableBuilder::new()
        .on(Prefix::InternalSystem, "on_start", |_b, _h, _a| {})
        .on(Prefix::UserEvent, "on_start", |_b, _h, _a| {})
        .build()
}

#[test]
fn finish_cascades_to_adopted_children_before_finalizing() {
    let (ledger, catalyst) = fixture();

    let parent_spec = TonicSpec::new("Parent", plain_handlers_no_op(), ());
    let parent = TonicHandle::new(ledger, Arc::clone(&catalyst), parent_spec).unwrap();

    let child_spec = TonicSpec::new("Child", plain_handlers_no_op(), ())
        .context(parent.id())
        .parent(Arc::new(parent.clone()) as Arc<dyn TonicParent>);
    let child = TonicHandle::new(ledger, Arc::clone(&catalyst), child_spec).unwrap();
    parent.adopt(Arc::new(child.clone()));

    run_until_idle(&catalyst, 4);

    parent.finish();
    run_to_finish(&catalyst);

    assert!(ledger.get_entity_by_id(parent.id()).is_none());
    assert!(ledger.get_entity_by_id(child.id()).is_none());
}

#[test]
fn finish_is_idempotent() {
    let (ledger, catalyst) = fixture();
    let spec = TonicSpec::new("Solo", plain_handlers_no_op(), ());
    let tonic = TonicHandle::new(ledger, Arc::clone(&catalyst), spec).unwrap();

    run_until_idle(&catalyst, 2);
    tonic.finish();
    tonic.finish(); // no-op, must not panic or double-finalize
    run_to_finish(&catalyst);
    assert!(ledger.get_entity_by_id(tonic.id()).is_none());
}
