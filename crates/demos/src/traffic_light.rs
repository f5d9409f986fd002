// SPDX-License-Identifier: MIT

//! Scenario 2 from spec.md §8: a three-state machine (red/green/yellow)
//! where each state's `on_enter` arms a single-shot timer for that state's
//! duration, and the timer firing dispatches an internal-tick
//! `change_state` sparkle that drives the next transition.

use parking_lot::Mutex;
use smol_str::SmolStr;
use std::sync::Arc;
use std::time::Duration;
use tasktonic_catalyst::{Catalyst, Clock, TimerKind};
use tasktonic_ledger::Ledger;
use tasktonic_tonic::{reserved, Args, HandlerTableBuilder, Prefix, TonicError, TonicHandle, TonicSpec};

pub const RED: Duration = Duration::from_secs(5);
pub const GREEN: Duration = Duration::from_secs(5);
pub const YELLOW: Duration = Duration::from_secs(2);

const CHANGE_STATE: &str = "change_state";

/// The sequence of states entered so far, in order, shared with the caller
/// so a test can assert against it while the tonic keeps running.
#[derive(Clone, Default)]
pub struct TrafficLightLog(pub Arc<Mutex<Vec<SmolStr>>>);

impl TrafficLightLog {
    pub fn snapshot(&self) -> Vec<SmolStr> {
        self.0.lock().clone()
    }
}

pub struct TrafficLightBody {
    log: TrafficLightLog,
}

fn on_enter<C: Clock>(
    catalyst: Arc<Catalyst<C>>,
    name: &'static str,
    duration: Duration,
) -> impl Fn(&mut TrafficLightBody, &TonicHandle<TrafficLightBody, C>, Args) + Send + Sync + 'static {
    move |body, handle, _args| {
        body.log.0.lock().push(SmolStr::new(name));
        let handle = handle.clone();
        catalyst.start_timer(TimerKind::SingleShot, duration, move || {
            handle.dispatch(Prefix::InternalTick, CHANGE_STATE, Args::none());
        });
    }
}

/// Builds and attaches the traffic-light tonic to `catalyst`, using the
/// canonical spec.md §8 scenario 2 durations (5s/5s/2s). The caller drives
/// `catalyst` (a `FakeClock`-backed one in tests) to observe the
/// red → green → yellow → red cycle without real sleeps.
pub fn spawn<C: Clock>(
    ledger: &'static Ledger,
    catalyst: Arc<Catalyst<C>>,
) -> Result<(TonicHandle<TrafficLightBody, C>, TrafficLightLog), TonicError> {
    spawn_with_durations(ledger, catalyst, RED, GREEN, YELLOW)
}

/// Builds and attaches the traffic-light tonic with caller-chosen per-state
/// durations, for callers (e.g. an end-to-end integration run against a
/// real `SystemClock`-backed [`tasktonic_runtime::Runtime`]) that want the
/// same state machine without waiting out the canonical 5s/5s/2s cycle.
pub fn spawn_with_durations<C: Clock>(
    ledger: &'static Ledger,
    catalyst: Arc<Catalyst<C>>,
    red: Duration,
    green: Duration,
    yellow: Duration,
) -> Result<(TonicHandle<TrafficLightBody, C>, TrafficLightLog), TonicError> {
    let log = TrafficLightLog::default();

    let handlers = HandlerTableBuilder::new()
        .on(Prefix::InternalSystem, reserved::ON_START, |_body, handle, _args| {
            let _ = handle.to_state_named("red");
        })
        .on_state(Prefix::InternalSystem, "red", reserved::ON_ENTER, on_enter(Arc::clone(&catalyst), "red", red))
        .on_state(
            Prefix::InternalSystem,
            "green",
            reserved::ON_ENTER,
            on_enter(Arc::clone(&catalyst), "green", green),
        )
        .on_state(
            Prefix::InternalSystem,
            "yellow",
            reserved::ON_ENTER,
            on_enter(Arc::clone(&catalyst), "yellow", yellow),
        )
        .on_state(Prefix::InternalTick, "red", CHANGE_STATE, |_body, handle, _args| {
            let _ = handle.to_state_named("green");
        })
        .on_state(Prefix::InternalTick, "green", CHANGE_STATE, |_body, handle, _args| {
            let _ = handle.to_state_named("yellow");
        })
        .on_state(Prefix::InternalTick, "yellow", CHANGE_STATE, |_body, handle, _args| {
            let _ = handle.to_state_named("red");
        })
        .build();

    let spec = TonicSpec::new("TrafficLight", handlers, TrafficLightBody { log: log.clone() });
    let handle = TonicHandle::new(ledger, catalyst, spec)?;
    Ok((handle, log))
}

#[cfg(test)]
#[path = "traffic_light_tests.rs"]
mod tests;
