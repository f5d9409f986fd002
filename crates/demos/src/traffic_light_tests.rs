// SPDX-License-Identifier: MIT

use super::*;
use tasktonic_catalyst::{FakeClock, LoopStep};

fn drive_one_transition(catalyst: &Catalyst<FakeClock>, advance_by: Duration) {
    catalyst.clock().advance(advance_by);
    assert_eq!(catalyst.loop_body_once(), LoopStep::Continue, "servicing the expired timer");
    assert_eq!(catalyst.loop_body_once(), LoopStep::Continue, "running the change_state sparkle");
}

#[test]
fn traffic_light_cycles_red_green_yellow_red_on_schedule() {
    let ledger: &'static Ledger = Box::leak(Box::new(Ledger::new()));
    let catalyst_id = ledger.register("Catalyst", None, None).unwrap();
    let catalyst = Arc::new(Catalyst::with_clock(catalyst_id, FakeClock::new()));

    let (_handle, log) = spawn(ledger, Arc::clone(&catalyst)).unwrap();

    // Drains the startup sparkle that enters the initial "red" state.
    assert_eq!(catalyst.loop_body_once(), LoopStep::Continue);
    assert_eq!(log.snapshot(), vec![SmolStr::new("red")]);

    drive_one_transition(&catalyst, RED);
    assert_eq!(log.snapshot(), vec![SmolStr::new("red"), SmolStr::new("green")]);

    drive_one_transition(&catalyst, GREEN);
    assert_eq!(
        log.snapshot(),
        vec![SmolStr::new("red"), SmolStr::new("green"), SmolStr::new("yellow")]
    );

    drive_one_transition(&catalyst, YELLOW);
    assert_eq!(
        log.snapshot(),
        vec![SmolStr::new("red"), SmolStr::new("green"), SmolStr::new("yellow"), SmolStr::new("red")]
    );
}
