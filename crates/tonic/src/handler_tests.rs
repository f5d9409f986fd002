// SPDX-License-Identifier: MIT

use super::*;
use crate::prefix::Prefix;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

#[test]
fn absent_entry_resolves_to_none() {
    let table: HandlerTable<i32> = HandlerTableBuilder::new().build();
    assert!(table.resolve(Prefix::UserTick, "a", crate::state::INACTIVE).is_none());
}

#[test]
fn generic_handler_resolves_for_any_state() {
    let calls = Arc::new(AtomicUsize::new(0));
    let table: HandlerTable<i32> = HandlerTableBuilder::new()
        .on(Prefix::UserTick, "a", {
            let calls = Arc::clone(&calls);
            move |_body, _handle, _args| {
                calls.fetch_add(1, Ordering::SeqCst);
            }
        })
        .build();

    assert!(table.resolve(Prefix::UserTick, "a", crate::state::INACTIVE).is_some());
    assert!(table.resolve(Prefix::UserTick, "a", 3).is_some());
    assert!(table.resolve(Prefix::UserCommand, "a", crate::state::INACTIVE).is_none());
}

#[test]
fn state_specific_handler_wins_over_generic() {
    let table: HandlerTable<i32> = HandlerTableBuilder::new()
        .on(Prefix::UserEvent, "tick", |body, _handle, _args| *body += 1)
        .on_state(Prefix::UserEvent, "red", "tick", |body, _handle, _args| *body += 100)
        .build();

    assert_eq!(table.states(), ["red"]);

    let mut body = 0;
    let generic_state_handler = table.resolve(Prefix::UserEvent, "tick", 5);
    assert!(generic_state_handler.is_some());
    // State index 5 has no "red" entry (only index 0 does); falls back to
    // the generic handler.
    drop(generic_state_handler);

    let red_handler = table.resolve(Prefix::UserEvent, "tick", 0).unwrap();
    // Can't call without a real TonicHandle; assert it is the state-specific
    // one by checking resolution at a non-matching state falls back instead.
    let other_state_handler = table.resolve(Prefix::UserEvent, "tick", 1).unwrap();
    assert!(!Arc::ptr_eq(&red_handler, &other_state_handler));

    let fallback = table.resolve(Prefix::UserEvent, "tick", crate::state::INACTIVE).unwrap();
    assert!(Arc::ptr_eq(&fallback, &other_state_handler));
    let _ = &mut body;
}

#[test]
fn states_are_collected_from_all_entries_sorted_and_deduplicated() {
    let table: HandlerTable<i32> = HandlerTableBuilder::new()
        .on_state(Prefix::UserEvent, "yellow", "tick", |_b, _h, _a| {})
        .on_state(Prefix::UserCommand, "red", "change", |_b, _h, _a| {})
        .on_state(Prefix::UserEvent, "red", "tick", |_b, _h, _a| {})
        .build();
    assert_eq!(table.states(), ["red", "yellow"]);
}
