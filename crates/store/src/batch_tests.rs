// SPDX-License-Identifier: MIT

use super::*;
use crate::event::ChangeEvent;

fn ev(path: &str) -> ChangeEvent {
    ChangeEvent::new(path, None, None, current_source())
}

#[test]
fn record_at_depth_zero_flushes_immediately() {
    let flushed = record(ev("a"));
    assert_eq!(flushed.map(|v| v.len()), Some(1));
}

#[test]
fn nested_scope_buffers_until_outermost_exit() {
    let outer = enter(None, true);
    let inner = enter(None, true);
    assert!(record(ev("a")).is_none());
    assert!(record(ev("b")).is_none());
    assert!(leave(inner).is_none());
    let flushed = leave(outer).unwrap();
    assert_eq!(flushed.len(), 2);
}

#[test]
fn silent_group_drops_events() {
    let scope = enter(None, false);
    assert!(record(ev("x")).is_none());
    let flushed = leave(scope);
    assert_eq!(flushed, Some(Vec::new()));
}

#[test]
fn nested_silence_propagates_even_if_inner_requests_notify() {
    let outer = enter(None, false);
    let inner = enter(None, true);
    assert!(record(ev("x")).is_none());
    assert!(leave(inner).is_none());
    let flushed = leave(outer);
    assert_eq!(flushed, Some(Vec::new()));
}

#[test]
fn source_tag_applies_while_scope_is_open_then_restores() {
    assert_eq!(current_source(), None);
    let scope = enter(Some("agent-1".to_string()), true);
    assert_eq!(current_source(), Some("agent-1".to_string()));
    let _ = leave(scope);
    assert_eq!(current_source(), None);
}
