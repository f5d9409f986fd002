// SPDX-License-Identifier: MIT

//! Per-invoking-thread batching state for grouped store updates.
//!
//! Batch depth, pending events, the active source tag, and the combined
//! notify flag are all thread-local: two threads writing to the same
//! [`crate::Store`] concurrently have independent batches, exactly as
//! spec'd (`§4.2 Concurrency`).

use crate::event::ChangeEvent;
use std::cell::RefCell;

#[derive(Default)]
struct BatchState {
    depth: usize,
    pending: Vec<ChangeEvent>,
    source: Option<String>,
    /// Combined (AND-reduced) notify flag across the currently nested scopes.
    /// `true` at depth 0 (no scope silences by default).
    notify: bool,
}

impl BatchState {
    fn fresh() -> Self {
        Self { depth: 0, pending: Vec::new(), source: None, notify: true }
    }
}

thread_local! {
    static STATE: RefCell<BatchState> = RefCell::new(BatchState::fresh());
}

/// Snapshot needed to restore the previous scope on exit.
pub(crate) struct ScopeSaved {
    prev_source: Option<String>,
    prev_notify: bool,
    source_was_set: bool,
}

/// Enters a nested batch scope, combining `notify` with the enclosing scope
/// by AND and setting `source` if provided (innermost-wins while open).
pub(crate) fn enter(source: Option<String>, notify: bool) -> ScopeSaved {
    STATE.with(|cell| {
        let mut state = cell.borrow_mut();
        let prev_source = state.source.clone();
        let prev_notify = state.notify;
        let source_was_set = source.is_some();
        if let Some(src) = source {
            state.source = Some(src);
        }
        state.notify = prev_notify && notify;
        state.depth += 1;
        ScopeSaved { prev_source, prev_notify, source_was_set }
    })
}

/// Leaves a batch scope. Returns `Some(pending_events)` if this was the
/// outermost scope and it was notifying (the caller should flush them);
/// returns `None` otherwise (either nested, or silenced).
pub(crate) fn leave(saved: ScopeSaved) -> Option<Vec<ChangeEvent>> {
    STATE.with(|cell| {
        let mut state = cell.borrow_mut();
        state.depth = state.depth.saturating_sub(1);
        let flush = state.depth == 0 && state.notify;
        let events = if flush && !state.pending.is_empty() {
            Some(std::mem::take(&mut state.pending))
        } else if flush {
            Some(Vec::new())
        } else {
            None
        };
        if saved.source_was_set {
            state.source = saved.prev_source;
        }
        state.notify = saved.prev_notify;
        events
    })
}

/// Records a change on the current thread's batch. Returns
/// `Some(pending_events)` if this push should flush immediately (depth 0),
/// `None` if it was buffered for an open scope or dropped because the
/// current scope is silenced.
pub(crate) fn record(event: ChangeEvent) -> Option<Vec<ChangeEvent>> {
    STATE.with(|cell| {
        let mut state = cell.borrow_mut();
        if !state.notify {
            return None;
        }
        state.pending.push(event);
        if state.depth == 0 {
            Some(std::mem::take(&mut state.pending))
        } else {
            None
        }
    })
}

/// The source tag active on the current thread's batch, if any.
pub(crate) fn current_source() -> Option<String> {
    STATE.with(|cell| cell.borrow().source.clone())
}

#[cfg(test)]
#[path = "batch_tests.rs"]
mod tests;
