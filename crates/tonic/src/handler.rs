// SPDX-License-Identifier: MIT

use crate::args::Args;
use crate::prefix::Prefix;
use crate::tonic::TonicHandle;
use smol_str::SmolStr;
use std::collections::HashMap;
use std::sync::Arc;
use tasktonic_catalyst::{Clock, SystemClock};

/// A registered sparkle handler: given the tonic's own body and a handle
/// back to itself (so a handler can call `to_state`, dispatch to a sibling,
/// or `finish`), runs to completion on the owning catalyst's thread.
pub type HandlerFn<T, C = SystemClock> = Arc<dyn Fn(&mut T, &TonicHandle<T, C>, Args) + Send + Sync>;

struct Entry<T, C: Clock> {
    generic: Option<HandlerFn<T, C>>,
    by_state: HashMap<SmolStr, HandlerFn<T, C>>,
}

impl<T, C: Clock> Default for Entry<T, C> {
    fn default() -> Self {
        Self { generic: None, by_state: HashMap::new() }
    }
}

impl<T, C: Clock> Clone for Entry<T, C> {
    fn clone(&self) -> Self {
        Self { generic: self.generic.clone(), by_state: self.by_state.clone() }
    }
}

/// Builds a [`HandlerTable`] explicitly, replacing the reflective method
/// discovery the original performs over a class's declared method names
/// (spec.md §4.4, §9 Design Notes option (b) — "a registration builder
/// where each handler is explicitly registered with its prefix, optional
/// state, and base name").
pub struct HandlerTableBuilder<T, C: Clock = SystemClock> {
    entries: HashMap<(Prefix, SmolStr), Entry<T, C>>,
}

impl<T, C: Clock> Default for HandlerTableBuilder<T, C> {
    fn default() -> Self {
        Self { entries: HashMap::new() }
    }
}

impl<T, C: Clock> HandlerTableBuilder<T, C> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the state-independent handler for `<prefix>__<base>`.
    pub fn on(
        mut self,
        prefix: Prefix,
        base: impl Into<SmolStr>,
        handler: impl Fn(&mut T, &TonicHandle<T, C>, Args) + Send + Sync + 'static,
    ) -> Self {
        let entry = self.entries.entry((prefix, base.into())).or_default();
        entry.generic = Some(Arc::new(handler));
        self
    }

    /// Registers the state-specific handler for `<prefix>_<state>__<base>`.
    /// A `(prefix, base)` pair's state-awareness is scoped to exactly that
    /// pair — a deliberate simplification over the original's looser
    /// same-named-method-across-any-prefix lookup, documented in DESIGN.md.
    pub fn on_state(
        mut self,
        prefix: Prefix,
        state: impl Into<SmolStr>,
        base: impl Into<SmolStr>,
        handler: impl Fn(&mut T, &TonicHandle<T, C>, Args) + Send + Sync + 'static,
    ) -> Self {
        let entry = self.entries.entry((prefix, base.into())).or_default();
        entry.by_state.insert(state.into(), Arc::new(handler));
        self
    }

    /// Finalizes the table. The state set is every distinct state name
    /// passed to [`HandlerTableBuilder::on_state`] across all entries,
    /// sorted — this is the same set [`crate::StateTable`] is built from,
    /// so a handler table and its tonic's state machine always agree on
    /// indices.
    pub fn build(self) -> HandlerTable<T, C> {
        let mut states: Vec<SmolStr> = self
            .entries
            .values()
            .flat_map(|entry| entry.by_state.keys().cloned())
            .collect();
        states.sort();
        states.dedup();

        let table = self
            .entries
            .into_iter()
            .map(|(key, entry)| {
                let mut per_state = vec![None; states.len()];
                for (state_name, handler) in entry.by_state {
                    if let Ok(idx) = states.binary_search(&state_name) {
                        per_state[idx] = Some(handler);
                    }
                }
                (key, ResolvedEntry { generic: entry.generic, per_state })
            })
            .collect();

        HandlerTable { states, table }
    }
}

struct ResolvedEntry<T, C: Clock> {
    generic: Option<HandlerFn<T, C>>,
    per_state: Vec<Option<HandlerFn<T, C>>>,
}

impl<T, C: Clock> Clone for ResolvedEntry<T, C> {
    fn clone(&self) -> Self {
        Self { generic: self.generic.clone(), per_state: self.per_state.clone() }
    }
}

/// The runtime table built by [`HandlerTableBuilder::build`]: an array of
/// `(prefix, base) -> per-state[]` exactly as spec.md §9 describes, plus
/// the state name list it was built against.
pub struct HandlerTable<T, C: Clock = SystemClock> {
    states: Vec<SmolStr>,
    table: HashMap<(Prefix, SmolStr), ResolvedEntry<T, C>>,
}

impl<T, C: Clock> HandlerTable<T, C> {
    pub fn states(&self) -> &[SmolStr] {
        &self.states
    }

    /// Resolves the handler to run for `(prefix, base)` given the tonic's
    /// current state index. State-specific entries win over the generic
    /// one; an absent entry resolves to `None`, which callers treat as a
    /// no-op sparkle (spec.md §3, "absent entries fall back to a generic
    /// handler or a no-op").
    pub fn resolve(&self, prefix: Prefix, base: &str, state: i32) -> Option<HandlerFn<T, C>> {
        let entry = self.table.get(&(prefix, SmolStr::new(base)))?;
        if state >= 0 {
            if let Some(Some(handler)) = entry.per_state.get(state as usize) {
                return Some(Arc::clone(handler));
            }
        }
        entry.generic.clone()
    }
}

#[cfg(test)]
#[path = "handler_tests.rs"]
mod tests;
