// SPDX-License-Identifier: MIT

use parking_lot::Mutex;
use smol_str::SmolStr;

/// Sentinel `current` value meaning "the state machine is inactive"
/// (spec.md §3, "State machine (tonic)").
pub const INACTIVE: i32 = -1;

/// The sorted set of state qualifiers discovered on a tonic, plus the
/// currently active index. Per spec.md §5 ("tonic instance state mutated
/// only on its catalyst's thread"), `current` is never touched off that
/// thread in practice, but it is still kept behind a `parking_lot::Mutex`
/// rather than a bare `Cell` because [`crate::TonicHandle`] is a shared,
/// `Arc`-backed handle any thread can hold — the mutex is here for Rust's
/// aliasing rules, not because the access pattern is actually contended.
#[derive(Debug)]
pub struct StateTable {
    states: Vec<SmolStr>,
    current: Mutex<i32>,
}

impl StateTable {
    pub fn new(mut states: Vec<SmolStr>) -> Self {
        states.sort();
        states.dedup();
        Self { states, current: Mutex::new(INACTIVE) }
    }

    pub fn states(&self) -> &[SmolStr] {
        &self.states
    }

    pub fn index_of(&self, name: &str) -> Option<i32> {
        self.states.iter().position(|s| s == name).map(|i| i as i32)
    }

    pub fn name_of(&self, index: i32) -> Option<&SmolStr> {
        if index < 0 {
            None
        } else {
            self.states.get(index as usize)
        }
    }

    pub fn current(&self) -> i32 {
        *self.current.lock()
    }

    pub fn is_active(&self) -> bool {
        self.current() != INACTIVE
    }

    /// Assigns the new current index. Only ever called from within the
    /// extra-sparkle job `to_state` schedules between `on_exit` and
    /// `on_enter`; see `crate::tonic::TonicHandle::to_state`.
    pub(crate) fn assign(&self, target: i32) {
        *self.current.lock() = target;
    }
}

#[cfg(test)]
#[path = "state_tests.rs"]
mod tests;
