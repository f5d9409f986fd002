// SPDX-License-Identifier: MIT

use serde_json::Value;

/// The positional argument bag passed to a sparkle handler, the Rust
/// analogue of the original's dynamically-typed `*args`. Always moved into
/// the job the dispatcher hands the catalyst, never cloned on dispatch —
/// Rust's ownership transfer is the native equivalent of the source's
/// deep-copy-on-cross-thread-dispatch rule (spec.md §9), since a moved
/// value can no longer be observed by the caller.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Args(pub Vec<Value>);

impl Args {
    pub fn none() -> Self {
        Self(Vec::new())
    }

    pub fn get(&self, index: usize) -> Option<&Value> {
        self.0.get(index)
    }
}

impl From<Vec<Value>> for Args {
    fn from(values: Vec<Value>) -> Self {
        Self(values)
    }
}

impl<const N: usize> From<[Value; N]> for Args {
    fn from(values: [Value; N]) -> Self {
        Self(values.into())
    }
}
