// SPDX-License-Identifier: MIT

use serde_json::Value;

/// A single change to a node's value: `(path, new_value, old_value, source)`.
///
/// `old_value` is `None` both for a brand-new node and for a node whose
/// value was explicitly `null`; callers that need to distinguish the two
/// should consult [`crate::Store::get`] directly rather than relying on this
/// event alone, matching the original `(path, new, old, source)` tuple
/// contract.
#[derive(Debug, Clone, PartialEq)]
pub struct ChangeEvent {
    pub path: String,
    pub new_value: Option<Value>,
    pub old_value: Option<Value>,
    pub source: Option<String>,
}

impl ChangeEvent {
    pub(crate) fn new(
        path: impl Into<String>,
        new_value: Option<Value>,
        old_value: Option<Value>,
        source: Option<String>,
    ) -> Self {
        Self { path: path.into(), new_value, old_value, source }
    }
}
