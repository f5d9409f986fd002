// SPDX-License-Identifier: MIT

use serde_json::Value;
use std::collections::BTreeSet;

/// A single node in the tree: an optional value and the set of directly
/// present child segment names (not full paths).
#[derive(Debug, Default, Clone)]
pub(crate) struct StoreNode {
    pub value: Option<Value>,
    pub children: BTreeSet<String>,
}

impl StoreNode {
    pub fn empty() -> Self {
        Self { value: None, children: BTreeSet::new() }
    }
}
