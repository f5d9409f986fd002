// SPDX-License-Identifier: MIT

use crate::error::StoreError;
use crate::path;
use crate::store::Store;
use serde_json::Value;

/// An ergonomic, path-bound handle into a [`Store`]. Cheap to create and
/// clone; holds no lock of its own. Every method simply forwards to the
/// matching [`Store`] call at `self.path()`, the way the original `Item`
/// wrapper forwarded onto its owning store.
#[derive(Clone, Copy)]
pub struct Cursor<'s> {
    store: &'s Store,
    path: &'s str,
}

impl<'s> Cursor<'s> {
    pub(crate) fn new(store: &'s Store, path: &'s str) -> Self {
        Self { store, path }
    }

    /// The normalized path this cursor is bound to.
    pub fn path(&self) -> &str {
        self.path
    }

    pub fn get(&self) -> Result<Option<Value>, StoreError> {
        self.store.get(self.path)
    }

    pub fn set(&self, value: Value) -> Result<(), StoreError> {
        self.store.set(self.path, value, true)
    }

    pub fn set_quiet(&self, value: Value) -> Result<(), StoreError> {
        self.store.set(self.path, value, false)
    }

    pub fn remove(&self) -> Result<(), StoreError> {
        self.store.remove(self.path)
    }

    pub fn children(&self, prefix: Option<&str>) -> Result<Vec<String>, StoreError> {
        self.store.children(self.path, prefix)
    }

    /// `(relative_path, value)` pairs for this cursor's whole subtree.
    pub fn dump(&self) -> Result<Vec<(String, Value)>, StoreError> {
        self.store.subtree(self.path)
    }

    /// Appends an auto-indexed child under this cursor and returns the new
    /// path, allocated but not yet navigated to (borrow it back with
    /// [`Store::at`] if you need a cursor on it, since the returned `String`
    /// would otherwise outlive this cursor's borrow).
    pub fn append(&self, prefix: Option<&str>) -> Result<String, StoreError> {
        self.store.append(self.path, prefix)
    }

    /// The parent path of this cursor, or `None` if it is already the root.
    pub fn parent_path(&self) -> Option<String> {
        path::split_last(self.path).map(|(parent, _)| parent.to_string())
    }

    /// Sets `value` at `relative` resolved against this cursor's path,
    /// interpreting the reserved dynamic segments (`#`, `<prefix>#`, `.`,
    /// `<prefix>.`) spec.md §4.2 describes. Returns the absolute path the
    /// value was actually written to. See [`Store::resolve_dynamic`].
    pub fn set_dynamic(&self, relative: &str, value: Value, notify: bool) -> Result<String, StoreError> {
        self.store.set_dynamic(self.path, relative, value, notify)
    }
}

impl Store {
    /// Returns a [`Cursor`] bound to `path` on this store. `path` is not
    /// validated or normalized until a cursor method is actually called.
    pub fn at<'s>(&'s self, path: &'s str) -> Cursor<'s> {
        Cursor::new(self, path)
    }
}

#[cfg(test)]
#[path = "cursor_tests.rs"]
mod tests;
