// SPDX-License-Identifier: MIT

use crate::batch;
use crate::error::StoreError;
use crate::event::ChangeEvent;
use crate::node::StoreNode;
use crate::path;
use crate::subscribe::{SubscribeOptions, Subscription, SubscriptionId};
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

struct StoreInner {
    nodes: HashMap<String, StoreNode>,
    subscribers: HashMap<String, Vec<Subscription>>,
    next_sub_id: u64,
}

impl StoreInner {
    fn new() -> Self {
        let mut nodes = HashMap::new();
        nodes.insert(String::new(), StoreNode::empty());
        Self { nodes, subscribers: HashMap::new(), next_sub_id: 0 }
    }

    /// Creates every missing ancestor of `path` (including `path` itself),
    /// linking each into its parent's children set. Mirrors `Store._ensure_node`.
    fn ensure_node(&mut self, path: &str) {
        if self.nodes.contains_key(path) {
            return;
        }
        let mut current = String::new();
        for segment in path::segments(path) {
            let parent = current.clone();
            current = path::join(&current, segment);
            self.nodes.entry(current.clone()).or_insert_with(StoreNode::empty);
            if let Some(parent_node) = self.nodes.get_mut(&parent) {
                parent_node.children.insert(segment.to_string());
            }
        }
    }

    /// Depth-first collection + removal of `path` and its whole subtree.
    /// Returns `(path, old_value)` for every node whose value was non-null,
    /// in the order spec.md requires events to be emitted (self, then
    /// descendants).
    fn collect_and_delete(&mut self, path: &str) -> Vec<(String, Value)> {
        let mut out = Vec::new();
        self.collect_and_delete_into(path, &mut out);
        out
    }

    fn collect_and_delete_into(&mut self, path: &str, out: &mut Vec<(String, Value)>) {
        let children: Vec<String> = match self.nodes.get(path) {
            Some(node) => {
                if let Some(v) = &node.value {
                    out.push((path.to_string(), v.clone()));
                }
                node.children.iter().cloned().collect()
            }
            None => Vec::new(),
        };
        for child in children {
            let child_path = path::join(path, &child);
            self.collect_and_delete_into(&child_path, out);
        }
        self.nodes.remove(path);
    }
}

/// A thread-safe, hierarchical path-addressed tree with batched, ancestor-
/// routed change notifications. See the crate docs for the full contract.
pub struct Store {
    inner: Mutex<StoreInner>,
}

impl Default for Store {
    fn default() -> Self {
        Self::new()
    }
}

impl Store {
    pub fn new() -> Self {
        Self { inner: Mutex::new(StoreInner::new()) }
    }

    /// Returns the node's value, or `None` if the path is absent or null.
    pub fn get(&self, path: &str) -> Result<Option<Value>, StoreError> {
        let normalized = path::normalize(path)?;
        let inner = self.inner.lock();
        Ok(inner.nodes.get(&normalized).and_then(|n| n.value.clone()))
    }

    /// Creates all missing ancestors, assigns `value`, and — if `notify` and
    /// the value actually changed — emits a change event.
    pub fn set(&self, path: &str, value: Value, notify: bool) -> Result<(), StoreError> {
        let normalized = path::normalize(path)?;
        let old = {
            let mut inner = self.inner.lock();
            inner.ensure_node(&normalized);
            let node = inner.nodes.entry(normalized.clone()).or_insert_with(StoreNode::empty);
            node.value.replace(value.clone())
        };
        if notify && old.as_ref() != Some(&value) {
            let source = batch::current_source();
            let event = ChangeEvent::new(normalized, Some(value), old, source);
            if let Some(batch) = batch::record(event) {
                self.flush(batch);
            }
        }
        Ok(())
    }

    /// Removes the subtree rooted at `path`, emitting `(p, None, old)` for
    /// each removed node that held a non-null value. Removing the root only
    /// clears its own value (the root node itself is never deleted).
    pub fn remove(&self, path: &str) -> Result<(), StoreError> {
        let normalized = path::normalize(path)?;
        if normalized.is_empty() {
            let old = {
                let mut inner = self.inner.lock();
                match inner.nodes.get_mut("") {
                    Some(root) => root.value.take(),
                    None => None,
                }
            };
            if let Some(old_val) = old {
                self.emit(ChangeEvent::new("", None, Some(old_val), batch::current_source()));
            }
            return Ok(());
        }

        let removed = {
            let mut inner = self.inner.lock();
            if !inner.nodes.contains_key(&normalized) {
                return Ok(());
            }
            let removed = inner.collect_and_delete(&normalized);
            if let Some((parent, segment)) = path::split_last(&normalized) {
                if let Some(parent_node) = inner.nodes.get_mut(parent) {
                    parent_node.children.remove(segment);
                }
            }
            removed
        };

        let source = batch::current_source();
        for (removed_path, old_value) in removed {
            self.emit(ChangeEvent::new(removed_path, None, Some(old_value), source.clone()));
        }
        Ok(())
    }

    /// Creates a new auto-indexed child of `base` (`#<n>` or `<prefix>#<n>`,
    /// whichever the largest existing matching sibling index plus one is)
    /// and returns its path.
    ///
    /// The index scan and the node's creation happen under one acquisition
    /// of the structural lock — never releasing it between "read the
    /// largest existing index" and "insert the `#<k+1>` node" — so two
    /// threads racing to append to the same `base` cannot both observe the
    /// same `max_idx` and collide on the same new path (spec.md §8 scenario
    /// 5: concurrent appends must each land on a distinct index).
    pub fn append(&self, base: &str, prefix: Option<&str>) -> Result<String, StoreError> {
        let base_normalized = path::normalize(base)?;
        let (new_path, old) = {
            let mut inner = self.inner.lock();
            inner.ensure_node(&base_normalized);
            let max_idx = inner
                .nodes
                .get(&base_normalized)
                .map(|n| max_matching_index(&n.children, prefix))
                .unwrap_or(-1);
            let new_key = match prefix {
                Some(p) => format!("{p}#{}", max_idx + 1),
                None => format!("#{}", max_idx + 1),
            };
            let new_path = path::join(&base_normalized, &new_key);
            inner.ensure_node(&new_path);
            let node = inner.nodes.entry(new_path.clone()).or_insert_with(StoreNode::empty);
            let old = node.value.replace(Value::Null);
            (new_path, old)
        };
        if old.as_ref() != Some(&Value::Null) {
            let source = batch::current_source();
            let event = ChangeEvent::new(new_path.clone(), Some(Value::Null), old, source);
            if let Some(batch) = batch::record(event) {
                self.flush(batch);
            }
        }
        Ok(new_path)
    }

    /// Sorted direct child segment names of `path`, optionally filtered to
    /// those matching `<prefix>#<digits>`.
    pub fn children(&self, path: &str, prefix: Option<&str>) -> Result<Vec<String>, StoreError> {
        let normalized = path::normalize(path)?;
        let inner = self.inner.lock();
        let Some(node) = inner.nodes.get(&normalized) else {
            return Ok(Vec::new());
        };
        let mut out: Vec<String> = match prefix {
            None => node.children.iter().cloned().collect(),
            Some(p) => {
                let needle = format!("{p}#");
                node.children.iter().filter(|c| c.starts_with(&needle)).cloned().collect()
            }
        };
        out.sort();
        Ok(out)
    }

    /// `(relative_path, value)` pairs for every non-null node at or below
    /// `path`, in lexicographic absolute-path order.
    pub fn subtree(&self, path: &str) -> Result<Vec<(String, Value)>, StoreError> {
        let base = path::normalize(path)?;
        let inner = self.inner.lock();
        let mut keys: Vec<&String> = inner.nodes.keys().collect();
        keys.sort();
        let mut out = Vec::new();
        for key in keys {
            if !crate::path::is_self_or_descendant(key, &base) {
                continue;
            }
            let Some(value) = inner.nodes[key].value.clone() else {
                continue;
            };
            let relative = if key == &base {
                String::new()
            } else if base.is_empty() {
                key.clone()
            } else {
                key[base.len() + 1..].to_string()
            };
            out.push((relative, value));
        }
        Ok(out)
    }

    /// Shortcut for `subtree("")`.
    pub fn dump(&self) -> Vec<(String, Value)> {
        match self.subtree("") {
            Ok(v) => v,
            Err(_) => Vec::new(),
        }
    }

    /// Resolves `relative` against `base`, interpreting the reserved dynamic
    /// segments spec.md §4.2 reserves for helpers that parse them explicitly
    /// (bare [`Store::get`]/[`Store::set`] never do): a segment `#` or
    /// `<prefix>#` creates a fresh auto-indexed child as a side effect (same
    /// as [`Store::append`]); a segment `.` or `<prefix>.` resolves to the
    /// numerically greatest existing `#<n>` / `<prefix>#<n>` sibling at that
    /// point, without creating anything. Plain segments navigate literally.
    /// Mirrors `Item._smart_set_path` / `_get_last_list_item` from the
    /// original, with the "last created" lookup resolved order-independently
    /// per spec.md §9's Open Question (numerically greatest index among
    /// current children, not an append-order journal).
    pub fn resolve_dynamic(&self, base: &str, relative: &str) -> Result<String, StoreError> {
        let mut current = path::normalize(base)?;
        for part in relative.split('/') {
            if part.is_empty() {
                continue;
            } else if part == "#" {
                current = self.append(&current, None)?;
            } else if part == "." {
                current = self.last_matching_child(&current, None)?;
            } else if let Some(prefix) = part.strip_suffix('#') {
                current = self.append(&current, Some(prefix))?;
            } else if let Some(prefix) = part.strip_suffix('.') {
                let children = self.children(&current, None)?;
                if children.iter().any(|c| c == prefix) {
                    current = self.last_matching_child(&path::join(&current, prefix), None)?;
                } else {
                    current = self.last_matching_child(&current, Some(prefix))?;
                }
            } else {
                current = path::join(&current, part);
            }
        }
        Ok(current)
    }

    /// Sets `value` at the path obtained by resolving `relative` (which may
    /// use the reserved dynamic segments above) against `base`.
    pub fn set_dynamic(
        &self,
        base: &str,
        relative: &str,
        value: Value,
        notify: bool,
    ) -> Result<String, StoreError> {
        let resolved = self.resolve_dynamic(base, relative)?;
        self.set(&resolved, value, notify)?;
        Ok(resolved)
    }

    /// The path of the numerically greatest `#<n>` / `<prefix>#<n>` child of
    /// `base`, or `base` itself if none match (mirrors the original's
    /// "return cursor unchanged" fallback).
    fn last_matching_child(&self, base: &str, prefix: Option<&str>) -> Result<String, StoreError> {
        let base_normalized = path::normalize(base)?;
        let inner = self.inner.lock();
        let best = inner.nodes.get(&base_normalized).and_then(|node| {
            let mut best: Option<(i64, &String)> = None;
            for child in &node.children {
                let digits = match prefix {
                    Some(p) => child.strip_prefix(p).and_then(|rest| rest.strip_prefix('#')),
                    None => child.strip_prefix('#'),
                };
                let Some(digits) = digits else { continue };
                let Ok(idx) = digits.parse::<i64>() else { continue };
                if best.map(|(b, _)| idx > b).unwrap_or(true) {
                    best = Some((idx, child));
                }
            }
            best.map(|(_, key)| key.clone())
        });
        Ok(match best {
            Some(key) => path::join(&base_normalized, &key),
            None => base_normalized,
        })
    }

    /// Registers a listener at `path`. See [`SubscribeOptions`] for matching
    /// rules. Returns a handle for later removal.
    pub fn subscribe(
        &self,
        path: &str,
        options: SubscribeOptions,
        callback: impl Fn(&[ChangeEvent]) + Send + Sync + 'static,
    ) -> Result<SubscriptionId, StoreError> {
        let normalized = path::normalize(path)?;
        let mut exclude = Vec::with_capacity(options.exclude.len());
        for e in &options.exclude {
            exclude.push(path::normalize(e)?);
        }
        let normalized_options = SubscribeOptions { exclude, ..options };

        let mut inner = self.inner.lock();
        let id = SubscriptionId(inner.next_sub_id);
        inner.next_sub_id += 1;
        inner.subscribers.entry(normalized).or_default().push(Subscription {
            id,
            callback: Arc::new(callback),
            options: normalized_options,
        });
        Ok(id)
    }

    /// Removes a previously registered subscription. A no-op if the handle
    /// is unknown (already removed, or never valid).
    pub fn unsubscribe(&self, id: SubscriptionId) {
        let mut inner = self.inner.lock();
        for subs in inner.subscribers.values_mut() {
            subs.retain(|s| s.id != id);
        }
    }

    /// Opens a batching scope. Changes made while any guard on the current
    /// thread is alive are buffered; when the outermost guard on this thread
    /// is dropped, matching subscribers are notified once with the full
    /// ordered list. `notify=false` anywhere in a nested chain silences the
    /// whole chain; `source` tags every change made inside the scope.
    pub fn group(&self, source: Option<String>, notify: bool) -> GroupGuard<'_> {
        GroupGuard { store: self, saved: Some(batch::enter(source, notify)) }
    }

    fn emit(&self, event: ChangeEvent) {
        if let Some(batch) = batch::record(event) {
            self.flush(batch);
        }
    }

    /// Ancestor-routed notification dispatch (spec.md §4.2, "Notification
    /// algorithm"). Callback invocation happens after the structural lock is
    /// released, so a callback that calls back into the store cannot
    /// deadlock on it.
    fn flush(&self, events: Vec<ChangeEvent>) {
        if events.is_empty() {
            return;
        }

        let mut relevant_paths: HashSet<String> = HashSet::new();
        for event in &events {
            for ancestor in path::ancestors(&event.path) {
                relevant_paths.insert(ancestor);
            }
        }

        let mut to_invoke: Vec<(Arc<dyn Fn(&[ChangeEvent]) + Send + Sync>, Vec<ChangeEvent>)> =
            Vec::new();
        {
            let inner = self.inner.lock();
            for sub_path in &relevant_paths {
                let Some(subs) = inner.subscribers.get(sub_path) else { continue };
                let at_or_under: Vec<&ChangeEvent> = events
                    .iter()
                    .filter(|e| path::is_self_or_descendant(&e.path, sub_path))
                    .collect();
                if at_or_under.is_empty() {
                    continue;
                }
                for sub in subs {
                    let mut matched: Vec<ChangeEvent> = if sub.options.recursive {
                        at_or_under.iter().map(|e| (*e).clone()).collect()
                    } else {
                        at_or_under
                            .iter()
                            .filter(|e| &e.path == sub_path)
                            .map(|e| (*e).clone())
                            .collect()
                    };
                    if !sub.options.exclude.is_empty() {
                        matched.retain(|e| {
                            !sub.options.exclude.iter().any(|ex| path::is_self_or_descendant(&e.path, ex))
                        });
                    }
                    if let Some(ignore) = &sub.options.ignore_source {
                        matched.retain(|e| e.source.as_ref() != Some(ignore));
                    }
                    if !matched.is_empty() {
                        to_invoke.push((Arc::clone(&sub.callback), matched));
                    }
                }
            }
        }

        for (callback, matched) in to_invoke {
            let result =
                std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| callback(&matched)));
            if let Err(_panic) = result {
                tracing::error!("store subscriber callback panicked; other listeners still ran");
            }
        }
    }
}

/// RAII guard returned by [`Store::group`]. Dropping it leaves the scope and
/// flushes pending changes if it was the outermost, notifying one.
pub struct GroupGuard<'s> {
    store: &'s Store,
    saved: Option<batch::ScopeSaved>,
}

impl Drop for GroupGuard<'_> {
    fn drop(&mut self) {
        if let Some(saved) = self.saved.take() {
            if let Some(events) = batch::leave(saved) {
                self.store.flush(events);
            }
        }
    }
}

/// Largest existing `k` among children matching `(prefix)?#<digits>`, or
/// `-1` if none match.
fn max_matching_index(children: &std::collections::BTreeSet<String>, prefix: Option<&str>) -> i64 {
    let mut max_idx: i64 = -1;
    for child in children {
        let digits = match prefix {
            Some(p) => child.strip_prefix(p).and_then(|rest| rest.strip_prefix('#')),
            None => child.strip_prefix('#'),
        };
        if let Some(digits) = digits {
            if let Ok(idx) = digits.parse::<i64>() {
                if idx > max_idx {
                    max_idx = idx;
                }
            }
        }
    }
    max_idx
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;
