// SPDX-License-Identifier: MIT

//! Path grammar: slash-separated, non-empty segments; root is `""`.

use crate::error::StoreError;

/// Normalizes a path string: strips leading/trailing `/`, rejects internal
/// empty segments (`"a//b"`), and returns the canonical `"a/b/c"` form (or
/// `""` for the root).
pub fn normalize(path: &str) -> Result<String, StoreError> {
    let trimmed = path.trim_matches('/');
    if trimmed.is_empty() {
        return Ok(String::new());
    }
    for segment in trimmed.split('/') {
        if segment.is_empty() {
            return Err(StoreError::InvalidPath(path.to_string()));
        }
    }
    Ok(trimmed.to_string())
}

/// Splits a normalized path into its segments (empty for the root).
pub fn segments(path: &str) -> Vec<&str> {
    if path.is_empty() {
        Vec::new()
    } else {
        path.split('/').collect()
    }
}

/// Joins a parent path and a child segment into a normalized path.
pub fn join(parent: &str, segment: &str) -> String {
    if parent.is_empty() {
        segment.to_string()
    } else {
        format!("{parent}/{segment}")
    }
}

/// Returns `(parent, last_segment)` for a non-root normalized path.
pub fn split_last(path: &str) -> Option<(&str, &str)> {
    if path.is_empty() {
        return None;
    }
    match path.rsplit_once('/') {
        Some((parent, last)) => Some((parent, last)),
        None => Some(("", path)),
    }
}

/// Returns every ancestor of `path`, starting at `path` itself and ending at
/// the root `""`.
pub fn ancestors(path: &str) -> Vec<String> {
    let mut out = vec![path.to_string()];
    let mut current = path.to_string();
    while let Some((parent, _)) = split_last(&current) {
        out.push(parent.to_string());
        current = parent.to_string();
    }
    out
}

/// `true` if `candidate` equals `ancestor` or is a descendant of it
/// (`ancestor + "/" + ...`).
pub fn is_self_or_descendant(candidate: &str, ancestor: &str) -> bool {
    if ancestor.is_empty() {
        return true;
    }
    candidate == ancestor || candidate.starts_with(&format!("{ancestor}/"))
}

#[cfg(test)]
#[path = "path_tests.rs"]
mod tests;
