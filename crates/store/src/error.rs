// SPDX-License-Identifier: MIT

use thiserror::Error;

/// Errors raised by [`crate::Store`] operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    /// A path segment was empty after normalization (e.g. `"a//b"`).
    #[error("invalid path {0:?}: contains an empty segment")]
    InvalidPath(String),
}
