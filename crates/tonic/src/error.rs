// SPDX-License-Identifier: MIT

use thiserror::Error;

/// Errors raised by [`crate::TonicHandle`] operations.
#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum TonicError {
    #[error("unknown state {0:?}")]
    UnknownState(String),
    #[error("tonic is already finishing")]
    AlreadyFinishing,
    #[error("tonic is not attached to a catalyst")]
    NotAttached,
}
