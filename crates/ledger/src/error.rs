// SPDX-License-Identifier: MIT

use crate::entity::{EntityId, ServiceKey};
use thiserror::Error;

/// Errors raised by [`crate::Ledger`] operations.
#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum LedgerError {
    #[error("entity {0} is not registered")]
    UnknownEntity(EntityId),
    #[error("no entity registered under name {0:?}")]
    UnknownName(String),
    #[error("registration is missing required field {0:?}")]
    MissingField(&'static str),
    #[error("fixed slot {0} is already claimed")]
    FixedSlotTaken(EntityId),
    #[error("service key {0:?} has no live entity")]
    NotAService(ServiceKey),
}
