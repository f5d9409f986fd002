// SPDX-License-Identifier: MIT

use tasktonic_catalyst::CatalystError;
use tasktonic_ledger::LedgerError;
use tasktonic_store::StoreError;
use tasktonic_tonic::TonicError;
use thiserror::Error;

/// Errors raised while assembling or driving a [`crate::Runtime`].
#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("invalid runtime config: {0}")]
    InvalidConfig(#[from] toml::de::Error),
    #[error("formula write failed: {0}")]
    Formula(StoreError),
    #[error("ledger error during bootstrap: {0}")]
    Ledger(#[from] LedgerError),
    #[error("catalyst error during bootstrap: {0}")]
    Catalyst(#[from] CatalystError),
    #[error("tonic error during bootstrap: {0}")]
    Tonic(#[from] TonicError),
    #[error("main catalyst (id 0) was not claimed during bootstrap")]
    MainCatalystMissing,
}
