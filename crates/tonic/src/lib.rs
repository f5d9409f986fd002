// SPDX-License-Identifier: MIT

#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
#![cfg_attr(test, allow(clippy::panic))]

//! tasktonic-tonic: reactive components whose handlers ("sparkles") run
//! serially on a shared catalyst.
//!
//! A tonic has no runtime method reflection — Rust has none — so its
//! handler table is built explicitly with [`HandlerTableBuilder`] instead
//! of being discovered from declared method names. Everything else
//! (prefix-tagged dispatch, an optional state machine, cross-thread
//! marshalling by move, and a cascading shutdown protocol) follows the
//! same shape the original describes.

mod args;
mod error;
mod handler;
mod prefix;
mod service;
mod state;
mod tonic;

pub use args::Args;
pub use error::TonicError;
pub use handler::{HandlerFn, HandlerTable, HandlerTableBuilder};
pub use prefix::Prefix;
pub use service::ServiceTonic;
pub use state::{StateTable, INACTIVE};
pub use tonic::{reserved, TonicHandle, TonicLifecycle, TonicParent, TonicSpec};
