// SPDX-License-Identifier: MIT

#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
#![cfg_attr(test, allow(clippy::panic))]

//! tasktonic-store: hierarchical, path-addressed reactive key/value tree.
//!
//! A [`Store`] is a tree of nodes identified by slash-separated path strings,
//! rooted at the empty path `""`. Writes are grouped per invoking thread into
//! batches ([`Store::group`]); when the outermost batch on a thread exits,
//! every matching subscriber is notified once with the full list of changes
//! that occurred during the batch, in emission order. Subscriber matching is
//! driven by walking each changed path's ancestors rather than scanning every
//! subscriber, so cost scales with event count and tree depth, not with
//! subscriber count.

mod batch;
mod cursor;
mod error;
mod event;
mod node;
mod path;
mod store;
mod subscribe;

pub use cursor::Cursor;
pub use error::StoreError;
pub use event::ChangeEvent;
pub use store::Store;
pub use subscribe::{SubscribeOptions, SubscriptionId};
