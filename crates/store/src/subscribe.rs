// SPDX-License-Identifier: MIT

use crate::event::ChangeEvent;
use std::sync::Arc;

/// Opaque handle returned by [`crate::Store::subscribe`], used to remove the
/// listener later via [`crate::Store::unsubscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(pub(crate) u64);

/// Options controlling how a subscriber at a given path is matched against a
/// batch of changes (spec.md §4.2, "Notification algorithm").
#[derive(Debug, Clone)]
pub struct SubscribeOptions {
    /// If `true` (the default), also match events at any descendant path.
    /// If `false`, only events whose path equals the subscribed path match.
    pub recursive: bool,
    /// Drop events whose `source` equals this tag.
    pub ignore_source: Option<String>,
    /// Drop events whose path equals or is under any of these paths.
    pub exclude: Vec<String>,
}

impl Default for SubscribeOptions {
    fn default() -> Self {
        Self { recursive: true, ignore_source: None, exclude: Vec::new() }
    }
}

pub(crate) struct Subscription {
    pub id: SubscriptionId,
    pub callback: Arc<dyn Fn(&[ChangeEvent]) + Send + Sync>,
    pub options: SubscribeOptions,
}
