// SPDX-License-Identifier: MIT

use crate::args::Args;
use crate::error::TonicError;
use crate::handler::HandlerTable;
use crate::prefix::Prefix;
use crate::state::StateTable;
use parking_lot::Mutex;
use smol_str::SmolStr;
use std::sync::Arc;
use tasktonic_catalyst::{Catalyst, Clock, SystemClock};
use tasktonic_ledger::{EntityId, Ledger, ServiceKey};

/// The reserved system/user lifecycle base names the framework itself
/// invokes (spec.md §6, "Reserved base names").
pub mod reserved {
    pub const ON_START: &str = "on_start";
    pub const ON_FINISHED: &str = "on_finished";
    pub const ON_ENTER: &str = "on_enter";
    pub const ON_EXIT: &str = "on_exit";
}

/// Type-erased shutdown surface every `TonicHandle<T, C>` implements,
/// regardless of its body type `T` — needed because a tonic's children may
/// each have a different concrete body (spec.md §3 "Parent/child binding"
/// places no constraint on a child's type beyond being another entity).
pub trait TonicLifecycle: Send + Sync {
    fn id(&self) -> EntityId;
    fn finish_from(&self, from_context: Option<EntityId>);
}

/// The generic half of the parent side of a binding: lets a child notify
/// its parent that it has fully finalized, without the parent needing to
/// know the child's concrete body type (and vice versa).
pub trait TonicParent: Send + Sync {
    fn binding_finished(&self, child_id: EntityId);
}

/// Non-generic-over-`T` tonic state: identity, attachment, the shutdown
/// cascade's bookkeeping, and (if this tonic has a state machine) its
/// [`StateTable`]. Split out from [`TonicShared`] so the cascade logic
/// doesn't need to be generic over the handler body type.
struct TonicCore<C: Clock> {
    id: EntityId,
    catalyst: Arc<Catalyst<C>>,
    ledger: &'static Ledger,
    service_key: Option<ServiceKey>,
    force_stealth: bool,
    finishing: Mutex<bool>,
    system_only: Mutex<bool>,
    state: Option<StateTable>,
    children: Mutex<Vec<Arc<dyn TonicLifecycle>>>,
    parent: Option<Arc<dyn TonicParent>>,
}

/// Construction parameters for [`TonicHandle::new`], grouped to avoid an
/// unwieldy positional-argument list.
pub struct TonicSpec<T, C: Clock = SystemClock> {
    pub type_name: String,
    pub name: Option<String>,
    pub context: Option<EntityId>,
    pub service_key: Option<ServiceKey>,
    pub force_stealth: bool,
    pub states: Vec<SmolStr>,
    pub handlers: HandlerTable<T, C>,
    pub body: T,
    pub parent: Option<Arc<dyn TonicParent>>,
}

impl<T, C: Clock> TonicSpec<T, C> {
    pub fn new(type_name: impl Into<String>, handlers: HandlerTable<T, C>, body: T) -> Self {
        Self {
            type_name: type_name.into(),
            name: None,
            context: None,
            service_key: None,
            force_stealth: false,
            states: handlers.states().to_vec(),
            handlers,
            body,
            parent: None,
        }
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn context(mut self, context: EntityId) -> Self {
        self.context = Some(context);
        self
    }

    pub fn service_key(mut self, key: ServiceKey) -> Self {
        self.service_key = Some(key);
        self
    }

    pub fn force_stealth(mut self, force: bool) -> Self {
        self.force_stealth = force;
        self
    }

    pub fn parent(mut self, parent: Arc<dyn TonicParent>) -> Self {
        self.parent = Some(parent);
        self
    }
}

struct TonicShared<T, C: Clock> {
    core: TonicCore<C>,
    handlers: HandlerTable<T, C>,
    body: Mutex<T>,
}

/// A live tonic instance: a cheap, cloneable `Arc`-backed handle over its
/// shared state, handler table, and body (spec.md §4.4). Every call that
/// crosses into the tonic's body goes through [`TonicHandle::dispatch`],
/// which enqueues onto the owning catalyst rather than running inline,
/// except for lifecycle/state-machine operations that are only ever
/// called from within a handler already running on that thread.
///
/// Generic over the catalyst's [`Clock`] (`C`, defaulting to
/// [`SystemClock`]) so tests and demos can drive a tonic's timers through a
/// `FakeClock`-backed catalyst deterministically (spec.md §8 scenario 2,
/// "traffic light").
pub struct TonicHandle<T, C: Clock = SystemClock>(Arc<TonicShared<T, C>>);

impl<T, C: Clock> Clone for TonicHandle<T, C> {
    fn clone(&self) -> Self {
        Self(Arc::clone(&self.0))
    }
}

impl<T: Send + 'static, C: Clock> TonicHandle<T, C> {
    /// Registers a new tonic: claims an entity id, binds it to `catalyst`,
    /// and enqueues the startup sparkles (spec.md §4.4, "after
    /// construction, a post-init hook ... enqueues `on_start` events (both
    /// the internal system variant and the user variant, in that order)").
    pub fn new(
        ledger: &'static Ledger,
        catalyst: Arc<Catalyst<C>>,
        spec: TonicSpec<T, C>,
    ) -> Result<Self, TonicError> {
        let id = ledger
            .register(spec.type_name.clone(), spec.context, spec.name.clone())
            .map_err(|_| TonicError::NotAttached)?;
        Self::at_id(id, ledger, catalyst, spec)
    }

    /// Builds a tonic against an entity id the caller already claimed in
    /// the ledger, instead of registering a fresh one. Used by
    /// [`crate::ServiceTonic::get_or_create`], whose
    /// [`tasktonic_ledger::Ledger::get_or_create_service`] call has already
    /// done the registration as part of resolving service-entity uniqueness
    /// (spec.md §3 "Service (singleton) entity") — calling [`TonicHandle::new`]
    /// on top of that would register a second, orphaned entity under a
    /// different id for the same service key.
    pub(crate) fn at_id(
        id: EntityId,
        ledger: &'static Ledger,
        catalyst: Arc<Catalyst<C>>,
        spec: TonicSpec<T, C>,
    ) -> Result<Self, TonicError> {
        catalyst.bind_tonic(id);

        let state = if spec.states.is_empty() { None } else { Some(StateTable::new(spec.states)) };

        let handle = Self(Arc::new(TonicShared {
            core: TonicCore {
                id,
                catalyst,
                ledger,
                service_key: spec.service_key,
                force_stealth: spec.force_stealth,
                finishing: Mutex::new(false),
                system_only: Mutex::new(false),
                state,
                children: Mutex::new(Vec::new()),
                parent: spec.parent,
            },
            handlers: spec.handlers,
            body: Mutex::new(spec.body),
        }));

        handle.dispatch(Prefix::InternalSystem, reserved::ON_START, Args::none());
        handle.dispatch(Prefix::UserEvent, reserved::ON_START, Args::none());
        Ok(handle)
    }

    pub fn id(&self) -> EntityId {
        self.0.core.id
    }

    pub fn is_stealth(&self) -> bool {
        self.0.core.force_stealth
    }

    pub fn current_state(&self) -> i32 {
        self.0.core.state.as_ref().map(StateTable::current).unwrap_or(crate::state::INACTIVE)
    }

    pub fn state_name(&self, index: i32) -> Option<SmolStr> {
        self.0.core.state.as_ref().and_then(|s| s.name_of(index)).cloned()
    }

    /// Registers `child` as a binding of this tonic: it will be asked to
    /// `finish` during this tonic's own shutdown cascade, and this tonic
    /// waits for all adopted children to finalize before finalizing itself
    /// (spec.md §4.4 shutdown, "if there are live children, request each to
    /// finish ... then wait ... until they have all finished").
    pub fn adopt(&self, child: Arc<dyn TonicLifecycle>) {
        self.0.core.children.lock().push(child);
    }

    /// Sparkle dispatch: the sole entry point user and framework code use
    /// to invoke a handler on this tonic. Always enqueues onto the owning
    /// catalyst rather than running inline, even when called from that
    /// catalyst's own thread (spec.md §4.4: the call's arguments are moved
    /// into the boxed job regardless of origin thread — there is no
    /// reflection-based thread check needed since ownership transfer
    /// already prevents aliasing).
    pub fn dispatch(&self, prefix: Prefix, base: &str, args: Args) {
        if self.is_finishing() && *self.0.core.system_only.lock() && !prefix.survives_system_only_mode(base) {
            tracing::trace!(tonic = %self.id(), %prefix, base, "sparkle dropped: system-only mode");
            return;
        }
        let handle = self.clone();
        let base = base.to_string();
        self.0.core.catalyst.enqueue(Box::new(move || handle.execute(prefix, &base, args)));
    }

    /// Runs the resolved handler for `(prefix, base)` inline. Only called
    /// from a job the catalyst is already executing on its own thread.
    fn execute(&self, prefix: Prefix, base: &str, args: Args) {
        let state = self.current_state();
        let Some(handler) = self.0.handlers.resolve(prefix, base, state) else {
            return;
        };
        let handle = self.clone();
        let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let mut body = self.0.body.lock();
            handler(&mut body, &handle, args);
        }));
        if outcome.is_err() {
            tracing::error!(tonic = %self.id(), %prefix, base, "sparkle handler panicked");
        }
    }

    /// Invokes the resolved handler for `base` synchronously, on the
    /// calling (catalyst) thread, bypassing the queue — used by
    /// [`TonicHandle::to_state`]'s extra-sparkle jobs (which already run
    /// strictly between queue items) and by [`TonicHandle::finish_from`]'s
    /// `on_finished`/`on_finished_system` calls, which spec.md §4.4 requires
    /// to complete before `finalize()` runs, not merely be enqueued after it.
    fn run_lifecycle_sparkle(&self, prefix: Prefix, base: &str) {
        self.execute(prefix, base, Args::none());
    }

    /// Requests a state transition. Per spec.md §4.4/§9, this does not
    /// mutate state synchronously: it schedules `on_exit` (if a state is
    /// currently active), the assignment itself, and `on_enter` (if
    /// `target != -1`) as extra sparkles. Extras drain LIFO strictly before
    /// the next queued sparkle, so they must be pushed in the *reverse* of
    /// their intended execution order: `on_enter` first, then the
    /// assignment, then `on_exit` last, so draining pops `on_exit`,
    /// assignment, `on_enter` — the correct forward order (spec.md P9).
    ///
    /// Must be called from a handler already running on this tonic's
    /// catalyst thread; it pushes directly onto that catalyst's
    /// extra-sparkles stack rather than going through `dispatch`.
    pub fn to_state(&self, target: i32) {
        let Some(state) = self.0.core.state.as_ref() else {
            tracing::warn!(tonic = %self.id(), "to_state called on a tonic with no state machine");
            return;
        };
        let current = state.current();

        if target != crate::state::INACTIVE {
            let handle = self.clone();
            self.0.core.catalyst.push_extra(Box::new(move || {
                handle.run_lifecycle_sparkle(Prefix::InternalSystem, reserved::ON_ENTER)
            }));
        }
        {
            let handle = self.clone();
            self.0.core.catalyst.push_extra(Box::new(move || {
                if let Some(state) = handle.0.core.state.as_ref() {
                    state.assign(target);
                }
            }));
        }
        if current != crate::state::INACTIVE {
            let handle = self.clone();
            self.0.core.catalyst.push_extra(Box::new(move || {
                handle.run_lifecycle_sparkle(Prefix::InternalSystem, reserved::ON_EXIT)
            }));
        }
    }

    /// Convenience over [`TonicHandle::to_state`] that resolves a state
    /// name through this tonic's [`StateTable`] first.
    pub fn to_state_named(&self, name: &str) -> Result<(), TonicError> {
        let index = self
            .0
            .core
            .state
            .as_ref()
            .and_then(|s| s.index_of(name))
            .ok_or_else(|| TonicError::UnknownState(name.to_string()))?;
        self.to_state(index);
        Ok(())
    }

    fn is_finishing(&self) -> bool {
        *self.0.core.finishing.lock()
    }

    /// Public, idempotent shutdown entry point (spec.md P10).
    pub fn finish(&self) {
        self.finish_from(None);
    }

    /// Detaches `context` from this tonic's service-context list (spec.md
    /// §3 "Service (singleton) entity", `ttEssence._finish_service_context`)
    /// and, if no holders remain, runs the full shutdown cascade. Used by
    /// [`crate::ServiceTonic`] holders instead of [`TonicHandle::finish`]
    /// when releasing a shared service instance rather than shutting down
    /// an owned child.
    pub fn release_service_context(&self, context: EntityId) {
        self.finish_from(Some(context));
    }

    /// Shutdown cascade (spec.md §4.4, §9 "Shutdown races"). `from_context`
    /// identifies the caller when this tonic is a service being detached
    /// from one of its holders; `None` for an ordinary parent-initiated or
    /// self-initiated finish.
    fn finish_from(&self, from_context: Option<EntityId>) {
        {
            let mut finishing = self.0.core.finishing.lock();
            if *finishing {
                return;
            }
            *finishing = true;
        }

        if let (Some(key), Some(ctx)) = (&self.0.core.service_key, from_context) {
            if let Ok(remaining) = self.0.core.ledger.remove_service_context(key, ctx) {
                if remaining > 0 {
                    // Other contexts still hold this service; this call only
                    // detached one of them, the service itself lives on.
                    *self.0.core.finishing.lock() = false;
                    return;
                }
            }
        }

        *self.0.core.system_only.lock() = true;

        if self.current_state() != crate::state::INACTIVE {
            self.to_state(crate::state::INACTIVE);
        }

        // Run inline, not via `dispatch`: these must complete before
        // `finalize()` runs below (spec.md §4.4, "invoke on_finished (user)
        // then on_finished_system (internal) ... then finalize"). Enqueuing
        // them would race `finalize()`'s `catalyst.remove_tonic()`, which
        // can stop the catalyst's loop before the queued jobs are ever
        // dequeued, silently dropping user cleanup.
        self.run_lifecycle_sparkle(Prefix::UserEvent, reserved::ON_FINISHED);
        self.run_lifecycle_sparkle(Prefix::InternalSystem, reserved::ON_FINISHED);

        let children = self.0.core.children.lock().clone();
        if children.is_empty() {
            self.finalize();
        } else {
            for child in children {
                child.finish_from(Some(self.id()));
            }
        }
    }

    fn binding_finished(&self, child_id: EntityId) {
        let mut children = self.0.core.children.lock();
        children.retain(|c| c.id() != child_id);
        let empty = children.is_empty();
        drop(children);
        if empty && *self.0.core.finishing.lock() {
            self.finalize();
        }
    }

    /// Finalization: unregisters from the ledger, detaches from the
    /// catalyst (which finishes itself once its last tonic is gone), and
    /// notifies the parent's `binding_finished` barrier.
    fn finalize(&self) {
        let _ = self.0.core.ledger.unregister(self.0.core.id);
        self.0.core.catalyst.remove_tonic(self.0.core.id);
        if let Some(parent) = &self.0.core.parent {
            parent.binding_finished(self.0.core.id);
        }
    }
}

impl<T: Send + 'static, C: Clock> TonicLifecycle for TonicHandle<T, C> {
    fn id(&self) -> EntityId {
        TonicHandle::id(self)
    }

    fn finish_from(&self, from_context: Option<EntityId>) {
        TonicHandle::finish_from(self, from_context)
    }
}

impl<T: Send + 'static, C: Clock> TonicParent for TonicHandle<T, C> {
    fn binding_finished(&self, child_id: EntityId) {
        TonicHandle::binding_finished(self, child_id)
    }
}

#[cfg(test)]
#[path = "tonic_tests.rs"]
mod tests;
