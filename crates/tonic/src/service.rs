// SPDX-License-Identifier: MIT

use crate::error::TonicError;
use crate::tonic::{TonicHandle, TonicSpec};
use parking_lot::Mutex;
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::{Arc, OnceLock};
use tasktonic_catalyst::{Catalyst, Clock};
use tasktonic_ledger::{EntityId, Ledger, ServiceKey};

type Registry = Mutex<HashMap<(TypeId, ServiceKey), Box<dyn Any + Send + Sync>>>;

fn registry() -> &'static Registry {
    static REGISTRY: OnceLock<Registry> = OnceLock::new();
    REGISTRY.get_or_init(|| Mutex::new(HashMap::new()))
}

/// Implements the service-singleton construction protocol (spec.md §3
/// "Service (singleton) entity", §4.4 "Service tonics"): the first caller
/// for a given key runs full construction; every later caller for the same
/// key is handed the existing instance and only runs a lightweight rebind
/// hook, mirroring the original's metaclass interception that returns the
/// singleton instance instead of re-running `__init__`.
///
/// [`Ledger::get_or_create_service`] is the sole authority on *whether* a
/// construction request is the first one; this module additionally needs
/// to hand back the *actual instance* (the ledger only deals in
/// [`EntityId`]s), so it keeps a small side table keyed by `(TypeId,
/// ServiceKey)`. A caller that registers two different concrete tonic
/// types under the same key is a programmer error this module does not
/// attempt to detect — see DESIGN.md.
pub struct ServiceTonic;

impl ServiceTonic {
    /// Resolves the service identified by `key` for `context`. Runs `build`
    /// exactly once per key, on the first caller; every subsequent caller
    /// for that key is handed the already-built instance and `on_rebind`
    /// runs instead (the `_init_service` hook in the original).
    pub fn get_or_create<T, C>(
        ledger: &'static Ledger,
        catalyst: Arc<Catalyst<C>>,
        key: ServiceKey,
        context: EntityId,
        type_name: impl Into<String>,
        name: Option<String>,
        build: impl FnOnce() -> TonicSpec<T, C>,
        on_rebind: impl FnOnce(&TonicHandle<T, C>, EntityId),
    ) -> Result<TonicHandle<T, C>, TonicError>
    where
        T: Send + 'static,
        C: Clock,
    {
        let (id, created) = ledger
            .get_or_create_service(key.clone(), context, type_name, name)
            .map_err(|_| TonicError::NotAttached)?;

        let type_key = (TypeId::of::<TonicHandle<T, C>>(), key);

        if created {
            let mut spec = build();
            spec.service_key = Some(type_key.1.clone());
            let handle = TonicHandle::at_id(id, ledger, catalyst, spec)?;
            registry().lock().insert(type_key, Box::new(handle.clone()));
            Ok(handle)
        } else {
            let existing = {
                let guard = registry().lock();
                guard
                    .get(&type_key)
                    .and_then(|boxed| boxed.downcast_ref::<TonicHandle<T, C>>())
                    .cloned()
            };
            let handle = existing.ok_or(TonicError::NotAttached)?;
            on_rebind(&handle, context);
            Ok(handle)
        }
    }
}

#[cfg(test)]
#[path = "service_tests.rs"]
mod tests;
