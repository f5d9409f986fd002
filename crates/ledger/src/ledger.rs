// SPDX-License-Identifier: MIT

use crate::entity::{EntityId, EntityRecord, ServiceKey};
use crate::error::LedgerError;
use parking_lot::RwLock;
use serde_json::Value;
use std::sync::OnceLock;
use tasktonic_store::{Store, StoreError};

struct LedgerState {
    records: Vec<Option<EntityRecord>>,
}

impl LedgerState {
    fn new() -> Self {
        Self { records: Vec::new() }
    }

    fn next_free_slot(&self) -> usize {
        self.records.iter().position(|r| r.is_none()).unwrap_or(self.records.len())
    }

    fn register(
        &mut self,
        type_name: String,
        context_id: Option<EntityId>,
        name: Option<String>,
    ) -> Result<EntityId, LedgerError> {
        if type_name.trim().is_empty() {
            return Err(LedgerError::MissingField("type"));
        }
        let idx = self.next_free_slot();
        if idx == self.records.len() {
            self.records.push(None);
        }
        let id = EntityId(idx);
        let name = name.unwrap_or_else(|| format!("{idx:02}.{type_name}"));
        self.records[idx] = Some(EntityRecord {
            id,
            name,
            type_name,
            context_id,
            service: None,
            service_contexts: Vec::new(),
            fixed: false,
        });
        Ok(id)
    }
}

/// The process-wide registry of every live entity: who exists, what they
/// are, and how to find them by id, name, or service key. See spec.md §4.1.
pub struct Ledger {
    state: RwLock<LedgerState>,
    formula: Store,
}

static GLOBAL: OnceLock<Ledger> = OnceLock::new();

impl Default for Ledger {
    fn default() -> Self {
        Self::new()
    }
}

impl Ledger {
    /// Builds a fresh, independent ledger. Production code normally wants
    /// [`Ledger::global`]; tests should use `new` directly so that property
    /// tests asserting P1/P2 over a sequence of operations don't interfere
    /// with each other across threads the way a single process-wide
    /// singleton (as in the original) would.
    pub fn new() -> Self {
        Self { state: RwLock::new(LedgerState::new()), formula: Store::new() }
    }

    /// The process-wide singleton instance, lazily constructed on first use.
    pub fn global() -> &'static Ledger {
        GLOBAL.get_or_init(Ledger::new)
    }

    /// The configuration store (log routing, project identity, ...), owned
    /// by the ledger and read-mostly after bootstrap.
    pub fn formula(&self) -> &Store {
        &self.formula
    }

    /// Writes a single key into [`Ledger::formula`].
    pub fn update_formula(&self, path: &str, value: Value) -> Result<(), StoreError> {
        self.formula.set(path, value, true)
    }

    /// Pre-allocates a densely-numbered slot before any entity claims it,
    /// e.g. to guarantee the main catalyst is always id 0. Claim it with
    /// [`Ledger::claim_fixed`] once the real entity is ready to register.
    pub fn reserve_fixed(&self, name: &str) -> EntityId {
        let mut state = self.state.write();
        let idx = state.next_free_slot();
        if idx == state.records.len() {
            state.records.push(None);
        }
        let id = EntityId(idx);
        state.records[idx] = Some(EntityRecord {
            id,
            name: name.to_string(),
            type_name: "RESERVED".to_string(),
            context_id: None,
            service: None,
            service_contexts: Vec::new(),
            fixed: true,
        });
        id
    }

    /// Claims a slot previously reserved via [`Ledger::reserve_fixed`],
    /// replacing its placeholder record with the real entity's metadata.
    pub fn claim_fixed(
        &self,
        id: EntityId,
        type_name: impl Into<String>,
        name: Option<String>,
    ) -> Result<EntityId, LedgerError> {
        let mut state = self.state.write();
        match state.records.get(id.0) {
            Some(Some(record)) if record.fixed && record.type_name == "RESERVED" => {}
            Some(Some(_)) => return Err(LedgerError::FixedSlotTaken(id)),
            _ => return Err(LedgerError::UnknownEntity(id)),
        }
        let type_name = type_name.into();
        let name = name.unwrap_or_else(|| format!("{:02}.{}", id.0, type_name));
        state.records[id.0] = Some(EntityRecord {
            id,
            name,
            type_name,
            context_id: None,
            service: None,
            service_contexts: Vec::new(),
            fixed: true,
        });
        Ok(id)
    }

    /// Registers a new entity, assigning it the lowest free slot.
    pub fn register(
        &self,
        type_name: impl Into<String>,
        context_id: Option<EntityId>,
        name: Option<String>,
    ) -> Result<EntityId, LedgerError> {
        self.state.write().register(type_name.into(), context_id, name)
    }

    /// Empties a slot. Idempotent if already empty; errors only if `id` was
    /// never a valid index.
    pub fn unregister(&self, id: EntityId) -> Result<(), LedgerError> {
        let mut state = self.state.write();
        match state.records.get_mut(id.0) {
            Some(slot) => {
                *slot = None;
                Ok(())
            }
            None => Err(LedgerError::UnknownEntity(id)),
        }
    }

    /// Shallow-merges a change into `id`'s record via the supplied closure.
    pub fn update_record(
        &self,
        id: EntityId,
        patch: impl FnOnce(&mut EntityRecord),
    ) -> Result<(), LedgerError> {
        let mut state = self.state.write();
        match state.records.get_mut(id.0).and_then(|slot| slot.as_mut()) {
            Some(record) => {
                patch(record);
                Ok(())
            }
            None => Err(LedgerError::UnknownEntity(id)),
        }
    }

    pub fn get_entity_by_id(&self, id: EntityId) -> Option<EntityRecord> {
        self.state.read().records.get(id.0).and_then(|slot| slot.clone())
    }

    pub fn get_id_by_name(&self, name: &str) -> Option<EntityId> {
        self.state.read().records.iter().flatten().find(|r| r.name == name).map(|r| r.id)
    }

    pub fn get_entity_by_name(&self, name: &str) -> Option<EntityRecord> {
        self.state.read().records.iter().flatten().find(|r| r.name == name).cloned()
    }

    pub fn get_entity_by_service(&self, key: &ServiceKey) -> Option<EntityRecord> {
        self.state.read().records.iter().flatten().find(|r| r.service.as_ref() == Some(key)).cloned()
    }

    /// Returns the entity for `key`, creating it via `type_name`/`name` if
    /// none exists yet. The returned bool is `true` when a new entity was
    /// created, `false` when an existing one gained `context` as an
    /// additional service context (spec.md §9, "get_or_create_service
    /// builder").
    pub fn get_or_create_service(
        &self,
        key: ServiceKey,
        context: EntityId,
        type_name: impl Into<String>,
        name: Option<String>,
    ) -> Result<(EntityId, bool), LedgerError> {
        let mut state = self.state.write();
        if let Some(record) = state.records.iter_mut().flatten().find(|r| r.service.as_ref() == Some(&key)) {
            record.service_contexts.push(context);
            return Ok((record.id, false));
        }
        let id = state.register(type_name.into(), Some(context), name)?;
        if let Some(record) = state.records[id.0].as_mut() {
            record.service = Some(key);
        }
        Ok((id, true))
    }

    /// Detaches `context` from the service identified by `key`'s
    /// `service_contexts` list, returning how many remain. Part of the
    /// shutdown cascade: a service only finishes once this reaches zero and
    /// its own parent chain has also finished.
    pub fn remove_service_context(&self, key: &ServiceKey, context: EntityId) -> Result<usize, LedgerError> {
        let mut state = self.state.write();
        match state.records.iter_mut().flatten().find(|r| r.service.as_ref() == Some(key)) {
            Some(record) => {
                record.service_contexts.retain(|c| *c != context);
                Ok(record.service_contexts.len())
            }
            None => Err(LedgerError::NotAService(key.clone())),
        }
    }
}

#[cfg(test)]
#[path = "ledger_tests.rs"]
mod tests;
