// SPDX-License-Identifier: MIT

use smol_str::SmolStr;

/// A dense, reused-on-unregister index into the ledger's record table.
///
/// Unlike the teacher crate's nanoid-based [`IdBuf`]-style identifiers
/// (`tasktonic-store` has no equivalent need for those), entity ids are
/// small integers: `register` always hands out the lowest currently-empty
/// slot, and `unregister` frees it for reuse (spec.md P1).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EntityId(pub(crate) usize);

impl EntityId {
    /// Wraps a raw slot index. Only needed outside this crate for tests and
    /// diagnostics that need to construct an id without going through
    /// [`crate::Ledger::register`] — never use this to fabricate an id you
    /// then look up, since the ledger is the sole authority on which ids are
    /// actually live.
    pub fn from_index(index: usize) -> Self {
        Self(index)
    }

    pub fn index(self) -> usize {
        self.0
    }
}

impl std::fmt::Display for EntityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Interned key identifying a service (singleton) entity. A small,
/// `Copy`-cheap string type — matches the teacher's preference for
/// `smol_str::SmolStr` over `String` for short, frequently-compared names.
pub type ServiceKey = SmolStr;

/// A ledger record: the metadata the ledger tracks about a registered
/// entity. The entity's actual behavior (a Tonic, a Catalyst, ...) lives in
/// its owning crate; the ledger only ever sees this data, per spec.md §3's
/// "Entity (ledger record)" framing.
#[derive(Debug, Clone, PartialEq)]
pub struct EntityRecord {
    pub id: EntityId,
    pub name: String,
    pub type_name: String,
    pub context_id: Option<EntityId>,
    pub service: Option<ServiceKey>,
    pub service_contexts: Vec<EntityId>,
    /// `true` for slots reserved via [`crate::Ledger::reserve_fixed`] or
    /// claimed via [`crate::Ledger::claim_fixed`], exempting them from the
    /// lowest-empty-slot search so a well-known id (e.g. the main catalyst
    /// at 0) never moves.
    pub fixed: bool,
}
