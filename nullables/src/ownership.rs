//! Nullable ownership oracle backed by an in-memory asset registry.

use drip_types::{Identity, OwnershipOracle, PositionId};
use std::cell::RefCell;
use std::collections::HashMap;

/// Tracks which identity holds each asset.
///
/// Assets that were never minted resolve to `None`, like an upstream
/// registry answering for a nonexistent token.
#[derive(Default)]
pub struct NullOwnership {
    owners: RefCell<HashMap<PositionId, Identity>>,
}

impl NullOwnership {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create (or overwrite) an asset held by `owner`.
    pub fn mint(&self, id: PositionId, owner: Identity) {
        self.owners.borrow_mut().insert(id, owner);
    }

    /// Move an existing asset to a new holder. Returns false if it does not exist.
    pub fn transfer(&self, id: PositionId, to: Identity) -> bool {
        match self.owners.borrow_mut().get_mut(&id) {
            Some(owner) => {
                *owner = to;
                true
            }
            None => false,
        }
    }

    /// Remove an asset entirely.
    pub fn burn(&self, id: PositionId) {
        self.owners.borrow_mut().remove(&id);
    }
}

impl OwnershipOracle for NullOwnership {
    fn owner_of(&self, id: PositionId) -> Option<Identity> {
        self.owners.borrow().get(&id).cloned()
    }
}
