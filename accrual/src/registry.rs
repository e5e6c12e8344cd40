//! Position registry and the staging overlay used for all-or-nothing updates.

use crate::position::Position;
use drip_types::PositionId;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Owns every position record. Records are never deleted.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct PositionRegistry {
    positions: HashMap<PositionId, Position>,
}

impl PositionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: PositionId) -> Option<&Position> {
        self.positions.get(&id)
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Position> {
        self.positions.values()
    }

    /// Begin a set of changes that only land on [`commit`](Self::commit).
    pub fn stage(&self) -> StagedChanges<'_> {
        StagedChanges {
            base: self,
            changes: HashMap::new(),
        }
    }

    /// Apply staged changes. Infallible, so a batch either fully lands or,
    /// if staging failed earlier, never reaches this point.
    pub fn commit(&mut self, changes: HashMap<PositionId, Position>) {
        self.positions.extend(changes);
    }

    pub(crate) fn insert(&mut self, position: Position) {
        self.positions.insert(position.id, position);
    }
}

/// Copy-on-write view over a registry.
///
/// Reads see earlier staged writes, so a batch naming the same id twice is
/// processed against its own intermediate state.
pub struct StagedChanges<'a> {
    base: &'a PositionRegistry,
    changes: HashMap<PositionId, Position>,
}

impl StagedChanges<'_> {
    pub fn get(&self, id: PositionId) -> Option<Position> {
        self.changes
            .get(&id)
            .or_else(|| self.base.get(id))
            .cloned()
    }

    pub fn put(&mut self, position: Position) {
        self.changes.insert(position.id, position);
    }

    pub fn into_changes(self) -> HashMap<PositionId, Position> {
        self.changes
    }
}
