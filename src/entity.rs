// Copyright 2024 Saptak Santra
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Entity identifiers and location metadata (C5).

use serde::{Deserialize, Serialize};
use slotmap::{Key, KeyData, new_key_type};

use crate::component::Component;
use crate::error::{EcsError, Result};
use crate::world::World;

new_key_type! {
    /// Unique entity identifier backed by slotmap's generational keys. Two
    /// distinct `EntityId`s are never equal, even after one has been
    /// despawned and its slot reused.
    pub struct EntityId;
}

/// Debug/test wire shape for an [`EntityId`]: the slot index and the
/// generation count that disambiguates a reused slot from its predecessors.
/// Not used on the hot path — table moves carry `EntityId` directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntitySnapshot {
    pub index: u32,
    pub generation: u32,
}

impl EntitySnapshot {
    /// The reserved value denoting "no entity" when round-tripped through
    /// this format.
    pub const PLACEHOLDER: EntitySnapshot = EntitySnapshot {
        index: u32::MAX,
        generation: 1,
    };

    pub fn is_placeholder(&self) -> bool {
        *self == Self::PLACEHOLDER
    }
}

/// Decompose an entity handle into its serializable index/generation pair.
pub fn serialize_entity(entity: EntityId) -> EntitySnapshot {
    let ffi = entity.data().as_ffi();
    EntitySnapshot {
        index: (ffi & 0xFFFF_FFFF) as u32,
        generation: (ffi >> 32) as u32,
    }
}

/// Reconstruct the handle a [`serialize_entity`] snapshot was taken from.
/// The returned handle is only valid to compare/look up against a world
/// that actually minted it; this does not allocate a new entity.
pub fn deserialize_entity(snapshot: EntitySnapshot) -> EntityId {
    let ffi = ((snapshot.generation as u64) << 32) | snapshot.index as u64;
    EntityId::from(KeyData::from_ffi(ffi))
}

/// An entity's current residency: which table it occupies and at which
/// row. `table_id == 0` means the entity is not resident in any live
/// table — either it has not yet been flushed into one, or it has been
/// despawned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntityLocation {
    pub table_id: usize,
    pub table_row: usize,
}

impl EntityLocation {
    pub const NOT_RESIDENT: EntityLocation = EntityLocation {
        table_id: 0,
        table_row: 0,
    };

    /// Construct a location, rejecting negative-equivalent (developer
    /// misuse) values. `usize` cannot be negative, so this only exists to
    /// give `World`/`EntityManager` a single validating constructor to
    /// call, matching the "setLocation validates non-negative" contract.
    pub fn new(table_id: usize, table_row: usize) -> Result<Self> {
        if table_id == 0 && table_row != 0 {
            return Err(EcsError::InvalidLocation(
                "non-zero row in the sentinel table".to_string(),
            ));
        }
        Ok(Self { table_id, table_row })
    }

    pub fn is_resident(&self) -> bool {
        self.table_id != 0
    }
}

/// A thin, chainable facade over staged mutations for one entity. Returned
/// by [`World::entity`]; every method forwards to the world's entity
/// manager and none of them touch table storage until the next `flush`.
pub struct EntityCommands<'w> {
    world: &'w mut World,
    entity: EntityId,
}

impl<'w> EntityCommands<'w> {
    pub(crate) fn new(world: &'w mut World, entity: EntityId) -> Self {
        Self { world, entity }
    }

    pub fn id(&self) -> EntityId {
        self.entity
    }

    pub fn is_alive(&self) -> bool {
        self.world.is_alive(self.entity)
    }

    pub fn insert<T: Component>(self, value: T) -> Self {
        self.world.insert(self.entity, value);
        self
    }

    pub fn insert_tag<T: Component>(self) -> Self {
        self.world.insert_tag::<T>(self.entity);
        self
    }

    pub fn remove<T: Component>(self) -> Self {
        self.world.remove::<T>(self.entity);
        self
    }

    pub fn despawn(self) {
        self.world.despawn(self.entity);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_round_trips_through_the_same_entity() {
        let mut world = World::new();
        let entity = world.spawn(());
        let snapshot = serialize_entity(entity);
        assert!(!snapshot.is_placeholder());
        assert_eq!(deserialize_entity(snapshot), entity);
    }

    #[test]
    fn snapshot_round_trips_through_json() {
        let mut world = World::new();
        let entity = world.spawn(());
        let snapshot = serialize_entity(entity);
        let json = serde_json::to_string(&snapshot).unwrap();
        let restored: EntitySnapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, snapshot);
        assert_eq!(deserialize_entity(restored), entity);
    }

    #[test]
    fn placeholder_is_reserved() {
        assert!(EntitySnapshot::PLACEHOLDER.is_placeholder());
        assert_eq!(EntitySnapshot::PLACEHOLDER.index, u32::MAX);
        assert_eq!(EntitySnapshot::PLACEHOLDER.generation, 1);
    }
}
