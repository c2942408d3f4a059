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

//! Stages destination archetypes and pending component payloads for every
//! entity, and resolves them into table moves on [`flush`](EntityManager::flush).

use rustc_hash::FxHashMap;
use slotmap::SlotMap;

use crate::archetype::ArchetypeId;
use crate::entity::{EntityId, EntityLocation};
use crate::registry::TypeRegistry;
use crate::table::{PendingValue, TableRegistry};

/// Owns entity identity (the generational slotmap) plus the two staging
/// maps: the archetype an entity will occupy after the next flush, and the
/// component payload to write at that time.
pub struct EntityManager {
    locations: SlotMap<EntityId, EntityLocation>,
    destinations: FxHashMap<EntityId, ArchetypeId>,
    pending: FxHashMap<EntityId, Vec<PendingValue>>,
}

impl EntityManager {
    pub fn new() -> Self {
        Self {
            locations: SlotMap::with_key(),
            destinations: FxHashMap::default(),
            pending: FxHashMap::default(),
        }
    }

    /// Allocate a new entity id, not yet resident in any table, and stage
    /// its destination archetype and initial component payload.
    pub fn spawn(&mut self, destination: ArchetypeId, pending: Vec<PendingValue>) -> EntityId {
        let entity = self.locations.insert(EntityLocation::NOT_RESIDENT);
        self.destinations.insert(entity, destination);
        self.pending.insert(entity, pending);
        entity
    }

    /// True iff `entity` has a live slot — reflects the world as of the
    /// last flush, not any pending structural change.
    pub fn is_alive(&self, entity: EntityId) -> bool {
        self.locations.contains_key(entity)
    }

    /// The entity's current (last-flushed) location, or `None` if it was
    /// never valid or has been despawned and flushed.
    pub fn location(&self, entity: EntityId) -> Option<EntityLocation> {
        self.locations.get(entity).copied()
    }

    /// Number of live entity slots, including ones not yet flushed into a table.
    pub fn len(&self) -> usize {
        self.locations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locations.is_empty()
    }

    fn destination_or_current(&mut self, entity: EntityId, current: impl FnOnce() -> ArchetypeId) -> &mut ArchetypeId {
        self.destinations.entry(entity).or_insert_with(current)
    }

    /// OR the bit for `component_id` into the entity's destination
    /// archetype and replace (or append) its pending value.
    pub fn stage_insert(
        &mut self,
        entity: EntityId,
        component_id: u32,
        value: PendingValue,
        current: impl FnOnce() -> ArchetypeId,
    ) {
        self.destination_or_current(entity, current).set(component_id);
        let payload = self.pending.entry(entity).or_default();
        if let Some(existing) = payload.iter_mut().find(|p| p.component_id == component_id) {
            *existing = value;
        } else {
            payload.push(value);
        }
    }

    /// OR the bit for a zero-sized (tag) component; no payload is staged.
    pub fn stage_insert_tag(&mut self, entity: EntityId, component_id: u32, current: impl FnOnce() -> ArchetypeId) {
        self.destination_or_current(entity, current).set(component_id);
    }

    /// AND the destination with the complement of `component_id`'s bit.
    /// Any already-staged pending value of that type is left in place; it
    /// is silently discarded at flush time because the target table has no
    /// matching column.
    pub fn stage_remove(&mut self, entity: EntityId, component_id: u32, current: impl FnOnce() -> ArchetypeId) {
        self.destination_or_current(entity, current).clear(component_id);
    }

    /// Stage destination = the sentinel archetype and drop any pending
    /// payload.
    pub fn stage_despawn(&mut self, entity: EntityId) {
        self.destinations.insert(entity, ArchetypeId::sentinel());
        self.pending.insert(entity, Vec::new());
    }

    /// Apply every staged structural change. Resolves every destination's
    /// target table first (table acquisition cannot fail), then performs
    /// every row move — so a flush can only fail on a genuine invariant
    /// violation, never partway through due to an unresolvable target.
    ///
    /// Returns the ids and archetypes of any tables created during this
    /// flush, so the caller can emit the table-created event exactly once
    /// per new table.
    pub fn flush(&mut self, type_registry: &TypeRegistry, tables: &mut TableRegistry) -> Vec<(usize, ArchetypeId)> {
        let destinations = std::mem::take(&mut self.destinations);
        let mut pending = std::mem::take(&mut self.pending);
        let mut created = Vec::new();

        let mut resolved: Vec<(EntityId, usize, bool)> = Vec::with_capacity(destinations.len());
        for (entity, destination) in &destinations {
            let (target_id, was_created) = tables.acquire(destination, type_registry);
            if was_created {
                created.push((target_id, destination.clone()));
            }
            resolved.push((*entity, target_id, destination.is_sentinel()));
        }

        for (entity, target_id, despawning) in resolved {
            let location = self.locations.get(entity).copied().unwrap_or(EntityLocation::NOT_RESIDENT);
            let payload = pending.remove(&entity).unwrap_or_default();
            let outcome = tables.move_row(entity, location.table_id, location.table_row, target_id, payload);

            if despawning {
                self.locations.remove(entity);
            } else if let Some(loc) = self.locations.get_mut(entity) {
                *loc = EntityLocation {
                    table_id: outcome.table_id,
                    table_row: outcome.row,
                };
            }

            if let Some(backfilled) = outcome.backfilled {
                if let Some(loc) = self.locations.get_mut(backfilled) {
                    loc.table_row = location.table_row;
                }
            }
        }

        created
    }
}

impl Default for EntityManager {
    fn default() -> Self {
        Self::new()
    }
}
