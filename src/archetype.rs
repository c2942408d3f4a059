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

//! Archetype identity: encodes a set of component ids to a bitfield and
//! decodes a bitfield back to an ordered list of component ids.

use std::any::TypeId;

use crate::bitset::BitSet;
use crate::registry::{TypeRegistry, ENTITY_COMPONENT_ID};

/// A non-zero bitfield whose bit `i` is set iff component id `i` is present.
/// Bit 0 (the Entity column) is always set for any archetype produced by
/// [`encode`]. The reserved all-zero value denotes the *despawned*
/// archetype and is never returned by the encoder.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct ArchetypeId(BitSet);

impl ArchetypeId {
    /// The reserved despawned/sentinel archetype — the single all-zero value.
    pub fn sentinel() -> Self {
        Self(BitSet::new())
    }

    pub fn is_sentinel(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, component_id: u32) -> bool {
        self.0.contains(component_id as usize)
    }

    pub fn set(&mut self, component_id: u32) {
        self.0.set(component_id as usize);
    }

    pub fn clear(&mut self, component_id: u32) {
        self.0.clear(component_id as usize);
    }

    /// True iff `require`'s bits are a subset of `self` and `forbid` shares
    /// no bit with `self`. The core predicate of the filter algebra.
    pub fn matches(&self, require: &ArchetypeId, forbid: &ArchetypeId) -> bool {
        require.0.is_subset_of(&self.0) && !forbid.0.intersects(&self.0)
    }

    pub fn or_assign(&mut self, other: &ArchetypeId) {
        self.0.or_assign(&other.0);
    }

    pub fn ones(&self) -> impl Iterator<Item = usize> + '_ {
        self.0.ones()
    }

    /// Decode back to an ordered (ascending by id) list of `(component_id,
    /// TypeId)` pairs, including the Entity id (0) if set. Ids whose type
    /// was never registered (can happen transiently on a sparse registry)
    /// are skipped.
    pub fn decode(&self, registry: &TypeRegistry) -> Vec<(u32, TypeId)> {
        self.0
            .ones()
            .filter_map(|id| registry.type_at(id as u32).map(|ty| (id as u32, ty)))
            .collect()
    }
}

/// Encode a set of component ids (plus the implicit Entity id) to an
/// archetype. Never returns the sentinel value.
pub fn encode(component_ids: &[u32]) -> ArchetypeId {
    let mut archetype = ArchetypeId::default();
    archetype.set(ENTITY_COMPONENT_ID);
    for &id in component_ids {
        archetype.set(id);
    }
    archetype
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::EntityId;

    struct Position;
    struct Velocity;

    #[test]
    fn encode_always_sets_entity_bit() {
        let archetype = encode(&[]);
        assert!(archetype.contains(ENTITY_COMPONENT_ID));
        assert!(!archetype.is_sentinel());
    }

    #[test]
    fn decode_preserves_ascending_order() {
        let mut registry = TypeRegistry::new();
        let pos = registry.component_id::<Position>();
        let vel = registry.component_id::<Velocity>();
        let archetype = encode(&[vel, pos]);
        let decoded = archetype.decode(&registry);
        let ids: Vec<u32> = decoded.iter().map(|(id, _)| *id).collect();
        let mut expected = vec![ENTITY_COMPONENT_ID, pos, vel];
        expected.sort_unstable();
        assert_eq!(ids, expected);
    }

    #[test]
    fn matches_checks_require_and_forbid() {
        let mut registry = TypeRegistry::new();
        let _ = registry.component_id::<EntityId>();
        let pos = registry.component_id::<Position>();
        let vel = registry.component_id::<Velocity>();

        let archetype = encode(&[pos]);
        let require = encode(&[pos]);
        let forbid = {
            let mut b = ArchetypeId::sentinel();
            b.set(vel);
            b
        };
        assert!(archetype.matches(&require, &forbid));

        let archetype_with_vel = encode(&[pos, vel]);
        assert!(!archetype_with_vel.matches(&require, &forbid));
    }
}
