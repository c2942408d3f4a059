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

//! Assigns each component type a stable, world-unique small integer id.

use std::any::TypeId;

use rustc_hash::FxHashMap;

use crate::component::Component;
use crate::entity::EntityId;
use crate::table::ComponentColumn;

/// Component id reserved for the Entity column. Every table carries this
/// column; it is registered before any user component.
pub const ENTITY_COMPONENT_ID: u32 = 0;

/// Maps component `TypeId`s to dense `u32` ids. Ids are assigned on first
/// reference and are never reclaimed, even if the component later goes
/// unused by any live table.
///
/// Alongside the id, each entry records a column factory — a monomorphized
/// function pointer captured at the call site that first referenced `T` —
/// so that a [`Table`](crate::table::Table) can materialize a column for a
/// runtime component id without any `dyn Any` downcasting.
pub struct TypeRegistry {
    ids: FxHashMap<TypeId, u32>,
    types: Vec<TypeId>,
    column_factories: Vec<fn() -> ComponentColumn>,
}

impl TypeRegistry {
    /// Create a registry with the Entity marker type pre-registered at id 0.
    pub fn new() -> Self {
        let mut registry = Self {
            ids: FxHashMap::default(),
            types: Vec::new(),
            column_factories: Vec::new(),
        };
        let entity_id = registry.component_id::<EntityId>();
        debug_assert_eq!(entity_id, ENTITY_COMPONENT_ID);
        registry
    }

    /// Return the id for `T`, assigning a new one if this is the first
    /// reference to it.
    pub fn component_id<T: Component>(&mut self) -> u32 {
        let type_id = TypeId::of::<T>();
        if let Some(id) = self.ids.get(&type_id) {
            return *id;
        }
        let id = self.types.len() as u32;
        self.types.push(type_id);
        self.column_factories.push(ComponentColumn::new::<T>);
        self.ids.insert(type_id, id);
        id
    }

    /// Build a fresh, empty column for a previously registered id.
    pub(crate) fn build_column(&self, id: u32) -> ComponentColumn {
        (self.column_factories[id as usize])()
    }

    /// Look up the id for `T` without registering it.
    pub fn try_component_id<T: Component>(&self) -> Option<u32> {
        self.ids.get(&TypeId::of::<T>()).copied()
    }

    /// The `TypeId` registered at `id`, if any.
    pub fn type_at(&self, id: u32) -> Option<TypeId> {
        self.types.get(id as usize).copied()
    }

    /// Number of distinct component types registered so far.
    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

impl Default for TypeRegistry {
    fn default() -> Self {
        Self::new()
    }
}
