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

//! Column-major table storage (C3) and the table registry that maps
//! archetypes to tables on demand (C4).

use rustc_hash::FxHashMap;

use crate::archetype::ArchetypeId;
use crate::component::Component;
use crate::entity::EntityId;
use crate::registry::{TypeRegistry, ENTITY_COMPONENT_ID};

/// Type-erased component column: a dense byte buffer plus enough type
/// information (item size, an optional drop glue function pointer) to
/// append, overwrite and drop elements without knowing the concrete type
/// at the call site.
pub struct ComponentColumn {
    data: Vec<u8>,
    item_size: usize,
    count: usize,
    drop_fn: Option<unsafe fn(*mut u8)>,
}

impl ComponentColumn {
    /// Create a new, empty column for type `T`.
    pub fn new<T: Component>() -> Self {
        Self {
            data: Vec::new(),
            item_size: std::mem::size_of::<T>(),
            count: 0,
            drop_fn: if std::mem::needs_drop::<T>() {
                Some(|ptr| unsafe {
                    std::ptr::drop_in_place(ptr as *mut T);
                })
            } else {
                None
            },
        }
    }

    /// Number of live elements.
    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Append one uninitialized slot and return a pointer the caller must
    /// immediately initialize.
    fn push_uninit(&mut self) -> *mut u8 {
        if self.item_size == 0 {
            self.count += 1;
            return std::ptr::NonNull::dangling().as_ptr();
        }
        let offset = self.count * self.item_size;
        self.data.resize(offset + self.item_size, 0);
        self.count += 1;
        unsafe { self.data.as_mut_ptr().add(offset) }
    }

    /// Append a raw byte representation of one element, taking ownership
    /// of those bytes without running drop glue (used when relocating a
    /// value unchanged from another table's column).
    fn append_raw(&mut self, bytes: &[u8]) {
        if self.item_size > 0 {
            debug_assert_eq!(bytes.len(), self.item_size);
            self.data.extend_from_slice(bytes);
        }
        self.count += 1;
    }

    /// Pointer to the existing element at `row`, running drop glue on the
    /// current value first since the caller is about to overwrite it.
    fn overwrite_ptr(&mut self, row: usize) -> *mut u8 {
        debug_assert!(row < self.count);
        if self.item_size == 0 {
            return std::ptr::NonNull::dangling().as_ptr();
        }
        let offset = row * self.item_size;
        let ptr = unsafe { self.data.as_mut_ptr().add(offset) };
        if let Some(drop_fn) = self.drop_fn {
            unsafe { drop_fn(ptr) };
        }
        ptr
    }

    /// Remove the element at `row` via swap-remove, returning its raw
    /// bytes without running drop glue (ownership moves to the caller).
    fn swap_remove_raw(&mut self, row: usize) -> Vec<u8> {
        debug_assert!(row < self.count);
        let size = self.item_size;
        let mut out = vec![0u8; size];
        if size > 0 {
            let start = row * size;
            out.copy_from_slice(&self.data[start..start + size]);
            let last = self.count - 1;
            if row != last {
                let last_start = last * size;
                let (before, after) = self.data.split_at_mut(last_start);
                before[start..start + size].copy_from_slice(&after[..size]);
            }
            self.data.truncate(last * size);
        }
        self.count -= 1;
        out
    }

    /// Run drop glue on raw bytes that are being discarded rather than
    /// relocated (e.g. a component removed by a structural change, or a
    /// staged value superseded by a later insert of the same type).
    fn drop_raw(&self, bytes: Vec<u8>) {
        if let Some(drop_fn) = self.drop_fn {
            let mut bytes = bytes;
            if self.item_size > 0 {
                unsafe { drop_fn(bytes.as_mut_ptr()) };
            }
        }
    }

    /// View the column as a typed slice. `T` must be the same type this
    /// column was constructed for.
    pub fn as_slice<T: Component>(&self) -> &[T] {
        debug_assert_eq!(self.item_size, std::mem::size_of::<T>());
        if self.item_size == 0 {
            return unsafe { std::slice::from_raw_parts(std::ptr::NonNull::dangling().as_ptr(), self.count) };
        }
        unsafe { std::slice::from_raw_parts(self.data.as_ptr() as *const T, self.count) }
    }

    /// View the column as a mutable typed slice.
    pub fn as_mut_slice<T: Component>(&mut self) -> &mut [T] {
        debug_assert_eq!(self.item_size, std::mem::size_of::<T>());
        if self.item_size == 0 {
            return unsafe {
                std::slice::from_raw_parts_mut(std::ptr::NonNull::dangling().as_ptr(), self.count)
            };
        }
        unsafe { std::slice::from_raw_parts_mut(self.data.as_mut_ptr() as *mut T, self.count) }
    }

    fn reserve(&mut self, additional: usize) {
        if self.item_size > 0 {
            self.data.reserve(additional * self.item_size);
        }
    }
}

impl Drop for ComponentColumn {
    fn drop(&mut self) {
        if self.item_size == 0 {
            return;
        }
        if let Some(drop_fn) = self.drop_fn {
            for i in 0..self.count {
                let offset = i * self.item_size;
                unsafe { drop_fn(self.data.as_mut_ptr().add(offset)) };
            }
        }
    }
}

/// A type-erased value plus the id of the column it belongs to, so
/// [`TableRegistry::move_row`] can dispatch per-column appends without any
/// reflection beyond the component id.
pub struct PendingValue {
    pub component_id: u32,
    pub write: Box<dyn FnOnce(*mut u8) + Send>,
}

impl PendingValue {
    pub fn new<T: Component>(component_id: u32, value: T) -> Self {
        Self {
            component_id,
            write: Box::new(move |ptr| unsafe { std::ptr::write(ptr as *mut T, value) }),
        }
    }
}

/// Column-major storage for every entity sharing one archetype.
pub struct Table {
    id: usize,
    archetype: ArchetypeId,
    /// Component ids present as columns, ascending order (excludes the
    /// implicit Entity id 0, which is tracked by `entities` instead).
    component_types: Vec<u32>,
    columns: Vec<ComponentColumn>,
    column_index: FxHashMap<u32, usize>,
    entities: Vec<EntityId>,
}

impl Table {
    pub fn new(id: usize, archetype: ArchetypeId, registry: &TypeRegistry) -> Self {
        let mut component_types = Vec::new();
        let mut columns = Vec::new();
        let mut column_index = FxHashMap::default();
        for (component_id, _type_id) in archetype.decode(registry) {
            if component_id == ENTITY_COMPONENT_ID {
                continue;
            }
            let column = registry.build_column(component_id);
            column_index.insert(component_id, columns.len());
            columns.push(column);
            component_types.push(component_id);
        }
        Self {
            id,
            archetype,
            component_types,
            columns,
            column_index,
            entities: Vec::new(),
        }
    }

    pub fn id(&self) -> usize {
        self.id
    }

    pub fn archetype(&self) -> &ArchetypeId {
        &self.archetype
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn entities(&self) -> &[EntityId] {
        &self.entities
    }

    pub fn entity_at(&self, row: usize) -> Option<EntityId> {
        self.entities.get(row).copied()
    }

    pub fn has_column(&self, component_id: u32) -> bool {
        self.column_index.contains_key(&component_id)
    }

    pub fn component_ids(&self) -> &[u32] {
        &self.component_types
    }

    pub fn column(&self, component_id: u32) -> Option<&ComponentColumn> {
        let idx = *self.column_index.get(&component_id)?;
        self.columns.get(idx)
    }

    pub fn column_mut(&mut self, component_id: u32) -> Option<&mut ComponentColumn> {
        let idx = *self.column_index.get(&component_id)?;
        self.columns.get_mut(idx)
    }

    /// Pre-size storage for `additional` more rows.
    pub fn reserve_rows(&mut self, additional: usize) {
        self.entities.reserve(additional);
        for column in &mut self.columns {
            column.reserve(additional);
        }
    }

    /// Remove `row` via swap-remove, returning the entity that occupied
    /// it, the raw bytes of each column value (so the caller can relocate
    /// or drop them), and the entity now occupying `row` if a later row
    /// was swapped into its place.
    fn remove_row(&mut self, row: usize) -> (EntityId, Vec<(u32, Vec<u8>)>, Option<EntityId>) {
        debug_assert!(row < self.entities.len());
        let removed_entity = self.entities.swap_remove(row);
        let backfilled = if row < self.entities.len() {
            Some(self.entities[row])
        } else {
            None
        };
        let mut values = Vec::with_capacity(self.columns.len());
        for (idx, column) in self.columns.iter_mut().enumerate() {
            let component_id = self.component_types[idx];
            values.push((component_id, column.swap_remove_raw(row)));
        }
        (removed_entity, values, backfilled)
    }
}

/// The outcome of a [`TableRegistry::move_row`] call.
pub struct MoveOutcome {
    pub table_id: usize,
    pub row: usize,
    /// The entity swapped into the vacated source row, if any. The caller
    /// must update that entity's cached location.
    pub backfilled: Option<EntityId>,
}

/// Maps archetype bitfields to tables, creating tables on demand.
pub struct TableRegistry {
    tables: Vec<Table>,
    index: FxHashMap<ArchetypeId, usize>,
}

impl TableRegistry {
    /// Construct a fresh registry with the sentinel table (archetype 0,
    /// never holding live entities) occupying id 0.
    pub fn new(registry: &TypeRegistry) -> Self {
        let sentinel = Table::new(0, ArchetypeId::sentinel(), registry);
        let mut index = FxHashMap::default();
        index.insert(ArchetypeId::sentinel(), 0);
        Self {
            tables: vec![sentinel],
            index,
        }
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    pub fn get(&self, id: usize) -> Option<&Table> {
        self.tables.get(id)
    }

    pub fn get_mut(&mut self, id: usize) -> Option<&mut Table> {
        self.tables.get_mut(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Table> {
        self.tables.iter()
    }

    /// Return the table for `archetype`, constructing and registering it
    /// if none exists yet. The second element of the return value is `true`
    /// iff a new table was created — callers use this to emit the
    /// table-created event exactly once.
    pub fn acquire(&mut self, archetype: &ArchetypeId, type_registry: &TypeRegistry) -> (usize, bool) {
        if let Some(&id) = self.index.get(archetype) {
            return (id, false);
        }
        let id = self.tables.len();
        let table = Table::new(id, archetype.clone(), type_registry);
        self.index.insert(archetype.clone(), id);
        self.tables.push(table);
        (id, true)
    }

    /// The central structural-mutation primitive: move the row currently
    /// holding `entity` (at `(source, row)`) into table `target`, writing
    /// `pending` values into the destination row (overriding any relocated
    /// value of the same component id), and report where the entity landed
    /// plus any back-filled entity whose location must be fixed up.
    ///
    /// `source == 0` means `entity` is a freshly staged spawn: the sentinel
    /// table never holds rows, so no removal is performed and nothing is
    /// carried over. `target == 0` despawns the row: it is removed from
    /// `source` and nothing is appended anywhere.
    pub fn move_row(
        &mut self,
        entity: EntityId,
        source: usize,
        row: usize,
        target: usize,
        pending: Vec<PendingValue>,
    ) -> MoveOutcome {
        if source == target {
            if source == 0 {
                // Despawning an entity that was never resident: no-op.
                return MoveOutcome {
                    table_id: 0,
                    row: 0,
                    backfilled: None,
                };
            }
            let table = &mut self.tables[source];
            for value in pending {
                if let Some(&col_idx) = table.column_index.get(&value.component_id) {
                    let ptr = table.columns[col_idx].overwrite_ptr(row);
                    (value.write)(ptr);
                }
            }
            return MoveOutcome {
                table_id: source,
                row,
                backfilled: None,
            };
        }

        let (removed_entity, carried, backfilled) = if source == 0 {
            (entity, Vec::new(), None)
        } else {
            let (removed, carried, backfilled) = self.tables[source].remove_row(row);
            debug_assert_eq!(removed, entity);
            (removed, carried, backfilled)
        };
        let mut carried: FxHashMap<u32, Vec<u8>> = carried.into_iter().collect();
        let mut pending_by_id: FxHashMap<u32, Box<dyn FnOnce(*mut u8) + Send>> =
            pending.into_iter().map(|p| (p.component_id, p.write)).collect();

        if target == 0 {
            // Despawn: drop whatever was carried; nothing to append.
            for (component_id, bytes) in carried.drain() {
                if let Some(column) = self.tables[source].column(component_id) {
                    column.drop_raw(bytes);
                }
            }
            return MoveOutcome {
                table_id: 0,
                row: 0,
                backfilled,
            };
        }

        let new_row;
        {
            let target_table = &mut self.tables[target];
            new_row = target_table.len();
            let column_count = target_table.columns.len();
            for col_idx in 0..column_count {
                let component_id = target_table.component_types[col_idx];
                if let Some(write) = pending_by_id.remove(&component_id) {
                    let ptr = target_table.columns[col_idx].push_uninit();
                    write(ptr);
                    carried.remove(&component_id);
                } else if let Some(bytes) = carried.remove(&component_id) {
                    target_table.columns[col_idx].append_raw(&bytes);
                } else {
                    debug_assert!(
                        target_table.columns[col_idx].item_size == 0,
                        "non-zero-sized column `{component_id}` appended with no staged value"
                    );
                    target_table.columns[col_idx].push_uninit();
                }
            }
            target_table.entities.push(removed_entity);
        }

        // Values carried from the source but not part of the target
        // archetype (a `remove` staged for this entity) must be dropped.
        let source_table = &self.tables[source];
        for (component_id, bytes) in carried {
            if let Some(column) = source_table.column(component_id) {
                column.drop_raw(bytes);
            }
        }

        MoveOutcome {
            table_id: target,
            row: new_row,
            backfilled,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archetype::encode;

    #[derive(Debug, Clone, Copy, PartialEq)]
    struct Position {
        x: f32,
        y: f32,
    }

    #[test]
    fn sentinel_table_has_no_columns() {
        let registry = TypeRegistry::new();
        let tables = TableRegistry::new(&registry);
        let sentinel = tables.get(0).unwrap();
        assert_eq!(sentinel.len(), 0);
        assert!(sentinel.component_ids().is_empty());
    }

    #[test]
    fn acquire_reuses_existing_table() {
        let mut registry = TypeRegistry::new();
        let pos = registry.component_id::<Position>();
        let mut tables = TableRegistry::new(&registry);
        let archetype = encode(&[pos]);
        let (id1, created1) = tables.acquire(&archetype, &registry);
        let (id2, created2) = tables.acquire(&archetype, &registry);
        assert_eq!(id1, id2);
        assert!(created1);
        assert!(!created2);
    }

    #[test]
    fn move_row_from_sentinel_spawns_into_target() {
        let mut registry = TypeRegistry::new();
        let pos = registry.component_id::<Position>();
        let mut tables = TableRegistry::new(&registry);
        let archetype = encode(&[pos]);
        let (table_id, created) = tables.acquire(&archetype, &registry);
        assert!(created);

        let entity = EntityId::default();
        let outcome = tables.move_row(
            entity,
            0,
            0,
            table_id,
            vec![PendingValue::new(pos, Position { x: 1.0, y: 2.0 })],
        );
        assert_eq!(outcome.table_id, table_id);
        assert_eq!(outcome.row, 0);
        assert!(outcome.backfilled.is_none());

        let table = tables.get(table_id).unwrap();
        assert_eq!(table.len(), 1);
        assert_eq!(table.entity_at(0), Some(entity));
        assert_eq!(table.column(pos).unwrap().as_slice::<Position>()[0], Position { x: 1.0, y: 2.0 });
    }

    #[test]
    fn move_row_despawn_drops_value() {
        let mut registry = TypeRegistry::new();
        let pos = registry.component_id::<Position>();
        let mut tables = TableRegistry::new(&registry);
        let archetype = encode(&[pos]);
        let (table_id, _) = tables.acquire(&archetype, &registry);

        let entity = EntityId::default();
        tables.move_row(entity, 0, 0, table_id, vec![PendingValue::new(pos, Position { x: 1.0, y: 2.0 })]);

        let outcome = tables.move_row(entity, table_id, 0, 0, Vec::new());
        assert_eq!(outcome.table_id, 0);
        assert!(tables.get(table_id).unwrap().is_empty());
    }

    #[test]
    fn get_row_out_of_range_is_none() {
        let registry = TypeRegistry::new();
        let tables = TableRegistry::new(&registry);
        let sentinel = tables.get(0).unwrap();
        assert_eq!(sentinel.entity_at(5), None);
    }
}
