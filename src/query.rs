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

//! Query system with archetype filtering
//!
//! Type-safe component queries with automatic archetype matching. A
//! [`QueryState`] is built once, caches which tables match, and is re-used
//! across calls to [`QueryState::query`]; new tables created by intervening
//! flushes are picked up incrementally rather than by a full rescan.

use std::marker::PhantomData;

use smallvec::{smallvec, SmallVec};

use crate::component::Component;
use crate::entity::EntityId;
use crate::filter::{self, Clause, Filter};
use crate::registry::TypeRegistry;
use crate::table::Table;
use crate::world::World;

fn base_clauses<Q: QueryParam>(registry: &mut TypeRegistry) -> Vec<Clause> {
    let ids = Q::component_ids(registry);
    let mut clauses = filter::unconstrained();
    for (require, _forbid) in &mut clauses {
        for id in &ids {
            require.set(*id);
        }
    }
    clauses
}

/// One element of a query's item type: a single component reference, an
/// optional one, or the entity id itself.
///
/// # Safety
/// Implementations must only read/write the column(s) whose ids they report
/// from [`component_ids`](QueryParam::component_ids), and must not read past
/// `row` in a table shorter than `row + 1`.
pub unsafe trait QueryParam {
    type Item<'a>;

    /// Component ids this parameter requires to be present (used to narrow
    /// which tables match). Optional parameters and `Entity` require none.
    fn component_ids(registry: &mut TypeRegistry) -> SmallVec<[u32; 8]>;

    /// # Safety
    /// `table` must be a valid, uniquely-owned-for-`'a` pointer and `row`
    /// must be less than the table's length.
    unsafe fn fetch<'a>(table: *mut Table, row: usize, registry: &TypeRegistry) -> Self::Item<'a>;
}

/// Fetches the [`EntityId`] of the current row.
pub struct Entity;

unsafe impl QueryParam for Entity {
    type Item<'a> = EntityId;

    fn component_ids(_registry: &mut TypeRegistry) -> SmallVec<[u32; 8]> {
        SmallVec::new()
    }

    unsafe fn fetch<'a>(table: *mut Table, row: usize, _registry: &TypeRegistry) -> EntityId {
        unsafe { &*table }
            .entity_at(row)
            .expect("row must be valid for the table it was matched against")
    }
}

unsafe impl<'q, T: Component> QueryParam for &'q T {
    type Item<'a> = &'a T;

    fn component_ids(registry: &mut TypeRegistry) -> SmallVec<[u32; 8]> {
        smallvec![registry.component_id::<T>()]
    }

    unsafe fn fetch<'a>(table: *mut Table, row: usize, registry: &TypeRegistry) -> &'a T {
        let id = registry
            .try_component_id::<T>()
            .expect("component required by a matched table must be registered");
        let column = unsafe { &*table }
            .column(id)
            .expect("matched table must carry every required column");
        &column.as_slice::<T>()[row]
    }
}

unsafe impl<'q, T: Component> QueryParam for &'q mut T {
    type Item<'a> = &'a mut T;

    fn component_ids(registry: &mut TypeRegistry) -> SmallVec<[u32; 8]> {
        smallvec![registry.component_id::<T>()]
    }

    unsafe fn fetch<'a>(table: *mut Table, row: usize, registry: &TypeRegistry) -> &'a mut T {
        let id = registry
            .try_component_id::<T>()
            .expect("component required by a matched table must be registered");
        let column = unsafe { &mut *table }
            .column_mut(id)
            .expect("matched table must carry every required column");
        &mut column.as_mut_slice::<T>()[row]
    }
}

unsafe impl<'q, T: Component> QueryParam for Option<&'q T> {
    type Item<'a> = Option<&'a T>;

    fn component_ids(_registry: &mut TypeRegistry) -> SmallVec<[u32; 8]> {
        SmallVec::new()
    }

    unsafe fn fetch<'a>(table: *mut Table, row: usize, registry: &TypeRegistry) -> Option<&'a T> {
        let id = registry.try_component_id::<T>()?;
        let column = unsafe { &*table }.column(id)?;
        Some(&column.as_slice::<T>()[row])
    }
}

unsafe impl<'q, T: Component> QueryParam for Option<&'q mut T> {
    type Item<'a> = Option<&'a mut T>;

    fn component_ids(_registry: &mut TypeRegistry) -> SmallVec<[u32; 8]> {
        SmallVec::new()
    }

    unsafe fn fetch<'a>(table: *mut Table, row: usize, registry: &TypeRegistry) -> Option<&'a mut T> {
        let id = registry.try_component_id::<T>()?;
        let column = unsafe { &mut *table }.column_mut(id)?;
        Some(&mut column.as_mut_slice::<T>()[row])
    }
}

macro_rules! impl_query_param_tuple {
    ($($T:ident),*) => {
        unsafe impl<$($T: QueryParam),*> QueryParam for ($($T,)*) {
            type Item<'a> = ($($T::Item<'a>,)*);

            fn component_ids(registry: &mut TypeRegistry) -> SmallVec<[u32; 8]> {
                let mut ids = SmallVec::new();
                $(ids.extend($T::component_ids(registry));)*
                ids
            }

            #[allow(non_snake_case)]
            unsafe fn fetch<'a>(table: *mut Table, row: usize, registry: &TypeRegistry) -> Self::Item<'a> {
                ($(unsafe { $T::fetch(table, row, registry) },)*)
            }
        }
    };
}

impl_query_param_tuple!(A);
impl_query_param_tuple!(A, B);
impl_query_param_tuple!(A, B, C);
impl_query_param_tuple!(A, B, C, D);
impl_query_param_tuple!(A, B, C, D, E);
impl_query_param_tuple!(A, B, C, D, E, F);
impl_query_param_tuple!(A, B, C, D, E, F, G);
impl_query_param_tuple!(A, B, C, D, E, F, G, H);

/// Iterator over one query's matched rows, flattening every matched table in
/// turn. Table pointers are resolved once up front; rows are fetched lazily.
pub struct QueryIter<'w, Q: QueryParam> {
    registry: &'w TypeRegistry,
    tables: Vec<*mut Table>,
    table_index: usize,
    row: usize,
    _marker: PhantomData<Q>,
}

impl<'w, Q: QueryParam> Iterator for QueryIter<'w, Q> {
    type Item = Q::Item<'w>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if self.table_index >= self.tables.len() {
                return None;
            }
            let table_ptr = self.tables[self.table_index];
            let len = unsafe { &*table_ptr }.len();
            if self.row >= len {
                self.table_index += 1;
                self.row = 0;
                continue;
            }
            let row = self.row;
            self.row += 1;
            // SAFETY: table_ptr is one of `self.tables`, each resolved from
            // the world's table registry for the exclusive duration of this
            // iterator; `row < len` was just checked.
            return Some(unsafe { Q::fetch(table_ptr, row, self.registry) });
        }
    }
}

/// Iterator over every unique unordered pair of matched rows, flattened
/// across every matched table. Used for per-entity-pair work (e.g. collision
/// checks) where the same query needs to see two rows at once.
pub struct QueryPairs<'w, Q: QueryParam> {
    registry: &'w TypeRegistry,
    entries: Vec<(*mut Table, usize)>,
    i: usize,
    j: usize,
}

impl<'w, Q: QueryParam> Iterator for QueryPairs<'w, Q> {
    type Item = (Q::Item<'w>, Q::Item<'w>);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if self.i + 1 >= self.entries.len() {
                return None;
            }
            if self.j >= self.entries.len() {
                self.i += 1;
                self.j = self.i + 1;
                continue;
            }
            let (table_a, row_a) = self.entries[self.i];
            let (table_b, row_b) = self.entries[self.j];
            self.j += 1;
            // SAFETY: `entries` lists each matched row exactly once, so
            // (table_a, row_a) != (table_b, row_b); two distinct rows of the
            // same table occupy disjoint column slots, and distinct tables
            // are disjoint allocations, so the two fetches never alias even
            // when Q borrows mutably.
            return Some((
                unsafe { Q::fetch(table_a, row_a, self.registry) },
                unsafe { Q::fetch(table_b, row_b, self.registry) },
            ));
        }
    }
}

/// A view over one world's tables scoped to a single query, handed out by
/// [`QueryState::query`]. Borrows the world exclusively for its lifetime.
pub struct QueryView<'w, Q: QueryParam, F: Filter> {
    world: &'w mut World,
    matched: &'w [usize],
    _marker: PhantomData<(Q, F)>,
}

impl<'w, Q: QueryParam, F: Filter> QueryView<'w, Q, F> {
    pub fn iter(&'w mut self) -> QueryIter<'w, Q> {
        let (registry, tables) = self.world.registry_and_tables_mut();
        let pointers = self
            .matched
            .iter()
            .filter_map(|&id| tables.get_mut(id).map(|table| table as *mut Table))
            .collect();
        QueryIter {
            registry,
            tables: pointers,
            table_index: 0,
            row: 0,
            _marker: PhantomData,
        }
    }

    /// Fetch the item for one entity, if it is alive and resident in a
    /// matched table.
    pub fn get(&'w mut self, entity: EntityId) -> Option<Q::Item<'w>> {
        let location = self.world.entity_location(entity)?;
        if !self.matched.contains(&location.table_id) {
            return None;
        }
        let (registry, tables) = self.world.registry_and_tables_mut();
        let table_ptr = tables.get_mut(location.table_id)? as *mut Table;
        Some(unsafe { Q::fetch(table_ptr, location.table_row, registry) })
    }

    /// The item for the query's sole match. `None` if zero or more than one
    /// row matches.
    pub fn single(&'w mut self) -> Option<Q::Item<'w>> {
        let mut iter = self.iter();
        let first = iter.next()?;
        if iter.next().is_some() {
            return None;
        }
        Some(first)
    }

    pub fn len(&self) -> usize {
        self.matched
            .iter()
            .filter_map(|&id| self.world.tables().get(id))
            .map(|table| table.len())
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Every unique unordered pair of matched rows, e.g. for all-vs-all
    /// collision checks within one query.
    pub fn pairs(&'w mut self) -> QueryPairs<'w, Q> {
        let (registry, tables) = self.world.registry_and_tables_mut();
        let mut entries = Vec::new();
        for &id in self.matched {
            if let Some(table) = tables.get_mut(id) {
                let len = table.len();
                let ptr = table as *mut Table;
                entries.extend((0..len).map(|row| (ptr, row)));
            }
        }
        QueryPairs { registry, entries, i: 0, j: 1 }
    }
}

/// Caches which tables match `Q`/`F` and refreshes incrementally as new
/// tables are created, avoiding a full archetype rescan on every call.
///
/// ```ignore
/// struct MovementSystem {
///     state: QueryState<(&'static mut Position, &'static Velocity)>,
/// }
///
/// impl System for MovementSystem {
///     fn run(&mut self, world: &mut World) -> Result<()> {
///         for (pos, vel) in self.state.query(world).iter() {
///             pos.x += vel.x;
///             pos.y += vel.y;
///         }
///         Ok(())
///     }
/// }
/// ```
pub struct QueryState<Q: QueryParam, F: Filter = ()> {
    clauses: Vec<Clause>,
    matched: Vec<usize>,
    last_table_count: usize,
    _marker: PhantomData<(Q, F)>,
}

impl<Q: QueryParam, F: Filter> QueryState<Q, F> {
    pub fn new(world: &mut World) -> Self {
        let clauses = F::apply(base_clauses::<Q>(world.type_registry_mut()), world.type_registry_mut());
        let mut state = Self {
            clauses,
            matched: Vec::new(),
            last_table_count: 0,
            _marker: PhantomData,
        };
        state.refresh(world);
        state
    }

    /// Scan any tables created since the last refresh. Cheap when nothing
    /// new was created: a single length comparison.
    pub fn refresh(&mut self, world: &World) {
        let tables = world.tables();
        let count = tables.len();
        if count > self.last_table_count {
            for table in tables.iter().skip(self.last_table_count) {
                if filter::matches_any(&self.clauses, table.archetype()) {
                    self.matched.push(table.id());
                }
            }
            self.last_table_count = count;
        }
    }

    pub fn match_count(&self) -> usize {
        self.matched.len()
    }

    pub fn query<'w>(&'w mut self, world: &'w mut World) -> QueryView<'w, Q, F> {
        self.refresh(world);
        QueryView {
            world,
            matched: &self.matched,
            _marker: PhantomData,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::{With, Without};
    use crate::world::World;

    #[derive(Debug, Clone, Copy, PartialEq)]
    struct Position {
        x: f32,
        y: f32,
    }

    #[derive(Debug, Clone, Copy, PartialEq)]
    struct Velocity {
        x: f32,
        y: f32,
    }

    struct Dead;

    #[test]
    fn query_over_empty_world_yields_nothing() {
        let mut world = World::new();
        let mut state = QueryState::<&Position>::new(&mut world);
        assert_eq!(state.query(&mut world).iter().count(), 0);
    }

    #[test]
    fn query_finds_spawned_entities() {
        let mut world = World::new();
        world.spawn((Position { x: 1.0, y: 2.0 }, Velocity { x: 0.0, y: 0.0 }));
        world.flush();

        let mut state = QueryState::<(&Position, &Velocity)>::new(&mut world);
        let results: Vec<_> = state
            .query(&mut world)
            .iter()
            .map(|(pos, vel)| (*pos, *vel))
            .collect();
        assert_eq!(results, vec![(Position { x: 1.0, y: 2.0 }, Velocity { x: 0.0, y: 0.0 })]);
    }

    #[test]
    fn mutable_query_writes_back() {
        let mut world = World::new();
        world.spawn((Position { x: 0.0, y: 0.0 },));
        world.flush();

        let mut state = QueryState::<&mut Position>::new(&mut world);
        for pos in state.query(&mut world).iter() {
            pos.x += 1.0;
        }

        let mut reader = QueryState::<&Position>::new(&mut world);
        let pos = *reader.query(&mut world).iter().next().unwrap();
        assert_eq!(pos, Position { x: 1.0, y: 0.0 });
    }

    #[test]
    fn without_excludes_matching_entities() {
        let mut world = World::new();
        world.spawn((Position { x: 0.0, y: 0.0 },));
        let dead = world.spawn((Position { x: 1.0, y: 1.0 },));
        world.entity(dead).insert_tag::<Dead>();
        world.flush();

        let mut state = QueryState::<&Position, Without<Dead>>::new(&mut world);
        assert_eq!(state.query(&mut world).iter().count(), 1);
    }

    #[test]
    fn with_requires_presence_without_fetching_it() {
        let mut world = World::new();
        let e = world.spawn((Position { x: 0.0, y: 0.0 },));
        world.entity(e).insert_tag::<Dead>();
        world.flush();

        let mut state = QueryState::<&Position, With<Dead>>::new(&mut world);
        assert_eq!(state.query(&mut world).iter().count(), 1);
    }

    #[test]
    fn optional_component_is_none_when_absent() {
        let mut world = World::new();
        world.spawn((Position { x: 0.0, y: 0.0 },));
        world.flush();

        let mut state = QueryState::<(&Position, Option<&Velocity>)>::new(&mut world);
        let (_, vel) = state.query(&mut world).iter().next().unwrap();
        assert!(vel.is_none());
    }

    #[test]
    fn get_fetches_a_single_entity() {
        let mut world = World::new();
        let e = world.spawn((Position { x: 5.0, y: 5.0 },));
        world.flush();

        let mut state = QueryState::<&Position>::new(&mut world);
        let pos = *state.query(&mut world).get(e).unwrap();
        assert_eq!(pos, Position { x: 5.0, y: 5.0 });
    }

    #[test]
    fn pairs_yields_every_unique_unordered_combination() {
        let mut world = World::new();
        for i in 0..4 {
            world.spawn((Position { x: i as f32, y: 0.0 },));
        }
        world.flush();

        let mut state = QueryState::<&Position>::new(&mut world);
        let count = state.query(&mut world).pairs().count();
        assert_eq!(count, 4 * 3 / 2);
    }

    #[test]
    fn pairs_mutates_both_sides_without_aliasing() {
        let mut world = World::new();
        world.spawn((Position { x: 1.0, y: 0.0 },));
        world.spawn((Position { x: 2.0, y: 0.0 },));
        world.flush();

        let mut state = QueryState::<&mut Position>::new(&mut world);
        for (a, b) in state.query(&mut world).pairs() {
            a.x += 10.0;
            b.y += 10.0;
        }

        let mut reader = QueryState::<&Position>::new(&mut world);
        let mut xs: Vec<f32> = reader.query(&mut world).iter().map(|p| p.x).collect();
        xs.sort_by(|a, b| a.partial_cmp(b).unwrap());
        assert_eq!(xs, vec![11.0, 12.0]);
    }

    #[test]
    fn pairs_on_empty_or_singleton_query_yields_nothing() {
        let mut world = World::new();
        let mut state = QueryState::<&Position>::new(&mut world);
        assert_eq!(state.query(&mut world).pairs().count(), 0);

        world.spawn((Position { x: 0.0, y: 0.0 },));
        world.flush();
        state.refresh(&world);
        assert_eq!(state.query(&mut world).pairs().count(), 0);
    }

    #[test]
    fn refresh_picks_up_tables_created_after_first_query() {
        let mut world = World::new();
        let mut state = QueryState::<&Position>::new(&mut world);
        assert_eq!(state.match_count(), 0);

        world.spawn((Position { x: 0.0, y: 0.0 },));
        world.flush();
        assert_eq!(state.query(&mut world).iter().count(), 1);
    }
}
