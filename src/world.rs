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

//! The world (C12): owns every other component and exposes the public
//! surface applications build against. Nothing outside this module touches
//! `TypeRegistry`, `TableRegistry` or `EntityManager` directly.

use std::any::Any;

use ahash::AHashMap;

use crate::archetype::{encode, ArchetypeId};
use crate::component::{Bundle, Component};
use crate::entity::{EntityCommands, EntityId, EntityLocation};
use crate::entity_manager::EntityManager;
use crate::error::{EcsError, Result};
use crate::event::{TableCreated, WorldStarted, WorldStopped};
use crate::event_bus::EventBus;
use crate::plugin::Plugin;
use crate::registry::TypeRegistry;
use crate::resource::{FromWorld, ResourceRegistry, TryFromWorld};
use crate::schedule::{Schedule, ScheduleLabel, POST_UPDATE, PRE_UPDATE, STARTUP, UPDATE};
use crate::system::BoxedSystem;
use crate::table::{PendingValue, TableRegistry};

/// When a world's `run()` loop flushes staged structural changes relative to
/// each schedule it executes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EntityUpdateTiming {
    /// Flush before running each schedule, so systems observe the effects of
    /// the previous tick's mutations as soon as the tick starts.
    Before,
    /// Flush after running each schedule (the default): mutations staged
    /// during a schedule are visible to the next one.
    #[default]
    After,
    /// Never flush automatically; the application calls
    /// [`World::flush`] itself.
    Custom,
}

/// Inert placeholder for the source spec's multi-worker `createWorker`
/// factory. No parallel scheduler is implemented here; this field exists so
/// world configuration has a stable shape, and is never read.
#[derive(Debug, Clone, Copy, Default)]
pub struct CreateWorkerConfig {
    pub worker_count: usize,
}

/// Owns the type registry, table storage, entity manager, resources,
/// schedules and event buses, and is the single argument every system runs
/// against.
pub struct World {
    type_registry: TypeRegistry,
    tables: TableRegistry,
    entities: EntityManager,
    resources: ResourceRegistry,
    schedules: AHashMap<ScheduleLabel, Schedule>,
    table_created: EventBus<TableCreated>,
    started_bus: EventBus<WorldStarted>,
    stopped_bus: EventBus<WorldStopped>,
    entity_update_timing: EntityUpdateTiming,
    create_worker: Option<CreateWorkerConfig>,
    started: bool,
}

impl World {
    pub fn new() -> Self {
        let type_registry = TypeRegistry::new();
        let tables = TableRegistry::new(&type_registry);
        Self {
            type_registry,
            tables,
            entities: EntityManager::new(),
            resources: ResourceRegistry::new(),
            schedules: AHashMap::new(),
            table_created: EventBus::new(),
            started_bus: EventBus::new(),
            stopped_bus: EventBus::new(),
            entity_update_timing: EntityUpdateTiming::default(),
            create_worker: None,
            started: false,
        }
    }

    pub fn entity_update_timing(&self) -> EntityUpdateTiming {
        self.entity_update_timing
    }

    pub fn set_entity_update_timing(&mut self, timing: EntityUpdateTiming) {
        self.entity_update_timing = timing;
    }

    pub fn create_worker_config(&self) -> Option<CreateWorkerConfig> {
        self.create_worker
    }

    /// Surface-only: records the config but never spawns any worker.
    pub fn set_create_worker_config(&mut self, config: CreateWorkerConfig) {
        self.create_worker = Some(config);
    }

    // ---- entities ------------------------------------------------------

    /// Stage a new entity with the given component bundle. Not resident in
    /// any table until the next [`flush`](Self::flush).
    pub fn spawn<B: Bundle>(&mut self, bundle: B) -> EntityId {
        let ids = B::component_ids(&mut self.type_registry);
        let destination = encode(&ids);
        let pending = bundle.into_pending(&mut self.type_registry).into_vec();
        self.entities.spawn(destination, pending)
    }

    /// Spawn every bundle in `bundles`, returning their entity ids in order.
    pub fn spawn_batch<B: Bundle>(&mut self, bundles: impl IntoIterator<Item = B>) -> Vec<EntityId> {
        bundles.into_iter().map(|bundle| self.spawn(bundle)).collect()
    }

    /// A chainable facade for staging further mutations on `entity`.
    pub fn entity(&mut self, entity: EntityId) -> EntityCommands<'_> {
        EntityCommands::new(self, entity)
    }

    pub fn is_alive(&self, entity: EntityId) -> bool {
        self.entities.is_alive(entity)
    }

    pub fn entity_location(&self, entity: EntityId) -> Option<EntityLocation> {
        self.entities.location(entity)
    }

    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    fn current_archetype(&self, entity: EntityId) -> ArchetypeId {
        self.entities
            .location(entity)
            .and_then(|location| self.tables.get(location.table_id))
            .map(|table| table.archetype().clone())
            .unwrap_or_else(ArchetypeId::sentinel)
    }

    /// Stage `value` to be written into `entity`'s row at the next flush,
    /// adding a column for `T` if the entity doesn't already carry one.
    pub fn insert<T: Component>(&mut self, entity: EntityId, value: T) {
        let id = self.type_registry.component_id::<T>();
        let current = self.current_archetype(entity);
        let pending = PendingValue::new(id, value);
        self.entities.stage_insert(entity, id, pending, || current);
    }

    /// Stage a zero-sized marker component with no payload.
    pub fn insert_tag<T: Component>(&mut self, entity: EntityId) {
        let id = self.type_registry.component_id::<T>();
        let current = self.current_archetype(entity);
        self.entities.stage_insert_tag(entity, id, || current);
    }

    /// Stage `T`'s column for removal from `entity`. A no-op if `T` was
    /// never registered (so the entity could never have carried one).
    pub fn remove<T: Component>(&mut self, entity: EntityId) {
        let Some(id) = self.type_registry.try_component_id::<T>() else {
            return;
        };
        let current = self.current_archetype(entity);
        self.entities.stage_remove(entity, id, || current);
    }

    pub fn despawn(&mut self, entity: EntityId) {
        self.entities.stage_despawn(entity);
    }

    /// True iff `entity`'s current (last-flushed) table carries a column
    /// for `T`. Pending, not-yet-flushed inserts/removes are not reflected.
    pub fn has<T: Component>(&self, entity: EntityId) -> bool {
        let Some(id) = self.type_registry.try_component_id::<T>() else {
            return false;
        };
        self.entities
            .location(entity)
            .and_then(|location| self.tables.get(location.table_id))
            .map(|table| table.has_column(id))
            .unwrap_or(false)
    }

    /// Apply every staged structural change, publishing a [`TableCreated`]
    /// event for each table created in the process. Returns the number of
    /// tables created.
    pub fn flush(&mut self) -> usize {
        #[cfg(feature = "profiling")]
        let span = crate::profiling::flush_span(self);
        #[cfg(feature = "profiling")]
        let _guard = span.enter();

        let created = self.entities.flush(&self.type_registry, &mut self.tables);
        for (table_id, archetype) in &created {
            self.table_created.publish(&TableCreated {
                table_id: *table_id,
                archetype: archetype.clone(),
            });
        }
        created.len()
    }

    // ---- storage access for query.rs / resource.rs ----------------------

    pub fn tables(&self) -> &TableRegistry {
        &self.tables
    }

    pub fn registry_and_tables_mut(&mut self) -> (&TypeRegistry, &mut TableRegistry) {
        (&self.type_registry, &mut self.tables)
    }

    pub fn type_registry_mut(&mut self) -> &mut TypeRegistry {
        &mut self.type_registry
    }

    pub fn table_count(&self) -> usize {
        self.tables.len()
    }

    // ---- events ----------------------------------------------------------

    pub fn on_table_created(&mut self, callback: fn(&TableCreated), priority: i32) {
        self.table_created.subscribe(callback, priority);
    }

    pub fn on_start(&mut self, callback: fn(&WorldStarted), priority: i32) {
        self.started_bus.subscribe(callback, priority);
    }

    pub fn on_stop(&mut self, callback: fn(&WorldStopped), priority: i32) {
        self.stopped_bus.subscribe(callback, priority);
    }

    // ---- resources -------------------------------------------------------

    pub fn insert_resource<T: Any + Send + Sync>(&mut self, value: T) -> Option<T> {
        self.resources.insert(value)
    }

    pub fn remove_resource<T: Any + Send + Sync>(&mut self) -> Option<T> {
        self.resources.remove::<T>()
    }

    pub fn resource<T: Any + Send + Sync>(&self) -> Option<&T> {
        self.resources.get::<T>()
    }

    pub fn resource_mut<T: Any + Send + Sync>(&mut self) -> Option<&mut T> {
        self.resources.get_mut::<T>()
    }

    pub fn has_resource<T: Any + Send + Sync>(&self) -> bool {
        self.resources.contains::<T>()
    }

    /// Fetch a resource, constructing it with [`FromWorld`] and caching it
    /// the first time it's requested.
    pub fn get_resource_or_init<T: FromWorld + Any + Send + Sync>(&mut self) -> &T {
        if !self.resources.contains::<T>() {
            let value = T::from_world(self);
            self.resources.insert(value);
        }
        self.resources.get::<T>().expect("resource inserted above")
    }

    /// Fallible counterpart of [`get_resource_or_init`](Self::get_resource_or_init),
    /// for resources whose [`TryFromWorld`] factory can fail.
    pub fn try_resource_or_init<T: TryFromWorld + Any + Send + Sync>(&mut self) -> Result<&T> {
        if !self.resources.contains::<T>() {
            let value = T::try_from_world(self)?;
            self.resources.insert(value);
        }
        Ok(self.resources.get::<T>().expect("resource inserted above"))
    }

    // ---- schedules ---------------------------------------------------------

    /// Append a system to `label`'s schedule, creating it if this is the
    /// first system registered for that label.
    pub fn add_system(&mut self, label: ScheduleLabel, system: BoxedSystem) -> Result<()> {
        self.schedules.entry(label).or_insert_with(Schedule::new).add_system(system)
    }

    pub fn remove_system(&mut self, label: &ScheduleLabel, name: &str) -> Result<()> {
        self.schedules
            .get_mut(label)
            .ok_or_else(|| EcsError::UnknownSchedule(label.to_string()))?
            .remove_system(name)
    }

    fn run_schedule(&mut self, label: &ScheduleLabel) -> Result<()> {
        let Some(mut schedule) = self.schedules.remove(label) else {
            return Ok(());
        };
        if self.entity_update_timing == EntityUpdateTiming::Before {
            self.flush();
        }
        let result = schedule.run(self);
        if self.entity_update_timing == EntityUpdateTiming::After {
            self.flush();
        }
        self.schedules.insert(label.clone(), schedule);
        result
    }

    /// Run one tick: `Startup` once, on the very first call, then
    /// `PreUpdate` → `Update` → `PostUpdate` in order, flushing around each
    /// schedule per [`entity_update_timing`](Self::entity_update_timing). A
    /// schedule with no systems registered for its label is simply skipped,
    /// not an error.
    pub fn run(&mut self) -> Result<()> {
        if !self.started {
            self.run_schedule(&STARTUP)?;
            self.started = true;
            self.started_bus.publish(&WorldStarted);
        }
        self.run_schedule(&PRE_UPDATE)?;
        self.run_schedule(&UPDATE)?;
        self.run_schedule(&POST_UPDATE)?;
        Ok(())
    }

    /// Publish [`WorldStopped`] to any subscribers and reset the started
    /// flag, so the next [`run`](Self::run) call re-runs `Startup`.
    pub fn stop(&mut self) {
        self.stopped_bus.publish(&WorldStopped);
        self.started = false;
    }

    // ---- plugins -----------------------------------------------------------

    pub fn add_plugin<P: Plugin>(&mut self, plugin: &P) {
        plugin.build(self);
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}
