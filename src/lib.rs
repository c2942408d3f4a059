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

//! Archetype ECS — an archetype-based Entity-Component-System world with
//! staged structural mutation.
//!
//! Entities are grouped into column-major tables by archetype (the exact
//! set of component types they carry). `spawn`/`insert`/`remove`/`despawn`
//! only stage an entity's destination; [`World::flush`] resolves every
//! staged entity into a table move in one pass. Queries iterate matched
//! tables directly, with no per-entity indirection beyond the row index.

pub mod archetype;
pub mod bitset;
pub mod component;
pub mod entity;
pub mod entity_manager;
pub mod error;
pub mod event;
pub mod event_bus;
pub mod filter;
pub mod plugin;
pub mod prelude;
pub mod profiling;
pub mod query;
pub mod registry;
pub mod resource;
pub mod schedule;
pub mod system;
pub mod table;
pub mod world;

pub use archetype::ArchetypeId;
pub use component::{Bundle, Component};
pub use entity::{EntityCommands, EntityId, EntityLocation, EntitySnapshot};
pub use error::{EcsError, Result};
pub use event::{TableCreated, WorldStarted, WorldStopped};
pub use filter::{And, Filter, Or, With, Without};
pub use plugin::Plugin;
pub use query::{Entity, QueryPairs, QueryParam, QueryState, QueryView};
pub use resource::{FromWorld, TryFromWorld};
pub use schedule::{Schedule, ScheduleLabel, POST_UPDATE, PRE_UPDATE, STARTUP, UPDATE};
pub use system::{BoxedSystem, System};
pub use world::{CreateWorkerConfig, EntityUpdateTiming, World};
