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

//! World lifecycle events, published through [`crate::event_bus::EventBus`].
//! This is the entire surface C11 is used for: table creation and the two
//! `start`/`stop` lifecycle notifications. There is no general entity-change
//! event stream — structural change is observed through queries, not events.

use crate::archetype::ArchetypeId;

/// Published once per table created by a [`crate::world::World::flush`] call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableCreated {
    pub table_id: usize,
    pub archetype: ArchetypeId,
}

/// Published the first time a world's `run` loop executes its `Startup`
/// schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorldStarted;

/// Published by [`crate::world::World::stop`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorldStopped;
