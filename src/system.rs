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

//! The `System` trait: one unit of schedule-driven logic over the world.

use crate::error::Result;
use crate::world::World;

/// A unit of logic run by a [`crate::schedule::Schedule`]. Identified by
/// name for duplicate/unknown-system detection; systems are otherwise given
/// full, direct `&mut World` access rather than a pre-resolved argument set.
pub trait System: Send + Sync {
    fn name(&self) -> &str;

    fn run(&mut self, world: &mut World) -> Result<()>;
}

pub type BoxedSystem = Box<dyn System>;
