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

//! An ordered list of systems run in sequence. No topological sort or
//! parallel staging: systems run in the order they were added, each with
//! exclusive access to the world, matching the single-threaded scheduling
//! model this crate targets.

use std::borrow::Cow;

use rustc_hash::FxHashMap;

#[cfg(feature = "profiling")]
use crate::profiling::system_span;

use crate::error::{EcsError, Result};
use crate::system::BoxedSystem;
use crate::world::World;

/// Identifies one of a world's schedules. The four defaults (
/// [`STARTUP`], [`PRE_UPDATE`], [`UPDATE`], [`POST_UPDATE`]) are plain
/// `&'static str` labels; [`ScheduleLabel::custom`] mints one for a
/// user-defined schedule at runtime.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ScheduleLabel(Cow<'static, str>);

impl ScheduleLabel {
    pub const fn new(name: &'static str) -> Self {
        Self(Cow::Borrowed(name))
    }

    pub fn custom(name: impl Into<String>) -> Self {
        Self(Cow::Owned(name.into()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&'static str> for ScheduleLabel {
    fn from(name: &'static str) -> Self {
        Self::new(name)
    }
}

impl std::fmt::Display for ScheduleLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

pub const STARTUP: ScheduleLabel = ScheduleLabel::new("Startup");
pub const PRE_UPDATE: ScheduleLabel = ScheduleLabel::new("PreUpdate");
pub const UPDATE: ScheduleLabel = ScheduleLabel::new("Update");
pub const POST_UPDATE: ScheduleLabel = ScheduleLabel::new("PostUpdate");

/// An ordered, name-addressable list of systems.
#[derive(Default)]
pub struct Schedule {
    systems: Vec<BoxedSystem>,
    index_by_name: FxHashMap<String, usize>,
}

impl Schedule {
    pub fn new() -> Self {
        Self {
            systems: Vec::new(),
            index_by_name: FxHashMap::default(),
        }
    }

    /// Append a system. Errors if a system with the same name is already
    /// registered in this schedule.
    pub fn add_system(&mut self, system: BoxedSystem) -> Result<()> {
        let name = system.name().to_string();
        if self.index_by_name.contains_key(&name) {
            return Err(EcsError::DuplicateSystem(name));
        }
        self.index_by_name.insert(name, self.systems.len());
        self.systems.push(system);
        Ok(())
    }

    pub fn with_system(mut self, system: BoxedSystem) -> Result<Self> {
        self.add_system(system)?;
        Ok(self)
    }

    /// Remove a system by name. Errors if no system with that name exists.
    pub fn remove_system(&mut self, name: &str) -> Result<()> {
        let index = self
            .index_by_name
            .remove(name)
            .ok_or_else(|| EcsError::UnknownSystem(name.to_string()))?;
        self.systems.remove(index);
        for existing_index in self.index_by_name.values_mut() {
            if *existing_index > index {
                *existing_index -= 1;
            }
        }
        Ok(())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index_by_name.contains_key(name)
    }

    pub fn system_count(&self) -> usize {
        self.systems.len()
    }

    /// Run every system in registration order, stopping at the first error.
    pub fn run(&mut self, world: &mut World) -> Result<()> {
        for system in &mut self.systems {
            #[cfg(feature = "profiling")]
            let span = system_span(system.name(), world);
            #[cfg(feature = "profiling")]
            let _guard = span.enter();

            system.run(world).map_err(|source| EcsError::SystemError {
                system: system.name().to_string(),
                source: Box::new(SystemFailure(format!("{source}"))),
            })?;
        }
        Ok(())
    }
}

/// Wraps a system's own [`EcsError`] so it can be carried as the boxed
/// `source` of an [`EcsError::SystemError`] without creating a cyclic type.
#[derive(Debug)]
struct SystemFailure(String);

impl std::fmt::Display for SystemFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for SystemFailure {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::system::System;

    struct Noop;
    impl System for Noop {
        fn name(&self) -> &str {
            "noop"
        }
        fn run(&mut self, _world: &mut World) -> Result<()> {
            Ok(())
        }
    }

    struct Failing;
    impl System for Failing {
        fn name(&self) -> &str {
            "failing"
        }
        fn run(&mut self, _world: &mut World) -> Result<()> {
            Err(EcsError::InvalidInsert("boom".to_string()))
        }
    }

    #[test]
    fn duplicate_system_name_is_rejected() {
        let mut schedule = Schedule::new();
        schedule.add_system(Box::new(Noop)).unwrap();
        assert!(matches!(schedule.add_system(Box::new(Noop)), Err(EcsError::DuplicateSystem(_))));
    }

    #[test]
    fn removing_unknown_system_errors() {
        let mut schedule = Schedule::new();
        assert!(matches!(schedule.remove_system("ghost"), Err(EcsError::UnknownSystem(_))));
    }

    #[test]
    fn run_executes_systems_in_order() {
        let mut world = World::new();
        let mut schedule = Schedule::new();
        schedule.add_system(Box::new(Noop)).unwrap();
        assert!(schedule.run(&mut world).is_ok());
    }

    #[test]
    fn run_stops_on_first_failing_system() {
        let mut world = World::new();
        let mut schedule = Schedule::new();
        schedule.add_system(Box::new(Failing)).unwrap();
        match schedule.run(&mut world) {
            Err(EcsError::SystemError { system, .. }) => assert_eq!(system, "failing"),
            other => panic!("expected SystemError, got {other:?}"),
        }
    }
}
