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

//! Modular setup: a `Plugin` groups a set of resources and systems to
//! register on a world in one call.

use crate::world::World;

/// Registers resources, systems, and schedules onto a [`World`] in one
/// place, so a reusable feature doesn't have to be wired up by hand at
/// every call site.
pub trait Plugin {
    fn build(&self, world: &mut World);
}

/// Any `Fn(&mut World)` closure is a plugin, so simple setup doesn't need a
/// named unit struct.
impl<F: Fn(&mut World)> Plugin for F {
    fn build(&self, world: &mut World) {
        self(world)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Counter(u32);

    struct CounterPlugin;
    impl Plugin for CounterPlugin {
        fn build(&self, world: &mut World) {
            world.insert_resource(Counter(0));
        }
    }

    #[test]
    fn plugin_build_runs_against_the_world() {
        let mut world = World::new();
        world.add_plugin(&CounterPlugin);
        assert_eq!(world.resource::<Counter>().unwrap().0, 0);
    }

    #[test]
    fn closures_are_plugins() {
        let mut world = World::new();
        let setup = |world: &mut World| {
            world.insert_resource(Counter(7));
        };
        world.add_plugin(&setup);
        assert_eq!(world.resource::<Counter>().unwrap().0, 7);
    }
}
