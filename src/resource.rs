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

//! World-singleton resources (C9): one value of a given type shared across
//! every system, constructed either directly or from the world itself.

use std::any::{Any, TypeId};

use rustc_hash::FxHashMap;

use crate::error::{EcsError, Result};
use crate::world::World;

/// Produces a default value of `Self`, optionally reading the world to do
/// so. The blanket impl below covers any `T: Default`; types that need to
/// inspect the world implement this directly instead of deriving `Default`.
pub trait FromWorld {
    fn from_world(world: &World) -> Self;
}

impl<T: Default> FromWorld for T {
    fn from_world(_world: &World) -> Self {
        T::default()
    }
}

/// Fallible counterpart to [`FromWorld`], for resources that may not be
/// constructible in the world's current state. Every `FromWorld` type gets
/// this for free via the blanket impl.
pub trait TryFromWorld: Sized {
    fn try_from_world(world: &World) -> Result<Self>;
}

impl<T: FromWorld> TryFromWorld for T {
    fn try_from_world(world: &World) -> Result<Self> {
        Ok(T::from_world(world))
    }
}

/// Type-erased store of at most one value per type.
pub struct ResourceRegistry {
    resources: FxHashMap<TypeId, Box<dyn Any + Send + Sync>>,
}

impl ResourceRegistry {
    pub fn new() -> Self {
        Self {
            resources: FxHashMap::default(),
        }
    }

    pub fn insert<T: Any + Send + Sync>(&mut self, value: T) -> Option<T> {
        self.resources
            .insert(TypeId::of::<T>(), Box::new(value))
            .map(|previous| *previous.downcast::<T>().expect("TypeId collision"))
    }

    pub fn remove<T: Any + Send + Sync>(&mut self) -> Option<T> {
        self.resources
            .remove(&TypeId::of::<T>())
            .map(|value| *value.downcast::<T>().expect("TypeId collision"))
    }

    pub fn get<T: Any + Send + Sync>(&self) -> Option<&T> {
        self.resources.get(&TypeId::of::<T>()).and_then(|value| value.downcast_ref::<T>())
    }

    pub fn get_mut<T: Any + Send + Sync>(&mut self) -> Option<&mut T> {
        self.resources.get_mut(&TypeId::of::<T>()).and_then(|value| value.downcast_mut::<T>())
    }

    pub fn contains<T: Any + Send + Sync>(&self) -> bool {
        self.resources.contains_key(&TypeId::of::<T>())
    }

    /// Like [`get`](Self::get), but reports which type was missing.
    pub fn require<T: Any + Send + Sync>(&self) -> Result<&T> {
        self.get::<T>()
            .ok_or_else(|| EcsError::MissingFromWorldResult(std::any::type_name::<T>().to_string()))
    }
}

impl Default for ResourceRegistry {
    fn default() -> Self {
        Self::new()
    }
}
