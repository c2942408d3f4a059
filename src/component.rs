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

//! Component and Bundle traits
//!
//! Components are data attached to entities.
//! Bundles group multiple components for spawning.

use smallvec::{smallvec, SmallVec};

use crate::registry::TypeRegistry;
use crate::table::PendingValue;

/// Maximum number of components supported by Bundle implementations
pub const MAX_BUNDLE_COMPONENTS: usize = 8;

/// Marker trait for components
///
/// Components must be 'static (no borrowed data)
pub trait Component: 'static + Send + Sync {}

/// Automatically implement Component for all valid types
impl<T: 'static + Send + Sync> Component for T {}

/// Bundle of components
///
/// Allows spawning or inserting entities with multiple components at once.
pub trait Bundle: Send + Sync + 'static {
    /// Register (or look up) the id of every component in the bundle.
    fn component_ids(registry: &mut TypeRegistry) -> SmallVec<[u32; MAX_BUNDLE_COMPONENTS]>
    where
        Self: Sized;

    /// Consume the bundle into one staged, type-erased write per component.
    fn into_pending(self, registry: &mut TypeRegistry) -> SmallVec<[PendingValue; MAX_BUNDLE_COMPONENTS]>
    where
        Self: Sized;
}

// DO NOT implement Bundle for T: Component
// This conflicts with tuple implementations
// Instead, implement only for tuples

/// The empty bundle: spawns an entity with no components beyond the
/// implicit Entity column.
impl Bundle for () {
    fn component_ids(_registry: &mut TypeRegistry) -> SmallVec<[u32; MAX_BUNDLE_COMPONENTS]> {
        SmallVec::new()
    }

    fn into_pending(self, _registry: &mut TypeRegistry) -> SmallVec<[PendingValue; MAX_BUNDLE_COMPONENTS]> {
        SmallVec::new()
    }
}

// Macro for tuple Bundle implementations
macro_rules! impl_bundle {
    ($($T:ident),*) => {
        #[allow(non_snake_case)]
        impl<$($T: Component),*> Bundle for ($($T,)*) {
            fn component_ids(registry: &mut TypeRegistry) -> SmallVec<[u32; MAX_BUNDLE_COMPONENTS]> {
                smallvec![$(registry.component_id::<$T>()),*]
            }

            fn into_pending(self, registry: &mut TypeRegistry) -> SmallVec<[PendingValue; MAX_BUNDLE_COMPONENTS]> {
                let ($($T,)*) = self;
                smallvec![$(PendingValue::new(registry.component_id::<$T>(), $T)),*]
            }
        }
    };
}

// Implement for tuples of 1-8 components
impl_bundle!(A);
impl_bundle!(A, B);
impl_bundle!(A, B, C);
impl_bundle!(A, B, C, D);
impl_bundle!(A, B, C, D, E);
impl_bundle!(A, B, C, D, E, F);
impl_bundle!(A, B, C, D, E, F, G);
impl_bundle!(A, B, C, D, E, F, G, H);
