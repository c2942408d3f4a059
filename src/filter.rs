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

//! Composable query filters (C8): `With`, `Without`, `And`, `Or`, and tuples
//! (implicit `And`), reduced to a small disjunction of `(require, forbid)`
//! archetype pairs that [`crate::query::QueryState`] tests a table against.

use std::marker::PhantomData;

use smallvec::{smallvec, SmallVec};

use crate::archetype::ArchetypeId;
use crate::component::Component;
use crate::registry::TypeRegistry;

/// One clause of the disjunction: a table matches if its archetype is a
/// superset of `require` and shares no bit with `forbid`.
pub type Clause = (ArchetypeId, ArchetypeId);

/// The starting point for every filter: one clause with nothing required
/// and nothing forbidden, matching every table.
pub fn unconstrained() -> Vec<Clause> {
    vec![(ArchetypeId::sentinel(), ArchetypeId::sentinel())]
}

/// A list of component types, used by [`With`]/[`Without`] without needing
/// to stage any value — only the id matters.
pub trait TypeList {
    fn ids(registry: &mut TypeRegistry) -> SmallVec<[u32; 8]>;
}

impl<T: Component> TypeList for T {
    fn ids(registry: &mut TypeRegistry) -> SmallVec<[u32; 8]> {
        smallvec![registry.component_id::<T>()]
    }
}

macro_rules! impl_type_list {
    ($($T:ident),*) => {
        impl<$($T: Component),*> TypeList for ($($T,)*) {
            fn ids(registry: &mut TypeRegistry) -> SmallVec<[u32; 8]> {
                let mut ids = SmallVec::new();
                $(ids.push(registry.component_id::<$T>());)*
                ids
            }
        }
    };
}

impl_type_list!(A, B);
impl_type_list!(A, B, C);
impl_type_list!(A, B, C, D);
impl_type_list!(A, B, C, D, E);
impl_type_list!(A, B, C, D, E, F);
impl_type_list!(A, B, C, D, E, F, G);
impl_type_list!(A, B, C, D, E, F, G, H);

/// Reduces a set of candidate clauses, given the current component
/// registry. Every filter combinator is built from this single method.
pub trait Filter {
    fn apply(clauses: Vec<Clause>, registry: &mut TypeRegistry) -> Vec<Clause>
    where
        Self: Sized;
}

/// No constraint: matches every table.
impl Filter for () {
    fn apply(clauses: Vec<Clause>, _registry: &mut TypeRegistry) -> Vec<Clause> {
        clauses
    }
}

/// Require every type in `T` to be present.
pub struct With<T: TypeList>(PhantomData<T>);

impl<T: TypeList> Filter for With<T> {
    fn apply(mut clauses: Vec<Clause>, registry: &mut TypeRegistry) -> Vec<Clause> {
        let ids = T::ids(registry);
        for (require, _forbid) in &mut clauses {
            for id in &ids {
                require.set(*id);
            }
        }
        clauses
    }
}

/// Require every type in `T` to be absent.
pub struct Without<T: TypeList>(PhantomData<T>);

impl<T: TypeList> Filter for Without<T> {
    fn apply(mut clauses: Vec<Clause>, registry: &mut TypeRegistry) -> Vec<Clause> {
        let ids = T::ids(registry);
        for (_require, forbid) in &mut clauses {
            for id in &ids {
                forbid.set(*id);
            }
        }
        clauses
    }
}

/// Both `A` and `B` must hold. Each existing clause is narrowed by `A`, then
/// by `B` — constraints from both accumulate onto the same clauses.
pub struct And<A, B>(PhantomData<(A, B)>);

impl<A: Filter, B: Filter> Filter for And<A, B> {
    fn apply(clauses: Vec<Clause>, registry: &mut TypeRegistry) -> Vec<Clause> {
        B::apply(A::apply(clauses, registry), registry)
    }
}

/// Either `A` or `B` holds. Each input clause is narrowed independently by
/// `A` and by `B`; the results are concatenated into one disjunction.
pub struct Or<A, B>(PhantomData<(A, B)>);

impl<A: Filter, B: Filter> Filter for Or<A, B> {
    fn apply(clauses: Vec<Clause>, registry: &mut TypeRegistry) -> Vec<Clause> {
        let mut left = A::apply(clauses.clone(), registry);
        let mut right = B::apply(clauses, registry);
        left.append(&mut right);
        left
    }
}

macro_rules! impl_filter_tuple {
    ($($T:ident),*) => {
        impl<$($T: Filter),*> Filter for ($($T,)*) {
            fn apply(clauses: Vec<Clause>, registry: &mut TypeRegistry) -> Vec<Clause> {
                #[allow(unused_mut)]
                let mut clauses = clauses;
                $(clauses = $T::apply(clauses, registry);)*
                clauses
            }
        }
    };
}

impl_filter_tuple!(A);
impl_filter_tuple!(A, B);
impl_filter_tuple!(A, B, C);
impl_filter_tuple!(A, B, C, D);
impl_filter_tuple!(A, B, C, D, E);
impl_filter_tuple!(A, B, C, D, E, F);
impl_filter_tuple!(A, B, C, D, E, F, G);
impl_filter_tuple!(A, B, C, D, E, F, G, H);

/// True iff any clause in the disjunction matches `archetype`.
pub fn matches_any(clauses: &[Clause], archetype: &ArchetypeId) -> bool {
    clauses.iter().any(|(require, forbid)| archetype.matches(require, forbid))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archetype::encode;

    struct Position;
    struct Velocity;
    struct Dead;

    #[test]
    fn with_requires_presence() {
        let mut registry = TypeRegistry::new();
        let clauses = With::<Position>::apply(unconstrained(), &mut registry);
        let pos = registry.component_id::<Position>();
        assert!(matches_any(&clauses, &encode(&[pos])));
        assert!(!matches_any(&clauses, &encode(&[])));
    }

    #[test]
    fn without_forbids_presence() {
        let mut registry = TypeRegistry::new();
        let pos = registry.component_id::<Position>();
        let clauses = Without::<Dead>::apply(unconstrained(), &mut registry);
        let dead = registry.component_id::<Dead>();
        assert!(matches_any(&clauses, &encode(&[pos])));
        assert!(!matches_any(&clauses, &encode(&[pos, dead])));
    }

    #[test]
    fn and_combines_constraints() {
        let mut registry = TypeRegistry::new();
        let clauses = <And<With<Position>, With<Velocity>>>::apply(unconstrained(), &mut registry);
        let pos = registry.component_id::<Position>();
        let vel = registry.component_id::<Velocity>();
        assert!(matches_any(&clauses, &encode(&[pos, vel])));
        assert!(!matches_any(&clauses, &encode(&[pos])));
    }

    #[test]
    fn or_matches_either_branch() {
        let mut registry = TypeRegistry::new();
        let clauses = <Or<With<Position>, With<Velocity>>>::apply(unconstrained(), &mut registry);
        let pos = registry.component_id::<Position>();
        let vel = registry.component_id::<Velocity>();
        assert!(matches_any(&clauses, &encode(&[pos])));
        assert!(matches_any(&clauses, &encode(&[vel])));
        assert!(!matches_any(&clauses, &encode(&[])));
    }

    #[test]
    fn tuple_is_implicit_and() {
        let mut registry = TypeRegistry::new();
        let clauses = <(With<Position>, Without<Dead>)>::apply(unconstrained(), &mut registry);
        let pos = registry.component_id::<Position>();
        let dead = registry.component_id::<Dead>();
        assert!(matches_any(&clauses, &encode(&[pos])));
        assert!(!matches_any(&clauses, &encode(&[pos, dead])));
    }
}
