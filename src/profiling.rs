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

//! Optional `tracing` instrumentation, enabled by the `profiling` feature.
//! Everything here is compiled out entirely when the feature is off, so the
//! call sites that use it (`Schedule::run`, `World::flush`) gate their own
//! statements with the same `#[cfg(feature = "profiling")]`.

#[cfg(feature = "profiling")]
use crate::world::World;

/// Span for one system's execution, sized by how many entities are live
/// going into it.
#[cfg(feature = "profiling")]
pub fn system_span(name: &str, world: &World) -> tracing::Span {
    tracing::info_span!("system", name, entity_count = world.entity_count())
}

/// Span for one `flush` call, sized by how many tables exist going in.
#[cfg(feature = "profiling")]
pub fn flush_span(world: &World) -> tracing::Span {
    tracing::info_span!("flush", table_count = world.table_count())
}
