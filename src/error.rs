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

//! Error types

use std::fmt;

/// ECS error type
#[derive(Debug)]
pub enum EcsError {
    /// A location (table id / row) carried a negative or otherwise invalid value.
    InvalidLocation(String),

    /// `add_system`/`add_systems` was called twice with the same system name on one schedule.
    DuplicateSystem(String),

    /// `remove_system`/`has_system` referenced a system name never added to the schedule.
    UnknownSystem(String),

    /// A schedule label was referenced that was never registered on the world.
    UnknownSchedule(String),

    /// A filter tree produced no `(require, forbid)` pair with `require & forbid == 0`.
    UnsatisfiableFilter,

    /// `insert`/`spawn` received a value that cannot be written into a component column.
    InvalidInsert(String),

    /// A `TryFromWorld` resource factory reported that it could not produce a value.
    MissingFromWorldResult(String),

    /// A system returned an error; the schedule aborts before running the rest.
    SystemError {
        system: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl fmt::Display for EcsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EcsError::InvalidLocation(msg) => write!(f, "invalid entity location: {msg}"),
            EcsError::DuplicateSystem(name) => {
                write!(f, "system `{name}` is already registered on this schedule")
            }
            EcsError::UnknownSystem(name) => {
                write!(f, "no system named `{name}` is registered on this schedule")
            }
            EcsError::UnknownSchedule(label) => write!(f, "no schedule named `{label}`"),
            EcsError::UnsatisfiableFilter => {
                write!(f, "filter tree has no satisfiable (require, forbid) pair")
            }
            EcsError::InvalidInsert(msg) => write!(f, "invalid component insert: {msg}"),
            EcsError::MissingFromWorldResult(ty) => {
                write!(f, "resource factory for `{ty}` did not produce a value")
            }
            EcsError::SystemError { system, source } => {
                write!(f, "system `{system}` failed: {source}")
            }
        }
    }
}

impl std::error::Error for EcsError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            EcsError::SystemError { source, .. } => Some(source.as_ref()),
            _ => None,
        }
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, EcsError>;
