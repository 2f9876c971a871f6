// Copyright 2024 Ntuplizer Authors
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

//! Native function tables
//!
//! One table per (return kind, object kind) pair, filled in two layers.
//! Object-specific entries shadow shared ones whatever order they are
//! registered in; two entries with the same name in the same layer are a
//! registration error.

use super::function::{FunctionOrigin, NamedFunction};
use crate::error::{NtupleError, Result};
use crate::model::{EventContext, PhysicsObject, ReturnValue};
use log::debug;
use rustc_hash::FxHashMap;
use std::fmt;

/// Name to native function map for one (return kind, object kind) pair
pub struct NativeTable<B, T> {
    entries: FxHashMap<String, NamedFunction<B, T>>,
}

impl<B: ReturnValue, T: PhysicsObject> NativeTable<B, T> {
    /// Create an empty table
    pub fn new() -> Self {
        Self {
            entries: FxHashMap::default(),
        }
    }

    /// Register an event-scope function shared by every object kind
    pub fn shared<F>(&mut self, name: &str, func: F) -> Result<&mut Self>
    where
        F: Fn(&T, &EventContext) -> B + Send + Sync + 'static,
    {
        self.insert(NamedFunction::native(name, FunctionOrigin::Shared, func))?;
        Ok(self)
    }

    /// Register a function specific to this table's object kind
    pub fn object<F>(&mut self, name: &str, func: F) -> Result<&mut Self>
    where
        F: Fn(&T, &EventContext) -> B + Send + Sync + 'static,
    {
        self.insert(NamedFunction::native(name, FunctionOrigin::ObjectSpecific, func))?;
        Ok(self)
    }

    /// Insert a function, applying the layer override rule
    pub fn insert(&mut self, function: NamedFunction<B, T>) -> Result<()> {
        let Some(existing) = self.entries.get(function.name()) else {
            self.entries.insert(function.name().to_string(), function);
            return Ok(());
        };

        match (existing.origin(), function.origin()) {
            (FunctionOrigin::Shared, FunctionOrigin::ObjectSpecific) => {
                debug!(
                    "{} function '{}' for {} shadows the shared one",
                    B::KIND,
                    function.name(),
                    T::KIND
                );
                self.entries.insert(function.name().to_string(), function);
                Ok(())
            }
            (FunctionOrigin::ObjectSpecific, FunctionOrigin::Shared) => {
                debug!(
                    "Shared {} function '{}' is shadowed for {}",
                    B::KIND,
                    function.name(),
                    T::KIND
                );
                Ok(())
            }
            _ => Err(NtupleError::DuplicateFunction {
                name: function.name().to_string(),
                return_kind: B::KIND,
                object_kind: T::KIND,
            }),
        }
    }

    /// Look up a function by exact name
    pub fn get(&self, name: &str) -> Option<&NamedFunction<B, T>> {
        self.entries.get(name)
    }

    /// Check whether a name is registered
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// All registered names, sorted
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.entries.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Number of registered functions
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the table is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<B: ReturnValue, T: PhysicsObject> Default for NativeTable<B, T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<B, T> fmt::Debug for NativeTable<B, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NativeTable")
            .field("function_count", &self.entries.len())
            .finish()
    }
}
