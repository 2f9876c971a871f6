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

//! The per-event consumer loop

use super::branches::BranchSet;
use super::config::NtupleConfig;
use crate::compiler::ExpressionCompiler;
use crate::error::{NtupleError, Result};
use crate::model::{EventContext, Value};
use crate::registry::{AnyFunction, LibrarySet, ObjectFunctions};
use indexmap::IndexMap;
use log::debug;
use serde::{Deserialize, Serialize};

/// One ntuple row: branch name to value, in branch order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NtupleRow(pub IndexMap<String, Value>);

impl NtupleRow {
    /// Value of one branch
    pub fn get(&self, branch: &str) -> Option<Value> {
        self.0.get(branch).copied()
    }

    /// Number of branches
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the row has no branches
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Fills one row per object per event.
///
/// Every branch is resolved at construction, so a bad function name or
/// expression fails the job before the first event.
pub struct Ntuplizer<T> {
    branches: Vec<(String, AnyFunction<T>)>,
}

impl<T: ObjectFunctions> Ntuplizer<T> {
    /// Build from a job configuration, with libraries of its own
    pub fn new(config: &NtupleConfig) -> Result<Self> {
        if config.object != T::KIND {
            return Err(NtupleError::UnsupportedObjectKind(config.object));
        }
        let branches = config.resolved_branches()?;
        let compiler = ExpressionCompiler::with_config(config.compiler.clone());
        let libraries = LibrarySet::with_compiler(compiler)?;
        Self::with_libraries(&branches, &libraries)
    }

    /// Build from validated branches, sharing `libraries` and their memo
    pub fn with_libraries(branches: &BranchSet, libraries: &LibrarySet<T>) -> Result<Self> {
        let branches = branches
            .iter()
            .map(|(kind, branch, function)| -> Result<(String, AnyFunction<T>)> {
                Ok((branch.to_string(), libraries.get(kind, function)?))
            })
            .collect::<Result<Vec<_>>>()?;
        debug!("Ntuplizer for {} resolved {} branches", T::KIND, branches.len());
        Ok(Self { branches })
    }

    /// Branch names, in row order
    pub fn branch_names(&self) -> impl Iterator<Item = &str> {
        self.branches.iter().map(|(name, _)| name.as_str())
    }

    /// Row for one object
    pub fn fill(&self, object: &T, event: &EventContext) -> NtupleRow {
        NtupleRow(
            self.branches
                .iter()
                .map(|(name, function)| (name.clone(), function.call(object, event)))
                .collect(),
        )
    }

    /// Rows for every object of one event
    pub fn fill_all(&self, objects: &[T], event: &EventContext) -> Vec<NtupleRow> {
        objects.iter().map(|object| self.fill(object, event)).collect()
    }
}
