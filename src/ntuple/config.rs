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

//! Ntuple job configuration

use super::branches::BranchSet;
use crate::compiler::CompilerConfig;
use crate::error::Result;
use crate::model::ObjectKind;
use serde::{Deserialize, Serialize};

/// Configuration of one ntuple: which objects, which branches
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NtupleConfig {
    /// Kind of the objects filling one row each
    pub object: ObjectKind,
    /// Object branches
    #[serde(default)]
    pub branches: BranchSet,
    /// Prepend the standard event branches
    #[serde(default)]
    pub include_event: bool,
    /// Prepend the generator-level event branches
    #[serde(default)]
    pub include_gen: bool,
    #[serde(default)]
    pub compiler: CompilerConfig,
}

impl NtupleConfig {
    /// Configuration with no branches for `object`
    pub fn new(object: ObjectKind) -> Self {
        Self {
            object,
            branches: BranchSet::new(),
            include_event: false,
            include_gen: false,
            compiler: CompilerConfig::default(),
        }
    }

    /// Parse a JSON configuration
    pub fn from_json(input: &str) -> serde_json::Result<Self> {
        serde_json::from_str(input)
    }

    /// Presets followed by the configured branches, validated.
    ///
    /// A configured branch replaces a preset branch of the same name and kind.
    pub fn resolved_branches(&self) -> Result<BranchSet> {
        let mut resolved = BranchSet::new();
        if self.include_event {
            resolved.merge(&BranchSet::event());
        }
        if self.include_gen {
            resolved.merge(&BranchSet::event_gen());
        }
        resolved.merge(&self.branches);
        resolved.validate()?;
        Ok(resolved)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::NtupleError;
    use crate::model::ReturnKind;

    #[test]
    fn test_from_json_with_defaults() {
        let config = NtupleConfig::from_json(
            r#"{"object": "muon", "include_event": true, "branches": {"floats": {"Pt": "pt"}}}"#,
        )
        .unwrap();
        assert_eq!(config.object, ObjectKind::Muon);
        assert_eq!(config.compiler, CompilerConfig::default());

        let branches = config.resolved_branches().unwrap();
        assert_eq!(branches.len(), 13);
        assert_eq!(branches.iter().last(), Some((ReturnKind::ULong, "evt", "evt")));
    }

    #[test]
    fn test_unknown_fields_are_rejected() {
        assert!(NtupleConfig::from_json(r#"{"object": "muon", "brnaches": {}}"#).is_err());
    }

    #[test]
    fn test_cross_group_collision_with_preset() {
        let mut config = NtupleConfig::new(ObjectKind::Electron);
        config.include_event = true;
        config.branches.insert(ReturnKind::Float, "nvtx", "pt");
        assert_eq!(
            config.resolved_branches().unwrap_err(),
            NtupleError::DuplicateBranch("nvtx".to_string())
        );
    }
}
