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

//! Branch sets: output column name to function name, grouped by return kind

use crate::error::{NtupleError, Result};
use crate::model::ReturnKind;
use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::Regex;
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};

static BRANCH_NAME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("branch-name pattern is a valid regex")
});

/// Ordered branch definitions for every return kind.
///
/// Each value is resolved through a function library: a native function
/// name or an expression.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BranchSet {
    pub floats: IndexMap<String, String>,
    pub bools: IndexMap<String, String>,
    pub ints: IndexMap<String, String>,
    pub uints: IndexMap<String, String>,
    pub ulls: IndexMap<String, String>,
}

impl BranchSet {
    /// Create an empty branch set
    pub fn new() -> Self {
        Self::default()
    }

    /// Standard event-level branches
    pub fn event() -> Self {
        let mut set = Self::new();
        for name in ["pvndof", "pvZ", "pvRho", "type1_pfMETEt", "type1_pfMETPhi"] {
            set.insert(ReturnKind::Float, name, name);
        }
        for name in ["pvIsValid", "pvIsFake"] {
            set.insert(ReturnKind::Bool, name, name);
        }
        for name in ["lumi", "run", "nvtx", "nJets"] {
            set.insert(ReturnKind::UInt, name, name);
        }
        set.insert(ReturnKind::ULong, "evt", "evt");
        set
    }

    /// Generator-level event branches for simulated samples
    pub fn event_gen() -> Self {
        let mut set = Self::new();
        for name in ["genWeight", "nTruePU"] {
            set.insert(ReturnKind::Float, name, name);
        }
        set
    }

    /// The group holding branches of `kind`
    pub fn group(&self, kind: ReturnKind) -> &IndexMap<String, String> {
        match kind {
            ReturnKind::Float => &self.floats,
            ReturnKind::Bool => &self.bools,
            ReturnKind::Int => &self.ints,
            ReturnKind::UInt => &self.uints,
            ReturnKind::ULong => &self.ulls,
        }
    }

    fn group_mut(&mut self, kind: ReturnKind) -> &mut IndexMap<String, String> {
        match kind {
            ReturnKind::Float => &mut self.floats,
            ReturnKind::Bool => &mut self.bools,
            ReturnKind::Int => &mut self.ints,
            ReturnKind::UInt => &mut self.uints,
            ReturnKind::ULong => &mut self.ulls,
        }
    }

    /// Add or replace a branch
    pub fn insert(
        &mut self,
        kind: ReturnKind,
        branch: impl Into<String>,
        function: impl Into<String>,
    ) -> &mut Self {
        self.group_mut(kind).insert(branch.into(), function.into());
        self
    }

    /// Add every branch of `other`, replacing same-named branches of the same kind
    pub fn merge(&mut self, other: &BranchSet) -> &mut Self {
        for (kind, branch, function) in other.iter() {
            self.insert(kind, branch, function);
        }
        self
    }

    /// All branches as (kind, branch name, function name), group by group
    pub fn iter(&self) -> impl Iterator<Item = (ReturnKind, &str, &str)> {
        ReturnKind::ALL.into_iter().flat_map(move |kind| {
            self.group(kind)
                .iter()
                .map(move |(branch, function)| (kind, branch.as_str(), function.as_str()))
        })
    }

    /// Total number of branches
    pub fn len(&self) -> usize {
        ReturnKind::ALL.iter().map(|&kind| self.group(kind).len()).sum()
    }

    /// Whether no branch is defined
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Check branch names and reject names used in more than one group
    pub fn validate(&self) -> Result<()> {
        let mut seen = FxHashSet::default();
        for (_, branch, _) in self.iter() {
            if !BRANCH_NAME.is_match(branch) {
                return Err(NtupleError::InvalidBranchName(branch.to_string()));
            }
            if !seen.insert(branch) {
                return Err(NtupleError::DuplicateBranch(branch.to_string()));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_event_preset() {
        let set = BranchSet::event();
        assert_eq!(set.len(), 12);
        assert_eq!(set.group(ReturnKind::ULong).get("evt").map(String::as_str), Some("evt"));
        assert!(set.validate().is_ok());
    }

    #[test]
    fn test_merge_and_iteration_order() {
        let mut set = BranchSet::event_gen();
        let mut extra = BranchSet::new();
        extra
            .insert(ReturnKind::Float, "Pt", "pt")
            .insert(ReturnKind::Float, "nTruePU", "-1")
            .insert(ReturnKind::Int, "Charge", "Charge");
        set.merge(&extra);

        let entries: Vec<_> = set.iter().collect();
        assert_eq!(
            entries,
            vec![
                (ReturnKind::Float, "genWeight", "genWeight"),
                (ReturnKind::Float, "nTruePU", "-1"),
                (ReturnKind::Float, "Pt", "pt"),
                (ReturnKind::Int, "Charge", "Charge"),
            ]
        );
    }

    #[test]
    fn test_validation() {
        let mut bad_name = BranchSet::new();
        bad_name.insert(ReturnKind::Float, "2ndPt", "pt");
        assert_eq!(
            bad_name.validate().unwrap_err(),
            NtupleError::InvalidBranchName("2ndPt".to_string())
        );

        let mut duplicate = BranchSet::new();
        duplicate
            .insert(ReturnKind::Float, "Charge", "charge")
            .insert(ReturnKind::Int, "Charge", "Charge");
        assert_eq!(
            duplicate.validate().unwrap_err(),
            NtupleError::DuplicateBranch("Charge".to_string())
        );
    }

    #[test]
    fn test_deserialize_partial_groups() {
        let set: BranchSet =
            serde_json::from_str(r#"{"floats": {"Mass": "mass", "DR": "DR"}, "bools": {"SS": "SS"}}"#)
                .unwrap();
        assert_eq!(set.len(), 3);
        assert!(set.uints.is_empty());
        assert_eq!(set.floats.keys().map(String::as_str).collect::<Vec<_>>(), vec!["Mass", "DR"]);
    }
}
