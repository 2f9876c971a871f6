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

//! The candidate abstraction shared by every physics object
//!
//! [`Candidate`] is the generic accessor surface: kinematics, charge, PDG id,
//! daughters and user data. [`PhysicsObject`] adds the static information a
//! concrete record type needs to take part in function registries.

use super::accessor::AccessorTable;
use super::lorentz::LorentzVector;
use super::types::ObjectKind;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Borrowed candidate, as returned by daughter access
pub type CandidateRef<'a> = &'a (dyn Candidate + 'static);

/// Named values attached to an object after reconstruction
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserData {
    /// Floating point user values
    #[serde(default)]
    pub floats: IndexMap<String, f32>,
    /// Integer user values
    #[serde(default)]
    pub ints: IndexMap<String, i32>,
}

impl UserData {
    /// Get a user float by key
    pub fn user_float(&self, key: &str) -> Option<f32> {
        self.floats.get(key).copied()
    }

    /// Get a user int by key
    pub fn user_int(&self, key: &str) -> Option<i32> {
        self.ints.get(key).copied()
    }

    /// Whether a user float with this key is present
    pub fn has_user_float(&self, key: &str) -> bool {
        self.floats.contains_key(key)
    }

    /// Whether a user int with this key is present
    pub fn has_user_int(&self, key: &str) -> bool {
        self.ints.contains_key(key)
    }

    /// Attach or overwrite a user float
    pub fn add_user_float(&mut self, key: impl Into<String>, value: f32) {
        self.floats.insert(key.into(), value);
    }

    /// Attach or overwrite a user int
    pub fn add_user_int(&mut self, key: impl Into<String>, value: i32) {
        self.ints.insert(key.into(), value);
    }
}

/// Generic physics candidate
pub trait Candidate: Send + Sync {
    /// Four-momentum
    fn p4(&self) -> LorentzVector;

    /// Electric charge in units of e
    fn charge(&self) -> i32;

    /// PDG particle id
    fn pdg_id(&self) -> i32;

    /// User data attached to this candidate
    fn user_data(&self) -> &UserData;

    /// Number of daughter candidates
    fn number_of_daughters(&self) -> usize {
        0
    }

    /// Daughter candidate by index, `None` when out of range
    fn daughter(&self, _index: usize) -> Option<CandidateRef<'_>> {
        None
    }

    /// Transverse momentum
    fn pt(&self) -> f64 {
        self.p4().pt()
    }

    /// Pseudorapidity
    fn eta(&self) -> f64 {
        self.p4().eta()
    }

    /// Azimuthal angle
    fn phi(&self) -> f64 {
        self.p4().phi()
    }

    /// Invariant mass
    fn mass(&self) -> f64 {
        self.p4().mass()
    }

    /// Energy
    fn energy(&self) -> f64 {
        self.p4().energy()
    }

    /// Transverse energy
    fn et(&self) -> f64 {
        self.p4().et()
    }
}

/// A concrete record type that function registries can be built over
pub trait PhysicsObject: Candidate + Sized + 'static {
    /// The object kind tag of this type
    const KIND: ObjectKind;

    /// Accessors specific to this type, consulted before the generic surface
    fn accessors() -> &'static AccessorTable<Self>;

    /// View as a generic candidate
    fn as_candidate(&self) -> CandidateRef<'_> {
        self
    }
}
