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

//! Physics data model consumed by named functions
//!
//! Objects are opaque typed records with named accessors. The event context
//! carries the ambient per-event quantities native functions may read.

pub mod accessor;
pub mod candidate;
pub mod event;
pub mod lorentz;
pub mod objects;
pub mod types;
pub mod value;

pub use accessor::{Accessor, AccessorTable, CANDIDATE_ACCESSORS};
pub use candidate::{Candidate, CandidateRef, PhysicsObject, UserData};
pub use event::{EventContext, EventId, GenEventInfo, Met, PileupSummary, Point, Vertex};
pub use lorentz::{LorentzVector, delta_phi, delta_r, delta_r_p4};
pub use objects::{
    CompositeCandidate, Electron, GenJet, Jet, Muon, MuonTrackType, Particle, Track,
};
pub use types::{ObjectKind, ReturnKind, Value, ValueType};
pub use value::ReturnValue;
