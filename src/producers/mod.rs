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

//! Per-event producers built on the function library
//!
//! Each producer takes already-materialized collections and returns derived
//! ones; scheduling and event storage belong to the caller.

pub mod id_embedder;
pub mod jes_shifter;
pub mod object_counter;

pub use id_embedder::{ElectronWwIdEmbedder, IdVariables, RegionCuts, WwIdConfig};
pub use jes_shifter::{
    ConstantUncertainty, DEFAULT_JET_TYPE, JetCorrectionUncertainty, JetCorrectionsRecord,
    JetEnergyScaleShifter, JetUncertaintySource, ShiftedJets, UncertaintyBin, UncertaintyPoint,
};
pub use object_counter::ObjectCounter;
