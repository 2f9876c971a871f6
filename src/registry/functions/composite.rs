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

//! Composite-candidate functions: pair quantities and FSR-free kinematics

use super::{MISSING_POSITION, ObjectFunctions};
use crate::error::Result;
use crate::model::{Candidate, CompositeCandidate, LorentzVector, delta_r_p4};
use crate::registry::table::NativeTable;

fn no_fsr(table: &mut NativeTable<f32, CompositeCandidate>, name: &str, f: fn(&LorentzVector) -> f64) -> Result<()> {
    table.object(name, move |c, _| f(&c.p4_without_fsr()) as f32)?;
    Ok(())
}

impl ObjectFunctions for CompositeCandidate {
    fn float_functions(table: &mut NativeTable<f32, Self>) -> Result<()> {
        table.object("DR", |c, _| match c.daughters.as_slice() {
            [first, second, ..] => delta_r_p4(&first.p4(), &second.p4()) as f32,
            _ => MISSING_POSITION,
        })?;
        no_fsr(table, "massNoFSR", LorentzVector::mass)?;
        no_fsr(table, "ptNoFSR", LorentzVector::pt)?;
        no_fsr(table, "etaNoFSR", LorentzVector::eta)?;
        no_fsr(table, "phiNoFSR", LorentzVector::phi)?;
        no_fsr(table, "energyNoFSR", LorentzVector::energy)?;
        Ok(())
    }

    fn bool_functions(table: &mut NativeTable<bool, Self>) -> Result<()> {
        table.object("SS", |c, _| match c.daughters.as_slice() {
            [first, second, ..] => first.charge() == second.charge(),
            _ => false,
        })?;
        Ok(())
    }
}
