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

//! Event-scope functions shared by every object kind

use super::{MISSING_MOMENTUM, MISSING_POSITION};
use crate::error::Result;
use crate::model::{EventContext, LorentzVector, PhysicsObject, Vertex};
use crate::registry::table::NativeTable;

fn pv_quantity(event: &EventContext, f: impl Fn(&Vertex) -> f64) -> f32 {
    event.pv().map_or(MISSING_POSITION, |pv| f(pv) as f32)
}

fn jet_p4(event: &EventContext, index: usize) -> Option<LorentzVector> {
    event.jets.get(index).map(|jet| jet.p4)
}

fn gen_jet_p4(event: &EventContext, index: usize) -> Option<LorentzVector> {
    event.gen_jets.get(index).map(|jet| jet.p4)
}

fn dijet(event: &EventContext) -> Option<LorentzVector> {
    Some(jet_p4(event, 0)? + jet_p4(event, 1)?)
}

fn gen_dijet(event: &EventContext) -> Option<LorentzVector> {
    Some(gen_jet_p4(event, 0)? + gen_jet_p4(event, 1)?)
}

fn or_sentinel(p4: Option<LorentzVector>, f: fn(&LorentzVector) -> f64, missing: f32) -> f32 {
    p4.map_or(missing, |p4| f(&p4) as f32)
}

fn qg_likelihood(event: &EventContext, index: usize) -> f32 {
    event
        .jets
        .get(index)
        .and_then(|jet| jet.user.user_float("qgLikelihood"))
        .unwrap_or(MISSING_MOMENTUM)
}

/// Transverse mass of the object and the missing transverse momentum
fn mt_to_met<T: PhysicsObject>(object: &T, event: &EventContext) -> f32 {
    let p4 = object.p4();
    let met = event.met.p4;
    let total_et = p4.et() + met.pt();
    let total_pt = (p4 + met).pt();
    (total_et * total_et - total_pt * total_pt).abs().sqrt() as f32
}

pub(super) fn floats<T: PhysicsObject>(table: &mut NativeTable<f32, T>) -> Result<()> {
    table
        .shared("pvZ", |_, event| pv_quantity(event, |pv| pv.position.z))?
        .shared("pvndof", |_, event| pv_quantity(event, |pv| pv.ndof))?
        .shared("pvRho", |_, event| pv_quantity(event, |pv| pv.position.rho()))?
        .shared("nTruePU", |_, event| {
            event.true_interactions().unwrap_or(MISSING_MOMENTUM)
        })?
        .shared("type1_pfMETEt", |_, event| event.met.p4.pt() as f32)?
        .shared("type1_pfMETPhi", |_, event| event.met.p4.phi() as f32)?
        .shared("genWeight", |_, event| {
            event.gen_info.map_or(0.0, |info| info.weight as f32)
        })?
        .shared("mtToMET", mt_to_met)?
        .shared("jet1Pt", |_, event| {
            or_sentinel(jet_p4(event, 0), LorentzVector::pt, MISSING_MOMENTUM)
        })?
        .shared("jet1Eta", |_, event| {
            or_sentinel(jet_p4(event, 0), LorentzVector::eta, MISSING_POSITION)
        })?
        .shared("jet1Phi", |_, event| {
            or_sentinel(jet_p4(event, 0), LorentzVector::phi, MISSING_POSITION)
        })?
        .shared("jet2Pt", |_, event| {
            or_sentinel(jet_p4(event, 1), LorentzVector::pt, MISSING_MOMENTUM)
        })?
        .shared("jet2Eta", |_, event| {
            or_sentinel(jet_p4(event, 1), LorentzVector::eta, MISSING_POSITION)
        })?
        .shared("jet2Phi", |_, event| {
            or_sentinel(jet_p4(event, 1), LorentzVector::phi, MISSING_POSITION)
        })?
        .shared("dijetMass", |_, event| {
            or_sentinel(dijet(event), LorentzVector::mass, MISSING_MOMENTUM)
        })?
        .shared("dijetPt", |_, event| {
            or_sentinel(dijet(event), LorentzVector::pt, MISSING_MOMENTUM)
        })?
        .shared("dijetEta", |_, event| {
            or_sentinel(dijet(event), LorentzVector::eta, MISSING_POSITION)
        })?
        .shared("dijetPhi", |_, event| {
            or_sentinel(dijet(event), LorentzVector::phi, MISSING_POSITION)
        })?
        .shared("jet1QGLikelihood", |_, event| qg_likelihood(event, 0))?
        .shared("jet2QGLikelihood", |_, event| qg_likelihood(event, 1))?
        .shared("genJet1Pt", |_, event| {
            or_sentinel(gen_jet_p4(event, 0), LorentzVector::pt, MISSING_MOMENTUM)
        })?
        .shared("genJet2Pt", |_, event| {
            or_sentinel(gen_jet_p4(event, 1), LorentzVector::pt, MISSING_MOMENTUM)
        })?
        .shared("genJet1Eta", |_, event| {
            or_sentinel(gen_jet_p4(event, 0), LorentzVector::eta, MISSING_POSITION)
        })?
        .shared("genJet2Eta", |_, event| {
            or_sentinel(gen_jet_p4(event, 1), LorentzVector::eta, MISSING_POSITION)
        })?
        .shared("genJet1Phi", |_, event| {
            or_sentinel(gen_jet_p4(event, 0), LorentzVector::phi, MISSING_POSITION)
        })?
        .shared("genJet2Phi", |_, event| {
            or_sentinel(gen_jet_p4(event, 1), LorentzVector::phi, MISSING_POSITION)
        })?
        .shared("mjjGen", |_, event| {
            or_sentinel(gen_dijet(event), LorentzVector::mass, MISSING_MOMENTUM)
        })?;
    Ok(())
}

pub(super) fn bools<T: PhysicsObject>(table: &mut NativeTable<bool, T>) -> Result<()> {
    table
        .shared("pvIsValid", |_, event| event.pv().is_some_and(|pv| pv.is_valid))?
        .shared("pvIsFake", |_, event| event.pv().is_none_or(|pv| pv.is_fake))?;
    Ok(())
}

pub(super) fn ints<T: PhysicsObject>(table: &mut NativeTable<i32, T>) -> Result<()> {
    table
        .shared("Charge", |object, _| object.charge())?
        .shared("PdgId", |object, _| object.pdg_id())?;
    Ok(())
}

pub(super) fn uints<T: PhysicsObject>(table: &mut NativeTable<u32, T>) -> Result<()> {
    table
        .shared("lumi", |_, event| event.id.lumi)?
        .shared("run", |_, event| event.id.run)?
        .shared("nvtx", |_, event| event.n_vertices() as u32)?
        .shared("nJets", |_, event| event.jets.len() as u32)?
        .shared("nGenJets", |_, event| event.gen_jets.len() as u32)?;
    Ok(())
}

pub(super) fn ulongs<T: PhysicsObject>(table: &mut NativeTable<u64, T>) -> Result<()> {
    table.shared("evt", |_, event| event.id.event)?;
    Ok(())
}
