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

//! Reconstructed physics objects: electrons, muons, jets and composites

use super::accessor::{
    AccessorTable, COMPOSITE_ACCESSORS, ELECTRON_ACCESSORS, JET_ACCESSORS, MUON_ACCESSORS,
    PARTICLE_ACCESSORS,
};
use super::candidate::{Candidate, CandidateRef, PhysicsObject, UserData};
use super::event::Point;
use super::lorentz::LorentzVector;
use super::types::ObjectKind;
use serde::{Deserialize, Serialize};

/// Charged-particle track parameters at its reference point
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Track {
    /// Reference point x
    pub vx: f64,
    /// Reference point y
    pub vy: f64,
    /// Reference point z
    pub vz: f64,
    /// Momentum x at the reference point
    pub px: f64,
    /// Momentum y at the reference point
    pub py: f64,
    /// Momentum z at the reference point
    pub pz: f64,
    /// Missing hits before the first valid inner-tracker hit
    #[serde(default)]
    pub missing_inner_hits: u32,
}

impl Track {
    fn pt(&self) -> f64 {
        self.px.hypot(self.py)
    }

    /// Transverse impact parameter with respect to `point`
    pub fn dxy(&self, point: &Point) -> f64 {
        let pt = self.pt();
        if pt == 0.0 {
            return 0.0;
        }
        (-(self.vx - point.x) * self.py + (self.vy - point.y) * self.px) / pt
    }

    /// Longitudinal impact parameter with respect to `point`
    pub fn dz(&self, point: &Point) -> f64 {
        let pt = self.pt();
        if pt == 0.0 {
            return self.vz - point.z;
        }
        let transverse = (self.vx - point.x) * self.px + (self.vy - point.y) * self.py;
        (self.vz - point.z) - transverse / pt * (self.pz / pt)
    }
}

/// Reconstructed electron with the variables used by cut-based identification
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Electron {
    pub p4: LorentzVector,
    pub charge: i32,
    pub user: UserData,
    /// Supercluster in the barrel
    pub is_eb: bool,
    /// Supercluster in the endcap
    pub is_ee: bool,
    pub sigma_ieta_ieta: f64,
    pub hcal_over_ecal: f64,
    pub delta_eta_sc_trk_at_vtx: f64,
    pub delta_phi_sc_trk_at_vtx: f64,
    pub e_sc_over_p: f64,
    pub ecal_energy: f64,
    pub ecal_pf_cluster_iso: f64,
    pub hcal_pf_cluster_iso: f64,
    pub dr03_tk_sum_pt: f64,
    pub pass_conversion_veto: bool,
    /// 3D impact parameter
    pub db_3d: f64,
    /// Uncertainty on the 3D impact parameter
    pub edb_3d: f64,
    pub gsf_track: Track,
}

impl Electron {
    /// |1/E - 1/p| computed from the supercluster energy over momentum
    pub fn one_over_e_minus_one_over_p(&self) -> f64 {
        if self.ecal_energy == 0.0 {
            return 0.0;
        }
        ((1.0 - self.e_sc_over_p) / self.ecal_energy).abs()
    }
}

impl Candidate for Electron {
    fn p4(&self) -> LorentzVector {
        self.p4
    }

    fn charge(&self) -> i32 {
        self.charge
    }

    fn pdg_id(&self) -> i32 {
        if self.charge < 0 { 11 } else { -11 }
    }

    fn user_data(&self) -> &UserData {
        &self.user
    }
}

impl PhysicsObject for Electron {
    const KIND: ObjectKind = ObjectKind::Electron;

    fn accessors() -> &'static AccessorTable<Self> {
        &ELECTRON_ACCESSORS
    }
}

/// Which track was chosen as a muon's best track
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MuonTrackType {
    #[default]
    None,
    InnerTrack,
    OuterTrack,
    CombinedTrack,
    Tpfms,
    Picky,
    Dyt,
}

impl MuonTrackType {
    /// Numeric code stored in ntuples
    pub fn code(self) -> u32 {
        match self {
            MuonTrackType::None => 0,
            MuonTrackType::InnerTrack => 1,
            MuonTrackType::OuterTrack => 2,
            MuonTrackType::CombinedTrack => 3,
            MuonTrackType::Tpfms => 4,
            MuonTrackType::Picky => 5,
            MuonTrackType::Dyt => 6,
        }
    }
}

/// Reconstructed muon
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Muon {
    pub p4: LorentzVector,
    pub charge: i32,
    pub user: UserData,
    pub is_pf: bool,
    pub is_global: bool,
    pub is_tracker: bool,
    pub best_track: Option<Track>,
    pub best_track_type: MuonTrackType,
    pub matched_stations: u32,
    /// 3D impact parameter
    pub db_3d: f64,
    /// Uncertainty on the 3D impact parameter
    pub edb_3d: f64,
}

impl Candidate for Muon {
    fn p4(&self) -> LorentzVector {
        self.p4
    }

    fn charge(&self) -> i32 {
        self.charge
    }

    fn pdg_id(&self) -> i32 {
        if self.charge < 0 { 13 } else { -13 }
    }

    fn user_data(&self) -> &UserData {
        &self.user
    }
}

impl PhysicsObject for Muon {
    const KIND: ObjectKind = ObjectKind::Muon;

    fn accessors() -> &'static AccessorTable<Self> {
        &MUON_ACCESSORS
    }
}

/// Reconstructed jet
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Jet {
    pub p4: LorentzVector,
    pub user: UserData,
}

impl Jet {
    /// Jet with the given kinematics and no user data
    pub fn new(p4: LorentzVector) -> Self {
        Self {
            p4,
            user: UserData::default(),
        }
    }
}

impl Candidate for Jet {
    fn p4(&self) -> LorentzVector {
        self.p4
    }

    fn charge(&self) -> i32 {
        0
    }

    fn pdg_id(&self) -> i32 {
        0
    }

    fn user_data(&self) -> &UserData {
        &self.user
    }
}

impl PhysicsObject for Jet {
    const KIND: ObjectKind = ObjectKind::Other;

    fn accessors() -> &'static AccessorTable<Self> {
        &JET_ACCESSORS
    }
}

/// Generator-level jet
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct GenJet {
    pub p4: LorentzVector,
}

/// Any object that can be a daughter of a composite candidate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Particle {
    Electron(Electron),
    Muon(Muon),
    Jet(Jet),
    Composite(Box<CompositeCandidate>),
}

impl Particle {
    fn inner(&self) -> CandidateRef<'_> {
        match self {
            Particle::Electron(e) => e,
            Particle::Muon(m) => m,
            Particle::Jet(j) => j,
            Particle::Composite(c) => c.as_ref(),
        }
    }

    /// Four-momentum with final-state radiation photons removed at every level
    pub fn p4_without_fsr(&self) -> LorentzVector {
        match self {
            Particle::Composite(c) => c.p4_without_fsr(),
            other => other.p4(),
        }
    }
}

impl Candidate for Particle {
    fn p4(&self) -> LorentzVector {
        self.inner().p4()
    }

    fn charge(&self) -> i32 {
        self.inner().charge()
    }

    fn pdg_id(&self) -> i32 {
        self.inner().pdg_id()
    }

    fn user_data(&self) -> &UserData {
        match self {
            Particle::Electron(e) => &e.user,
            Particle::Muon(m) => &m.user,
            Particle::Jet(j) => &j.user,
            Particle::Composite(c) => &c.user,
        }
    }

    fn number_of_daughters(&self) -> usize {
        self.inner().number_of_daughters()
    }

    fn daughter(&self, index: usize) -> Option<CandidateRef<'_>> {
        match self {
            Particle::Composite(c) => c.daughter(index),
            _ => None,
        }
    }
}

impl PhysicsObject for Particle {
    const KIND: ObjectKind = ObjectKind::Other;

    fn accessors() -> &'static AccessorTable<Self> {
        &PARTICLE_ACCESSORS
    }
}

impl From<Electron> for Particle {
    fn from(value: Electron) -> Self {
        Particle::Electron(value)
    }
}

impl From<Muon> for Particle {
    fn from(value: Muon) -> Self {
        Particle::Muon(value)
    }
}

impl From<Jet> for Particle {
    fn from(value: Jet) -> Self {
        Particle::Jet(value)
    }
}

impl From<CompositeCandidate> for Particle {
    fn from(value: CompositeCandidate) -> Self {
        Particle::Composite(Box::new(value))
    }
}

/// Candidate built from daughters, such as a Z boson or a ZZ pair
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompositeCandidate {
    pub daughters: Vec<Particle>,
    /// Final-state radiation photons attached to this candidate
    pub fsr_photons: Vec<LorentzVector>,
    pub pdg_id: i32,
    pub user: UserData,
}

impl CompositeCandidate {
    /// Composite of the given daughters, without FSR photons
    pub fn new(pdg_id: i32, daughters: Vec<Particle>) -> Self {
        Self {
            daughters,
            fsr_photons: Vec::new(),
            pdg_id,
            user: UserData::default(),
        }
    }

    /// Attach an FSR photon
    pub fn with_fsr(mut self, photon: LorentzVector) -> Self {
        self.fsr_photons.push(photon);
        self
    }

    /// Sum of the daughters' four-momenta, FSR photons excluded recursively
    pub fn p4_without_fsr(&self) -> LorentzVector {
        self.daughters.iter().map(Particle::p4_without_fsr).sum()
    }
}

impl Candidate for CompositeCandidate {
    fn p4(&self) -> LorentzVector {
        let daughters: LorentzVector = self.daughters.iter().map(Candidate::p4).sum();
        let fsr: LorentzVector = self.fsr_photons.iter().copied().sum();
        daughters + fsr
    }

    fn charge(&self) -> i32 {
        self.daughters.iter().map(Candidate::charge).sum()
    }

    fn pdg_id(&self) -> i32 {
        self.pdg_id
    }

    fn user_data(&self) -> &UserData {
        &self.user
    }

    fn number_of_daughters(&self) -> usize {
        self.daughters.len()
    }

    fn daughter(&self, index: usize) -> Option<CandidateRef<'_>> {
        self.daughters.get(index).map(|d| d as CandidateRef<'_>)
    }
}

impl PhysicsObject for CompositeCandidate {
    const KIND: ObjectKind = ObjectKind::Composite;

    fn accessors() -> &'static AccessorTable<Self> {
        &COMPOSITE_ACCESSORS
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn muon(pt: f64, eta: f64, phi: f64, charge: i32) -> Particle {
        Particle::Muon(Muon {
            p4: LorentzVector::from_pt_eta_phi_m(pt, eta, phi, 0.105),
            charge,
            ..Muon::default()
        })
    }

    #[test]
    fn test_composite_fsr_is_excluded_recursively() {
        let photon = LorentzVector::from_pt_eta_phi_m(5.0, 0.1, 0.2, 0.0);
        let z = CompositeCandidate::new(23, vec![muon(40.0, 0.1, 0.0, -1), muon(35.0, -0.4, 2.8, 1)])
            .with_fsr(photon);
        let without = z.p4_without_fsr();
        let with = z.p4();

        assert!(((with - without).pt() - photon.pt()).abs() < 1e-9);

        let zz = CompositeCandidate::new(25, vec![z.clone().into(), z.into()]);
        assert!((zz.p4_without_fsr().e - 2.0 * without.e).abs() < 1e-9);
        assert_eq!(zz.charge(), 0);
    }

    #[test]
    fn test_daughter_out_of_range() {
        let z = CompositeCandidate::new(23, vec![muon(40.0, 0.1, 0.0, -1)]);
        assert!(z.daughter(0).is_some());
        assert!(z.daughter(1).is_none());
        assert_eq!(z.number_of_daughters(), 1);
    }

    #[test]
    fn test_track_impact_parameters() {
        let track = Track {
            vx: 0.01,
            vy: 0.0,
            vz: 0.5,
            px: 0.0,
            py: 10.0,
            pz: 0.0,
            missing_inner_hits: 0,
        };
        let pv = Point::new(0.0, 0.0, 0.2);
        assert!((track.dxy(&pv) + 0.01).abs() < 1e-12);
        assert!((track.dz(&pv) - 0.3).abs() < 1e-12);
    }

    #[test]
    fn test_particle_serde_tag() {
        let json = r#"{"type":"jet","p4":{"px":1.0,"py":0.0,"pz":0.0,"e":1.0}}"#;
        let particle: Particle = serde_json::from_str(json).unwrap();
        assert!(matches!(particle, Particle::Jet(_)));
        assert_eq!(particle.pdg_id(), 0);
    }
}
