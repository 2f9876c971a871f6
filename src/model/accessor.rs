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

//! Accessor surfaces: the named methods an expression may call on an object
//!
//! Every object kind has a table of its own accessors, consulted first, and
//! falls back to [`CANDIDATE_ACCESSORS`], the surface all candidates share.
//! Objects reached through `daughter(i)` only expose the shared surface.

use super::candidate::{Candidate, CandidateRef};
use super::objects::{CompositeCandidate, Electron, Jet, Muon, Particle};
use super::types::{ObjectKind, ValueType};
use once_cell::sync::Lazy;
use rustc_hash::FxHashMap;

/// A single named accessor on objects of type `T`
pub enum Accessor<T: ?Sized + 'static> {
    /// Numeric quantity, no arguments
    Number(fn(&T) -> f64),
    /// Boolean flag, no arguments
    Boolean(fn(&T) -> bool),
    /// Numeric quantity looked up by a string key, `None` when absent
    NumberByKey(fn(&T, &str) -> Option<f64>),
    /// Boolean looked up by a string key
    BooleanByKey(fn(&T, &str) -> bool),
    /// Child candidate by index, `None` when out of range
    Daughter(for<'a> fn(&'a T, usize) -> Option<CandidateRef<'a>>),
}

impl<T: ?Sized> Clone for Accessor<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T: ?Sized> Copy for Accessor<T> {}

impl<T: ?Sized> Accessor<T> {
    /// Type of the value the accessor yields
    pub fn value_type(&self) -> ValueType {
        match self {
            Accessor::Number(_) | Accessor::NumberByKey(_) => ValueType::Number,
            Accessor::Boolean(_) | Accessor::BooleanByKey(_) => ValueType::Boolean,
            Accessor::Daughter(_) => ValueType::Object(ObjectKind::Other),
        }
    }
}

/// Accessors of one object type, by name
pub struct AccessorTable<T: ?Sized + 'static> {
    kind: ObjectKind,
    entries: FxHashMap<&'static str, Accessor<T>>,
}

impl<T: ?Sized> AccessorTable<T> {
    /// Empty table for the given kind
    pub fn new(kind: ObjectKind) -> Self {
        Self {
            kind,
            entries: FxHashMap::default(),
        }
    }

    /// Object kind this table describes
    pub fn kind(&self) -> ObjectKind {
        self.kind
    }

    /// Look up an accessor by name
    pub fn get(&self, name: &str) -> Option<Accessor<T>> {
        self.entries.get(name).copied()
    }

    /// Names of all accessors, sorted
    pub fn names(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.entries.keys().copied().collect();
        names.sort_unstable();
        names
    }

    pub fn number(mut self, name: &'static str, f: fn(&T) -> f64) -> Self {
        self.entries.insert(name, Accessor::Number(f));
        self
    }

    pub fn boolean(mut self, name: &'static str, f: fn(&T) -> bool) -> Self {
        self.entries.insert(name, Accessor::Boolean(f));
        self
    }

    pub fn number_by_key(mut self, name: &'static str, f: fn(&T, &str) -> Option<f64>) -> Self {
        self.entries.insert(name, Accessor::NumberByKey(f));
        self
    }

    pub fn boolean_by_key(mut self, name: &'static str, f: fn(&T, &str) -> bool) -> Self {
        self.entries.insert(name, Accessor::BooleanByKey(f));
        self
    }

    pub fn daughter(
        mut self,
        name: &'static str,
        f: for<'a> fn(&'a T, usize) -> Option<CandidateRef<'a>>,
    ) -> Self {
        self.entries.insert(name, Accessor::Daughter(f));
        self
    }
}

fn candidate_daughter<'a>(
    candidate: &'a (dyn Candidate + 'static),
    index: usize,
) -> Option<CandidateRef<'a>> {
    candidate.daughter(index)
}

/// The surface shared by every candidate
pub static CANDIDATE_ACCESSORS: Lazy<AccessorTable<dyn Candidate>> = Lazy::new(|| {
    AccessorTable::<dyn Candidate>::new(ObjectKind::Other)
        .number("pt", |c| c.pt())
        .number("eta", |c| c.eta())
        .number("phi", |c| c.phi())
        .number("mass", |c| c.mass())
        .number("energy", |c| c.energy())
        .number("et", |c| c.et())
        .number("px", |c| c.p4().px)
        .number("py", |c| c.p4().py)
        .number("pz", |c| c.p4().pz)
        .number("p", |c| c.p4().p())
        .number("rapidity", |c| c.p4().rapidity())
        .number("y", |c| c.p4().rapidity())
        .number("theta", |c| c.p4().theta())
        .number("charge", |c| f64::from(c.charge()))
        .number("pdgId", |c| f64::from(c.pdg_id()))
        .number("numberOfDaughters", |c| c.number_of_daughters() as f64)
        .daughter("daughter", candidate_daughter)
        .number_by_key("userFloat", |c, key| {
            c.user_data().user_float(key).map(f64::from)
        })
        .number_by_key("userInt", |c, key| c.user_data().user_int(key).map(f64::from))
        .boolean_by_key("hasUserFloat", |c, key| c.user_data().has_user_float(key))
        .boolean_by_key("hasUserInt", |c, key| c.user_data().has_user_int(key))
});

pub(crate) static ELECTRON_ACCESSORS: Lazy<AccessorTable<Electron>> = Lazy::new(|| {
    AccessorTable::<Electron>::new(ObjectKind::Electron)
        .boolean("isEB", |e| e.is_eb)
        .boolean("isEE", |e| e.is_ee)
        .number("sigmaIetaIeta", |e| e.sigma_ieta_ieta)
        .number("hcalOverEcal", |e| e.hcal_over_ecal)
        .number("deltaEtaSuperClusterTrackAtVtx", |e| e.delta_eta_sc_trk_at_vtx)
        .number("deltaPhiSuperClusterTrackAtVtx", |e| e.delta_phi_sc_trk_at_vtx)
        .number("eSuperClusterOverP", |e| e.e_sc_over_p)
        .number("ecalEnergy", |e| e.ecal_energy)
        .number("ecalPFClusterIso", |e| e.ecal_pf_cluster_iso)
        .number("hcalPFClusterIso", |e| e.hcal_pf_cluster_iso)
        .number("dr03TkSumPt", |e| e.dr03_tk_sum_pt)
        .boolean("passConversionVeto", |e| e.pass_conversion_veto)
        .number("dB", |e| e.db_3d)
        .number("edB", |e| e.edb_3d)
        .number("missingInnerHits", |e| f64::from(e.gsf_track.missing_inner_hits))
});

pub(crate) static MUON_ACCESSORS: Lazy<AccessorTable<Muon>> = Lazy::new(|| {
    AccessorTable::<Muon>::new(ObjectKind::Muon)
        .boolean("isPFMuon", |m| m.is_pf)
        .boolean("isGlobalMuon", |m| m.is_global)
        .boolean("isTrackerMuon", |m| m.is_tracker)
        .number("numberOfMatchedStations", |m| f64::from(m.matched_stations))
        .number("muonBestTrackType", |m| f64::from(m.best_track_type.code()))
        .number("dB", |m| m.db_3d)
        .number("edB", |m| m.edb_3d)
});

// Composites, jets and type-erased particles only have the shared surface.
pub(crate) static COMPOSITE_ACCESSORS: Lazy<AccessorTable<CompositeCandidate>> =
    Lazy::new(|| AccessorTable::<CompositeCandidate>::new(ObjectKind::Composite));

pub(crate) static JET_ACCESSORS: Lazy<AccessorTable<Jet>> =
    Lazy::new(|| AccessorTable::<Jet>::new(ObjectKind::Other));

pub(crate) static PARTICLE_ACCESSORS: Lazy<AccessorTable<Particle>> =
    Lazy::new(|| AccessorTable::<Particle>::new(ObjectKind::Other));

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{LorentzVector, PhysicsObject};

    #[test]
    fn test_specific_surfaces_do_not_leak() {
        assert!(Electron::accessors().get("sigmaIetaIeta").is_some());
        assert!(Muon::accessors().get("sigmaIetaIeta").is_none());
        assert!(CompositeCandidate::accessors().get("isPFMuon").is_none());
        assert_eq!(Muon::accessors().kind(), ObjectKind::Muon);
    }

    #[test]
    fn test_daughter_accessor_reaches_children() {
        let z = CompositeCandidate::new(
            23,
            vec![
                Particle::Jet(Jet::new(LorentzVector::from_pt_eta_phi_m(30.0, 0.1, 0.2, 0.0))),
                Particle::Jet(Jet::new(LorentzVector::from_pt_eta_phi_m(20.0, 0.3, 0.4, 0.0))),
            ],
        );
        let candidate: &(dyn Candidate + 'static) = &z;
        let Some(Accessor::Daughter(daughter)) = CANDIDATE_ACCESSORS.get("daughter") else {
            panic!("expected a daughter accessor");
        };
        let second = daughter(candidate, 1).map(|d| d.pt());
        assert!(second.is_some_and(|pt| (pt - 20.0).abs() < 1e-9));
        assert!(daughter(candidate, 2).is_none());
    }

    #[test]
    fn test_generic_surface_names() {
        let names = CANDIDATE_ACCESSORS.names();
        for expected in ["daughter", "pt", "userFloat", "hasUserInt"] {
            assert!(names.contains(&expected), "missing {expected}");
        }
        assert_eq!(
            CANDIDATE_ACCESSORS.get("daughter").map(|a| a.value_type()),
            Some(ValueType::Object(ObjectKind::Other))
        );
    }
}
