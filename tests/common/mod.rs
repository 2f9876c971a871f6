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

//! Shared fixtures for integration tests

#![allow(dead_code)]

use ntuplizer::model::{
    CompositeCandidate, Electron, EventContext, EventId, GenJet, Jet, LorentzVector, Met, Muon,
    Particle, PileupSummary, Point, Track, Vertex,
};

pub fn muon(pt: f64, eta: f64, phi: f64, charge: i32) -> Muon {
    Muon {
        p4: LorentzVector::from_pt_eta_phi_m(pt, eta, phi, 0.105),
        charge,
        is_pf: true,
        is_global: true,
        matched_stations: 2,
        best_track: Some(Track {
            vx: 0.001,
            vy: -0.002,
            vz: 0.01,
            px: pt * phi.cos(),
            py: pt * phi.sin(),
            pz: pt * eta.sinh(),
            missing_inner_hits: 0,
        }),
        db_3d: 0.003,
        edb_3d: 0.001,
        ..Muon::default()
    }
}

/// Barrel electron passing every loose WW cut with room to spare
pub fn barrel_electron(pt: f64) -> Electron {
    Electron {
        p4: LorentzVector::from_pt_eta_phi_m(pt, 0.8, 1.0, 0.0),
        charge: -1,
        is_eb: true,
        sigma_ieta_ieta: 0.008,
        hcal_over_ecal: 0.01,
        delta_eta_sc_trk_at_vtx: 0.003,
        delta_phi_sc_trk_at_vtx: -0.01,
        e_sc_over_p: 1.05,
        ecal_energy: 100.0,
        ecal_pf_cluster_iso: 0.1 * pt,
        hcal_pf_cluster_iso: 0.05 * pt,
        dr03_tk_sum_pt: 0.02 * pt,
        pass_conversion_veto: true,
        db_3d: 0.002,
        edb_3d: 0.004,
        gsf_track: Track {
            vz: 0.02,
            px: pt,
            ..Track::default()
        },
        ..Electron::default()
    }
}

pub fn z_to_mumu() -> CompositeCandidate {
    CompositeCandidate::new(
        23,
        vec![
            Particle::from(muon(45.0, 0.4, 0.1, -1)),
            Particle::from(muon(38.0, -0.9, 2.9, 1)),
        ],
    )
}

pub fn jet(pt: f64, eta: f64, phi: f64, mass: f64) -> Jet {
    Jet::new(LorentzVector::from_pt_eta_phi_m(pt, eta, phi, mass))
}

/// A simulated event with `n_jets` jets of decreasing pt
pub fn event_with_jets(n_jets: usize) -> EventContext {
    let jets = (0..n_jets)
        .map(|i| jet(120.0 / (i + 1) as f64, 1.5 - i as f64, 0.7 * i as f64, 10.0))
        .collect();
    EventContext {
        id: EventId {
            run: 273_158,
            lumi: 42,
            event: 1_234_567_890_123,
        },
        vertices: vec![
            Vertex::new(Point::new(0.01, 0.02, 1.3), 85.0),
            Vertex::new(Point::new(0.0, 0.0, -4.0), 12.0),
        ],
        met: Met {
            p4: LorentzVector::from_pt_eta_phi_m(35.0, 0.0, -2.0, 0.0),
        },
        jets,
        gen_jets: vec![GenJet {
            p4: LorentzVector::from_pt_eta_phi_m(110.0, 1.4, 0.1, 9.0),
        }],
        pileup: Some(vec![PileupSummary {
            bunch_crossing: 0,
            true_num_interactions: 23.0,
        }]),
        gen_info: None,
    }
}
