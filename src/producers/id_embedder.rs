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

//! Loose WW electron identification
//!
//! Applies a fixed battery of shape, isolation and impact-parameter cuts with
//! separate thresholds for barrel and endcap electrons, then derives "with
//! impact parameter" variants of the POG identification flags already
//! attached to each electron.

use crate::error::{NtupleError, Result};
use crate::model::{Candidate, Electron, Point, Vertex};
use log::{debug, warn};
use serde::{Deserialize, Serialize};

/// Embedder configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WwIdConfig {
    /// User floats holding POG identification decisions
    pub pog_id_names: Vec<String>,
    /// User int receiving the loose WW decision
    pub label: String,
    /// Suffix of the derived "with impact parameter" user floats
    pub suffix: String,
}

impl Default for WwIdConfig {
    fn default() -> Self {
        Self {
            pog_id_names: ["IsCBVIDTight", "IsCBVIDMedium", "IsCBVIDLoose", "IsCBVIDVeto", "IsCBVIDHLTSafe"]
                .into_iter()
                .map(String::from)
                .collect(),
            label: "IsWWLoose".to_string(),
            suffix: "wIP".to_string(),
        }
    }
}

/// Thresholds for one detector region.
///
/// Every cut is a strict `<` except `max_missing_hits`, which is `<=`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RegionCuts {
    pub d_eta_in: f64,
    pub d_phi_in: f64,
    pub sigma_ieta_ieta: f64,
    pub h_over_e: f64,
    pub one_over_e_minus_one_over_p: f64,
    pub rel_ecal_iso: f64,
    pub rel_hcal_iso: f64,
    pub rel_track_iso: f64,
    pub max_missing_hits: u32,
    pub dxy: f64,
    pub dz: f64,
    /// Transverse impact parameter cut of the derived POG flags
    pub ip_dxy: f64,
    /// Longitudinal impact parameter cut of the derived POG flags
    pub ip_dz: f64,
}

impl RegionCuts {
    /// Barrel thresholds
    pub const BARREL: RegionCuts = RegionCuts {
        d_eta_in: 0.01,
        d_phi_in: 0.04,
        sigma_ieta_ieta: 0.011,
        h_over_e: 0.08,
        one_over_e_minus_one_over_p: 0.01,
        rel_ecal_iso: 0.45,
        rel_hcal_iso: 0.25,
        rel_track_iso: 0.2,
        max_missing_hits: 2,
        dxy: 0.1,
        dz: 0.373,
        ip_dxy: 0.05,
        ip_dz: 0.1,
    };

    /// Endcap thresholds
    pub const ENDCAP: RegionCuts = RegionCuts {
        d_eta_in: 0.01,
        d_phi_in: 0.08,
        sigma_ieta_ieta: 0.031,
        h_over_e: 0.08,
        one_over_e_minus_one_over_p: 0.01,
        rel_ecal_iso: 0.45,
        rel_hcal_iso: 0.25,
        rel_track_iso: 0.2,
        max_missing_hits: 1,
        dxy: 0.2,
        dz: 0.602,
        ip_dxy: 0.1,
        ip_dz: 0.2,
    };

    /// Whether `vars` pass the loose selection
    ///
    /// Isolation is cut relative to pt; a zero-pt object fails.
    pub fn passes(&self, vars: &IdVariables) -> bool {
        vars.d_eta_in < self.d_eta_in
            && vars.d_phi_in < self.d_phi_in
            && vars.sigma_ieta_ieta < self.sigma_ieta_ieta
            && vars.h_over_e < self.h_over_e
            && vars.one_over_e_minus_one_over_p < self.one_over_e_minus_one_over_p
            && vars.ecal_iso / vars.pt < self.rel_ecal_iso
            && vars.hcal_iso / vars.pt < self.rel_hcal_iso
            && vars.track_iso / vars.pt < self.rel_track_iso
            && vars.missing_hits <= self.max_missing_hits
            && vars.dxy < self.dxy
            && vars.dz < self.dz
            && vars.pass_conversion_veto
    }

    /// Whether `vars` pass the impact-parameter requirement of the derived flags
    pub fn passes_impact_parameter(&self, vars: &IdVariables) -> bool {
        vars.dxy < self.ip_dxy && vars.dz < self.ip_dz
    }
}

/// Identification variables of one electron relative to the primary vertex
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IdVariables {
    pub pt: f64,
    pub d_eta_in: f64,
    pub d_phi_in: f64,
    pub sigma_ieta_ieta: f64,
    pub h_over_e: f64,
    pub one_over_e_minus_one_over_p: f64,
    pub ecal_iso: f64,
    pub hcal_iso: f64,
    pub track_iso: f64,
    pub missing_hits: u32,
    /// |dxy| to the primary vertex
    pub dxy: f64,
    /// |dz| to the primary vertex
    pub dz: f64,
    pub pass_conversion_veto: bool,
}

impl IdVariables {
    /// Compute the variables of `electron` with respect to `pv`
    pub fn compute(electron: &Electron, pv: &Point) -> Self {
        Self {
            pt: electron.pt(),
            d_eta_in: electron.delta_eta_sc_trk_at_vtx.abs(),
            d_phi_in: electron.delta_phi_sc_trk_at_vtx.abs(),
            sigma_ieta_ieta: electron.sigma_ieta_ieta,
            h_over_e: electron.hcal_over_ecal,
            one_over_e_minus_one_over_p: electron.one_over_e_minus_one_over_p(),
            ecal_iso: electron.ecal_pf_cluster_iso,
            hcal_iso: electron.hcal_pf_cluster_iso,
            track_iso: electron.dr03_tk_sum_pt,
            missing_hits: electron.gsf_track.missing_inner_hits,
            dxy: electron.gsf_track.dxy(pv).abs(),
            dz: electron.gsf_track.dz(pv).abs(),
            pass_conversion_veto: electron.pass_conversion_veto,
        }
    }
}

/// Embeds the loose WW identification into electrons
#[derive(Debug, Clone)]
pub struct ElectronWwIdEmbedder {
    config: WwIdConfig,
}

impl ElectronWwIdEmbedder {
    /// Create an embedder
    pub fn new(config: WwIdConfig) -> Self {
        if config.pog_id_names.is_empty() {
            warn!("WW ID embedder configured without POG ID names, no '{}' flags will be written", config.suffix);
        }
        debug!(
            "WW ID embedder writes '{}' and {} derived flags",
            config.label,
            config.pog_id_names.len()
        );
        Self { config }
    }

    /// The active configuration
    pub fn config(&self) -> &WwIdConfig {
        &self.config
    }

    /// Loose decision for one electron; neither barrel nor endcap fails
    pub fn passes_loose(electron: &Electron, pv: &Point) -> bool {
        let vars = IdVariables::compute(electron, pv);
        match region(electron) {
            Some(cuts) => cuts.passes(&vars),
            None => false,
        }
    }

    /// Copy `electrons` with the decisions attached as user data.
    ///
    /// The first vertex is the primary vertex; an empty vertex collection is
    /// an error.
    pub fn produce(&self, electrons: &[Electron], vertices: &[Vertex]) -> Result<Vec<Electron>> {
        let pv = vertices.first().ok_or(NtupleError::MissingPrimaryVertex)?;
        Ok(electrons
            .iter()
            .map(|electron| self.embed(electron.clone(), &pv.position))
            .collect())
    }

    fn embed(&self, mut electron: Electron, pv: &Point) -> Electron {
        let vars = IdVariables::compute(&electron, pv);
        let pass_loose = region(&electron).is_some_and(|cuts| cuts.passes(&vars));
        electron.user.add_user_int(self.config.label.as_str(), i32::from(pass_loose));

        let ip_cuts = if electron.is_eb { RegionCuts::BARREL } else { RegionCuts::ENDCAP };
        let pass_ip = ip_cuts.passes_impact_parameter(&vars);
        for id in &self.config.pog_id_names {
            let Some(decision) = electron.user.user_float(id) else {
                continue;
            };
            let pass_all = decision != 0.0 && pass_ip;
            electron
                .user
                .add_user_float(format!("{id}{}", self.config.suffix), if pass_all { 1.0 } else { 0.0 });
        }
        electron
    }
}

fn region(electron: &Electron) -> Option<RegionCuts> {
    if electron.is_eb {
        Some(RegionCuts::BARREL)
    } else if electron.is_ee {
        Some(RegionCuts::ENDCAP)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{LorentzVector, Track};
    use pretty_assertions::assert_eq;

    fn good_barrel_electron() -> Electron {
        let mut electron = Electron {
            p4: LorentzVector::from_pt_eta_phi_m(40.0, 0.5, 0.0, 0.0),
            charge: -1,
            is_eb: true,
            sigma_ieta_ieta: 0.009,
            hcal_over_ecal: 0.02,
            delta_eta_sc_trk_at_vtx: -0.002,
            delta_phi_sc_trk_at_vtx: 0.01,
            e_sc_over_p: 1.0,
            ecal_energy: 40.0,
            ecal_pf_cluster_iso: 2.0,
            hcal_pf_cluster_iso: 1.0,
            dr03_tk_sum_pt: 0.5,
            pass_conversion_veto: true,
            gsf_track: Track {
                vz: 0.03,
                px: 40.0,
                ..Track::default()
            },
            ..Electron::default()
        };
        electron.user.add_user_float("IsCBVIDTight", 1.0);
        electron.user.add_user_float("IsCBVIDLoose", 0.0);
        electron
    }

    fn pv() -> Vec<Vertex> {
        vec![Vertex::new(Point::new(0.0, 0.0, 0.0), 20.0)]
    }

    #[test]
    fn test_good_barrel_electron_passes() {
        let embedder = ElectronWwIdEmbedder::new(WwIdConfig::default());
        let out = embedder.produce(&[good_barrel_electron()], &pv()).unwrap();

        let user = &out[0].user;
        assert_eq!(user.user_int("IsWWLoose"), Some(1));
        assert_eq!(user.user_float("IsCBVIDTightwIP"), Some(1.0));
        assert_eq!(user.user_float("IsCBVIDLoosewIP"), Some(0.0));
        assert!(!user.has_user_float("IsCBVIDMediumwIP"));
    }

    #[test]
    fn test_thresholds_are_exclusive() {
        let mut electron = good_barrel_electron();
        electron.delta_eta_sc_trk_at_vtx = 0.01;
        electron.delta_phi_sc_trk_at_vtx = 0.04;
        electron.sigma_ieta_ieta = 0.011;
        electron.hcal_over_ecal = 0.08;
        electron.ecal_pf_cluster_iso = 0.45 * 40.0;
        electron.hcal_pf_cluster_iso = 0.25 * 40.0;
        electron.dr03_tk_sum_pt = 0.2 * 40.0;

        let embedder = ElectronWwIdEmbedder::new(WwIdConfig::default());
        let out = embedder.produce(&[electron], &pv()).unwrap();
        assert_eq!(out[0].user.user_int("IsWWLoose"), Some(0));
    }

    #[test]
    fn test_relative_isolation_needs_positive_pt() {
        let pv = Point::new(0.0, 0.0, 0.0);
        let mut vars = IdVariables::compute(&good_barrel_electron(), &pv);
        assert!(RegionCuts::BARREL.passes(&vars));

        vars.ecal_iso = 0.449 * vars.pt;
        assert!(RegionCuts::BARREL.passes(&vars));

        vars.pt = 0.0;
        vars.ecal_iso = 0.0;
        vars.hcal_iso = 0.0;
        vars.track_iso = 0.0;
        assert!(!RegionCuts::BARREL.passes(&vars));
    }

    #[test]
    fn test_missing_hits_cut_is_inclusive() {
        let pv = Point::new(0.0, 0.0, 0.0);
        let mut electron = good_barrel_electron();
        electron.gsf_track.missing_inner_hits = 2;
        assert!(ElectronWwIdEmbedder::passes_loose(&electron, &pv));
        electron.gsf_track.missing_inner_hits = 3;
        assert!(!ElectronWwIdEmbedder::passes_loose(&electron, &pv));
    }

    #[test]
    fn test_endcap_thresholds_and_no_region() {
        let pv = Point::new(0.0, 0.0, 0.0);
        let mut electron = good_barrel_electron();
        electron.is_eb = false;
        electron.is_ee = true;
        electron.sigma_ieta_ieta = 0.025;
        electron.delta_phi_sc_trk_at_vtx = 0.06;
        assert!(ElectronWwIdEmbedder::passes_loose(&electron, &pv));

        electron.is_ee = false;
        assert!(!ElectronWwIdEmbedder::passes_loose(&electron, &pv));
    }

    #[test]
    fn test_impact_parameter_flags_use_region_cuts() {
        let mut electron = good_barrel_electron();
        // dz of 0.15 passes the endcap cut but not the barrel one
        electron.gsf_track.vz = 0.15;
        let embedder = ElectronWwIdEmbedder::new(WwIdConfig::default());
        let barrel = embedder.produce(&[electron.clone()], &pv()).unwrap();
        assert_eq!(barrel[0].user.user_float("IsCBVIDTightwIP"), Some(0.0));

        electron.is_eb = false;
        electron.is_ee = true;
        let endcap = embedder.produce(&[electron], &pv()).unwrap();
        assert_eq!(endcap[0].user.user_float("IsCBVIDTightwIP"), Some(1.0));
    }

    #[test]
    fn test_missing_vertex_is_an_error() {
        let embedder = ElectronWwIdEmbedder::new(WwIdConfig::default());
        assert_eq!(
            embedder.produce(&[good_barrel_electron()], &[]).unwrap_err(),
            NtupleError::MissingPrimaryVertex
        );
    }
}
