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

//! Jet energy scale systematic shifts
//!
//! Every jet is copied into an "up" and a "down" collection with its
//! transverse momentum scaled by `1 ± u`, where `u` is the uncertainty at the
//! jet's own pseudorapidity and transverse momentum. Direction and mass are
//! unchanged.

use crate::error::{NtupleError, Result};
use crate::model::{Candidate, Jet};
use indexmap::IndexMap;
use log::debug;
use serde::{Deserialize, Serialize};

/// Jet type whose uncertainties are used when none is configured
pub const DEFAULT_JET_TYPE: &str = "AK4PFchs";

/// Source of relative jet energy scale uncertainties
pub trait JetUncertaintySource {
    /// Relative uncertainty for a jet at (`eta`, `pt`)
    fn uncertainty(&self, eta: f64, pt: f64) -> f64;
}

/// The same relative uncertainty for every jet
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConstantUncertainty(pub f64);

impl JetUncertaintySource for ConstantUncertainty {
    fn uncertainty(&self, _eta: f64, _pt: f64) -> f64 {
        self.0
    }
}

/// One (pt, uncertainty) knot of a bin
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct UncertaintyPoint {
    pub pt: f64,
    pub uncertainty: f64,
}

/// Uncertainties for jets with `eta_min <= eta < eta_max`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UncertaintyBin {
    pub eta_min: f64,
    pub eta_max: f64,
    /// Knots in increasing pt
    pub points: Vec<UncertaintyPoint>,
}

impl UncertaintyBin {
    /// Linear interpolation in pt, constant beyond the first and last knots
    fn interpolate(&self, pt: f64) -> f64 {
        let points = &self.points;
        let upper = points.partition_point(|point| point.pt <= pt);
        match upper {
            0 => points[0].uncertainty,
            n if n == points.len() => points[n - 1].uncertainty,
            n => {
                let (low, high) = (points[n - 1], points[n]);
                let fraction = (pt - low.pt) / (high.pt - low.pt);
                low.uncertainty + fraction * (high.uncertainty - low.uncertainty)
            }
        }
    }
}

/// Uncertainty table binned in eta and interpolated in pt.
///
/// Jets outside the eta range use the nearest bin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<UncertaintyBin>", into = "Vec<UncertaintyBin>")]
pub struct JetCorrectionUncertainty {
    bins: Vec<UncertaintyBin>,
}

impl JetCorrectionUncertainty {
    /// Build a table; bins must be non-empty and ordered, knots increasing in pt
    pub fn new(mut bins: Vec<UncertaintyBin>) -> Result<Self> {
        if bins.is_empty() {
            return Err(NtupleError::InvalidUncertaintyTable("no eta bins".to_string()));
        }
        bins.sort_by(|a, b| a.eta_min.total_cmp(&b.eta_min));
        for bin in &bins {
            if !(bin.eta_min < bin.eta_max) {
                return Err(NtupleError::InvalidUncertaintyTable(format!(
                    "eta bin [{}, {}) is empty",
                    bin.eta_min, bin.eta_max
                )));
            }
            if bin.points.is_empty() {
                return Err(NtupleError::InvalidUncertaintyTable(format!(
                    "eta bin [{}, {}) has no points",
                    bin.eta_min, bin.eta_max
                )));
            }
            if bin.points.windows(2).any(|pair| !(pair[0].pt < pair[1].pt)) {
                return Err(NtupleError::InvalidUncertaintyTable(format!(
                    "pt points of eta bin [{}, {}) are not increasing",
                    bin.eta_min, bin.eta_max
                )));
            }
        }
        if let Some(pair) = bins.windows(2).find(|pair| pair[0].eta_max > pair[1].eta_min) {
            return Err(NtupleError::InvalidUncertaintyTable(format!(
                "eta bins starting at {} and {} overlap",
                pair[0].eta_min, pair[1].eta_min
            )));
        }
        Ok(Self { bins })
    }

    /// The eta bins, ordered
    pub fn bins(&self) -> &[UncertaintyBin] {
        &self.bins
    }

    fn bin_for(&self, eta: f64) -> &UncertaintyBin {
        let index = self
            .bins
            .partition_point(|bin| bin.eta_max <= eta)
            .min(self.bins.len() - 1);
        &self.bins[index]
    }
}

impl JetUncertaintySource for JetCorrectionUncertainty {
    fn uncertainty(&self, eta: f64, pt: f64) -> f64 {
        self.bin_for(eta).interpolate(pt)
    }
}

impl TryFrom<Vec<UncertaintyBin>> for JetCorrectionUncertainty {
    type Error = NtupleError;

    fn try_from(bins: Vec<UncertaintyBin>) -> Result<Self> {
        Self::new(bins)
    }
}

impl From<JetCorrectionUncertainty> for Vec<UncertaintyBin> {
    fn from(table: JetCorrectionUncertainty) -> Self {
        table.bins
    }
}

/// Uncertainty tables keyed by jet type
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JetCorrectionsRecord {
    tables: IndexMap<String, JetCorrectionUncertainty>,
}

impl JetCorrectionsRecord {
    /// Create an empty record
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace the table of `jet_type`
    pub fn insert(&mut self, jet_type: impl Into<String>, table: JetCorrectionUncertainty) {
        self.tables.insert(jet_type.into(), table);
    }

    /// Table for `jet_type`
    pub fn get(&self, jet_type: &str) -> Result<&JetCorrectionUncertainty> {
        self.tables
            .get(jet_type)
            .ok_or_else(|| NtupleError::UnknownJetType(jet_type.to_string()))
    }
}

/// Shifted copies of a jet collection
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ShiftedJets {
    pub up: Vec<Jet>,
    pub down: Vec<Jet>,
}

/// Produces jet energy scale up/down collections
#[derive(Debug, Clone)]
pub struct JetEnergyScaleShifter<S> {
    source: S,
}

impl<S: JetUncertaintySource> JetEnergyScaleShifter<S> {
    /// Shift with uncertainties from `source`
    pub fn new(source: S) -> Self {
        Self { source }
    }

    /// Shift every jet up and down by its uncertainty
    pub fn produce(&self, jets: &[Jet]) -> ShiftedJets {
        let mut shifted = ShiftedJets {
            up: Vec::with_capacity(jets.len()),
            down: Vec::with_capacity(jets.len()),
        };
        for jet in jets {
            let uncertainty = self.source.uncertainty(jet.eta(), jet.pt());
            let mut up = jet.clone();
            up.p4 = jet.p4.with_scaled_pt(1.0 + uncertainty);
            let mut down = jet.clone();
            down.p4 = jet.p4.with_scaled_pt(1.0 - uncertainty);
            shifted.up.push(up);
            shifted.down.push(down);
        }
        shifted
    }
}

impl JetEnergyScaleShifter<JetCorrectionUncertainty> {
    /// Shift with the table of `jet_type` from `record`
    pub fn from_record(record: &JetCorrectionsRecord, jet_type: &str) -> Result<Self> {
        let table = record.get(jet_type)?.clone();
        debug!("JES shifter uses {} eta bins for '{jet_type}'", table.bins().len());
        Ok(Self::new(table))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::LorentzVector;
    use rstest::rstest;

    fn table() -> JetCorrectionUncertainty {
        let points = vec![
            UncertaintyPoint { pt: 20.0, uncertainty: 0.05 },
            UncertaintyPoint { pt: 100.0, uncertainty: 0.01 },
        ];
        JetCorrectionUncertainty::new(vec![
            UncertaintyBin { eta_min: 0.0, eta_max: 2.5, points: points.clone() },
            UncertaintyBin {
                eta_min: -2.5,
                eta_max: 0.0,
                points: vec![UncertaintyPoint { pt: 10.0, uncertainty: 0.1 }],
            },
        ])
        .unwrap()
    }

    #[test]
    fn test_constant_shift_keeps_direction_and_mass() {
        let jet = Jet::new(LorentzVector::from_pt_eta_phi_m(50.0, 1.0, 0.3, 8.0));
        let shifted = JetEnergyScaleShifter::new(ConstantUncertainty(0.03)).produce(&[jet.clone()]);

        let (up, down) = (&shifted.up[0], &shifted.down[0]);
        assert!((up.pt() - 51.5).abs() < 1e-9);
        assert!((down.pt() - 48.5).abs() < 1e-9);
        for shifted in [up, down] {
            assert!((shifted.eta() - jet.eta()).abs() < 1e-9);
            assert!((shifted.phi() - jet.phi()).abs() < 1e-9);
            assert!((shifted.mass() - jet.mass()).abs() < 1e-6);
        }
    }

    #[rstest]
    #[case(1.0, 20.0, 0.05)]
    #[case(1.0, 60.0, 0.03)]
    #[case(1.0, 5.0, 0.05)]
    #[case(1.0, 500.0, 0.01)]
    #[case(-1.0, 60.0, 0.1)]
    #[case(4.0, 60.0, 0.03)]
    #[case(-4.0, 60.0, 0.1)]
    fn test_binned_lookup(#[case] eta: f64, #[case] pt: f64, #[case] expected: f64) {
        assert!((table().uncertainty(eta, pt) - expected).abs() < 1e-12);
    }

    #[test]
    fn test_invalid_tables() {
        assert!(JetCorrectionUncertainty::new(vec![]).is_err());
        let unordered = UncertaintyBin {
            eta_min: 0.0,
            eta_max: 1.0,
            points: vec![
                UncertaintyPoint { pt: 50.0, uncertainty: 0.02 },
                UncertaintyPoint { pt: 20.0, uncertainty: 0.03 },
            ],
        };
        assert!(matches!(
            JetCorrectionUncertainty::new(vec![unordered]),
            Err(NtupleError::InvalidUncertaintyTable(_))
        ));
    }

    #[test]
    fn test_record_lookup_by_jet_type() {
        let mut record = JetCorrectionsRecord::new();
        record.insert(DEFAULT_JET_TYPE, table());
        assert!(JetEnergyScaleShifter::from_record(&record, DEFAULT_JET_TYPE).is_ok());
        assert_eq!(
            JetEnergyScaleShifter::from_record(&record, "AK8PFPuppi").unwrap_err(),
            NtupleError::UnknownJetType("AK8PFPuppi".to_string())
        );
    }

    #[test]
    fn test_record_from_json() {
        let record: JetCorrectionsRecord = serde_json::from_str(
            r#"{"AK4PFchs": [{"eta_min": -5.0, "eta_max": 5.0, "points": [{"pt": 10.0, "uncertainty": 0.02}]}]}"#,
        )
        .unwrap();
        assert_eq!(record.get("AK4PFchs").unwrap().uncertainty(0.0, 30.0), 0.02);

        let invalid: std::result::Result<JetCorrectionsRecord, _> =
            serde_json::from_str(r#"{"AK4PFchs": []}"#);
        assert!(invalid.is_err());
    }
}
