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

//! Four-vectors and angular helpers

use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Sub};

/// Pseudorapidity reported for a vector with no transverse momentum
const ETA_AT_ZERO_PT: f64 = 1.0e10;

/// Cartesian Lorentz vector (px, py, pz, E) in GeV
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct LorentzVector {
    /// x component of momentum
    pub px: f64,
    /// y component of momentum
    pub py: f64,
    /// z component of momentum
    pub pz: f64,
    /// Energy
    pub e: f64,
}

impl LorentzVector {
    /// Create from cartesian components
    pub const fn new(px: f64, py: f64, pz: f64, e: f64) -> Self {
        Self { px, py, pz, e }
    }

    /// Create from transverse momentum, pseudorapidity, azimuth and mass
    pub fn from_pt_eta_phi_m(pt: f64, eta: f64, phi: f64, mass: f64) -> Self {
        let px = pt * phi.cos();
        let py = pt * phi.sin();
        let pz = pt * eta.sinh();
        let e = (px * px + py * py + pz * pz + mass * mass).sqrt();
        Self { px, py, pz, e }
    }

    /// Transverse momentum
    pub fn pt(&self) -> f64 {
        self.px.hypot(self.py)
    }

    /// Total momentum
    pub fn p(&self) -> f64 {
        (self.px * self.px + self.py * self.py + self.pz * self.pz).sqrt()
    }

    /// Energy
    pub fn energy(&self) -> f64 {
        self.e
    }

    /// Azimuthal angle in (-pi, pi]
    pub fn phi(&self) -> f64 {
        if self.px == 0.0 && self.py == 0.0 {
            0.0
        } else {
            self.py.atan2(self.px)
        }
    }

    /// Pseudorapidity
    pub fn eta(&self) -> f64 {
        let pt = self.pt();
        if pt == 0.0 {
            if self.pz == 0.0 {
                0.0
            } else {
                ETA_AT_ZERO_PT.copysign(self.pz)
            }
        } else {
            (self.pz / pt).asinh()
        }
    }

    /// Polar angle
    pub fn theta(&self) -> f64 {
        if self.pt() == 0.0 && self.pz == 0.0 {
            0.0
        } else {
            self.pt().atan2(self.pz)
        }
    }

    /// Invariant mass; negative mass squared gives a negative mass
    pub fn mass(&self) -> f64 {
        let m2 = self.mass2();
        if m2 < 0.0 { -(-m2).sqrt() } else { m2.sqrt() }
    }

    /// Invariant mass squared
    pub fn mass2(&self) -> f64 {
        self.e * self.e - self.p() * self.p()
    }

    /// Transverse energy, E sin(theta)
    pub fn et(&self) -> f64 {
        let p = self.p();
        if p == 0.0 { 0.0 } else { self.e * self.pt() / p }
    }

    /// Rapidity
    pub fn rapidity(&self) -> f64 {
        let denominator = self.e - self.pz;
        if denominator <= 0.0 || self.e + self.pz <= 0.0 {
            return 0.0;
        }
        0.5 * ((self.e + self.pz) / denominator).ln()
    }

    /// Same direction and mass, transverse momentum multiplied by `factor`
    pub fn with_scaled_pt(&self, factor: f64) -> Self {
        Self::from_pt_eta_phi_m(self.pt() * factor, self.eta(), self.phi(), self.mass())
    }
}

impl Add for LorentzVector {
    type Output = LorentzVector;

    fn add(self, rhs: LorentzVector) -> LorentzVector {
        LorentzVector::new(
            self.px + rhs.px,
            self.py + rhs.py,
            self.pz + rhs.pz,
            self.e + rhs.e,
        )
    }
}

impl AddAssign for LorentzVector {
    fn add_assign(&mut self, rhs: LorentzVector) {
        *self = *self + rhs;
    }
}

impl Sub for LorentzVector {
    type Output = LorentzVector;

    fn sub(self, rhs: LorentzVector) -> LorentzVector {
        LorentzVector::new(
            self.px - rhs.px,
            self.py - rhs.py,
            self.pz - rhs.pz,
            self.e - rhs.e,
        )
    }
}

impl Sum for LorentzVector {
    fn sum<I: Iterator<Item = LorentzVector>>(iter: I) -> Self {
        iter.fold(LorentzVector::default(), Add::add)
    }
}

/// Azimuthal difference folded into (-pi, pi], NaN for non-finite input
pub fn delta_phi(phi1: f64, phi2: f64) -> f64 {
    let dphi = phi1 - phi2;
    if !dphi.is_finite() {
        return f64::NAN;
    }
    let folded = dphi.rem_euclid(2.0 * PI);
    if folded > PI { folded - 2.0 * PI } else { folded }
}

/// Angular distance in (eta, phi)
pub fn delta_r(eta1: f64, phi1: f64, eta2: f64, phi2: f64) -> f64 {
    let deta = eta1 - eta2;
    deta.hypot(delta_phi(phi1, phi2))
}

/// Angular distance between two four-vectors
pub fn delta_r_p4(a: &LorentzVector, b: &LorentzVector) -> f64 {
    delta_r(a.eta(), a.phi(), b.eta(), b.phi())
}
