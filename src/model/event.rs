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

//! Per-event ambient state passed to every named function

use super::lorentz::LorentzVector;
use super::objects::{GenJet, Jet};
use serde::{Deserialize, Serialize};

/// Run, luminosity block and event number
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EventId {
    pub run: u32,
    pub lumi: u32,
    pub event: u64,
}

/// A point in detector coordinates (cm)
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Distance from the beam line
    pub fn rho(&self) -> f64 {
        self.x.hypot(self.y)
    }
}

/// Reconstructed vertex
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Vertex {
    pub position: Point,
    #[serde(default)]
    pub ndof: f64,
    #[serde(default = "default_true")]
    pub is_valid: bool,
    #[serde(default)]
    pub is_fake: bool,
}

fn default_true() -> bool {
    true
}

impl Vertex {
    /// A valid, non-fake vertex at `position`
    pub fn new(position: Point, ndof: f64) -> Self {
        Self {
            position,
            ndof,
            is_valid: true,
            is_fake: false,
        }
    }
}

/// Missing transverse energy
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Met {
    pub p4: LorentzVector,
}

/// Pileup truth for one bunch crossing
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PileupSummary {
    /// Bunch crossing relative to the triggered one
    pub bunch_crossing: i32,
    /// Mean number of true interactions
    pub true_num_interactions: f32,
}

/// Generator event information
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GenEventInfo {
    pub weight: f64,
}

/// Everything a named function may read besides the object itself.
///
/// Supplied fresh for every event and never retained past it. Jets are
/// ordered by decreasing transverse momentum; `vertices[0]` is the primary
/// vertex when present. Pileup and generator information only exist for
/// simulated events.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EventContext {
    pub id: EventId,
    pub vertices: Vec<Vertex>,
    pub met: Met,
    pub jets: Vec<Jet>,
    pub gen_jets: Vec<GenJet>,
    pub pileup: Option<Vec<PileupSummary>>,
    pub gen_info: Option<GenEventInfo>,
}

impl EventContext {
    /// The primary vertex, if any vertex was reconstructed
    pub fn pv(&self) -> Option<&Vertex> {
        self.vertices.first()
    }

    /// Number of reconstructed vertices
    pub fn n_vertices(&self) -> usize {
        self.vertices.len()
    }

    /// True interactions of the in-time bunch crossing
    pub fn true_interactions(&self) -> Option<f32> {
        self.pileup
            .as_ref()?
            .iter()
            .find(|summary| summary.bunch_crossing == 0)
            .map(|summary| summary.true_num_interactions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_in_time_pileup() {
        let mut event = EventContext::default();
        assert_eq!(event.true_interactions(), None);

        event.pileup = Some(vec![
            PileupSummary {
                bunch_crossing: -1,
                true_num_interactions: 20.0,
            },
            PileupSummary {
                bunch_crossing: 0,
                true_num_interactions: 23.5,
            },
        ]);
        assert_eq!(event.true_interactions(), Some(23.5));
    }

    #[test]
    fn test_vertex_defaults_from_json() {
        let vertex: Vertex = serde_json::from_str(r#"{"position":{"x":0,"y":0,"z":1.5}}"#).unwrap();
        assert!(vertex.is_valid);
        assert!(!vertex.is_fake);
        assert_eq!(vertex.position.z, 1.5);
    }
}
