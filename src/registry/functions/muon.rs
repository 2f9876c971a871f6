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

//! Muon-specific functions
//!
//! Impact parameters use the muon's best track; muons without one get the
//! position sentinel.

use super::{MISSING_POSITION, ObjectFunctions, impact_parameter_significance};
use crate::error::Result;
use crate::model::{EventContext, Muon, Point, Track};
use crate::registry::table::NativeTable;

fn best_track_ip(muon: &Muon, event: &EventContext, f: fn(&Track, &Point) -> f64) -> f32 {
    match (muon.best_track.as_ref(), event.pv()) {
        (Some(track), Some(pv)) => f(track, &pv.position) as f32,
        _ => MISSING_POSITION,
    }
}

impl ObjectFunctions for Muon {
    fn float_functions(table: &mut NativeTable<f32, Self>) -> Result<()> {
        table
            .object("SIP3D", |m, _| impact_parameter_significance(m.db_3d, m.edb_3d))?
            .object("PVDZ", |m, event| best_track_ip(m, event, Track::dz))?
            .object("PVDXY", |m, event| best_track_ip(m, event, Track::dxy))?;
        Ok(())
    }

    fn bool_functions(table: &mut NativeTable<bool, Self>) -> Result<()> {
        table
            .object("IsPFMuon", |m, _| m.is_pf)?
            .object("IsGlobal", |m, _| m.is_global)?
            .object("IsTracker", |m, _| m.is_tracker)?;
        Ok(())
    }

    fn uint_functions(table: &mut NativeTable<u32, Self>) -> Result<()> {
        table
            .object("BestTrackType", |m, _| m.best_track_type.code())?
            .object("MatchedStations", |m, _| m.matched_stations)?;
        Ok(())
    }
}
