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

//! Electron-specific functions

use super::{MISSING_POSITION, ObjectFunctions, impact_parameter_significance};
use crate::error::Result;
use crate::model::Electron;
use crate::registry::table::NativeTable;

impl ObjectFunctions for Electron {
    fn float_functions(table: &mut NativeTable<f32, Self>) -> Result<()> {
        table
            .object("SIP3D", |e, _| impact_parameter_significance(e.db_3d, e.edb_3d))?
            .object("PVDZ", |e, event| {
                event
                    .pv()
                    .map_or(MISSING_POSITION, |pv| e.gsf_track.dz(&pv.position) as f32)
            })?
            .object("PVDXY", |e, event| {
                event
                    .pv()
                    .map_or(MISSING_POSITION, |pv| e.gsf_track.dxy(&pv.position) as f32)
            })?;
        Ok(())
    }

    fn uint_functions(table: &mut NativeTable<u32, Self>) -> Result<()> {
        table.object("MissingHits", |e, _| e.gsf_track.missing_inner_hits)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{EventContext, Point, Track, Vertex};

    #[test]
    fn test_impact_parameters_need_a_vertex() {
        let mut table = NativeTable::<f32, Electron>::new();
        Electron::float_functions(&mut table).unwrap();
        let electron = Electron {
            gsf_track: Track {
                vz: 0.5,
                px: 10.0,
                ..Track::default()
            },
            ..Electron::default()
        };

        let pvdz = table.get("PVDZ").unwrap();
        assert_eq!(pvdz.call(&electron, &EventContext::default()), -999.0);

        let event = EventContext {
            vertices: vec![Vertex::new(Point::new(0.0, 0.0, 0.2), 10.0)],
            ..EventContext::default()
        };
        assert!((pvdz.call(&electron, &event) - 0.3).abs() < 1e-6);
        assert_eq!(table.get("SIP3D").unwrap().call(&electron, &event), -1.0);
    }
}
