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

//! Function library lookups, fallbacks and determinism

mod common;

use common::{barrel_electron, event_with_jets, muon, z_to_mumu};
use ntuplizer::model::{CompositeCandidate, Electron, EventContext, Muon, ObjectKind, PhysicsObject};
use ntuplizer::registry::{FunctionOrigin, NativeValue, ObjectFunctions};
use ntuplizer::{FunctionLibrary, NtupleError, ReturnKind};
use pretty_assertions::assert_eq;
use rstest::rstest;

/// Every native name resolves to functions that agree bit for bit
fn assert_deterministic<B, T>(object: &T, event: &EventContext)
where
    B: NativeValue,
    T: ObjectFunctions,
{
    let library = FunctionLibrary::<B, T>::new().unwrap();
    for name in library.native_names() {
        let first = library.get(name).unwrap();
        let second = library.get(name).unwrap();
        let (a, b) = (first.call(object, event).into_value(), second.call(object, event).into_value());
        assert_eq!(format!("{a:?}"), format!("{b:?}"), "{name}");
    }
}

#[test]
fn test_native_functions_are_deterministic() {
    let event = event_with_jets(3);
    let m = muon(30.0, 0.5, 0.2, 1);
    let e = barrel_electron(25.0);
    let z = z_to_mumu();

    assert_deterministic::<f32, Muon>(&m, &event);
    assert_deterministic::<bool, Muon>(&m, &event);
    assert_deterministic::<u32, Muon>(&m, &event);
    assert_deterministic::<f32, Electron>(&e, &event);
    assert_deterministic::<u32, Electron>(&e, &event);
    assert_deterministic::<i32, Electron>(&e, &event);
    assert_deterministic::<u64, Electron>(&e, &event);
    assert_deterministic::<f32, CompositeCandidate>(&z, &event);
    assert_deterministic::<bool, CompositeCandidate>(&z, &event);
}

#[test]
fn test_layers_are_present() {
    let muons = FunctionLibrary::<f32, Muon>::new().unwrap();
    for name in ["pvZ", "mtToMET", "dijetMass", "mjjGen", "SIP3D", "PVDZ", "PVDXY"] {
        assert!(muons.is_native(name), "{name}");
    }
    assert!(!muons.is_native("DR"));

    let composites = FunctionLibrary::<f32, CompositeCandidate>::new().unwrap();
    for name in ["DR", "massNoFSR", "ptNoFSR", "etaNoFSR", "phiNoFSR", "energyNoFSR"] {
        assert_eq!(
            composites.get(name).unwrap().origin(),
            FunctionOrigin::ObjectSpecific,
            "{name}"
        );
    }
}

#[rstest]
#[case(0, -1.0)]
#[case(1, -1.0)]
fn test_dijet_mass_needs_two_jets(#[case] n_jets: usize, #[case] expected: f32) {
    let library = FunctionLibrary::<f32, Muon>::new().unwrap();
    let dijet_mass = library.get("dijetMass").unwrap();
    assert_eq!(dijet_mass.call(&Muon::default(), &event_with_jets(n_jets)), expected);
}

#[test]
fn test_dijet_mass_of_two_jets() {
    let library = FunctionLibrary::<f32, Muon>::new().unwrap();
    let event = event_with_jets(2);
    let expected = (event.jets[0].p4 + event.jets[1].p4).mass() as f32;

    let dijet_mass = library.get("dijetMass").unwrap().call(&Muon::default(), &event);
    assert!((dijet_mass - expected).abs() < 1e-3);
    assert!(dijet_mass > 0.0);
}

#[test]
fn test_event_identifiers() {
    let event = event_with_jets(2);
    let e = barrel_electron(30.0);

    let evt = FunctionLibrary::<u64, Electron>::new().unwrap().get("evt").unwrap();
    assert_eq!(evt.call(&e, &event), 1_234_567_890_123);

    let uints = FunctionLibrary::<u32, Electron>::new().unwrap();
    assert_eq!(uints.get("run").unwrap().call(&e, &event), 273_158);
    assert_eq!(uints.get("nvtx").unwrap().call(&e, &event), 2);
    assert_eq!(uints.get("nJets").unwrap().call(&e, &event), 2);
    assert_eq!(uints.get("MissingHits").unwrap().call(&e, &event), 0);

    let pdg_id = FunctionLibrary::<i32, Electron>::new().unwrap().get("PdgId").unwrap();
    assert_eq!(pdg_id.call(&e, &event), 11);
}

#[rstest]
#[case::muon_flag_on_electron(ReturnKind::Bool, ObjectKind::Electron, "IsPFMuon")]
#[case::electron_hits_on_muon(ReturnKind::UInt, ObjectKind::Muon, "MissingHits")]
#[case::pair_angle_on_muon(ReturnKind::Float, ObjectKind::Muon, "DR")]
#[case::same_sign_on_electron(ReturnKind::Bool, ObjectKind::Electron, "SS")]
fn test_other_kinds_names_are_unresolvable(
    #[case] return_kind: ReturnKind,
    #[case] object_kind: ObjectKind,
    #[case] name: &str,
) {
    let err = match (return_kind, object_kind) {
        (ReturnKind::Bool, ObjectKind::Electron) => {
            FunctionLibrary::<bool, Electron>::new().unwrap().get(name).unwrap_err()
        }
        (ReturnKind::UInt, ObjectKind::Muon) => {
            FunctionLibrary::<u32, Muon>::new().unwrap().get(name).unwrap_err()
        }
        (ReturnKind::Float, ObjectKind::Muon) => {
            FunctionLibrary::<f32, Muon>::new().unwrap().get(name).unwrap_err()
        }
        other => panic!("no library for {other:?}"),
    };
    assert!(matches!(
        err,
        NtupleError::Unresolvable { return_kind: r, object_kind: o, .. } if r == return_kind && o == object_kind
    ));
}

#[test]
fn test_valid_accessor_chain_from_other_kind_resolves() {
    // Not a native muon name, but a muon accessor
    let library = FunctionLibrary::<u32, Muon>::new().unwrap();
    let stations = library.get("numberOfMatchedStations").unwrap();
    assert_eq!(stations.origin(), FunctionOrigin::Compiled);
    assert_eq!(stations.call(&muon(20.0, 0.0, 0.0, 1), &EventContext::default()), 2);
}

#[test]
fn test_shared_library_compiles_each_name_once() {
    let library = FunctionLibrary::<f32, Muon>::new().unwrap();
    let m = muon(40.0, 1.2, -0.4, -1);
    let event = EventContext::default();

    std::thread::scope(|scope| {
        for _ in 0..8 {
            scope.spawn(|| {
                for _ in 0..50 {
                    let f = library.get("pt * abs(eta)").unwrap();
                    assert!((f.call(&m, &event) - 48.0).abs() < 1e-3);
                }
            });
        }
    });
    assert_eq!(library.compiled_count(), 1);
    assert_eq!(Muon::KIND, ObjectKind::Muon);
}
