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

//! Counts objects passing configured cuts

use crate::compiler::{CompiledExpression, ExpressionCompiler};
use crate::error::{NtupleError, Result};
use crate::model::PhysicsObject;
use indexmap::IndexMap;
use log::{debug, trace};

/// One configured count: a compiled cut, or `None` for the collection size
struct Count<T> {
    label: String,
    cut: Option<CompiledExpression<bool, T>>,
}

/// Emits, per label, the number of objects passing its cut.
///
/// An empty cut string counts every object.
pub struct ObjectCounter<T> {
    counts: Vec<Count<T>>,
}

impl<T: PhysicsObject> ObjectCounter<T> {
    /// Compile `cuts`, paired with `labels` by position
    pub fn new<S: AsRef<str>, L: AsRef<str>>(
        cuts: &[S],
        labels: &[L],
        compiler: &ExpressionCompiler,
    ) -> Result<Self> {
        if cuts.len() != labels.len() {
            return Err(NtupleError::MismatchedCutsAndLabels {
                cuts: cuts.len(),
                labels: labels.len(),
            });
        }

        let mut counts: Vec<Count<T>> = Vec::with_capacity(cuts.len());
        for (cut, label) in cuts.iter().zip(labels) {
            let label = label.as_ref();
            if counts.iter().any(|count| count.label == label) {
                return Err(NtupleError::DuplicateLabel(label.to_string()));
            }
            let cut = cut.as_ref().trim();
            let cut = if cut.is_empty() {
                None
            } else {
                Some(compiler.compile::<bool, T>(cut)?)
            };
            counts.push(Count {
                label: label.to_string(),
                cut,
            });
        }
        debug!("{} counter configured with {} labels", T::KIND, counts.len());
        Ok(Self { counts })
    }

    /// Output labels, in configuration order
    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.counts.iter().map(|count| count.label.as_str())
    }

    /// Count `objects` for every label
    pub fn produce(&self, objects: &[T]) -> IndexMap<String, i32> {
        let result: IndexMap<String, i32> = self
            .counts
            .iter()
            .map(|count| {
                let n = match &count.cut {
                    Some(cut) => objects.iter().filter(|object| cut.evaluate(object)).count(),
                    None => objects.len(),
                };
                (count.label.clone(), i32::try_from(n).unwrap_or(i32::MAX))
            })
            .collect();
        trace!("{} counts: {result:?}", T::KIND);
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{LorentzVector, Muon};
    use pretty_assertions::assert_eq;

    fn muons(pts: &[f64]) -> Vec<Muon> {
        pts.iter()
            .map(|&pt| Muon {
                p4: LorentzVector::from_pt_eta_phi_m(pt, 0.0, 0.0, 0.105),
                ..Muon::default()
            })
            .collect()
    }

    #[test]
    fn test_counts_and_size() {
        let counter =
            ObjectCounter::<Muon>::new(&["pt > 20", ""], &["tight", "all"], &ExpressionCompiler::new())
                .unwrap();
        let counts = counter.produce(&muons(&[5.0, 25.0, 30.0, 12.0, 45.0]));

        let expected: IndexMap<String, i32> =
            [("tight".to_string(), 3), ("all".to_string(), 5)].into_iter().collect();
        assert_eq!(counts, expected);
        assert_eq!(counter.labels().collect::<Vec<_>>(), vec!["tight", "all"]);
    }

    #[test]
    fn test_empty_collection() {
        let counter =
            ObjectCounter::<Muon>::new(&["isGlobalMuon"], &["global"], &ExpressionCompiler::new())
                .unwrap();
        assert_eq!(counter.produce(&[]).get("global"), Some(&0));
    }

    #[test]
    fn test_configuration_errors() {
        let compiler = ExpressionCompiler::new();
        assert!(matches!(
            ObjectCounter::<Muon>::new(&["pt > 20"], &["a", "b"], &compiler),
            Err(NtupleError::MismatchedCutsAndLabels { cuts: 1, labels: 2 })
        ));
        assert!(matches!(
            ObjectCounter::<Muon>::new(&["", "pt > 5"], &["a", "a"], &compiler),
            Err(NtupleError::DuplicateLabel(label)) if label == "a"
        ));
        assert!(matches!(
            ObjectCounter::<Muon>::new(&["pt >"], &["a"], &compiler),
            Err(NtupleError::Parse { .. })
        ));
    }
}
