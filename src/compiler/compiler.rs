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

//! Expression compiler: string to typed closure
//!
//! Compilation is lex, parse, then bind against the object's accessor
//! surface. Every error surfaces here, never on first evaluation.

use super::binder::{Binder, Bound};
use crate::error::{NtupleError, Result};
use crate::model::{PhysicsObject, ReturnValue};
use crate::parser::{self, ParseError};
use log::debug;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Configuration for the expression compiler
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompilerConfig {
    /// Maximum nesting depth of an expression tree
    pub max_depth: usize,
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self { max_depth: 100 }
    }
}

/// A typed function synthesized from an expression string.
///
/// Evaluates over the object alone; expressions have no access to the
/// event context.
pub struct CompiledExpression<B, T> {
    source: String,
    eval: Box<dyn Fn(&T) -> B + Send + Sync>,
}

impl<B: ReturnValue, T: PhysicsObject> CompiledExpression<B, T> {
    fn from_bound(source: &str, bound: Bound<T>) -> Result<Self> {
        let eval: Box<dyn Fn(&T) -> B + Send + Sync> = match bound {
            Bound::Number(f) => {
                Box::new(move |t: &T| f(t).map(B::from_number).unwrap_or(B::MISSING))
            }
            Bound::Boolean(f) => {
                Box::new(move |t: &T| f(t).map(B::from_boolean).unwrap_or(B::MISSING))
            }
            other => {
                return Err(NtupleError::type_mismatch(
                    source,
                    "a number or boolean result",
                    other.value_type(),
                ));
            }
        };
        Ok(Self {
            source: source.to_string(),
            eval,
        })
    }

    /// Evaluate for one object
    #[inline]
    pub fn evaluate(&self, object: &T) -> B {
        (self.eval)(object)
    }

    /// The expression this was compiled from
    pub fn source(&self) -> &str {
        &self.source
    }
}

impl<B, T> fmt::Debug for CompiledExpression<B, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompiledExpression")
            .field("source", &self.source)
            .finish_non_exhaustive()
    }
}

/// Compiles expression strings against an object type's accessor surface
#[derive(Debug, Clone, Default)]
pub struct ExpressionCompiler {
    config: CompilerConfig,
}

impl ExpressionCompiler {
    /// Create a compiler with the default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a compiler with custom configuration
    pub fn with_config(config: CompilerConfig) -> Self {
        Self { config }
    }

    /// The active configuration
    pub fn config(&self) -> &CompilerConfig {
        &self.config
    }

    /// Compile `expression` into a function returning `B` for objects of type `T`
    pub fn compile<B: ReturnValue, T: PhysicsObject>(
        &self,
        expression: &str,
    ) -> Result<CompiledExpression<B, T>> {
        let ast = parser::parse_with_max_depth(expression, self.config.max_depth).map_err(
            |e| match e {
                ParseError::TooDeep { limit, .. } => NtupleError::ExpressionTooDeep {
                    expression: expression.to_string(),
                    limit,
                },
                other => NtupleError::parse(expression, other),
            },
        )?;

        let bound = Binder::<T>::new(expression).bind(&ast)?;
        let compiled = CompiledExpression::from_bound(expression, bound)?;
        debug!("Compiled {} expression for {}: {ast}", B::KIND, T::KIND);
        Ok(compiled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{
        CompositeCandidate, Electron, LorentzVector, Muon, ObjectKind, Particle, ValueType,
    };
    use rstest::rstest;

    fn muon(pt: f64, eta: f64, charge: i32) -> Muon {
        Muon {
            p4: LorentzVector::from_pt_eta_phi_m(pt, eta, 0.5, 0.105),
            charge,
            is_global: true,
            ..Muon::default()
        }
    }

    fn z_candidate() -> CompositeCandidate {
        let mut z = CompositeCandidate::new(
            23,
            vec![Particle::from(muon(40.0, 0.3, -1)), Particle::from(muon(25.0, -1.1, 1))],
        );
        z.user.add_user_float("iso", 0.125);
        z
    }

    fn eval<B: ReturnValue>(expression: &str, z: &CompositeCandidate) -> B {
        ExpressionCompiler::new()
            .compile::<B, CompositeCandidate>(expression)
            .unwrap()
            .evaluate(z)
    }

    #[rstest]
    #[case("daughter(0).pt() - daughter(1).pt()", 15.0)]
    #[case("daughter[0].pt - daughter[1].pt", 15.0)]
    #[case("2 ^ 3 ^ 2", 512.0)]
    #[case("-2 ^ 2", -4.0)]
    #[case("max(daughter(0).pt, daughter(1).pt) / 4", 10.0)]
    #[case("userFloat('iso') * 8", 1.0)]
    #[case("numberOfDaughters == 2 ? 7 : 3", 7.0)]
    #[case("daughter(0).charge + daughter(1).charge", 0.0)]
    #[case("hasUserFloat(\"iso\") + 1", 2.0)]
    fn test_float_expressions(#[case] expression: &str, #[case] expected: f32) {
        let value: f32 = eval(expression, &z_candidate());
        assert!((value - expected).abs() < 1e-4, "{expression} = {value}");
    }

    #[rstest]
    #[case("daughter(0).pt > 20 && daughter(1).pt > 20", true)]
    #[case("daughter(0).pt > 20 and not (daughter(1).pt > 30)", true)]
    #[case("abs(daughter(1).eta) < 1.0 || daughter(0).charge == 1", false)]
    #[case("hasUserFloat('iso') == true", true)]
    #[case("numberOfDaughters", true)]
    fn test_boolean_expressions(#[case] expression: &str, #[case] expected: bool) {
        assert_eq!(eval::<bool>(expression, &z_candidate()), expected);
    }

    #[test]
    fn test_missing_values_become_sentinels() {
        let z = z_candidate();
        assert_eq!(eval::<f32>("daughter(5).pt", &z), -999.0);
        assert_eq!(eval::<i32>("userInt('absent') + 1", &z), -999);
        assert_eq!(eval::<u32>("daughter(2).numberOfDaughters", &z), 0);
        assert!(!eval::<bool>("daughter(3).pt > 0", &z));
        // Short-circuit before the missing operand
        assert!(!eval::<bool>("daughter(0).pt < 0 && daughter(3).pt > 0", &z));
    }

    #[test]
    fn test_object_specific_surface_comes_first() {
        let compiler = ExpressionCompiler::new();
        let electron = Electron {
            sigma_ieta_ieta: 0.009,
            is_eb: true,
            p4: LorentzVector::from_pt_eta_phi_m(30.0, 0.2, 0.0, 0.0),
            ..Electron::default()
        };
        let f = compiler
            .compile::<bool, Electron>("isEB && sigmaIetaIeta < 0.011 && pt > 25")
            .unwrap();
        assert!(f.evaluate(&electron));

        let err = compiler
            .compile::<bool, Muon>("sigmaIetaIeta < 0.011")
            .unwrap_err();
        assert!(matches!(
            err,
            NtupleError::UnknownAccessor { object: ObjectKind::Muon, ref name, .. } if name == "sigmaIetaIeta"
        ));
    }

    #[test]
    fn test_daughters_only_expose_the_generic_surface() {
        let err = ExpressionCompiler::new()
            .compile::<bool, CompositeCandidate>("daughter(0).isGlobalMuon")
            .unwrap_err();
        assert!(matches!(err, NtupleError::UnknownAccessor { object: ObjectKind::Other, .. }));
    }

    #[rstest]
    #[case("pt >", "Parse")]
    #[case("ptt", "UnknownAccessor")]
    #[case("daughter(0)", "TypeMismatch")]
    #[case("pt(1)", "InvalidArguments")]
    #[case("userFloat(iso)", "InvalidArguments")]
    #[case("daughter(-1).pt", "InvalidArguments")]
    #[case("pt[0]", "InvalidArguments")]
    #[case("atan2(pt)", "InvalidArguments")]
    #[case("'iso' > 1", "TypeMismatch")]
    #[case("pt.eta", "TypeMismatch")]
    fn test_compile_errors(#[case] expression: &str, #[case] variant: &str) {
        let err = ExpressionCompiler::new()
            .compile::<f32, CompositeCandidate>(expression)
            .unwrap_err();
        assert!(
            format!("{err:?}").starts_with(variant),
            "{expression}: {err:?}"
        );
        assert!(err.to_string().contains(expression));
    }

    #[test]
    fn test_depth_limit() {
        let compiler = ExpressionCompiler::with_config(CompilerConfig { max_depth: 3 });
        let err = compiler
            .compile::<f32, Muon>("((pt + 1) + 2) + 3")
            .unwrap_err();
        assert_eq!(
            err,
            NtupleError::ExpressionTooDeep {
                expression: "((pt + 1) + 2) + 3".to_string(),
                limit: 3,
            }
        );
        assert!(compiler.compile::<f32, Muon>("pt + 1").is_ok());
    }

    #[rstest]
    #[case::parentheses(format!("{}pt{}", "(".repeat(10_000), ")".repeat(10_000)))]
    #[case::negations(format!("{}pt", "-".repeat(10_000)))]
    #[case::additive_chain(format!("pt{}", " + 1".repeat(10_000)))]
    #[case::nested_calls(format!("{}pt{}", "abs(".repeat(10_000), ")".repeat(10_000)))]
    #[case::daughter_chain(format!("{}.pt", vec!["daughter(0)"; 10_000].join(".")))]
    fn test_deep_nesting_is_rejected_without_overflow(#[case] expression: String) {
        let err = ExpressionCompiler::new()
            .compile::<f32, CompositeCandidate>(&expression)
            .unwrap_err();
        assert!(
            matches!(err, NtupleError::ExpressionTooDeep { limit: 100, .. }),
            "{err}"
        );
    }

    #[test]
    fn test_nesting_at_the_limit_compiles() {
        // abs(abs(abs(-daughter(0).pt))) is seven levels deep
        let compiler = ExpressionCompiler::with_config(CompilerConfig { max_depth: 7 });
        let z = z_candidate();
        let within = compiler.compile::<f32, CompositeCandidate>("abs(abs(abs(-daughter(0).pt)))");
        assert_eq!(within.unwrap().evaluate(&z), 40.0);
        assert!(matches!(
            compiler.compile::<f32, CompositeCandidate>("abs(abs(abs(abs(-daughter(0).pt))))"),
            Err(NtupleError::ExpressionTooDeep { limit: 7, .. })
        ));
    }

    #[rstest]
    #[case("deltaPhi(daughter(0).phi, 1 / 0)")]
    #[case("deltaPhi(0 / 0, daughter(1).phi)")]
    #[case("deltaR(daughter(0).eta, daughter(0).phi, 0, 1 / 0)")]
    fn test_non_finite_angles_give_nan(#[case] expression: &str) {
        assert!(eval::<f32>(expression, &z_candidate()).is_nan());
    }

    #[test]
    fn test_huge_angle_difference_is_folded() {
        let dphi: f32 = eval("deltaPhi(1e300, daughter(0).phi)", &z_candidate());
        assert!(dphi.is_finite() && dphi.abs() <= std::f32::consts::PI, "{dphi}");
    }

    #[test]
    fn test_text_operand_is_rejected() {
        let err = ExpressionCompiler::new()
            .compile::<f32, Muon>("pt + 'iso'")
            .unwrap_err();
        assert!(matches!(err, NtupleError::TypeMismatch { found: ValueType::Text, .. }));
    }

    #[test]
    fn test_text_result_is_rejected() {
        let err = ExpressionCompiler::new()
            .compile::<f32, Muon>("'iso'")
            .unwrap_err();
        assert!(matches!(err, NtupleError::TypeMismatch { found: ValueType::Text, .. }));
    }
}
