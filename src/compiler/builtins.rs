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

//! Math functions callable from expressions

use crate::model::{delta_phi, delta_r};
use once_cell::sync::Lazy;
use rustc_hash::FxHashMap;

/// A builtin numeric function, by arity
#[derive(Debug, Clone, Copy)]
pub enum Builtin {
    Unary(fn(f64) -> f64),
    Binary(fn(f64, f64) -> f64),
    Quaternary(fn(f64, f64, f64, f64) -> f64),
}

impl Builtin {
    /// Number of arguments the function takes
    pub fn arity(&self) -> usize {
        match self {
            Builtin::Unary(_) => 1,
            Builtin::Binary(_) => 2,
            Builtin::Quaternary(_) => 4,
        }
    }
}

static BUILTINS: Lazy<FxHashMap<&'static str, Builtin>> = Lazy::new(|| {
    let mut table: FxHashMap<&'static str, Builtin> = FxHashMap::default();
    table.insert("abs", Builtin::Unary(f64::abs));
    table.insert("acos", Builtin::Unary(f64::acos));
    table.insert("asin", Builtin::Unary(f64::asin));
    table.insert("atan", Builtin::Unary(f64::atan));
    table.insert("cos", Builtin::Unary(f64::cos));
    table.insert("cosh", Builtin::Unary(f64::cosh));
    table.insert("exp", Builtin::Unary(f64::exp));
    table.insert("log", Builtin::Unary(f64::ln));
    table.insert("log10", Builtin::Unary(f64::log10));
    table.insert("sin", Builtin::Unary(f64::sin));
    table.insert("sinh", Builtin::Unary(f64::sinh));
    table.insert("sq", Builtin::Unary(|x| x * x));
    table.insert("sqrt", Builtin::Unary(f64::sqrt));
    table.insert("tan", Builtin::Unary(f64::tan));
    table.insert("tanh", Builtin::Unary(f64::tanh));
    table.insert("atan2", Builtin::Binary(f64::atan2));
    table.insert("hypot", Builtin::Binary(f64::hypot));
    table.insert("max", Builtin::Binary(f64::max));
    table.insert("min", Builtin::Binary(f64::min));
    table.insert("pow", Builtin::Binary(f64::powf));
    table.insert("deltaPhi", Builtin::Binary(delta_phi));
    table.insert("deltaR", Builtin::Quaternary(delta_r));
    table
});

/// Look up a builtin by name
pub fn lookup(name: &str) -> Option<Builtin> {
    BUILTINS.get(name).copied()
}

/// Names of all builtins, sorted
pub fn names() -> Vec<&'static str> {
    let mut names: Vec<_> = BUILTINS.keys().copied().collect();
    names.sort_unstable();
    names
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_by_arity() {
        assert_eq!(lookup("deltaR").map(|b| b.arity()), Some(4));
        assert_eq!(lookup("atan2").map(|b| b.arity()), Some(2));
        assert!(lookup("pt").is_none());
        assert!(names().contains(&"log10"));
    }

    #[test]
    fn test_log_is_natural() {
        let Some(Builtin::Unary(log)) = lookup("log") else {
            panic!("log must be unary");
        };
        assert!((log(std::f64::consts::E) - 1.0).abs() < 1e-12);
    }
}
