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

//! Type tags for named functions and their values

use serde::{Deserialize, Serialize};
use std::fmt;

/// The value type a named function produces.
///
/// Closed set: these are the branch types an ntuple can hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReturnKind {
    /// 32-bit float
    Float,
    /// Boolean flag
    Bool,
    /// Signed 32-bit integer
    Int,
    /// Unsigned 32-bit integer
    UInt,
    /// Unsigned 64-bit integer
    ULong,
}

impl ReturnKind {
    /// All return kinds, in branch-group order
    pub const ALL: [ReturnKind; 5] = [
        ReturnKind::Float,
        ReturnKind::Bool,
        ReturnKind::Int,
        ReturnKind::UInt,
        ReturnKind::ULong,
    ];

    /// Name of the branch group holding this kind in a branch set
    pub fn group_name(self) -> &'static str {
        match self {
            ReturnKind::Float => "floats",
            ReturnKind::Bool => "bools",
            ReturnKind::Int => "ints",
            ReturnKind::UInt => "uints",
            ReturnKind::ULong => "ulls",
        }
    }
}

impl fmt::Display for ReturnKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ReturnKind::Float => "float",
            ReturnKind::Bool => "bool",
            ReturnKind::Int => "int",
            ReturnKind::UInt => "unsigned",
            ReturnKind::ULong => "unsigned long long",
        };
        f.write_str(name)
    }
}

/// The physics-object type a named function operates over
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ObjectKind {
    /// Reconstructed electron
    Electron,
    /// Reconstructed muon
    Muon,
    /// Composite candidate built from daughters (Z, ZZ, ...)
    Composite,
    /// Any other candidate, reached through the generic accessor surface
    Other,
}

impl fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ObjectKind::Electron => "electron",
            ObjectKind::Muon => "muon",
            ObjectKind::Composite => "composite candidate",
            ObjectKind::Other => "candidate",
        };
        f.write_str(name)
    }
}

/// A value produced by a named function, tagged with its [`ReturnKind`]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    /// Boolean value
    Bool(bool),
    /// Signed integer value
    Int(i32),
    /// Unsigned integer value
    UInt(u32),
    /// Unsigned 64-bit value
    ULong(u64),
    /// Floating point value
    Float(f32),
}

impl Value {
    /// The kind tag of this value
    pub fn kind(&self) -> ReturnKind {
        match self {
            Value::Float(_) => ReturnKind::Float,
            Value::Bool(_) => ReturnKind::Bool,
            Value::Int(_) => ReturnKind::Int,
            Value::UInt(_) => ReturnKind::UInt,
            Value::ULong(_) => ReturnKind::ULong,
        }
    }

    /// Widen any value to `f64`, booleans as 1/0
    pub fn as_f64(&self) -> f64 {
        match *self {
            Value::Float(v) => f64::from(v),
            Value::Bool(v) => f64::from(u8::from(v)),
            Value::Int(v) => f64::from(v),
            Value::UInt(v) => f64::from(v),
            Value::ULong(v) => v as f64,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Float(v) => write!(f, "{v}"),
            Value::Bool(v) => write!(f, "{v}"),
            Value::Int(v) => write!(f, "{v}"),
            Value::UInt(v) => write!(f, "{v}"),
            Value::ULong(v) => write!(f, "{v}"),
        }
    }
}

/// Static type of a bound sub-expression in the expression compiler
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueType {
    /// Any numeric quantity, carried as `f64`
    Number,
    /// Boolean flag
    Boolean,
    /// A physics object with the given accessor surface
    Object(ObjectKind),
    /// String literal, only valid as an accessor key
    Text,
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueType::Number => f.write_str("number"),
            ValueType::Boolean => f.write_str("boolean"),
            ValueType::Object(kind) => write!(f, "{kind} object"),
            ValueType::Text => f.write_str("string"),
        }
    }
}
