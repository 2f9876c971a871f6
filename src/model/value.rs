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

//! Rust types standing for each [`ReturnKind`]

use super::types::{ReturnKind, Value};
use std::fmt::Debug;

/// A scalar type a named function can return.
///
/// Implemented for exactly one Rust type per [`ReturnKind`]. Coercions follow
/// the usual numeric conversions: narrowing to `f32`, saturating truncation to
/// integers, and non-zero (and not NaN) to `true`.
pub trait ReturnValue: Copy + Debug + PartialEq + Send + Sync + 'static {
    /// Kind tag of this type
    const KIND: ReturnKind;

    /// Value used when an expression cannot be evaluated for an object
    const MISSING: Self;

    /// Coerce a numeric result
    fn from_number(value: f64) -> Self;

    /// Coerce a boolean result
    fn from_boolean(value: bool) -> Self;

    /// Tag the value with its kind
    fn into_value(self) -> Value;
}

impl ReturnValue for f32 {
    const KIND: ReturnKind = ReturnKind::Float;
    const MISSING: Self = -999.0;

    fn from_number(value: f64) -> Self {
        value as f32
    }

    fn from_boolean(value: bool) -> Self {
        if value { 1.0 } else { 0.0 }
    }

    fn into_value(self) -> Value {
        Value::Float(self)
    }
}

impl ReturnValue for bool {
    const KIND: ReturnKind = ReturnKind::Bool;
    const MISSING: Self = false;

    fn from_number(value: f64) -> Self {
        value != 0.0 && !value.is_nan()
    }

    fn from_boolean(value: bool) -> Self {
        value
    }

    fn into_value(self) -> Value {
        Value::Bool(self)
    }
}

impl ReturnValue for i32 {
    const KIND: ReturnKind = ReturnKind::Int;
    const MISSING: Self = -999;

    fn from_number(value: f64) -> Self {
        value as i32
    }

    fn from_boolean(value: bool) -> Self {
        i32::from(value)
    }

    fn into_value(self) -> Value {
        Value::Int(self)
    }
}

impl ReturnValue for u32 {
    const KIND: ReturnKind = ReturnKind::UInt;
    const MISSING: Self = 0;

    fn from_number(value: f64) -> Self {
        value as u32
    }

    fn from_boolean(value: bool) -> Self {
        u32::from(value)
    }

    fn into_value(self) -> Value {
        Value::UInt(self)
    }
}

impl ReturnValue for u64 {
    const KIND: ReturnKind = ReturnKind::ULong;
    const MISSING: Self = 0;

    fn from_number(value: f64) -> Self {
        value as u64
    }

    fn from_boolean(value: bool) -> Self {
        u64::from(value)
    }

    fn into_value(self) -> Value {
        Value::ULong(self)
    }
}
