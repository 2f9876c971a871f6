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

//! Native function definitions
//!
//! The shared layer depends only on the return type and is defined once for
//! every object type. The object layer is looked up through
//! [`ObjectFunctions`], one method per return kind, so a table for any
//! (return kind, object kind) pair is built without specialization.

mod composite;
mod electron;
mod event;
mod muon;

use super::table::NativeTable;
use crate::error::Result;
use crate::model::{Jet, Particle, PhysicsObject, ReturnValue};

/// Sentinel for position- and angle-like quantities that cannot be computed
pub const MISSING_POSITION: f32 = -999.0;

/// Sentinel for momentum- and count-like quantities that cannot be computed
pub const MISSING_MOMENTUM: f32 = -1.0;

/// Object-specific native functions, by return kind
pub trait ObjectFunctions: PhysicsObject {
    fn float_functions(_table: &mut NativeTable<f32, Self>) -> Result<()> {
        Ok(())
    }

    fn bool_functions(_table: &mut NativeTable<bool, Self>) -> Result<()> {
        Ok(())
    }

    fn int_functions(_table: &mut NativeTable<i32, Self>) -> Result<()> {
        Ok(())
    }

    fn uint_functions(_table: &mut NativeTable<u32, Self>) -> Result<()> {
        Ok(())
    }

    fn ulong_functions(_table: &mut NativeTable<u64, Self>) -> Result<()> {
        Ok(())
    }
}

impl ObjectFunctions for Jet {}

impl ObjectFunctions for Particle {}

/// A return type with native function tables
pub trait NativeValue: ReturnValue {
    /// Event-scope functions available to every object kind
    fn shared_functions<T: PhysicsObject>(table: &mut NativeTable<Self, T>) -> Result<()>;

    /// Functions specific to `T`
    fn object_functions<T: ObjectFunctions>(table: &mut NativeTable<Self, T>) -> Result<()>;
}

impl NativeValue for f32 {
    fn shared_functions<T: PhysicsObject>(table: &mut NativeTable<Self, T>) -> Result<()> {
        event::floats(table)
    }

    fn object_functions<T: ObjectFunctions>(table: &mut NativeTable<Self, T>) -> Result<()> {
        T::float_functions(table)
    }
}

impl NativeValue for bool {
    fn shared_functions<T: PhysicsObject>(table: &mut NativeTable<Self, T>) -> Result<()> {
        event::bools(table)
    }

    fn object_functions<T: ObjectFunctions>(table: &mut NativeTable<Self, T>) -> Result<()> {
        T::bool_functions(table)
    }
}

impl NativeValue for i32 {
    fn shared_functions<T: PhysicsObject>(table: &mut NativeTable<Self, T>) -> Result<()> {
        event::ints(table)
    }

    fn object_functions<T: ObjectFunctions>(table: &mut NativeTable<Self, T>) -> Result<()> {
        T::int_functions(table)
    }
}

impl NativeValue for u32 {
    fn shared_functions<T: PhysicsObject>(table: &mut NativeTable<Self, T>) -> Result<()> {
        event::uints(table)
    }

    fn object_functions<T: ObjectFunctions>(table: &mut NativeTable<Self, T>) -> Result<()> {
        T::uint_functions(table)
    }
}

impl NativeValue for u64 {
    fn shared_functions<T: PhysicsObject>(table: &mut NativeTable<Self, T>) -> Result<()> {
        event::ulongs(table)
    }

    fn object_functions<T: ObjectFunctions>(table: &mut NativeTable<Self, T>) -> Result<()> {
        T::ulong_functions(table)
    }
}

/// |dB| / edB, or -1 when the uncertainty is zero
pub(crate) fn impact_parameter_significance(db: f64, edb: f64) -> f32 {
    if edb == 0.0 {
        return MISSING_MOMENTUM;
    }
    (db.abs() / edb) as f32
}
