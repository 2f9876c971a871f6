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

//! The named-function library
//!
//! [`FunctionLibrary`] answers "get me the function named X" for one
//! (return kind, object kind) pair. Native entries are built once at
//! construction; any other name is compiled as an expression on first use
//! and memoized for the life of the library.

use super::function::NamedFunction;
use super::functions::{NativeValue, ObjectFunctions};
use super::table::NativeTable;
use crate::compiler::ExpressionCompiler;
use crate::error::{NtupleError, Result};
use crate::model::{EventContext, ObjectKind, ReturnKind, Value};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use log::debug;
use std::fmt;

/// Registry of named functions returning `B` for objects of type `T`.
///
/// Safe to share between threads: the only mutation after construction is
/// the compiled-expression memo, a concurrent map in which each name is
/// compiled at most once.
pub struct FunctionLibrary<B, T> {
    native: NativeTable<B, T>,
    compiled: DashMap<String, NamedFunction<B, T>>,
    compiler: ExpressionCompiler,
}

impl<B: NativeValue, T: ObjectFunctions> FunctionLibrary<B, T> {
    /// Build the native tables with the default expression compiler
    pub fn new() -> Result<Self> {
        Self::with_compiler(ExpressionCompiler::new())
    }

    /// Build the native tables, compiling unknown names with `compiler`
    pub fn with_compiler(compiler: ExpressionCompiler) -> Result<Self> {
        let mut native = NativeTable::new();
        B::shared_functions(&mut native)?;
        B::object_functions(&mut native)?;
        debug!(
            "Built {} function library for {} with {} native functions",
            B::KIND,
            T::KIND,
            native.len()
        );
        Ok(Self {
            native,
            compiled: DashMap::new(),
            compiler,
        })
    }

    /// Get the function named `name`.
    ///
    /// Native functions come first. Anything else is treated as an expression
    /// over the object's accessors; if it does not compile the name is
    /// unresolvable.
    pub fn get(&self, name: &str) -> Result<NamedFunction<B, T>> {
        if name.is_empty() {
            return Err(NtupleError::EmptyFunctionName);
        }
        if let Some(function) = self.native.get(name) {
            return Ok(function.clone());
        }
        if let Some(function) = self.compiled.get(name) {
            return Ok(function.clone());
        }

        match self.compiled.entry(name.to_string()) {
            Entry::Occupied(entry) => Ok(entry.get().clone()),
            Entry::Vacant(entry) => {
                let expression = self.compiler.compile::<B, T>(name).map_err(|source| {
                    NtupleError::Unresolvable {
                        name: name.to_string(),
                        return_kind: B::KIND,
                        object_kind: T::KIND,
                        source: Box::new(source),
                    }
                })?;
                let function = NamedFunction::compiled(expression);
                entry.insert(function.clone());
                debug!("Memoized {} expression '{name}' for {}", B::KIND, T::KIND);
                Ok(function)
            }
        }
    }

    /// Whether `name` is a native function of this library
    pub fn is_native(&self, name: &str) -> bool {
        self.native.contains(name)
    }

    /// Native function names, sorted
    pub fn native_names(&self) -> Vec<&str> {
        self.native.names()
    }

    /// Number of expressions compiled so far
    pub fn compiled_count(&self) -> usize {
        self.compiled.len()
    }

    /// The expression compiler used for unknown names
    pub fn compiler(&self) -> &ExpressionCompiler {
        &self.compiler
    }
}

impl<B, T> fmt::Debug for FunctionLibrary<B, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FunctionLibrary")
            .field("native", &self.native)
            .field("compiled_count", &self.compiled.len())
            .field("compiler", &self.compiler)
            .finish()
    }
}

/// A named function of any return kind, tagged at runtime
#[derive(Debug, Clone)]
pub enum AnyFunction<T> {
    Float(NamedFunction<f32, T>),
    Bool(NamedFunction<bool, T>),
    Int(NamedFunction<i32, T>),
    UInt(NamedFunction<u32, T>),
    ULong(NamedFunction<u64, T>),
}

impl<T: ObjectFunctions> AnyFunction<T> {
    /// Evaluate and tag the result with its kind
    pub fn call(&self, object: &T, event: &EventContext) -> Value {
        match self {
            AnyFunction::Float(f) => Value::Float(f.call(object, event)),
            AnyFunction::Bool(f) => Value::Bool(f.call(object, event)),
            AnyFunction::Int(f) => Value::Int(f.call(object, event)),
            AnyFunction::UInt(f) => Value::UInt(f.call(object, event)),
            AnyFunction::ULong(f) => Value::ULong(f.call(object, event)),
        }
    }

    /// Return kind tag
    pub fn kind(&self) -> ReturnKind {
        match self {
            AnyFunction::Float(_) => ReturnKind::Float,
            AnyFunction::Bool(_) => ReturnKind::Bool,
            AnyFunction::Int(_) => ReturnKind::Int,
            AnyFunction::UInt(_) => ReturnKind::UInt,
            AnyFunction::ULong(_) => ReturnKind::ULong,
        }
    }

    /// Name the function was requested under
    pub fn name(&self) -> &str {
        match self {
            AnyFunction::Float(f) => f.name(),
            AnyFunction::Bool(f) => f.name(),
            AnyFunction::Int(f) => f.name(),
            AnyFunction::UInt(f) => f.name(),
            AnyFunction::ULong(f) => f.name(),
        }
    }
}

/// One library per return kind for an object type.
///
/// Resolves functions by a runtime [`ReturnKind`] tag, which is how branch
/// groups read from configuration are turned into callables.
#[derive(Debug)]
pub struct LibrarySet<T> {
    floats: FunctionLibrary<f32, T>,
    bools: FunctionLibrary<bool, T>,
    ints: FunctionLibrary<i32, T>,
    uints: FunctionLibrary<u32, T>,
    ulongs: FunctionLibrary<u64, T>,
}

impl<T: ObjectFunctions> LibrarySet<T> {
    /// Build every library with the default expression compiler
    pub fn new() -> Result<Self> {
        Self::with_compiler(ExpressionCompiler::new())
    }

    /// Build every library, sharing one compiler configuration
    pub fn with_compiler(compiler: ExpressionCompiler) -> Result<Self> {
        Ok(Self {
            floats: FunctionLibrary::with_compiler(compiler.clone())?,
            bools: FunctionLibrary::with_compiler(compiler.clone())?,
            ints: FunctionLibrary::with_compiler(compiler.clone())?,
            uints: FunctionLibrary::with_compiler(compiler.clone())?,
            ulongs: FunctionLibrary::with_compiler(compiler)?,
        })
    }

    /// Object kind served by this set
    pub fn object_kind(&self) -> ObjectKind {
        T::KIND
    }

    /// Get the function named `name` returning `kind`
    pub fn get(&self, kind: ReturnKind, name: &str) -> Result<AnyFunction<T>> {
        Ok(match kind {
            ReturnKind::Float => AnyFunction::Float(self.floats.get(name)?),
            ReturnKind::Bool => AnyFunction::Bool(self.bools.get(name)?),
            ReturnKind::Int => AnyFunction::Int(self.ints.get(name)?),
            ReturnKind::UInt => AnyFunction::UInt(self.uints.get(name)?),
            ReturnKind::ULong => AnyFunction::ULong(self.ulongs.get(name)?),
        })
    }

    /// The float library
    pub fn floats(&self) -> &FunctionLibrary<f32, T> {
        &self.floats
    }

    /// The boolean library
    pub fn bools(&self) -> &FunctionLibrary<bool, T> {
        &self.bools
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::FunctionOrigin;
    use crate::model::{CompositeCandidate, Electron, Muon};

    #[test]
    fn test_native_lookup_and_origin() {
        let library = FunctionLibrary::<f32, Muon>::new().unwrap();
        let f = library.get("pvZ").unwrap();
        assert_eq!(f.origin(), FunctionOrigin::Shared);
        assert_eq!(library.get("SIP3D").unwrap().origin(), FunctionOrigin::ObjectSpecific);
        assert!(library.is_native("PVDXY"));
        assert_eq!(library.compiled_count(), 0);
    }

    #[test]
    fn test_fallback_is_memoized() {
        let library = FunctionLibrary::<f32, Muon>::new().unwrap();
        let first = library.get("pt * 2").unwrap();
        let second = library.get("pt * 2").unwrap();
        assert_eq!(first.origin(), FunctionOrigin::Compiled);
        assert_eq!(library.compiled_count(), 1);

        let muon = Muon::default();
        let event = EventContext::default();
        assert_eq!(first.call(&muon, &event).to_bits(), second.call(&muon, &event).to_bits());
    }

    #[test]
    fn test_empty_and_unresolvable_names() {
        let library = FunctionLibrary::<bool, Electron>::new().unwrap();
        assert_eq!(library.get("").unwrap_err(), NtupleError::EmptyFunctionName);

        match library.get("IsGlobal").unwrap_err() {
            NtupleError::Unresolvable {
                name,
                return_kind,
                object_kind,
                source,
            } => {
                assert_eq!(name, "IsGlobal");
                assert_eq!(return_kind, ReturnKind::Bool);
                assert_eq!(object_kind, ObjectKind::Electron);
                assert!(matches!(*source, NtupleError::UnknownAccessor { .. }));
            }
            other => panic!("expected an unresolvable name, got {other:?}"),
        }
        assert_eq!(library.compiled_count(), 0);
    }

    #[test]
    fn test_library_set_dispatch() {
        let set = LibrarySet::<CompositeCandidate>::new().unwrap();
        assert_eq!(set.object_kind(), ObjectKind::Composite);

        let ss = set.get(ReturnKind::Bool, "SS").unwrap();
        assert_eq!(ss.kind(), ReturnKind::Bool);
        assert_eq!(ss.name(), "SS");
        let n = set.get(ReturnKind::UInt, "numberOfDaughters").unwrap();
        assert_eq!(
            n.call(&CompositeCandidate::default(), &EventContext::default()),
            Value::UInt(0)
        );
        assert!(set.get(ReturnKind::Int, "SS").is_err());
    }
}
