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

//! Named functions: the unit the registry hands out

use crate::compiler::CompiledExpression;
use crate::model::{EventContext, ObjectKind, PhysicsObject, ReturnKind, ReturnValue};
use std::fmt;
use std::sync::Arc;

/// Signature shared by native and compiled functions
pub type FunctionImpl<B, T> = Arc<dyn Fn(&T, &EventContext) -> B + Send + Sync>;

/// Where a named function came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FunctionOrigin {
    /// Native event-scope quantity available to every object kind
    Shared,
    /// Native quantity specific to one object kind
    ObjectSpecific,
    /// Synthesized by the expression compiler on first lookup
    Compiled,
}

/// An immutable (name, return kind, object kind) to callable triple.
///
/// Cloning is cheap: the name and the callable are shared.
pub struct NamedFunction<B, T> {
    name: Arc<str>,
    origin: FunctionOrigin,
    func: FunctionImpl<B, T>,
}

impl<B: ReturnValue, T: PhysicsObject> NamedFunction<B, T> {
    /// Wrap a native closure
    pub fn native<F>(name: &str, origin: FunctionOrigin, func: F) -> Self
    where
        F: Fn(&T, &EventContext) -> B + Send + Sync + 'static,
    {
        Self {
            name: Arc::from(name),
            origin,
            func: Arc::new(func),
        }
    }

    /// Wrap a compiled expression; the event context is ignored
    pub fn compiled(expression: CompiledExpression<B, T>) -> Self {
        Self {
            name: Arc::from(expression.source()),
            origin: FunctionOrigin::Compiled,
            func: Arc::new(move |object: &T, _: &EventContext| expression.evaluate(object)),
        }
    }

    /// Evaluate for one object in one event
    #[inline]
    pub fn call(&self, object: &T, event: &EventContext) -> B {
        (self.func)(object, event)
    }

    /// Name this function was registered or requested under
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Where the function came from
    pub fn origin(&self) -> FunctionOrigin {
        self.origin
    }

    /// Return kind tag
    pub fn return_kind(&self) -> ReturnKind {
        B::KIND
    }

    /// Object kind tag
    pub fn object_kind(&self) -> ObjectKind {
        T::KIND
    }
}

impl<B, T> Clone for NamedFunction<B, T> {
    fn clone(&self) -> Self {
        Self {
            name: Arc::clone(&self.name),
            origin: self.origin,
            func: Arc::clone(&self.func),
        }
    }
}

impl<B, T> fmt::Debug for NamedFunction<B, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NamedFunction")
            .field("name", &self.name)
            .field("origin", &self.origin)
            .finish_non_exhaustive()
    }
}
