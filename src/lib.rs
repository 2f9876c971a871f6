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

//! Named-function registry and expression compiler for physics ntuples
//!
//! A [`FunctionLibrary`] hands out typed functions by name for one
//! (return kind, object kind) pair. Names of native quantities resolve to
//! hand-written extractors; any other name is compiled, once, as an
//! expression over the object's accessors:
//!
//! ```
//! use ntuplizer::FunctionLibrary;
//! use ntuplizer::model::{CompositeCandidate, EventContext};
//!
//! let library = FunctionLibrary::<f32, CompositeCandidate>::new()?;
//! let delta_pt = library.get("daughter(0).pt() - daughter(1).pt()")?;
//! let value = delta_pt.call(&CompositeCandidate::default(), &EventContext::default());
//! assert_eq!(value, -999.0);
//! # Ok::<(), ntuplizer::NtupleError>(())
//! ```

pub mod ast;
pub mod compiler;
pub mod error;
pub mod model;
pub mod ntuple;
pub mod parser;
pub mod producers;
pub mod registry;

pub use compiler::{CompiledExpression, CompilerConfig, ExpressionCompiler};
pub use error::{NtupleError, Result};
pub use model::{EventContext, ObjectKind, ReturnKind, Value};
pub use ntuple::{BranchSet, NtupleConfig, NtupleRow, Ntuplizer};
pub use parser::{ParseError, parse};
pub use registry::{AnyFunction, FunctionLibrary, LibrarySet, NamedFunction};
