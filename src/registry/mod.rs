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

//! Named-function registry
//!
//! Typed function libraries keyed by (return kind, object kind), with native
//! tables and an expression-compiler fallback for every other name.

pub mod function;
pub mod functions;
pub mod library;
pub mod table;

pub use function::{FunctionImpl, FunctionOrigin, NamedFunction};
pub use functions::{MISSING_MOMENTUM, MISSING_POSITION, NativeValue, ObjectFunctions};
pub use library::{AnyFunction, FunctionLibrary, LibrarySet};
pub use table::NativeTable;
