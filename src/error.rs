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

//! Error types for the ntuplizer
//!
//! Every variant is a configuration error: it is raised while a job is being
//! set up and aborts it. Missing per-event data is never an error, it is
//! absorbed into sentinel values by the functions themselves.

use crate::model::{ObjectKind, ReturnKind, ValueType};
use crate::parser::ParseError;
use thiserror::Error;

/// Result type alias for ntuplizer operations
pub type Result<T> = std::result::Result<T, NtupleError>;

/// Configuration errors raised while building functions, producers and ntuples
#[derive(Error, Debug, Clone, PartialEq)]
pub enum NtupleError {
    /// The expression string is not syntactically valid
    #[error("Cannot parse expression '{expression}': {source}")]
    Parse {
        /// The offending expression
        expression: String,
        /// Positioned parser error
        source: ParseError,
    },

    /// An accessor name that the object kind does not provide
    #[error("Unknown accessor '{name}' for {object} in expression '{expression}'")]
    UnknownAccessor {
        /// The offending expression
        expression: String,
        /// Accessor surface the name was looked up on
        object: ObjectKind,
        /// The unknown name
        name: String,
    },

    /// Wrong number or kind of arguments to an accessor or builtin
    #[error("Invalid arguments to '{name}' in expression '{expression}': {message}")]
    InvalidArguments {
        /// The offending expression
        expression: String,
        /// Accessor or builtin name
        name: String,
        /// What was wrong with the arguments
        message: String,
    },

    /// A sub-expression has the wrong type for where it is used
    #[error("Type mismatch in expression '{expression}': expected {expected}, found {found}")]
    TypeMismatch {
        /// The offending expression
        expression: String,
        /// Type required at this position
        expected: String,
        /// Type actually produced
        found: ValueType,
    },

    /// Expression nests deeper than the compiler allows
    #[error("Expression '{expression}' nests deeper than the limit of {limit}")]
    ExpressionTooDeep {
        /// The offending expression
        expression: String,
        /// Configured nesting limit
        limit: usize,
    },

    /// A function was requested with an empty name
    #[error("Function name must not be empty")]
    EmptyFunctionName,

    /// Name is neither a native function nor a valid expression
    #[error("'{name}' is neither a {return_kind} function for {object_kind} nor a valid expression: {source}")]
    Unresolvable {
        /// Requested name
        name: String,
        /// Return kind of the registry asked
        return_kind: ReturnKind,
        /// Object kind of the registry asked
        object_kind: ObjectKind,
        /// Why the expression compiler rejected it
        source: Box<NtupleError>,
    },

    /// Two native functions with the same name in the same table layer
    #[error("Native {return_kind} function '{name}' for {object_kind} is registered twice")]
    DuplicateFunction {
        /// Function name
        name: String,
        /// Return kind of the table
        return_kind: ReturnKind,
        /// Object kind of the table
        object_kind: ObjectKind,
    },

    /// Object counter configured with unequal cut and label lists
    #[error("Object counter has {cuts} cuts but {labels} labels")]
    MismatchedCutsAndLabels {
        /// Number of cut strings
        cuts: usize,
        /// Number of labels
        labels: usize,
    },

    /// Object counter configured with the same label twice
    #[error("Object counter label '{0}' is used more than once")]
    DuplicateLabel(String),

    /// A producer that needs a primary vertex got an empty vertex collection
    #[error("No primary vertex available")]
    MissingPrimaryVertex,

    /// No jet uncertainty parameterization for the requested jet type
    #[error("No jet energy uncertainty available for jet type '{0}'")]
    UnknownJetType(String),

    /// Malformed jet uncertainty table
    #[error("Invalid jet energy uncertainty table: {0}")]
    InvalidUncertaintyTable(String),

    /// Branch name that cannot be used as an ntuple column
    #[error("Invalid branch name '{0}'")]
    InvalidBranchName(String),

    /// Branch name used in more than one group
    #[error("Branch '{0}' is defined more than once")]
    DuplicateBranch(String),

    /// Object kind with no concrete record type to ntuplize
    #[error("Object kind '{0}' cannot be ntuplized directly")]
    UnsupportedObjectKind(ObjectKind),
}

impl NtupleError {
    /// Wrap a parser error with the expression it came from
    pub fn parse(expression: impl Into<String>, source: ParseError) -> Self {
        NtupleError::Parse {
            expression: expression.into(),
            source,
        }
    }

    /// Create an invalid-arguments error
    pub fn invalid_arguments(
        expression: impl Into<String>,
        name: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        NtupleError::InvalidArguments {
            expression: expression.into(),
            name: name.into(),
            message: message.into(),
        }
    }

    /// Create a type-mismatch error
    pub fn type_mismatch(
        expression: impl Into<String>,
        expected: impl Into<String>,
        found: ValueType,
    ) -> Self {
        NtupleError::TypeMismatch {
            expression: expression.into(),
            expected: expected.into(),
            found,
        }
    }
}
