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

//! Parser error types

use std::borrow::Cow;
use thiserror::Error;

/// Result type for parser operations
pub type ParseResult<T> = Result<T, ParseError>;

/// Parse error with byte position information
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    /// A character that starts no token
    #[error("Invalid character '{ch}' at position {position}")]
    InvalidCharacter {
        /// The offending character
        ch: char,
        /// Position of the character
        position: usize,
    },

    /// Unexpected token
    #[error("Unexpected token '{token}' at position {position}")]
    UnexpectedToken {
        /// The unexpected token that was found
        token: Cow<'static, str>,
        /// Position where the token was found
        position: usize,
    },

    /// Expected token
    #[error("Expected {expected} at position {position}")]
    ExpectedToken {
        /// The expected token description
        expected: Cow<'static, str>,
        /// Position where the token was expected
        position: usize,
    },

    /// Unexpected end of input at specific position
    #[error("Unexpected end of input at position {position}")]
    UnexpectedEndOfInput {
        /// Position where more input was expected
        position: usize,
    },

    /// Unclosed string literal
    #[error("Unclosed string literal starting at position {position}")]
    UnclosedString {
        /// Position of the opening quote
        position: usize,
    },

    /// Numeric literal that does not fit its type
    #[error("Invalid number '{literal}' at position {position}")]
    InvalidNumber {
        /// The literal text
        literal: String,
        /// Position of the literal
        position: usize,
    },

    /// Expression nests deeper than the parser accepts
    #[error("Expression nests deeper than {limit} levels at position {position}")]
    TooDeep {
        /// The depth limit in force
        limit: usize,
        /// Position where the limit was crossed
        position: usize,
    },

    /// Input is empty or only whitespace
    #[error("Empty expression")]
    EmptyExpression,
}

impl ParseError {
    /// Byte position the error refers to, if any
    pub fn position(&self) -> Option<usize> {
        match self {
            ParseError::InvalidCharacter { position, .. }
            | ParseError::UnexpectedToken { position, .. }
            | ParseError::ExpectedToken { position, .. }
            | ParseError::UnexpectedEndOfInput { position }
            | ParseError::UnclosedString { position }
            | ParseError::InvalidNumber { position, .. }
            | ParseError::TooDeep { position, .. } => Some(*position),
            ParseError::EmptyExpression => None,
        }
    }
}
