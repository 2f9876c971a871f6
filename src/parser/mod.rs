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

//! Expression parser
//!
//! Converts accessor expressions such as `daughter(0).pt() > 20` into an
//! [`ExpressionNode`](crate::ast::ExpressionNode) tree.

pub mod error;
pub mod pratt;
pub mod tokenizer;

pub use error::{ParseError, ParseResult};
pub use pratt::{DEFAULT_MAX_DEPTH, parse_expression_pratt, parse_expression_with_max_depth};

/// Parse an expression string into an AST
pub fn parse(input: &str) -> ParseResult<crate::ast::ExpressionNode> {
    parse_expression_pratt(input)
}

/// Parse an expression string, rejecting trees deeper than `max_depth`
pub fn parse_with_max_depth(
    input: &str,
    max_depth: usize,
) -> ParseResult<crate::ast::ExpressionNode> {
    parse_expression_with_max_depth(input, max_depth)
}
