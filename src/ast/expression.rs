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

//! Expression AST node definitions

use super::operator::{BinaryOperator, UnaryOperator};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::fmt;

/// Call arguments; accessors take at most one, builtins at most four
pub type Arguments = SmallVec<[ExpressionNode; 4]>;

/// AST representation of an accessor expression
///
/// Large variants are boxed to keep the enum small.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ExpressionNode {
    /// Literal value
    Literal(LiteralValue),

    /// Bare accessor name on the object itself (`pt`)
    Identifier(String),

    /// Accessor without parentheses on another expression (`daughter(0).pt`)
    Path {
        /// Base expression
        base: Box<ExpressionNode>,
        /// Accessor name
        path: String,
    },

    /// Free call: builtin function or accessor on the object (`abs(eta)`, `pt()`)
    FunctionCall(Box<FunctionCallData>),

    /// Call on another expression (`daughter(0).userFloat("iso")`)
    MethodCall(Box<MethodCallData>),

    /// Indexed child access (`daughter[1]`)
    Index {
        /// Base expression
        base: Box<ExpressionNode>,
        /// Index expression
        index: Box<ExpressionNode>,
    },

    /// Binary operation
    BinaryOp(Box<BinaryOpData>),

    /// Unary operation
    UnaryOp {
        /// The operator
        op: UnaryOperator,
        /// The operand
        operand: Box<ExpressionNode>,
    },

    /// Ternary conditional (`c ? a : b`)
    Conditional(Box<ConditionalData>),
}

/// Binary operation data
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BinaryOpData {
    /// The operator
    pub op: BinaryOperator,
    /// Left operand
    pub left: ExpressionNode,
    /// Right operand
    pub right: ExpressionNode,
}

/// Function call data
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionCallData {
    /// Function name
    pub name: String,
    /// Function arguments
    pub args: Arguments,
}

/// Method call data
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethodCallData {
    /// Base expression to call the method on
    pub base: ExpressionNode,
    /// Method name
    pub method: String,
    /// Method arguments
    pub args: Arguments,
}

/// Conditional expression data
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConditionalData {
    /// Condition
    pub condition: ExpressionNode,
    /// Value when the condition holds
    pub then_expr: ExpressionNode,
    /// Value otherwise
    pub else_expr: ExpressionNode,
}

/// Literal values
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum LiteralValue {
    /// Boolean literal
    Boolean(bool),
    /// Integer literal
    Integer(i64),
    /// Floating point literal
    Float(f64),
    /// String literal, only meaningful as an accessor key
    String(String),
}

impl ExpressionNode {
    /// Create a literal expression
    pub fn literal(value: LiteralValue) -> Self {
        Self::Literal(value)
    }

    /// Create an identifier expression
    pub fn identifier(name: impl Into<String>) -> Self {
        Self::Identifier(name.into())
    }

    /// Create a function call expression
    pub fn function_call(name: impl Into<String>, args: impl Into<Arguments>) -> Self {
        Self::FunctionCall(Box::new(FunctionCallData {
            name: name.into(),
            args: args.into(),
        }))
    }

    /// Create a method call expression
    pub fn method_call(
        base: ExpressionNode,
        method: impl Into<String>,
        args: impl Into<Arguments>,
    ) -> Self {
        Self::MethodCall(Box::new(MethodCallData {
            base,
            method: method.into(),
            args: args.into(),
        }))
    }

    /// Create a binary operation expression
    pub fn binary_op(op: BinaryOperator, left: ExpressionNode, right: ExpressionNode) -> Self {
        Self::BinaryOp(Box::new(BinaryOpData { op, left, right }))
    }

    /// Create a unary operation expression
    pub fn unary_op(op: UnaryOperator, operand: ExpressionNode) -> Self {
        Self::UnaryOp {
            op,
            operand: Box::new(operand),
        }
    }

    /// Create a path navigation expression
    pub fn path(base: ExpressionNode, path: impl Into<String>) -> Self {
        Self::Path {
            base: Box::new(base),
            path: path.into(),
        }
    }

    /// Create an index access expression
    pub fn index(base: ExpressionNode, index: ExpressionNode) -> Self {
        Self::Index {
            base: Box::new(base),
            index: Box::new(index),
        }
    }

    /// Create a conditional expression
    pub fn conditional(
        condition: ExpressionNode,
        then_expr: ExpressionNode,
        else_expr: ExpressionNode,
    ) -> Self {
        Self::Conditional(Box::new(ConditionalData {
            condition,
            then_expr,
            else_expr,
        }))
    }

    /// Get the literal value if this is a literal
    pub fn as_literal(&self) -> Option<&LiteralValue> {
        match self {
            Self::Literal(value) => Some(value),
            _ => None,
        }
    }

    /// Nesting depth of the tree; a leaf has depth 1
    pub fn depth(&self) -> usize {
        let children = match self {
            Self::Literal(_) | Self::Identifier(_) => 0,
            Self::Path { base, .. } => base.depth(),
            Self::FunctionCall(data) => data.args.iter().map(Self::depth).max().unwrap_or(0),
            Self::MethodCall(data) => data
                .args
                .iter()
                .map(Self::depth)
                .max()
                .unwrap_or(0)
                .max(data.base.depth()),
            Self::Index { base, index } => base.depth().max(index.depth()),
            Self::BinaryOp(data) => data.left.depth().max(data.right.depth()),
            Self::UnaryOp { operand, .. } => operand.depth(),
            Self::Conditional(data) => data
                .condition
                .depth()
                .max(data.then_expr.depth())
                .max(data.else_expr.depth()),
        };
        children + 1
    }
}

impl fmt::Display for LiteralValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Boolean(value) => write!(f, "{value}"),
            Self::Integer(value) => write!(f, "{value}"),
            Self::Float(value) => write!(f, "{value:?}"),
            Self::String(value) => write!(f, "\"{value}\""),
        }
    }
}

fn write_args(f: &mut fmt::Formatter<'_>, args: &[ExpressionNode]) -> fmt::Result {
    f.write_str("(")?;
    for (i, arg) in args.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{arg}")?;
    }
    f.write_str(")")
}

/// Fully parenthesized rendering, used in diagnostics and tests
impl fmt::Display for ExpressionNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Literal(value) => write!(f, "{value}"),
            Self::Identifier(name) => f.write_str(name),
            Self::Path { base, path } => write!(f, "{base}.{path}"),
            Self::FunctionCall(data) => {
                f.write_str(&data.name)?;
                write_args(f, &data.args)
            }
            Self::MethodCall(data) => {
                write!(f, "{}.{}", data.base, data.method)?;
                write_args(f, &data.args)
            }
            Self::Index { base, index } => write!(f, "{base}[{index}]"),
            Self::BinaryOp(data) => write!(f, "({} {} {})", data.left, data.op, data.right),
            Self::UnaryOp { op, operand } => write!(f, "({op}{operand})"),
            Self::Conditional(data) => write!(
                f,
                "({} ? {} : {})",
                data.condition, data.then_expr, data.else_expr
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use smallvec::smallvec;

    #[test]
    fn test_depth_counts_longest_branch() {
        let leaf = ExpressionNode::identifier("pt");
        assert_eq!(leaf.depth(), 1);

        let args: Arguments = smallvec![ExpressionNode::literal(LiteralValue::Integer(0))];
        let call = ExpressionNode::method_call(
            ExpressionNode::function_call("daughter", args),
            "pt",
            Arguments::new(),
        );
        let expr = ExpressionNode::binary_op(BinaryOperator::Subtract, call, leaf);
        assert_eq!(expr.depth(), 4);
    }

    #[test]
    fn test_display_is_parenthesized() {
        let expr = ExpressionNode::binary_op(
            BinaryOperator::Add,
            ExpressionNode::identifier("pt"),
            ExpressionNode::unary_op(
                UnaryOperator::Negate,
                ExpressionNode::literal(LiteralValue::Float(1.5)),
            ),
        );
        assert_eq!(expr.to_string(), "(pt + (-1.5))");
    }
}
