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

//! Binding: resolve a syntax tree against an accessor surface
//!
//! Every node becomes a closure over the root object. Values that cannot be
//! computed for a given object (daughter index out of range, absent user
//! value) are `None` and stay `None` through every operator.

use super::builtins::{self, Builtin};
use crate::ast::{BinaryOpData, BinaryOperator, ExpressionNode, LiteralValue, UnaryOperator};
use crate::error::{NtupleError, Result};
use crate::model::{
    Accessor, CANDIDATE_ACCESSORS, CandidateRef, ObjectKind, PhysicsObject, ValueType,
};

pub(crate) type NumberFn<T> = Box<dyn Fn(&T) -> Option<f64> + Send + Sync>;
pub(crate) type BooleanFn<T> = Box<dyn Fn(&T) -> Option<bool> + Send + Sync>;
pub(crate) type ObjectFn<T> =
    Box<dyn for<'a> Fn(&'a T) -> Option<CandidateRef<'a>> + Send + Sync>;

/// A bound sub-expression
pub(crate) enum Bound<T> {
    Number(NumberFn<T>),
    Boolean(BooleanFn<T>),
    /// A candidate reached through a child accessor
    Object(ObjectFn<T>),
    /// String literal, only valid as an accessor key
    Text,
}

impl<T> Bound<T> {
    pub(crate) fn value_type(&self) -> ValueType {
        match self {
            Bound::Number(_) => ValueType::Number,
            Bound::Boolean(_) => ValueType::Boolean,
            Bound::Object(_) => ValueType::Object(ObjectKind::Other),
            Bound::Text => ValueType::Text,
        }
    }
}

fn object_fn<T, F>(f: F) -> ObjectFn<T>
where
    F: for<'a> Fn(&'a T) -> Option<CandidateRef<'a>> + Send + Sync + 'static,
{
    Box::new(f)
}

fn constant_number<T>(value: f64) -> Bound<T> {
    Bound::Number(Box::new(move |_: &T| Some(value)))
}

fn constant_boolean<T>(value: bool) -> Bound<T> {
    Bound::Boolean(Box::new(move |_: &T| Some(value)))
}

/// Binds the nodes of one expression over objects of type `T`
pub(crate) struct Binder<'e, T> {
    expression: &'e str,
    _object: std::marker::PhantomData<fn(&T)>,
}

impl<'e, T: PhysicsObject> Binder<'e, T> {
    pub(crate) fn new(expression: &'e str) -> Self {
        Self {
            expression,
            _object: std::marker::PhantomData,
        }
    }

    pub(crate) fn bind(&self, node: &ExpressionNode) -> Result<Bound<T>> {
        match node {
            ExpressionNode::Literal(literal) => Ok(match literal {
                LiteralValue::Integer(value) => constant_number(*value as f64),
                LiteralValue::Float(value) => constant_number(*value),
                LiteralValue::Boolean(value) => constant_boolean(*value),
                LiteralValue::String(_) => Bound::Text,
            }),
            ExpressionNode::Identifier(name) => self.root_accessor(name, &[]),
            ExpressionNode::FunctionCall(data) => match builtins::lookup(&data.name) {
                Some(builtin) => self.builtin_call(&data.name, builtin, &data.args),
                None => self.root_accessor(&data.name, &data.args),
            },
            ExpressionNode::Path { base, path } => self.member(base, path, &[]),
            ExpressionNode::MethodCall(data) => self.member(&data.base, &data.method, &data.args),
            ExpressionNode::Index { base, index } => self.indexed(base, index),
            ExpressionNode::BinaryOp(data) => self.binary(data),
            ExpressionNode::UnaryOp { op, operand } => {
                let operand = self.bind(operand)?;
                match op {
                    UnaryOperator::Negate => {
                        let f = self.number(operand)?;
                        Ok(Bound::Number(Box::new(move |t: &T| f(t).map(|x| -x))))
                    }
                    UnaryOperator::Not => {
                        let f = self.boolean(operand)?;
                        Ok(Bound::Boolean(Box::new(move |t: &T| f(t).map(|b| !b))))
                    }
                }
            }
            ExpressionNode::Conditional(data) => {
                let condition = self.bind(&data.condition)?;
                let condition = self.boolean(condition)?;
                let then_bound = self.bind(&data.then_expr)?;
                let else_bound = self.bind(&data.else_expr)?;
                match (then_bound, else_bound) {
                    (Bound::Boolean(a), Bound::Boolean(b)) => Ok(Bound::Boolean(Box::new(
                        move |t: &T| if condition(t)? { a(t) } else { b(t) },
                    ))),
                    (then_bound, else_bound) => {
                        let a = self.number(then_bound)?;
                        let b = self.number(else_bound)?;
                        Ok(Bound::Number(Box::new(move |t: &T| {
                            if condition(t)? { a(t) } else { b(t) }
                        })))
                    }
                }
            }
        }
    }

    /// Accessor on the root object: its own surface first, then the shared one
    fn root_accessor(&self, name: &str, args: &[ExpressionNode]) -> Result<Bound<T>> {
        if let Some(accessor) = T::accessors().get(name) {
            return self.apply(|t| Some(t), accessor, name, args);
        }
        if let Some(accessor) = CANDIDATE_ACCESSORS.get(name) {
            return self.apply(|t| Some(t.as_candidate()), accessor, name, args);
        }
        Err(NtupleError::UnknownAccessor {
            expression: self.expression.to_string(),
            object: T::KIND,
            name: name.to_string(),
        })
    }

    /// Accessor on a candidate produced by another expression
    fn member(&self, base: &ExpressionNode, name: &str, args: &[ExpressionNode]) -> Result<Bound<T>> {
        match self.bind(base)? {
            Bound::Object(get) => {
                let Some(accessor) = CANDIDATE_ACCESSORS.get(name) else {
                    return Err(NtupleError::UnknownAccessor {
                        expression: self.expression.to_string(),
                        object: ObjectKind::Other,
                        name: name.to_string(),
                    });
                };
                self.apply(get, accessor, name, args)
            }
            other => Err(NtupleError::type_mismatch(
                self.expression,
                format!("an object before '.{name}'"),
                other.value_type(),
            )),
        }
    }

    /// `name[i]`, equivalent to `name(i)` for child accessors
    fn indexed(&self, base: &ExpressionNode, index: &ExpressionNode) -> Result<Bound<T>> {
        let args = std::slice::from_ref(index);
        let (name, bound) = match base {
            ExpressionNode::Identifier(name) => (name, self.root_accessor(name, args)?),
            ExpressionNode::Path { base, path } => (path, self.member(base, path, args)?),
            other => {
                return Err(NtupleError::invalid_arguments(
                    self.expression,
                    other.to_string(),
                    "only child accessors such as 'daughter' can be indexed",
                ));
            }
        };
        match bound {
            Bound::Object(_) => Ok(bound),
            _ => Err(NtupleError::invalid_arguments(
                self.expression,
                name.as_str(),
                "only child accessors such as 'daughter' can be indexed",
            )),
        }
    }

    fn apply<S, G>(
        &self,
        get: G,
        accessor: Accessor<S>,
        name: &str,
        args: &[ExpressionNode],
    ) -> Result<Bound<T>>
    where
        S: ?Sized + 'static,
        G: for<'a> Fn(&'a T) -> Option<&'a S> + Send + Sync + 'static,
    {
        Ok(match accessor {
            Accessor::Number(f) => {
                self.no_args(name, args)?;
                Bound::Number(Box::new(move |t: &T| get(t).map(f)))
            }
            Accessor::Boolean(f) => {
                self.no_args(name, args)?;
                Bound::Boolean(Box::new(move |t: &T| get(t).map(f)))
            }
            Accessor::NumberByKey(f) => {
                let key = self.key_arg(name, args)?;
                Bound::Number(Box::new(move |t: &T| get(t).and_then(|s| f(s, &key))))
            }
            Accessor::BooleanByKey(f) => {
                let key = self.key_arg(name, args)?;
                Bound::Boolean(Box::new(move |t: &T| get(t).map(|s| f(s, &key))))
            }
            Accessor::Daughter(f) => {
                let index = self.index_arg(name, args)?;
                Bound::Object(object_fn(move |t: &T| get(t).and_then(|s| f(s, index))))
            }
        })
    }

    fn no_args(&self, name: &str, args: &[ExpressionNode]) -> Result<()> {
        if args.is_empty() {
            Ok(())
        } else {
            Err(NtupleError::invalid_arguments(
                self.expression,
                name,
                format!("takes no arguments, found {}", args.len()),
            ))
        }
    }

    fn key_arg(&self, name: &str, args: &[ExpressionNode]) -> Result<String> {
        match args {
            [ExpressionNode::Literal(LiteralValue::String(key))] => Ok(key.clone()),
            _ => Err(NtupleError::invalid_arguments(
                self.expression,
                name,
                "expects a single string literal key",
            )),
        }
    }

    fn index_arg(&self, name: &str, args: &[ExpressionNode]) -> Result<usize> {
        match args {
            [ExpressionNode::Literal(LiteralValue::Integer(index))] => usize::try_from(*index)
                .map_err(|_| {
                    NtupleError::invalid_arguments(
                        self.expression,
                        name,
                        format!("index {index} is negative"),
                    )
                }),
            _ => Err(NtupleError::invalid_arguments(
                self.expression,
                name,
                "expects a single non-negative integer literal index",
            )),
        }
    }

    fn builtin_call(&self, name: &str, builtin: Builtin, args: &[ExpressionNode]) -> Result<Bound<T>> {
        if args.len() != builtin.arity() {
            return Err(NtupleError::invalid_arguments(
                self.expression,
                name,
                format!("expects {} arguments, found {}", builtin.arity(), args.len()),
            ));
        }
        let mut numbers = Vec::with_capacity(args.len());
        for arg in args {
            let bound = self.bind(arg)?;
            numbers.push(self.number(bound)?);
        }
        let mut numbers = numbers.into_iter();
        let mut next = || {
            numbers.next().ok_or_else(|| {
                NtupleError::invalid_arguments(self.expression, name, "missing argument")
            })
        };

        let call: NumberFn<T> = match builtin {
            Builtin::Unary(f) => {
                let a = next()?;
                Box::new(move |t: &T| Some(f(a(t)?)))
            }
            Builtin::Binary(f) => {
                let (a, b) = (next()?, next()?);
                Box::new(move |t: &T| Some(f(a(t)?, b(t)?)))
            }
            Builtin::Quaternary(f) => {
                let (a, b, c, d) = (next()?, next()?, next()?, next()?);
                Box::new(move |t: &T| Some(f(a(t)?, b(t)?, c(t)?, d(t)?)))
            }
        };
        Ok(Bound::Number(call))
    }

    fn binary(&self, data: &BinaryOpData) -> Result<Bound<T>> {
        let left = self.bind(&data.left)?;
        let right = self.bind(&data.right)?;
        match data.op {
            BinaryOperator::Add => self.arithmetic(left, right, |a, b| a + b),
            BinaryOperator::Subtract => self.arithmetic(left, right, |a, b| a - b),
            BinaryOperator::Multiply => self.arithmetic(left, right, |a, b| a * b),
            BinaryOperator::Divide => self.arithmetic(left, right, |a, b| a / b),
            BinaryOperator::Power => self.arithmetic(left, right, f64::powf),
            BinaryOperator::Equal => self.equality(left, right, false),
            BinaryOperator::NotEqual => self.equality(left, right, true),
            BinaryOperator::LessThan => self.comparison(left, right, |a, b| a < b),
            BinaryOperator::LessThanOrEqual => self.comparison(left, right, |a, b| a <= b),
            BinaryOperator::GreaterThan => self.comparison(left, right, |a, b| a > b),
            BinaryOperator::GreaterThanOrEqual => self.comparison(left, right, |a, b| a >= b),
            BinaryOperator::And => {
                let (l, r) = (self.boolean(left)?, self.boolean(right)?);
                Ok(Bound::Boolean(Box::new(move |t: &T| {
                    if l(t)? { r(t) } else { Some(false) }
                })))
            }
            BinaryOperator::Or => {
                let (l, r) = (self.boolean(left)?, self.boolean(right)?);
                Ok(Bound::Boolean(Box::new(move |t: &T| {
                    if l(t)? { Some(true) } else { r(t) }
                })))
            }
        }
    }

    fn arithmetic(&self, left: Bound<T>, right: Bound<T>, op: fn(f64, f64) -> f64) -> Result<Bound<T>> {
        let (l, r) = (self.number(left)?, self.number(right)?);
        Ok(Bound::Number(Box::new(move |t: &T| Some(op(l(t)?, r(t)?)))))
    }

    fn comparison(&self, left: Bound<T>, right: Bound<T>, op: fn(f64, f64) -> bool) -> Result<Bound<T>> {
        let (l, r) = (self.number(left)?, self.number(right)?);
        Ok(Bound::Boolean(Box::new(move |t: &T| Some(op(l(t)?, r(t)?)))))
    }

    /// Booleans compare as booleans, anything else numerically
    fn equality(&self, left: Bound<T>, right: Bound<T>, negate: bool) -> Result<Bound<T>> {
        match (left, right) {
            (Bound::Boolean(l), Bound::Boolean(r)) => Ok(Bound::Boolean(Box::new(move |t: &T| {
                Some((l(t)? == r(t)?) != negate)
            }))),
            (left, right) => {
                let (l, r) = (self.number(left)?, self.number(right)?);
                Ok(Bound::Boolean(Box::new(move |t: &T| {
                    Some((l(t)? == r(t)?) != negate)
                })))
            }
        }
    }

    /// Numeric view; booleans count as 1 and 0
    pub(crate) fn number(&self, bound: Bound<T>) -> Result<NumberFn<T>> {
        match bound {
            Bound::Number(f) => Ok(f),
            Bound::Boolean(f) => Ok(Box::new(move |t: &T| {
                f(t).map(|b| if b { 1.0 } else { 0.0 })
            })),
            other => Err(NtupleError::type_mismatch(
                self.expression,
                "a number",
                other.value_type(),
            )),
        }
    }

    /// Boolean view; numbers are true when non-zero and not NaN
    pub(crate) fn boolean(&self, bound: Bound<T>) -> Result<BooleanFn<T>> {
        match bound {
            Bound::Boolean(f) => Ok(f),
            Bound::Number(f) => Ok(Box::new(move |t: &T| {
                f(t).map(|x| x != 0.0 && !x.is_nan())
            })),
            other => Err(NtupleError::type_mismatch(
                self.expression,
                "a boolean",
                other.value_type(),
            )),
        }
    }
}
