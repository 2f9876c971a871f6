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

//! Pratt parser for accessor expressions

use super::error::{ParseError, ParseResult};
use super::tokenizer::{Token, Tokenizer};
use crate::ast::{Arguments, BinaryOperator, ExpressionNode, LiteralValue, UnaryOperator};
use std::borrow::Cow;

/// Operator precedence levels (higher = tighter binding)
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Precedence {
    /// Lowest precedence - ternary conditional (right associative)
    Conditional = 1,
    /// Logical OR
    Or = 2,
    /// Logical AND
    And = 3,
    /// Equality operators (==, !=)
    Equality = 4,
    /// Ordering comparisons (<, >, <=, >=)
    Comparison = 5,
    /// Additive operators (+, -)
    Additive = 6,
    /// Multiplicative operators (*, /)
    Multiplicative = 7,
    /// Prefix operators (-, +, !)
    Unary = 8,
    /// Exponentiation (right associative, binds tighter than prefix minus)
    Power = 9,
    /// Invocation/Indexing (., [])
    Invocation = 10,
}

impl Precedence {
    /// Convert precedence to raw u8 for fast comparison
    #[inline(always)]
    pub const fn as_u8(self) -> u8 {
        self as u8
    }

    /// Get the next higher precedence level for left-associative operators
    #[inline(always)]
    pub const fn next_level(self) -> Self {
        match self {
            Precedence::Conditional => Precedence::Or,
            Precedence::Or => Precedence::And,
            Precedence::And => Precedence::Equality,
            Precedence::Equality => Precedence::Comparison,
            Precedence::Comparison => Precedence::Additive,
            Precedence::Additive => Precedence::Multiplicative,
            Precedence::Multiplicative => Precedence::Unary,
            Precedence::Unary => Precedence::Power,
            Precedence::Power => Precedence::Invocation,
            Precedence::Invocation => Precedence::Invocation,
        }
    }

    /// Check if this precedence is right associative
    #[inline(always)]
    pub const fn is_right_associative(self) -> bool {
        matches!(self, Precedence::Conditional | Precedence::Power)
    }
}

/// Precedence of infix tokens; `None` for anything else
#[inline(always)]
fn get_precedence(token: &Token<'_>) -> Option<Precedence> {
    match token {
        Token::LessThan
        | Token::LessThanOrEqual
        | Token::GreaterThan
        | Token::GreaterThanOrEqual => Some(Precedence::Comparison),
        Token::And => Some(Precedence::And),
        Token::Or => Some(Precedence::Or),
        Token::Plus | Token::Minus => Some(Precedence::Additive),
        Token::Multiply | Token::Divide => Some(Precedence::Multiplicative),
        Token::Equal | Token::NotEqual => Some(Precedence::Equality),
        Token::Power => Some(Precedence::Power),
        Token::Question => Some(Precedence::Conditional),
        _ => None,
    }
}

#[inline(always)]
fn token_to_binary_op(token: &Token<'_>) -> Option<BinaryOperator> {
    match token {
        Token::LessThan => Some(BinaryOperator::LessThan),
        Token::LessThanOrEqual => Some(BinaryOperator::LessThanOrEqual),
        Token::GreaterThan => Some(BinaryOperator::GreaterThan),
        Token::GreaterThanOrEqual => Some(BinaryOperator::GreaterThanOrEqual),
        Token::And => Some(BinaryOperator::And),
        Token::Or => Some(BinaryOperator::Or),
        Token::Plus => Some(BinaryOperator::Add),
        Token::Minus => Some(BinaryOperator::Subtract),
        Token::Multiply => Some(BinaryOperator::Multiply),
        Token::Divide => Some(BinaryOperator::Divide),
        Token::Equal => Some(BinaryOperator::Equal),
        Token::NotEqual => Some(BinaryOperator::NotEqual),
        Token::Power => Some(BinaryOperator::Power),
        _ => None,
    }
}

/// Deepest expression tree accepted by [`parse_expression_pratt`]
pub const DEFAULT_MAX_DEPTH: usize = 256;

/// A parsed subtree and its depth, counted as in [`ExpressionNode::depth`]
type Parsed = (ExpressionNode, usize);

/// Pratt parser over a token stream
///
/// Parses a primary expression with its postfix invocations, then folds
/// infix operators while their precedence is at least the current minimum.
/// Left-associative operators parse their right operand one level tighter,
/// right-associative ones (`^`, `? :`) at the same level.
///
/// Both the recursion nesting and the depth of every built subtree are
/// bounded by `max_depth`, so neither the parser nor later tree walks can
/// run out of stack on hostile input.
pub struct PrattParser<'input> {
    tokenizer: Tokenizer<'input>,
    current_token: Option<Token<'input>>,
    current_pos: usize,
    max_depth: usize,
    nesting: usize,
}

impl<'input> PrattParser<'input> {
    /// Create a parser for `input`
    pub fn new(input: &'input str) -> Self {
        Self::with_max_depth(input, DEFAULT_MAX_DEPTH)
    }

    /// Create a parser that rejects trees deeper than `max_depth`
    pub fn with_max_depth(input: &'input str, max_depth: usize) -> Self {
        Self {
            tokenizer: Tokenizer::new(input),
            current_token: None,
            current_pos: 0,
            max_depth,
            nesting: 0,
        }
    }

    fn advance(&mut self) -> ParseResult<()> {
        self.current_token = self.tokenizer.next_token()?;
        self.current_pos = match self.current_token {
            Some(_) => self.tokenizer.token_start(),
            None => self.tokenizer.position(),
        };
        Ok(())
    }

    #[inline(always)]
    fn current(&self) -> Option<&Token<'input>> {
        self.current_token.as_ref()
    }

    #[inline]
    fn check_depth(&self, depth: usize) -> ParseResult<usize> {
        if depth > self.max_depth {
            return Err(ParseError::TooDeep {
                limit: self.max_depth,
                position: self.current_pos,
            });
        }
        Ok(depth)
    }

    fn unexpected(&self) -> ParseError {
        match &self.current_token {
            Some(token) => ParseError::UnexpectedToken {
                token: token.describe(),
                position: self.current_pos,
            },
            None => ParseError::UnexpectedEndOfInput {
                position: self.current_pos,
            },
        }
    }

    fn expect(&mut self, expected: Token<'input>) -> ParseResult<()> {
        match &self.current_token {
            Some(token) if *token == expected => self.advance(),
            Some(_) => Err(ParseError::ExpectedToken {
                expected: Cow::Owned(format!("'{}'", expected.describe())),
                position: self.current_pos,
            }),
            None => Err(ParseError::UnexpectedEndOfInput {
                position: self.current_pos,
            }),
        }
    }

    /// Parse the whole input as one expression
    pub fn parse(mut self) -> ParseResult<ExpressionNode> {
        self.advance()?;
        if self.current_token.is_none() {
            return Err(ParseError::EmptyExpression);
        }

        let (expr, _) = self.parse_expression_with_precedence(Precedence::Conditional)?;
        if self.current_token.is_some() {
            return Err(self.unexpected());
        }
        Ok(expr)
    }

    fn parse_expression_with_precedence(
        &mut self,
        min_precedence: Precedence,
    ) -> ParseResult<Parsed> {
        self.nesting = self.check_depth(self.nesting + 1)?;
        let parsed = self.parse_infix(min_precedence);
        self.nesting -= 1;
        parsed
    }

    fn parse_infix(&mut self, min_precedence: Precedence) -> ParseResult<Parsed> {
        let (mut left, mut depth) = self.parse_unary()?;

        while let Some(token) = self.current() {
            let Some(precedence) = get_precedence(token) else {
                break;
            };
            if precedence < min_precedence {
                break;
            }

            if matches!(token, Token::Question) {
                self.advance()?;
                let (then_expr, then_depth) =
                    self.parse_expression_with_precedence(Precedence::Conditional)?;
                self.expect(Token::Colon)?;
                let (else_expr, else_depth) =
                    self.parse_expression_with_precedence(Precedence::Conditional)?;
                depth = self.check_depth(depth.max(then_depth).max(else_depth) + 1)?;
                left = ExpressionNode::conditional(left, then_expr, else_expr);
                continue;
            }

            let Some(op) = token_to_binary_op(token) else {
                break;
            };
            self.advance()?;

            let next_precedence = if precedence.is_right_associative() {
                precedence
            } else {
                precedence.next_level()
            };
            let (right, right_depth) = self.parse_expression_with_precedence(next_precedence)?;
            depth = self.check_depth(depth.max(right_depth) + 1)?;
            left = ExpressionNode::binary_op(op, left, right);
        }

        Ok((left, depth))
    }

    /// Prefix operators bind looser than `^` and postfix invocation
    fn parse_unary(&mut self) -> ParseResult<Parsed> {
        let op = match self.current() {
            Some(Token::Minus) => Some(UnaryOperator::Negate),
            Some(Token::Not) => Some(UnaryOperator::Not),
            Some(Token::Plus) => None,
            _ => {
                let primary = self.parse_primary()?;
                return self.parse_postfix(primary);
            }
        };
        self.advance()?;
        let (operand, depth) = self.parse_expression_with_precedence(Precedence::Unary)?;
        match op {
            Some(op) => Ok((
                ExpressionNode::unary_op(op, operand),
                self.check_depth(depth + 1)?,
            )),
            None => Ok((operand, depth)),
        }
    }

    fn parse_primary(&mut self) -> ParseResult<Parsed> {
        match self.current() {
            Some(Token::Identifier(name)) => {
                let name = *name;
                self.advance()?;
                if let Some(Token::LeftParen) = self.current() {
                    let (args, depth) = self.parse_arguments()?;
                    Ok((
                        ExpressionNode::function_call(name, args),
                        self.check_depth(depth + 1)?,
                    ))
                } else {
                    Ok((ExpressionNode::identifier(name), 1))
                }
            }
            Some(Token::Integer(value)) => {
                let value = *value;
                self.advance()?;
                Ok((ExpressionNode::literal(LiteralValue::Integer(value)), 1))
            }
            Some(Token::Decimal(text)) => {
                let text = *text;
                let position = self.current_pos;
                let value = text.parse::<f64>().map_err(|_| ParseError::InvalidNumber {
                    literal: text.to_string(),
                    position,
                })?;
                self.advance()?;
                Ok((ExpressionNode::literal(LiteralValue::Float(value)), 1))
            }
            Some(Token::String(raw)) => {
                let value = process_string_escapes(raw);
                self.advance()?;
                Ok((ExpressionNode::literal(LiteralValue::String(value)), 1))
            }
            Some(Token::True) => {
                self.advance()?;
                Ok((ExpressionNode::literal(LiteralValue::Boolean(true)), 1))
            }
            Some(Token::False) => {
                self.advance()?;
                Ok((ExpressionNode::literal(LiteralValue::Boolean(false)), 1))
            }
            Some(Token::LeftParen) => {
                self.advance()?;
                let parsed = self.parse_expression_with_precedence(Precedence::Conditional)?;
                self.expect(Token::RightParen)?;
                Ok(parsed)
            }
            _ => Err(self.unexpected()),
        }
    }

    /// Member access and indexing, left to right
    fn parse_postfix(&mut self, (mut expr, mut depth): Parsed) -> ParseResult<Parsed> {
        loop {
            match self.current() {
                Some(Token::Dot) => {
                    self.advance()?;
                    let Some(Token::Identifier(name)) = self.current() else {
                        return Err(ParseError::ExpectedToken {
                            expected: Cow::Borrowed("accessor name after '.'"),
                            position: self.current_pos,
                        });
                    };
                    let name = *name;
                    self.advance()?;
                    expr = if let Some(Token::LeftParen) = self.current() {
                        let (args, args_depth) = self.parse_arguments()?;
                        depth = depth.max(args_depth);
                        ExpressionNode::method_call(expr, name, args)
                    } else {
                        ExpressionNode::path(expr, name)
                    };
                    depth = self.check_depth(depth + 1)?;
                }
                Some(Token::LeftBracket) => {
                    self.advance()?;
                    let (index, index_depth) =
                        self.parse_expression_with_precedence(Precedence::Conditional)?;
                    self.expect(Token::RightBracket)?;
                    depth = self.check_depth(depth.max(index_depth) + 1)?;
                    expr = ExpressionNode::index(expr, index);
                }
                _ => return Ok((expr, depth)),
            }
        }
    }

    /// Parenthesized, comma separated arguments; current token is `(`.
    /// Returns the arguments with the depth of the deepest one.
    fn parse_arguments(&mut self) -> ParseResult<(Arguments, usize)> {
        self.advance()?;
        let mut args = Arguments::new();
        let mut depth = 0;
        if let Some(Token::RightParen) = self.current() {
            self.advance()?;
            return Ok((args, depth));
        }

        loop {
            let (arg, arg_depth) = self.parse_expression_with_precedence(Precedence::Conditional)?;
            depth = depth.max(arg_depth);
            args.push(arg);
            match self.current() {
                Some(Token::Comma) => self.advance()?,
                Some(Token::RightParen) => {
                    self.advance()?;
                    return Ok((args, depth));
                }
                Some(_) => {
                    return Err(ParseError::ExpectedToken {
                        expected: Cow::Borrowed("',' or ')'"),
                        position: self.current_pos,
                    });
                }
                None => {
                    return Err(ParseError::UnexpectedEndOfInput {
                        position: self.current_pos,
                    });
                }
            }
        }
    }
}

/// `\x` stands for `x`
fn process_string_escapes(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(ch) = chars.next() {
        if ch == '\\' {
            if let Some(escaped) = chars.next() {
                out.push(escaped);
            }
        } else {
            out.push(ch);
        }
    }
    out
}

/// Parse an expression string into an AST
pub fn parse_expression_pratt(input: &str) -> ParseResult<ExpressionNode> {
    PrattParser::new(input).parse()
}

/// Parse an expression string, rejecting trees deeper than `max_depth`
pub fn parse_expression_with_max_depth(
    input: &str,
    max_depth: usize,
) -> ParseResult<ExpressionNode> {
    PrattParser::with_max_depth(input, max_depth).parse()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn render(input: &str) -> String {
        parse_expression_pratt(input).unwrap().to_string()
    }

    #[rstest]
    #[case("pt > 20 && abs(eta) < 2.4", "((pt > 20) && (abs(eta) < 2.4))")]
    #[case("a + b * c", "(a + (b * c))")]
    #[case("a - b - c", "((a - b) - c)")]
    #[case("a ^ b ^ c", "(a ^ (b ^ c))")]
    #[case("-a ^ 2", "(-(a ^ 2))")]
    #[case("!isEB || isEE", "((!isEB) || isEE)")]
    #[case("not isEB and pt >= 10", "((!isEB) && (pt >= 10))")]
    #[case("a || b && c", "(a || (b && c))")]
    #[case("a == b != c", "((a == b) != c)")]
    #[case("pt = 5", "(pt == 5)")]
    #[case("isEB ? 1 : isEE ? 2 : 3", "(isEB ? 1 : (isEE ? 2 : 3))")]
    #[case("(a + b) * c", "((a + b) * c)")]
    #[case("+pt", "pt")]
    fn test_precedence(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(render(input), expected);
    }

    #[test]
    fn test_accessor_chains() {
        assert_eq!(
            render("daughter(0).pt() - daughter[1].pt"),
            "(daughter(0).pt() - daughter[1].pt)"
        );
        assert_eq!(
            render("daughter(0).daughter(1).userFloat(\"iso\")"),
            "daughter(0).daughter(1).userFloat(\"iso\")"
        );
        assert_eq!(render("deltaR(eta, phi, 0.5, -1.2)"), "deltaR(eta, phi, 0.5, (-1.2))");
    }

    #[test]
    fn test_string_escapes() {
        let expr = parse_expression_pratt(r"userFloat('a\'b')").unwrap();
        let ExpressionNode::FunctionCall(call) = expr else {
            panic!("expected a function call");
        };
        assert_eq!(
            call.args[0],
            ExpressionNode::literal(LiteralValue::String("a'b".to_string()))
        );
    }

    #[rstest]
    #[case("", ParseError::EmptyExpression)]
    #[case("pt >", ParseError::UnexpectedEndOfInput { position: 4 })]
    #[case("pt pt", ParseError::UnexpectedToken { token: Cow::Borrowed("pt"), position: 3 })]
    #[case("(pt", ParseError::UnexpectedEndOfInput { position: 3 })]
    #[case("abs(pt eta)", ParseError::ExpectedToken { expected: Cow::Borrowed("',' or ')'"), position: 7 })]
    #[case("a ? b", ParseError::UnexpectedEndOfInput { position: 5 })]
    #[case("daughter(0).", ParseError::ExpectedToken { expected: Cow::Borrowed("accessor name after '.'"), position: 12 })]
    fn test_syntax_errors(#[case] input: &str, #[case] expected: ParseError) {
        assert_eq!(parse_expression_pratt(input).unwrap_err(), expected);
    }

    #[test]
    fn test_nesting_limit() {
        assert_eq!(
            parse_expression_with_max_depth("(((a)))", 2).unwrap_err(),
            ParseError::TooDeep { limit: 2, position: 2 }
        );
        assert_eq!(
            parse_expression_with_max_depth("((a))", 3).unwrap(),
            ExpressionNode::identifier("a")
        );
        assert!(matches!(
            parse_expression_with_max_depth("a + b + c", 2),
            Err(ParseError::TooDeep { limit: 2, .. })
        ));
    }

    #[test]
    fn test_tree_depth_matches_node_depth() {
        for input in ["a + b + c", "-daughter(0).pt ^ 2", "x[1 + y].z(w ? 1 : 2)", "f(g(h(1)))"] {
            let depth = parse_expression_pratt(input).unwrap().depth();
            assert!(parse_expression_with_max_depth(input, depth).is_ok(), "{input}");
            assert!(parse_expression_with_max_depth(input, depth - 1).is_err(), "{input}");
        }
    }

    #[rstest]
    #[case(format!("{}1{}", "(".repeat(50_000), ")".repeat(50_000)))]
    #[case(format!("{}1", "!".repeat(50_000)))]
    #[case(format!("a{}", ".b".repeat(50_000)))]
    #[case(format!("1{}", " ^ 1".repeat(50_000)))]
    fn test_hostile_nesting_fails_cleanly(#[case] input: String) {
        assert!(matches!(
            parse_expression_pratt(&input),
            Err(ParseError::TooDeep { limit: DEFAULT_MAX_DEPTH, .. })
        ));
    }
}
