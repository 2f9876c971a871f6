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

//! Byte-oriented tokenizer for accessor expressions
//!
//! Zero-copy: identifiers, strings and decimals are slices of the input.

use super::error::{ParseError, ParseResult};
use once_cell::sync::Lazy;
use rustc_hash::FxHashMap;
use std::borrow::Cow;

/// Expression token
#[derive(Debug, Clone, PartialEq)]
pub enum Token<'input> {
    // Literals
    /// Integer literal (e.g., 0, 20)
    Integer(i64),
    /// Decimal literal as string slice, parsed on demand (e.g., 2.5, 1e-3)
    Decimal(&'input str),
    /// String literal contents without quotes, escapes unprocessed
    String(&'input str),
    /// Boolean literal true
    True,
    /// Boolean literal false
    False,

    /// Accessor or function name
    Identifier(&'input str),

    // Operators
    /// Addition operator (+)
    Plus,
    /// Subtraction operator (-)
    Minus,
    /// Multiplication operator (*)
    Multiply,
    /// Division operator (/)
    Divide,
    /// Power operator (^)
    Power,
    /// Equality operator (== or =)
    Equal,
    /// Inequality operator (!=)
    NotEqual,
    /// Less than operator (<)
    LessThan,
    /// Less than or equal operator (<=)
    LessThanOrEqual,
    /// Greater than operator (>)
    GreaterThan,
    /// Greater than or equal operator (>=)
    GreaterThanOrEqual,
    /// Logical AND operator (&& or and)
    And,
    /// Logical OR operator (|| or or)
    Or,
    /// Logical NOT operator (! or not)
    Not,
    /// Conditional operator (?)
    Question,
    /// Conditional separator (:)
    Colon,

    // Delimiters
    /// Left parenthesis (
    LeftParen,
    /// Right parenthesis )
    RightParen,
    /// Left square bracket [
    LeftBracket,
    /// Right square bracket ]
    RightBracket,
    /// Dot operator (.) for member access
    Dot,
    /// Comma separator (,)
    Comma,
}

impl Token<'_> {
    /// Short description used in error messages
    pub fn describe(&self) -> Cow<'static, str> {
        match self {
            Token::Integer(value) => Cow::Owned(value.to_string()),
            Token::Decimal(value) | Token::Identifier(value) => Cow::Owned((*value).to_string()),
            Token::String(value) => Cow::Owned(format!("\"{value}\"")),
            Token::True => Cow::Borrowed("true"),
            Token::False => Cow::Borrowed("false"),
            Token::Plus => Cow::Borrowed("+"),
            Token::Minus => Cow::Borrowed("-"),
            Token::Multiply => Cow::Borrowed("*"),
            Token::Divide => Cow::Borrowed("/"),
            Token::Power => Cow::Borrowed("^"),
            Token::Equal => Cow::Borrowed("=="),
            Token::NotEqual => Cow::Borrowed("!="),
            Token::LessThan => Cow::Borrowed("<"),
            Token::LessThanOrEqual => Cow::Borrowed("<="),
            Token::GreaterThan => Cow::Borrowed(">"),
            Token::GreaterThanOrEqual => Cow::Borrowed(">="),
            Token::And => Cow::Borrowed("&&"),
            Token::Or => Cow::Borrowed("||"),
            Token::Not => Cow::Borrowed("!"),
            Token::Question => Cow::Borrowed("?"),
            Token::Colon => Cow::Borrowed(":"),
            Token::LeftParen => Cow::Borrowed("("),
            Token::RightParen => Cow::Borrowed(")"),
            Token::LeftBracket => Cow::Borrowed("["),
            Token::RightBracket => Cow::Borrowed("]"),
            Token::Dot => Cow::Borrowed("."),
            Token::Comma => Cow::Borrowed(","),
        }
    }
}

/// Word operators and literals
static KEYWORD_TABLE: Lazy<FxHashMap<&'static str, Token<'static>>> = Lazy::new(|| {
    let mut table = FxHashMap::default();
    table.insert("and", Token::And);
    table.insert("or", Token::Or);
    table.insert("not", Token::Not);
    table.insert("true", Token::True);
    table.insert("false", Token::False);
    table
});

/// Tokenizer over a single expression string
#[derive(Clone)]
pub struct Tokenizer<'input> {
    input: &'input str,
    bytes: &'input [u8],
    pos: usize,
    token_start: usize,
}

impl<'input> Tokenizer<'input> {
    /// Create a tokenizer positioned at the start of `input`
    pub fn new(input: &'input str) -> Self {
        Self {
            input,
            bytes: input.as_bytes(),
            pos: 0,
            token_start: 0,
        }
    }

    /// Byte position where the most recently returned token starts
    pub fn token_start(&self) -> usize {
        self.token_start
    }

    /// Current byte position
    pub fn position(&self) -> usize {
        self.pos
    }

    fn slice(&self, start: usize, end: usize) -> &'input str {
        // Token boundaries always fall on ASCII bytes
        self.input.get(start..end).unwrap_or("")
    }

    #[inline(always)]
    fn peek_byte(&self, offset: usize) -> Option<u8> {
        self.bytes.get(self.pos + offset).copied()
    }

    #[inline(always)]
    fn is_id_start(ch: u8) -> bool {
        matches!(ch, b'A'..=b'Z' | b'a'..=b'z' | b'_')
    }

    #[inline(always)]
    fn is_id_continue(ch: u8) -> bool {
        matches!(ch, b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'_')
    }

    fn skip_whitespace(&mut self) {
        while let Some(b' ' | b'\t' | b'\r' | b'\n') = self.peek_byte(0) {
            self.pos += 1;
        }
    }

    fn skip_digits(&mut self) {
        while self.peek_byte(0).is_some_and(|b| b.is_ascii_digit()) {
            self.pos += 1;
        }
    }

    /// Integer, or decimal with optional fraction and exponent
    fn parse_number(&mut self) -> ParseResult<Token<'input>> {
        let start = self.pos;
        self.skip_digits();

        let mut is_decimal = false;
        if self.peek_byte(0) == Some(b'.') && self.peek_byte(1).is_some_and(|b| b.is_ascii_digit())
        {
            is_decimal = true;
            self.pos += 1;
            self.skip_digits();
        }

        if matches!(self.peek_byte(0), Some(b'e' | b'E')) {
            let digits_at = match self.peek_byte(1) {
                Some(b'+' | b'-') => 2,
                _ => 1,
            };
            if self.peek_byte(digits_at).is_some_and(|b| b.is_ascii_digit()) {
                is_decimal = true;
                self.pos += digits_at;
                self.skip_digits();
            }
        }

        let text = self.slice(start, self.pos);
        if is_decimal {
            return Ok(Token::Decimal(text));
        }
        text.parse::<i64>()
            .map(Token::Integer)
            .map_err(|_| ParseError::InvalidNumber {
                literal: text.to_string(),
                position: start,
            })
    }

    fn parse_identifier(&mut self) -> Token<'input> {
        let start = self.pos;
        while self.peek_byte(0).is_some_and(Self::is_id_continue) {
            self.pos += 1;
        }
        let word = self.slice(start, self.pos);
        match KEYWORD_TABLE.get(word) {
            Some(keyword) => keyword.clone(),
            None => Token::Identifier(word),
        }
    }

    /// String literal delimited by `quote`; `\` escapes the next byte
    fn parse_string_literal(&mut self, quote: u8) -> ParseResult<&'input str> {
        let open = self.pos;
        self.pos += 1;
        let start = self.pos;

        while let Some(byte) = self.peek_byte(0) {
            if byte == quote {
                let content = self.slice(start, self.pos);
                self.pos += 1;
                return Ok(content);
            }
            self.pos += if byte == b'\\' { 2 } else { 1 };
        }

        Err(ParseError::UnclosedString { position: open })
    }

    fn single(&mut self, token: Token<'input>) -> Token<'input> {
        self.pos += 1;
        token
    }

    /// One or two byte operator, depending on whether `second` follows
    fn pair(&mut self, second: u8, double: Token<'input>, single: Token<'input>) -> Token<'input> {
        if self.peek_byte(1) == Some(second) {
            self.pos += 2;
            double
        } else {
            self.pos += 1;
            single
        }
    }

    /// Next token, or `None` at end of input
    pub fn next_token(&mut self) -> ParseResult<Option<Token<'input>>> {
        self.skip_whitespace();
        self.token_start = self.pos;

        let Some(byte) = self.peek_byte(0) else {
            return Ok(None);
        };

        let token = match byte {
            b'.' if self.peek_byte(1).is_some_and(|b| b.is_ascii_digit()) => {
                self.parse_number()?
            }
            b'.' => self.single(Token::Dot),
            b'(' => self.single(Token::LeftParen),
            b')' => self.single(Token::RightParen),
            b'[' => self.single(Token::LeftBracket),
            b']' => self.single(Token::RightBracket),
            b',' => self.single(Token::Comma),
            b'+' => self.single(Token::Plus),
            b'-' => self.single(Token::Minus),
            b'*' => self.single(Token::Multiply),
            b'/' => self.single(Token::Divide),
            b'^' => self.single(Token::Power),
            b'?' => self.single(Token::Question),
            b':' => self.single(Token::Colon),
            b'<' => self.pair(b'=', Token::LessThanOrEqual, Token::LessThan),
            b'>' => self.pair(b'=', Token::GreaterThanOrEqual, Token::GreaterThan),
            b'=' => self.pair(b'=', Token::Equal, Token::Equal),
            b'!' => self.pair(b'=', Token::NotEqual, Token::Not),
            b'&' if self.peek_byte(1) == Some(b'&') => {
                self.pos += 2;
                Token::And
            }
            b'|' if self.peek_byte(1) == Some(b'|') => {
                self.pos += 2;
                Token::Or
            }
            b'\'' | b'"' => Token::String(self.parse_string_literal(byte)?),
            b'0'..=b'9' => self.parse_number()?,
            b if Self::is_id_start(b) => self.parse_identifier(),
            _ => {
                let ch = self
                    .input
                    .get(self.pos..)
                    .and_then(|rest| rest.chars().next())
                    .unwrap_or(char::REPLACEMENT_CHARACTER);
                return Err(ParseError::InvalidCharacter {
                    ch,
                    position: self.pos,
                });
            }
        };

        Ok(Some(token))
    }

    /// Tokenize the whole input
    pub fn tokenize_all(&mut self) -> ParseResult<Vec<Token<'input>>> {
        let mut tokens = Vec::new();
        while let Some(token) = self.next_token()? {
            tokens.push(token);
        }
        Ok(tokens)
    }
}
