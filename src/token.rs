//! Token vocabulary of span expressions.

use std::fmt;
use std::mem;

use serde::Serialize;

/// Kind of a scanned token.  `STRING` and `NUMBER` carry their decoded
/// literal; every other kind is fully described by its lexeme.
///
/// Variant names are upper-case because `lazyfmt tokenize` prints them as is.
#[allow(non_camel_case_types)]
#[derive(Debug, Clone, Serialize)]
pub enum TokenType {
    // ( ) [ ] , .
    LEFT_PAREN,
    RIGHT_PAREN,
    LEFT_BRACKET,
    RIGHT_BRACKET,
    COMMA,
    DOT,

    // arithmetic
    MINUS,
    PLUS,
    SLASH,
    STAR,
    PERCENT,

    // negation, equality, ordering
    BANG,
    BANG_EQUAL,
    EQUAL_EQUAL,
    GREATER,
    GREATER_EQUAL,
    LESS,
    LESS_EQUAL,

    IDENTIFIER,
    STRING(String),
    NUMBER(f64),

    // keywords
    AND,
    OR,
    NOT,
    TRUE,
    FALSE,
    NIL,

    EOF,
}

impl PartialEq for TokenType {
    /// Compares the kind only; literal payloads are ignored.
    fn eq(&self, other: &Self) -> bool {
        mem::discriminant(self) == mem::discriminant(other)
    }
}

impl TokenType {
    pub fn name(&self) -> &'static str {
        use TokenType::*;

        match self {
            LEFT_PAREN => "LEFT_PAREN",
            RIGHT_PAREN => "RIGHT_PAREN",
            LEFT_BRACKET => "LEFT_BRACKET",
            RIGHT_BRACKET => "RIGHT_BRACKET",
            COMMA => "COMMA",
            DOT => "DOT",
            MINUS => "MINUS",
            PLUS => "PLUS",
            SLASH => "SLASH",
            STAR => "STAR",
            PERCENT => "PERCENT",
            BANG => "BANG",
            BANG_EQUAL => "BANG_EQUAL",
            EQUAL_EQUAL => "EQUAL_EQUAL",
            GREATER => "GREATER",
            GREATER_EQUAL => "GREATER_EQUAL",
            LESS => "LESS",
            LESS_EQUAL => "LESS_EQUAL",
            IDENTIFIER => "IDENTIFIER",
            STRING(_) => "STRING",
            NUMBER(_) => "NUMBER",
            AND => "AND",
            OR => "OR",
            NOT => "NOT",
            TRUE => "TRUE",
            FALSE => "FALSE",
            NIL => "NIL",
            EOF => "EOF",
        }
    }
}

/// One lexeme of a span, located by its byte offset in the whole template.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Token<'a> {
    pub token_type: TokenType,
    pub lexeme: &'a str,
    pub offset: usize,
}

impl<'a> Token<'a> {
    pub fn new(token_type: TokenType, lexeme: &'a str, offset: usize) -> Self {
        Self {
            token_type,
            lexeme,
            offset,
        }
    }
}

impl fmt::Display for Token<'_> {
    /// `KIND lexeme literal`, with `null` for kinds that carry no literal and
    /// whole numbers printed with one decimal (`3` → `3.0`).
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} ", self.token_type.name(), self.lexeme)?;

        match &self.token_type {
            TokenType::STRING(s) => f.write_str(s),
            TokenType::NUMBER(n) if n.fract() == 0.0 && n.abs() < i64::MAX as f64 => {
                let mut digits = itoa::Buffer::new();
                write!(f, "{}.0", digits.format(*n as i64))
            }
            // Whole, but past what i64 holds.
            TokenType::NUMBER(n) if n.fract() == 0.0 => write!(f, "{:.1}", n),
            TokenType::NUMBER(n) => write!(f, "{}", n),
            _ => f.write_str("null"),
        }
    }
}
