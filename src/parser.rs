//! Expression parser for template spans.
//!
//! Every `{…}` span holds exactly one expression: no statements, no
//! assignment.  The parser reads the token slice the
//! [`Scanner`](crate::scanner::Scanner) produced for one span and must land on
//! `EOF` afterwards, otherwise the span is rejected.
//!
//! Infix operators are parsed by precedence climbing over a binding-power
//! table; prefix operators and the postfix forms (call, `.attr`,
//! `[index]`) bind tighter than any infix operator.
//!
//! ```text
//! span     → expr EOF
//! expr     → prefix ( INFIX expr )*          -- by binding power, left assoc.
//! prefix   → ( "-" | "!" | "not" ) prefix | postfix
//! postfix  → primary ( "(" args? ")" | "." IDENT | "[" expr "]" )*
//! args     → expr ( "," expr )* ","?
//! primary  → NUMBER | STRING | "true" | "false" | "nil" | IDENT | "(" expr ")"
//! ```
//!
//! | power | operators            |
//! |------:|----------------------|
//! | 1     | `or`                 |
//! | 2     | `and`                |
//! | 3     | `==` `!=`            |
//! | 4     | `<` `<=` `>` `>=`    |
//! | 5     | `+` `-`              |
//! | 6     | `*` `/` `%`          |

use crate::error::{LazyError, Result};
use crate::token::{Token, TokenType};

use log::{debug, info};
use serde::Serialize;

/// Constant written directly in a span, copied out of its token.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum LiteralValue {
    Number(f64),

    /// Quotes stripped, escapes decoded.
    Str(String),

    True,
    False,
    Nil,
}

/// Syntax tree of one span.  Nodes borrow their tokens from the slice the
/// [`Parser`] was built over.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Expr<'a> {
    Literal(LiteralValue),

    /// `-n`, `!flag`, `not flag`
    Unary {
        operator: &'a Token<'a>,
        right: Box<Expr<'a>>,
    },

    /// Arithmetic, comparison and equality.
    Binary {
        left: Box<Expr<'a>>,
        operator: &'a Token<'a>,
        right: Box<Expr<'a>>,
    },

    /// `and` / `or`; the right operand is only evaluated when needed.
    Logical {
        left: Box<Expr<'a>>,
        operator: &'a Token<'a>,
        right: Box<Expr<'a>>,
    },

    Grouping(Box<Expr<'a>>),

    /// A captured name, looked up in the scope snapshot at render time.
    Variable(&'a Token<'a>),

    /// `len(items)`
    Call {
        callee: Box<Expr<'a>>,
        /// Closing `)`, used to locate arity and call errors.
        paren: &'a Token<'a>,
        arguments: Vec<Expr<'a>>,
    },

    /// `user.name`
    Get {
        object: Box<Expr<'a>>,
        name: &'a Token<'a>,
    },

    /// `items[0]`
    Index {
        object: Box<Expr<'a>>,
        /// Closing `]`, used to locate index errors.
        bracket: &'a Token<'a>,
        index: Box<Expr<'a>>,
    },
}

impl<'a> Expr<'a> {
    /// Byte offset in the template of the token that best locates this node.
    pub fn offset(&self) -> Option<usize> {
        match self {
            Expr::Literal(_) => None,
            Expr::Unary { operator, .. } => Some(operator.offset),
            Expr::Binary { operator, .. } | Expr::Logical { operator, .. } => {
                Some(operator.offset)
            }
            Expr::Grouping(inner) => inner.offset(),
            Expr::Variable(name) | Expr::Get { name, .. } => Some(name.offset),
            Expr::Call { paren, .. } => Some(paren.offset),
            Expr::Index { bracket, .. } => Some(bracket.offset),
        }
    }
}

/// Binding power of an infix operator, or `None` when `token_type` cannot
/// continue an expression.  Higher binds tighter.
fn infix_power(token_type: &TokenType) -> Option<u8> {
    let power: u8 = match token_type {
        TokenType::OR => 1,
        TokenType::AND => 2,
        TokenType::EQUAL_EQUAL | TokenType::BANG_EQUAL => 3,
        TokenType::LESS
        | TokenType::LESS_EQUAL
        | TokenType::GREATER
        | TokenType::GREATER_EQUAL => 4,
        TokenType::PLUS | TokenType::MINUS => 5,
        TokenType::STAR | TokenType::SLASH | TokenType::PERCENT => 6,
        _ => return None,
    };

    Some(power)
}

/// Parser over the immutable token slice of one span.
pub struct Parser<'a> {
    tokens: &'a [Token<'a>],
    current: usize,
}

impl<'a> Parser<'a> {
    /// `tokens` must end with an `EOF` token, which is what
    /// [`crate::scanner::tokenize`] produces.
    pub fn new(tokens: &'a [Token<'a>]) -> Self {
        debug!("Parser over {} tokens", tokens.len());

        Self { tokens, current: 0 }
    }

    /// Parse the whole span as one expression.
    pub fn parse(&mut self) -> Result<Expr<'a>> {
        let expr: Expr<'a> = self.expression()?;

        let trailing: &'a Token<'a> = self.peek();
        if trailing.token_type != TokenType::EOF {
            return Err(LazyError::parse(
                trailing.offset,
                format!("Unexpected '{}' after expression", trailing.lexeme),
            ));
        }

        info!("Parsed span expression at {:?}", expr.offset());

        Ok(expr)
    }

    fn expression(&mut self) -> Result<Expr<'a>> {
        self.infix(0)
    }

    /// Precedence climbing: fold operators that bind tighter than
    /// `min_power` into the left operand.
    fn infix(&mut self, min_power: u8) -> Result<Expr<'a>> {
        let mut left: Expr<'a> = self.prefix()?;

        while let Some(power) = infix_power(&self.peek().token_type) {
            if power <= min_power {
                break;
            }

            let operator: &'a Token<'a> = self.advance();
            let right: Box<Expr<'a>> = Box::new(self.infix(power)?);
            let left_operand: Box<Expr<'a>> = Box::new(left);

            left = match operator.token_type {
                TokenType::AND | TokenType::OR => Expr::Logical {
                    left: left_operand,
                    operator,
                    right,
                },
                _ => Expr::Binary {
                    left: left_operand,
                    operator,
                    right,
                },
            };
        }

        Ok(left)
    }

    fn prefix(&mut self) -> Result<Expr<'a>> {
        match self.peek().token_type {
            TokenType::MINUS | TokenType::BANG | TokenType::NOT => {
                let operator: &'a Token<'a> = self.advance();
                let right: Expr<'a> = self.prefix()?;

                Ok(Expr::Unary {
                    operator,
                    right: Box::new(right),
                })
            }
            _ => self.postfix(),
        }
    }

    fn postfix(&mut self) -> Result<Expr<'a>> {
        let mut expr: Expr<'a> = self.primary()?;

        loop {
            expr = match self.peek().token_type {
                TokenType::LEFT_PAREN => {
                    self.advance();
                    let arguments: Vec<Expr<'a>> = self.arguments()?;
                    let paren: &'a Token<'a> =
                        self.consume(TokenType::RIGHT_PAREN, "Expected ')' to close the call")?;

                    Expr::Call {
                        callee: Box::new(expr),
                        paren,
                        arguments,
                    }
                }

                TokenType::DOT => {
                    self.advance();
                    let name: &'a Token<'a> =
                        self.consume(TokenType::IDENTIFIER, "Expected attribute name after '.'")?;

                    Expr::Get {
                        object: Box::new(expr),
                        name,
                    }
                }

                TokenType::LEFT_BRACKET => {
                    self.advance();
                    let index: Expr<'a> = self.expression()?;
                    let bracket: &'a Token<'a> =
                        self.consume(TokenType::RIGHT_BRACKET, "Expected ']' after index")?;

                    Expr::Index {
                        object: Box::new(expr),
                        bracket,
                        index: Box::new(index),
                    }
                }

                _ => return Ok(expr),
            };
        }
    }

    /// Comma-separated call arguments up to (not including) the `)`.  A
    /// trailing comma is accepted.
    fn arguments(&mut self) -> Result<Vec<Expr<'a>>> {
        let mut arguments: Vec<Expr<'a>> = Vec::new();

        while self.peek().token_type != TokenType::RIGHT_PAREN {
            arguments.push(self.expression()?);

            if self.peek().token_type != TokenType::COMMA {
                break;
            }
            self.advance();
        }

        Ok(arguments)
    }

    fn primary(&mut self) -> Result<Expr<'a>> {
        let token: &'a Token<'a> = self.peek();

        let literal: LiteralValue = match &token.token_type {
            TokenType::NUMBER(n) => LiteralValue::Number(*n),
            TokenType::STRING(s) => LiteralValue::Str(s.clone()),
            TokenType::TRUE => LiteralValue::True,
            TokenType::FALSE => LiteralValue::False,
            TokenType::NIL => LiteralValue::Nil,

            TokenType::IDENTIFIER => {
                self.advance();
                return Ok(Expr::Variable(token));
            }

            TokenType::LEFT_PAREN => {
                self.advance();
                let inner: Expr<'a> = self.expression()?;
                self.consume(TokenType::RIGHT_PAREN, "Expected ')' to close the group")?;

                return Ok(Expr::Grouping(Box::new(inner)));
            }

            other => {
                debug!("No expression can start with {}", other.name());

                return Err(LazyError::parse(token.offset, "Expected expression"));
            }
        };

        self.advance();

        Ok(Expr::Literal(literal))
    }

    fn consume(&mut self, expected: TokenType, message: &str) -> Result<&'a Token<'a>> {
        if self.peek().token_type == expected {
            return Ok(self.advance());
        }

        debug!("Expected {}, found {}", expected.name(), self.peek().token_type.name());

        Err(LazyError::parse(self.peek().offset, message))
    }

    /// Step over the current token and return it.  `EOF` is never stepped
    /// over, so `peek` stays in bounds.
    fn advance(&mut self) -> &'a Token<'a> {
        let token: &'a Token<'a> = self.peek();

        if token.token_type != TokenType::EOF {
            self.current += 1;
        }

        token
    }

    fn peek(&self) -> &'a Token<'a> {
        let last: usize = self.tokens.len().saturating_sub(1);
        &self.tokens[self.current.min(last)]
    }
}
