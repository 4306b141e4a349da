//! Template evaluator.
//!
//! Splits a template, parses every span, then evaluates the spans left to
//! right against a [`ScopeSnapshot`] and joins their text with the literal
//! segments.  All spans are parsed before the first one is evaluated, so a
//! syntax error never leaves user conversion logic half-run.

use std::sync::Arc;

use log::{debug, info};

use crate::builtins::builtins;
use crate::error::{LazyError, Result};
use crate::parser::{Expr, LiteralValue, Parser};
use crate::scanner::tokenize;
use crate::scope::ScopeSnapshot;
use crate::template::{Segment, Template};
use crate::token::{Token, TokenType};
use crate::value::Value;

pub struct Interpreter<'s> {
    scope: &'s ScopeSnapshot,
}

impl<'s> Interpreter<'s> {
    pub fn new(scope: &'s ScopeSnapshot) -> Self {
        Self { scope }
    }

    /// Produce the final text of `template`.
    pub fn render(&self, template: &Template) -> Result<String> {
        info!("Rendering template of {} bytes", template.as_str().len());

        let segments: Vec<Segment<'_>> = template.segments()?;
        self.render_segments(&segments)
    }

    /// Produce the text of already split segments.
    pub fn render_segments(&self, segments: &[Segment<'_>]) -> Result<String> {
        // Phase 1: scan and parse every span.
        let token_lists: Vec<Vec<Token<'_>>> = segments
            .iter()
            .filter_map(|segment| match segment {
                Segment::Expr { source, offset } => Some(tokenize(source, *offset)),
                Segment::Literal(_) => None,
            })
            .collect::<Result<_>>()?;

        let exprs: Vec<Expr<'_>> = token_lists
            .iter()
            .map(|tokens| Parser::new(tokens).parse())
            .collect::<Result<_>>()?;

        debug!("Parsed {} expression span(s)", exprs.len());

        // Phase 2: evaluate and join.
        let mut out = String::new();
        let mut exprs = exprs.iter();

        for segment in segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),

                Segment::Expr { source, .. } => {
                    let Some(expr) = exprs.next() else {
                        return Err(LazyError::runtime("span count mismatch"));
                    };

                    let text: String = self.evaluate(expr)?.to_text()?;
                    debug!("Span {:?} rendered as {:?}", source, text);
                    out.push_str(&text);
                }
            }
        }

        info!("Rendered {} bytes", out.len());

        Ok(out)
    }

    /// Evaluates an expression and returns a Value.
    pub fn evaluate(&self, expr: &Expr<'_>) -> Result<Value> {
        let value = match expr {
            Expr::Literal(literal) => evaluate_literal(literal),
            Expr::Grouping(inner) => self.evaluate(inner)?,
            Expr::Variable(name) => self.evaluate_variable(name)?,
            Expr::Unary { operator, right } => self.evaluate_unary(operator, right)?,
            Expr::Binary {
                left,
                operator,
                right,
            } => self.evaluate_binary(left, operator, right)?,
            Expr::Logical {
                left,
                operator,
                right,
            } => self.evaluate_logical(left, operator, right)?,
            Expr::Call {
                callee,
                paren,
                arguments,
            } => {
                let callee_val: Value = self.evaluate(callee)?;
                let arg_values: Vec<Value> = arguments
                    .iter()
                    .map(|arg| self.evaluate(arg))
                    .collect::<Result<_>>()?;

                invoke_callable(&callee_val, paren, &arg_values)?
            }
            Expr::Get { object, name } => self.evaluate_get(object, name)?,
            Expr::Index {
                object,
                bracket,
                index,
            } => self.evaluate_index(object, bracket, index)?,
        };

        debug!("Expression evaluated to: {:?}", value);

        Ok(value)
    }

    /// Innermost tier first, then the builtins.
    fn evaluate_variable(&self, token: &Token<'_>) -> Result<Value> {
        debug!("Looking up variable '{}'", token.lexeme);

        self.scope
            .lookup(token.lexeme)
            .or_else(|| builtins().get(token.lexeme))
            .cloned()
            .ok_or_else(|| LazyError::name_resolution(token.lexeme))
    }

    fn evaluate_unary(&self, op: &Token<'_>, expr: &Expr<'_>) -> Result<Value> {
        let right_val: Value = self.evaluate(expr)?;

        match op.token_type {
            TokenType::MINUS => match right_val {
                Value::Number(n) => Ok(Value::Number(-n)),
                other => Err(LazyError::runtime(format!(
                    "Operand must be a number, got {} [offset {}]",
                    other.type_name(),
                    op.offset
                ))),
            },
            TokenType::BANG | TokenType::NOT => Ok(Value::Bool(!right_val.is_truthy())),
            _ => Err(LazyError::runtime(format!(
                "Invalid unary operator '{}' [offset {}]",
                op.lexeme, op.offset
            ))),
        }
    }

    /// `and` / `or` return the deciding operand, not a bool.
    fn evaluate_logical(
        &self,
        left: &Expr<'_>,
        op: &Token<'_>,
        right: &Expr<'_>,
    ) -> Result<Value> {
        let left_val: Value = self.evaluate(left)?;

        let short_circuit: bool = if op.token_type == TokenType::OR {
            left_val.is_truthy()
        } else {
            !left_val.is_truthy()
        };

        if short_circuit {
            return Ok(left_val);
        }

        self.evaluate(right)
    }

    fn evaluate_binary(
        &self,
        left: &Expr<'_>,
        op: &Token<'_>,
        right: &Expr<'_>,
    ) -> Result<Value> {
        let left_val: Value = self.evaluate(left)?;
        let right_val: Value = self.evaluate(right)?;

        debug!("Binary '{}' on {:?} and {:?}", op.lexeme, left_val, right_val);

        let operands_error = |expected: &str, a: &Value, b: &Value| {
            LazyError::runtime(format!(
                "Operands of '{}' must be {}, got {} and {} [offset {}]",
                op.lexeme,
                expected,
                a.type_name(),
                b.type_name(),
                op.offset
            ))
        };

        match op.token_type {
            TokenType::PLUS => match (&left_val, &right_val) {
                (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a + b)),
                (Value::Str(a), Value::Str(b)) => Ok(Value::from(format!("{}{}", a, b))),
                (Value::List(a), Value::List(b)) => {
                    Ok(Value::List(a.iter().chain(b.iter()).cloned().collect()))
                }
                (a, b) => Err(operands_error("two numbers, strings or lists", a, b)),
            },

            TokenType::STAR => match (&left_val, &right_val) {
                (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a * b)),
                (Value::Str(s), Value::Number(n)) | (Value::Number(n), Value::Str(s)) => {
                    repeat_text(s, *n, op)
                }
                (a, b) => Err(operands_error("numbers", a, b)),
            },

            TokenType::MINUS | TokenType::SLASH | TokenType::PERCENT => {
                let (a, b) = match (&left_val, &right_val) {
                    (Value::Number(a), Value::Number(b)) => (*a, *b),
                    (a, b) => return Err(operands_error("numbers", a, b)),
                };

                match op.token_type {
                    TokenType::MINUS => Ok(Value::Number(a - b)),
                    _ if b == 0.0 => Err(LazyError::runtime(format!(
                        "Division by zero [offset {}]",
                        op.offset
                    ))),
                    TokenType::SLASH => Ok(Value::Number(a / b)),
                    _ => Ok(Value::Number(a.rem_euclid(b))),
                }
            }

            TokenType::EQUAL_EQUAL => Ok(Value::Bool(left_val == right_val)),
            TokenType::BANG_EQUAL => Ok(Value::Bool(left_val != right_val)),

            TokenType::LESS
            | TokenType::LESS_EQUAL
            | TokenType::GREATER
            | TokenType::GREATER_EQUAL => {
                let ordering = match (&left_val, &right_val) {
                    (Value::Number(a), Value::Number(b)) => a.partial_cmp(b),
                    (Value::Str(a), Value::Str(b)) => Some(a.cmp(b)),
                    (a, b) => return Err(operands_error("two numbers or two strings", a, b)),
                };

                let Some(ordering) = ordering else {
                    return Ok(Value::Bool(false)); // NaN compares false
                };

                Ok(Value::Bool(match op.token_type {
                    TokenType::LESS => ordering.is_lt(),
                    TokenType::LESS_EQUAL => ordering.is_le(),
                    TokenType::GREATER => ordering.is_gt(),
                    _ => ordering.is_ge(),
                }))
            }

            _ => Err(LazyError::runtime(format!(
                "Invalid binary operator '{}' [offset {}]",
                op.lexeme, op.offset
            ))),
        }
    }

    fn evaluate_get(&self, object: &Expr<'_>, name: &Token<'_>) -> Result<Value> {
        let target: Value = self.evaluate(object)?;

        let found: Option<Value> = match &target {
            Value::Object(object) => object.get(name.lexeme),
            _ => None,
        };

        found.ok_or_else(|| {
            LazyError::runtime(format!(
                "'{}' has no attribute '{}' [offset {}]",
                target.type_name(),
                name.lexeme,
                name.offset
            ))
        })
    }

    fn evaluate_index(
        &self,
        object: &Expr<'_>,
        bracket: &Token<'_>,
        index: &Expr<'_>,
    ) -> Result<Value> {
        let target: Value = self.evaluate(object)?;
        let index_val: Value = self.evaluate(index)?;

        let Value::Number(n) = index_val else {
            return Err(LazyError::runtime(format!(
                "Index must be a number, got {} [offset {}]",
                index_val.type_name(),
                bracket.offset
            )));
        };

        let out_of_range = || {
            LazyError::runtime(format!(
                "Index {} out of range [offset {}]",
                n, bracket.offset
            ))
        };

        match &target {
            Value::List(items) => {
                let i: usize = normalize_index(n, items.len()).ok_or_else(out_of_range)?;
                Ok(items[i].clone())
            }

            Value::Str(s) => {
                let count: usize = s.chars().count();
                let i: usize = normalize_index(n, count).ok_or_else(out_of_range)?;
                let ch: Option<char> = s.chars().nth(i);
                ch.map(|c| Value::Str(Arc::from(c.to_string())))
                    .ok_or_else(out_of_range)
            }

            other => Err(LazyError::runtime(format!(
                "'{}' is not indexable [offset {}]",
                other.type_name(),
                bracket.offset
            ))),
        }
    }
}

fn evaluate_literal(literal: &LiteralValue) -> Value {
    match literal {
        LiteralValue::Number(n) => Value::Number(*n),
        LiteralValue::Str(s) => Value::from(s.as_str()),
        LiteralValue::True => Value::Bool(true),
        LiteralValue::False => Value::Bool(false),
        LiteralValue::Nil => Value::Nil,
    }
}

/// Largest text, in bytes, a single string repetition may produce.
const MAX_REPEAT_BYTES: usize = 1 << 24;

/// `text * count`.  The count must be a whole, non-negative number and the
/// result must stay under [`MAX_REPEAT_BYTES`].
fn repeat_text(text: &str, count: f64, op: &Token<'_>) -> Result<Value> {
    if !count.is_finite() || count.fract() != 0.0 || count < 0.0 {
        return Err(LazyError::runtime(format!(
            "Repeat count must be a non-negative whole number, got {} [offset {}]",
            count, op.offset
        )));
    }

    // Saturates for counts past usize::MAX, which the size check rejects.
    let times: usize = count as usize;

    text.len()
        .checked_mul(times)
        .filter(|bytes| *bytes <= MAX_REPEAT_BYTES)
        .ok_or_else(|| {
            LazyError::runtime(format!(
                "Repeating a {}-byte string {} times exceeds {} bytes [offset {}]",
                text.len(),
                count,
                MAX_REPEAT_BYTES,
                op.offset
            ))
        })?;

    Ok(Value::from(text.repeat(times)))
}

/// Integral indices only; negative ones count from the end.
fn normalize_index(n: f64, len: usize) -> Option<usize> {
    if n.fract() != 0.0 {
        return None;
    }

    let i: i64 = n as i64;
    let resolved: i64 = if i < 0 { len as i64 + i } else { i };

    if resolved < 0 || resolved >= len as i64 {
        None
    } else {
        Some(resolved as usize)
    }
}

/// Invokes a native function value.
fn invoke_callable(callee_val: &Value, paren: &Token<'_>, arg_values: &[Value]) -> Result<Value> {
    match callee_val {
        Value::Native { name, arity, func } => {
            debug!("Calling native function '{}'", name);

            if let Some(arity) = arity {
                if arg_values.len() != *arity {
                    return Err(LazyError::runtime(format!(
                        "{}() expected {} arguments but got {} [offset {}]",
                        name,
                        arity,
                        arg_values.len(),
                        paren.offset
                    )));
                }
            }

            let result: Value = func(arg_values).map_err(LazyError::from_boxed)?;
            debug!("Native function '{}' returned: {:?}", name, result);

            Ok(result)
        }

        other => Err(LazyError::runtime(format!(
            "'{}' is not callable [offset {}]",
            other.type_name(),
            paren.offset
        ))),
    }
}
