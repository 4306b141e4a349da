//! Prefix-form rendering of span syntax trees, used by `lazyfmt parse` and
//! in tests: `{a + f(b)}` prints as `(+ a (call f b))`.

use std::fmt::Write;

use crate::parser::{Expr, LiteralValue};
use crate::template::Segment;

pub struct AstPrinter;

impl AstPrinter {
    pub fn print(expr: &Expr<'_>) -> String {
        let mut out = String::new();
        Self::write_expr(&mut out, expr);
        out
    }

    /// One line per segment: `text "…"` for literals, `expr …` for spans.
    pub fn print_segment(segment: &Segment<'_>, expr: Option<&Expr<'_>>) -> String {
        match (segment, expr) {
            (Segment::Literal(text), _) => format!("text {:?}", text),
            (Segment::Expr { .. }, Some(expr)) => format!("expr {}", Self::print(expr)),
            (Segment::Expr { source, .. }, None) => format!("expr <unparsed {:?}>", source),
        }
    }

    fn write_expr(out: &mut String, expr: &Expr<'_>) {
        match expr {
            Expr::Literal(literal) => Self::write_literal(out, literal),

            Expr::Variable(name) => out.push_str(name.lexeme),

            Expr::Grouping(inner) => Self::write_node(out, "group", &[inner.as_ref()]),

            Expr::Unary { operator, right } => {
                Self::write_node(out, operator.lexeme, &[right.as_ref()])
            }

            Expr::Binary {
                left,
                operator,
                right,
            }
            | Expr::Logical {
                left,
                operator,
                right,
            } => Self::write_node(out, operator.lexeme, &[left.as_ref(), right.as_ref()]),

            Expr::Get { object, name } => {
                out.push_str("(. ");
                Self::write_expr(out, object);
                let _ = write!(out, " {})", name.lexeme);
            }

            Expr::Index { object, index, .. } => {
                Self::write_node(out, "[]", &[object.as_ref(), index.as_ref()])
            }

            Expr::Call {
                callee, arguments, ..
            } => {
                let mut children: Vec<&Expr<'_>> = Vec::with_capacity(arguments.len() + 1);
                children.push(callee);
                children.extend(arguments.iter());
                Self::write_node(out, "call", &children);
            }
        }
    }

    /// `(head child child …)`
    fn write_node(out: &mut String, head: &str, children: &[&Expr<'_>]) {
        out.push('(');
        out.push_str(head);
        for child in children {
            out.push(' ');
            Self::write_expr(out, child);
        }
        out.push(')');
    }

    fn write_literal(out: &mut String, literal: &LiteralValue) {
        // Numbers always show a fraction so `3` and `"3"` read differently.
        let _ = match literal {
            LiteralValue::Number(n) if n.fract() == 0.0 => write!(out, "{:.1}", n),
            LiteralValue::Number(n) => write!(out, "{}", n),
            LiteralValue::Str(s) => write!(out, "{:?}", s),
            LiteralValue::True => write!(out, "true"),
            LiteralValue::False => write!(out, "false"),
            LiteralValue::Nil => write!(out, "nil"),
        };
    }
}
