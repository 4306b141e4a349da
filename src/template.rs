//! Template splitting: literal text interleaved with `{expression}` spans.
//!
//! `{{` and `}}` are escapes for literal braces.  A lone `}` in literal text,
//! an unterminated `{` and an empty span are errors.  Inside a span, quoted
//! string literals may contain braces; the first `}` outside quotes closes
//! the span.  Nothing here looks at the captured scope.

use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

use log::{debug, info};
use memchr::memchr2;
use serde::Serialize;

use crate::error::{LazyError, Result};

/// One piece of a split template.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Segment<'a> {
    /// Literal text with brace escapes already decoded.
    Literal(Cow<'a, str>),

    /// The source of one expression span, without its braces.
    Expr {
        source: &'a str,

        /// Byte offset of `source` inside the template.
        offset: usize,
    },
}

/// Immutable template text.  Cheap to clone; splitting happens on demand.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Template {
    source: Arc<str>,
}

impl Template {
    pub fn new(source: impl Into<Arc<str>>) -> Self {
        Self {
            source: source.into(),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Split into segments.  Errors describe the first malformed brace.
    pub fn segments(&self) -> Result<Vec<Segment<'_>>> {
        split(&self.source)
    }

    /// Quick check used to skip evaluation entirely: text without any brace
    /// has no spans and no escapes, so it renders as itself.
    pub fn has_braces(&self) -> bool {
        memchr2(b'{', b'}', self.source.as_bytes()).is_some()
    }
}

impl fmt::Debug for Template {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Template").field(&&*self.source).finish()
    }
}

impl fmt::Display for Template {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

impl From<&str> for Template {
    fn from(source: &str) -> Self {
        Template::new(source)
    }
}

impl From<String> for Template {
    fn from(source: String) -> Self {
        Template::new(source)
    }
}

/// Split `source` into literal and expression segments, left to right.
pub fn split(source: &str) -> Result<Vec<Segment<'_>>> {
    info!("Splitting template of {} bytes", source.len());

    let bytes: &[u8] = source.as_bytes();
    let mut segments: Vec<Segment<'_>> = Vec::new();

    // Literal text accumulates here only when an escape forces a copy;
    // otherwise literals borrow straight from `source`.
    let mut literal: Option<String> = None;
    let mut lit_start: usize = 0;
    let mut pos: usize = 0;

    while let Some(found) = memchr2(b'{', b'}', &bytes[pos..]) {
        let at: usize = pos + found;
        let brace: u8 = bytes[at];
        let doubled: bool = bytes.get(at + 1) == Some(&brace);

        if doubled {
            // `{{` or `}}`: keep one brace as text.
            literal
                .get_or_insert_with(String::new)
                .push_str(&source[lit_start..=at]);
            pos = at + 2;
            lit_start = pos;
            continue;
        }

        if brace == b'}' {
            return Err(LazyError::template(
                at,
                "Single '}' is not allowed; use '}}' for a literal brace",
            ));
        }

        flush_literal(source, &mut segments, &mut literal, lit_start, at);

        let expr_start: usize = at + 1;
        let expr_end: usize = find_span_end(source, expr_start)?;
        let expr: &str = &source[expr_start..expr_end];

        if expr.trim().is_empty() {
            return Err(LazyError::template(at, "Empty expression is not allowed"));
        }

        debug!("Expression span at {}: {:?}", expr_start, expr);

        segments.push(Segment::Expr {
            source: expr,
            offset: expr_start,
        });

        pos = expr_end + 1;
        lit_start = pos;
    }

    flush_literal(source, &mut segments, &mut literal, lit_start, source.len());

    debug!("Template split into {} segments", segments.len());

    Ok(segments)
}

fn flush_literal<'a>(
    source: &'a str,
    segments: &mut Vec<Segment<'a>>,
    literal: &mut Option<String>,
    start: usize,
    end: usize,
) {
    let tail: &'a str = &source[start..end];

    let text: Cow<'a, str> = match literal.take() {
        Some(mut owned) => {
            owned.push_str(tail);
            Cow::Owned(owned)
        }
        None => Cow::Borrowed(tail),
    };

    if !text.is_empty() {
        segments.push(Segment::Literal(text));
    }
}

/// Find the `}` closing a span that starts at `start`, skipping quoted strings.
fn find_span_end(source: &str, start: usize) -> Result<usize> {
    let bytes: &[u8] = source.as_bytes();
    let mut i: usize = start;

    while i < bytes.len() {
        match bytes[i] {
            b'}' => return Ok(i),

            b'{' => {
                return Err(LazyError::template(
                    i,
                    "Nested '{' inside an expression is not supported",
                ));
            }

            quote @ (b'"' | b'\'') => {
                i += 1;
                while i < bytes.len() && bytes[i] != quote {
                    // Skip the escaped byte so `\"` does not end the string.
                    i += if bytes[i] == b'\\' { 2 } else { 1 };
                }
                i += 1;
            }

            _ => i += 1,
        }
    }

    Err(LazyError::template(
        start - 1,
        "Expected '}' before end of template",
    ))
}
