//! Lexer for the expression inside one template span.
//!
//! [`Scanner`] walks the bytes of a span and yields `Result<Token>`s,
//! skipping whitespace and finishing with exactly one `EOF` token.  Offsets
//! are shifted by the span's position so that tokens and errors point into
//! the whole template rather than into the span.
//!
//! Errors do not stop the iterator: the offending character is skipped and
//! scanning resumes, which lets `lazyfmt tokenize` report every problem in a
//! span.  [`tokenize`] is the stop-at-first-error form the evaluator uses.
//!
//! Two characters get dedicated messages because they are the usual mistakes
//! when coming from other f-string dialects: a bare `=` (assignment) and `:`
//! (format specifier).
//!
//! ```rust
//! use lazy_fstring::scanner::Scanner;
//!
//! for result in Scanner::new("count + 1", 0) {
//!     match result {
//!         Ok(token) => println!("{}", token),
//!         Err(err) => eprintln!("{}", err),
//!     }
//! }
//! ```

use std::iter::FusedIterator;

use log::{debug, info};
use memchr::memchr2;
use phf::phf_map;

use crate::error::{LazyError, Result};
use crate::token::{Token, TokenType};

static KEYWORDS: phf::Map<&'static [u8], TokenType> = phf_map! {
    b"and"   => TokenType::AND,
    b"false" => TokenType::FALSE,
    b"nil"   => TokenType::NIL,
    b"not"   => TokenType::NOT,
    b"or"    => TokenType::OR,
    b"true"  => TokenType::TRUE,
};

/// Streaming lexer over one span.  Token lexemes borrow from the span.
pub struct Scanner<'a> {
    span: &'a str,
    bytes: &'a [u8],
    base: usize,
    // start of the lexeme being scanned
    start: usize,
    pos: usize,
    done: bool,
}

impl<'a> Scanner<'a> {
    /// Lex `span`, which begins at byte `base` of its template.
    pub fn new(span: &'a str, base: usize) -> Self {
        info!("Scanning span of {} bytes at offset {}", span.len(), base);

        Self {
            span,
            bytes: span.as_bytes(),
            base,
            start: 0,
            pos: 0,
            done: false,
        }
    }

    fn current(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    fn lookahead(&self) -> Option<u8> {
        self.bytes.get(self.pos + 1).copied()
    }

    /// Consume the current byte when it equals `expected`.
    fn eat(&mut self, expected: u8) -> bool {
        let hit: bool = self.current() == Some(expected);
        if hit {
            self.pos += 1;
        }
        hit
    }

    /// `double` when the next byte is `=`, otherwise `single`.
    fn with_equals(&mut self, double: TokenType, single: TokenType) -> TokenType {
        if self.eat(b'=') {
            double
        } else {
            single
        }
    }

    fn error(&self, message: impl Into<String>) -> LazyError {
        LazyError::lex(self.base + self.start, message)
    }

    /// Scan one lexeme starting at `self.start`.  `Ok(None)` means whitespace.
    fn scan_token(&mut self) -> Result<Option<TokenType>> {
        let byte: u8 = self.bytes[self.pos];
        self.pos += 1;

        let token_type: TokenType = match byte {
            b' ' | b'\t' | b'\r' | b'\n' => return Ok(None),

            b'(' => TokenType::LEFT_PAREN,
            b')' => TokenType::RIGHT_PAREN,
            b'[' => TokenType::LEFT_BRACKET,
            b']' => TokenType::RIGHT_BRACKET,
            b',' => TokenType::COMMA,
            b'.' => TokenType::DOT,
            b'-' => TokenType::MINUS,
            b'+' => TokenType::PLUS,
            b'*' => TokenType::STAR,
            b'/' => TokenType::SLASH,
            b'%' => TokenType::PERCENT,

            b'!' => self.with_equals(TokenType::BANG_EQUAL, TokenType::BANG),
            b'<' => self.with_equals(TokenType::LESS_EQUAL, TokenType::LESS),
            b'>' => self.with_equals(TokenType::GREATER_EQUAL, TokenType::GREATER),

            b'=' if self.eat(b'=') => TokenType::EQUAL_EQUAL,
            b'=' => return Err(self.error("Assignment is not allowed in template expressions")),

            b':' => return Err(self.error("Format specifiers are not supported")),

            b'"' | b'\'' => self.string(byte)?,

            b'0'..=b'9' => self.number(),

            b'a'..=b'z' | b'A'..=b'Z' | b'_' => self.identifier(),

            _ => {
                // Skip the whole code point so the next lexeme starts on a
                // character boundary.
                let ch: char = self.span[self.start..]
                    .chars()
                    .next()
                    .unwrap_or(char::REPLACEMENT_CHARACTER);
                self.pos = self.start + ch.len_utf8();

                return Err(self.error(format!("Unexpected character: {}", ch)));
            }
        };

        Ok(Some(token_type))
    }

    /// Body of a quoted string; the opening `quote` is already consumed.
    fn string(&mut self, quote: u8) -> Result<TokenType> {
        let mut value = String::new();

        loop {
            let Some(found) = memchr2(quote, b'\\', &self.bytes[self.pos..]) else {
                self.pos = self.bytes.len();
                return Err(self.error("Unterminated string."));
            };

            value.push_str(&self.span[self.pos..self.pos + found]);
            self.pos += found + 1;

            if self.bytes[self.pos - 1] == quote {
                return Ok(TokenType::STRING(value));
            }

            let escaped: char = match self.current() {
                Some(b'n') => '\n',
                Some(b't') => '\t',
                Some(b'\\') => '\\',
                Some(b'\'') => '\'',
                Some(b'"') => '"',
                Some(other) => {
                    return Err(LazyError::lex(
                        self.base + self.pos - 1,
                        format!("Unknown escape sequence: \\{}", other as char),
                    ));
                }
                None => return Err(self.error("Unterminated string.")),
            };

            value.push(escaped);
            self.pos += 1;
        }
    }

    /// Digits with an optional fraction; a trailing `.` is left for the
    /// attribute operator.
    fn number(&mut self) -> TokenType {
        let digits = |s: &Self| s.bytes[s.pos..].iter().take_while(|b| b.is_ascii_digit()).count();

        self.pos += digits(self);

        if self.current() == Some(b'.') && self.lookahead().is_some_and(|b| b.is_ascii_digit()) {
            self.pos += 1;
            self.pos += digits(self);
        }

        // Only ASCII digits and one dot were consumed.
        let value: f64 = self.span[self.start..self.pos].parse().unwrap_or(f64::NAN);

        TokenType::NUMBER(value)
    }

    fn identifier(&mut self) -> TokenType {
        self.pos += self.bytes[self.pos..]
            .iter()
            .take_while(|b| b.is_ascii_alphanumeric() || **b == b'_')
            .count();

        KEYWORDS
            .get(&self.bytes[self.start..self.pos])
            .cloned()
            .unwrap_or(TokenType::IDENTIFIER)
    }
}

impl<'a> Iterator for Scanner<'a> {
    type Item = Result<Token<'a>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        while self.pos < self.bytes.len() {
            self.start = self.pos;

            match self.scan_token() {
                Ok(Some(token_type)) => {
                    let lexeme: &'a str = &self.span[self.start..self.pos];
                    let offset: usize = self.base + self.start;
                    debug!("{} {:?} at {}", token_type.name(), lexeme, offset);

                    return Some(Ok(Token::new(token_type, lexeme, offset)));
                }
                Ok(None) => continue,
                Err(e) => return Some(Err(e)),
            }
        }

        self.done = true;

        Some(Ok(Token::new(
            TokenType::EOF,
            "",
            self.base + self.bytes.len(),
        )))
    }
}

impl FusedIterator for Scanner<'_> {}

/// Scan a whole span, stopping at the first lexical error.
pub fn tokenize(span: &str, base: usize) -> Result<Vec<Token<'_>>> {
    Scanner::new(span, base).collect()
}
