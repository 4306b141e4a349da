//! Centralised error hierarchy for **lazy-fstring**.
//!
//! Every stage (template splitting, scanning, parsing, evaluation) converts
//! its failure modes into one of the variants defined here.  The library has
//! no file or process surface; the `lazyfmt` binary reports its own I/O
//! failures through `anyhow`.
//!
//! The module **does not** print diagnostics itself.

use thiserror::Error;

use log::info;

/// Boxed error returned by user conversion logic ([`crate::value::Object::render`])
/// and by native functions.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Canonical error type used throughout the crate.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum LazyError {
    /// Malformed template text (stray `}`, unterminated `{`, empty span).
    #[error("[offset {offset}] Template error: {message}")]
    Template {
        /// Human‑readable description.
        message: String,

        /// Byte offset into the template where the problem starts.
        offset: usize,
    },

    /// Lexical error inside an expression span.
    #[error("[offset {offset}] Error: {message}")]
    Lex { message: String, offset: usize },

    /// Syntactic error inside an expression span.
    #[error("[offset {offset}] Error: {message}")]
    Parse { message: String, offset: usize },

    /// An expression referenced a name bound in no captured tier.
    #[error("Name error: name '{name}' is not defined")]
    NameResolution { name: String },

    /// Evaluation error (type mismatch, arity, division by zero, ...).
    #[error("Runtime error: {0}")]
    Runtime(String),

    /// A dotted function path with an empty segment.
    #[error("Invalid lexical path: '{0}'")]
    InvalidPath(String),

    /// The deferred value was used where a primitive string is required.
    #[error("Unsupported operation: {0}")]
    Unsupported(String),

    /// Error raised by user conversion logic, passed through unchanged.
    #[error(transparent)]
    Conversion(BoxError),
}

impl LazyError {
    /// Helper constructor for the **template splitter**.
    pub fn template<S: Into<String>>(offset: usize, msg: S) -> Self {
        let message: String = msg.into();

        info!("Creating Template error: offset={}, msg={}", offset, message);

        LazyError::Template { message, offset }
    }

    /// Helper constructor for the **scanner**.
    pub fn lex<S: Into<String>>(offset: usize, msg: S) -> Self {
        let message: String = msg.into();

        info!("Creating Lex error: offset={}, msg={}", offset, message);

        LazyError::Lex { message, offset }
    }

    /// Helper constructor for the **parser**.
    pub fn parse<S: Into<String>>(offset: usize, msg: S) -> Self {
        let message: String = msg.into();

        info!("Creating Parse error: offset={}, msg={}", offset, message);

        LazyError::Parse { message, offset }
    }

    /// Helper constructor for name lookups that found nothing.
    pub fn name_resolution<S: Into<String>>(name: S) -> Self {
        let name: String = name.into();

        info!("Creating NameResolution error: name={}", name);

        LazyError::NameResolution { name }
    }

    /// Helper constructor for evaluation failures.
    pub fn runtime<S: Into<String>>(msg: S) -> Self {
        let message: String = msg.into();

        info!("Creating Runtime error: msg={}", message);

        LazyError::Runtime(message)
    }

    /// Wrap an error coming back from a native function.  Crate errors that
    /// were boxed on the way through are unwrapped instead of nested.
    pub fn from_boxed(error: BoxError) -> Self {
        match error.downcast::<LazyError>() {
            Ok(inner) => *inner,
            Err(other) => LazyError::Conversion(other),
        }
    }

    /// The error every primitive-string-only boundary reports.
    pub fn not_primitive(operation: &str) -> Self {
        info!("Creating Unsupported error: operation={}", operation);

        LazyError::Unsupported(format!(
            "{} requires a primitive text value; LazyString is not a primitive text value, \
             convert it explicitly first",
            operation
        ))
    }

    /// `true` for errors that stem from the template text itself rather than
    /// from the captured bindings.
    pub fn is_syntax(&self) -> bool {
        matches!(
            self,
            LazyError::Template { .. } | LazyError::Lex { .. } | LazyError::Parse { .. }
        )
    }
}

/// Crate‑wide `Result` alias.
pub type Result<T> = std::result::Result<T, LazyError>;
