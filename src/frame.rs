//! Activation descriptors and the call chain they form.
//!
//! A [`CallChain`] stands in for the live call stack: each [`Activation`]
//! exposes its local bindings and the lexical path of the function that owns
//! it.  Frames are entered outermost first, the way calls happen, and the
//! resolver walks them innermost first.

use std::fmt;
use std::str::FromStr;

use log::debug;

use crate::error::LazyError;
use crate::scope::Bindings;

/// Fully-qualified lexical path of a function, e.g. `Outer.Inner` for a
/// function `Inner` defined inside `Outer`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LexicalPath {
    segments: Vec<String>,
}

impl LexicalPath {
    /// Build from segments.  Returns `None` for an empty list or an empty
    /// segment.
    pub fn from_segments<I, S>(segments: I) -> Option<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let segments: Vec<String> = segments.into_iter().map(Into::into).collect();

        if segments.is_empty() || segments.iter().any(String::is_empty) {
            return None;
        }

        Some(LexicalPath { segments })
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// The function's own (final) name.
    pub fn name(&self) -> &str {
        // Never empty; see `from_segments`.
        self.segments.last().map_or("", String::as_str)
    }

    /// Path of the lexically enclosing function, or `None` for a
    /// module-level function.
    pub fn parent(&self) -> Option<LexicalPath> {
        match self.segments.len() {
            0 | 1 => None,
            n => Some(LexicalPath {
                segments: self.segments[..n - 1].to_vec(),
            }),
        }
    }

    /// Segment-wise prefix test; a path is a prefix of itself.
    pub fn is_prefix_of(&self, other: &LexicalPath) -> bool {
        self.segments.len() <= other.segments.len()
            && self
                .segments
                .iter()
                .zip(&other.segments)
                .all(|(a, b)| a == b)
    }
}

impl fmt::Display for LexicalPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.segments.join("."))
    }
}

impl FromStr for LexicalPath {
    type Err = LazyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        LexicalPath::from_segments(s.split('.'))
            .ok_or_else(|| LazyError::InvalidPath(s.to_string()))
    }
}

/// One call frame: the owning function's path (absent at module level) and
/// its local bindings.
#[derive(Debug, Clone)]
pub struct Activation {
    path: Option<LexicalPath>,
    locals: Bindings,
}

impl Activation {
    /// A frame executing the function at `path`.
    pub fn function(path: LexicalPath, locals: Bindings) -> Self {
        Activation {
            path: Some(path),
            locals,
        }
    }

    /// A frame executing module-level code; no function owns it.
    pub fn module(locals: Bindings) -> Self {
        Activation { path: None, locals }
    }

    pub fn path(&self) -> Option<&LexicalPath> {
        self.path.as_ref()
    }

    pub fn locals(&self) -> &Bindings {
        &self.locals
    }

    pub fn locals_mut(&mut self) -> &mut Bindings {
        &mut self.locals
    }
}

/// The chain of live activations at a construction site, plus the globals
/// every frame sees.
#[derive(Debug, Clone, Default)]
pub struct CallChain {
    // outermost first; the last frame is the call site
    frames: Vec<Activation>,
    globals: Bindings,
}

impl CallChain {
    pub fn new(globals: Bindings) -> Self {
        CallChain {
            frames: Vec::new(),
            globals,
        }
    }

    /// Push a new innermost frame (a call).
    pub fn push(&mut self, activation: Activation) {
        debug!(
            "Entering frame {} (depth {})",
            activation
                .path()
                .map_or_else(|| "<module>".to_string(), ToString::to_string),
            self.frames.len() + 1
        );

        self.frames.push(activation);
    }

    /// Builder form: call the function at `path` with `locals`.
    pub fn enter(mut self, path: &str, locals: Bindings) -> Result<Self, LazyError> {
        let path: LexicalPath = path.parse()?;
        self.push(Activation::function(path, locals));
        Ok(self)
    }

    /// Builder form: run module-level code with `locals`.
    pub fn enter_module(mut self, locals: Bindings) -> Self {
        self.push(Activation::module(locals));
        self
    }

    /// Pop the innermost frame (a return).
    pub fn pop(&mut self) -> Option<Activation> {
        self.frames.pop()
    }

    /// The call-site frame, if any code is executing.
    pub fn innermost(&self) -> Option<&Activation> {
        self.frames.last()
    }

    pub fn innermost_mut(&mut self) -> Option<&mut Activation> {
        self.frames.last_mut()
    }

    /// Frames from the call site outward, following caller links.
    pub fn walk(&self) -> impl Iterator<Item = &Activation> {
        self.frames.iter().rev()
    }

    pub fn globals(&self) -> &Bindings {
        &self.globals
    }

    pub fn globals_mut(&mut self) -> &mut Bindings {
        &mut self.globals
    }

    pub fn depth(&self) -> usize {
        self.frames.len()
    }
}
