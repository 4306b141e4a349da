//! The deferred value.
//!
//! A [`LazyString`] captures a template and a [`ScopeSnapshot`] when it is
//! built and computes its text the first time something observes it.  The
//! transition happens once:
//!
//! ```text
//!   Unevaluated { template, snapshot } ──force() ok──▶ Evaluated { text }
//!          ▲                │
//!          └─ force() err ──┘   (snapshot kept, next observation retries)
//! ```
//!
//! The cached text lives in a `OnceLock`, so an evaluated value answers with
//! one atomic load.  First observers serialize on a mutex around the pending
//! state; whoever wins evaluates, the rest find the cached text.  The snapshot
//! is dropped as soon as the text is cached, which ends the lifetime of every
//! captured object the value was keeping alive.
//!
//! # Example
//!
//! ```rust
//! use lazy_fstring::lazy;
//!
//! let x = 33;
//! let s = lazy!("{x} kittens drink milk", x);
//! assert!(!s.is_evaluated());
//! assert_eq!(s.force().unwrap(), "33 kittens drink milk");
//! ```

use std::borrow::Cow;
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::Chars;
use std::sync::OnceLock;

use log::{debug, error, info};
use parking_lot::Mutex;
use serde::ser::Error as _;
use serde::{Serialize, Serializer};

use crate::collector::collect;
use crate::error::{BoxError, LazyError, Result};
use crate::frame::CallChain;
use crate::interpreter::Interpreter;
use crate::resolver::resolve_enclosing;
use crate::scope::{Bindings, ScopeSnapshot};
use crate::template::Template;
use crate::value::{Object, Value};

/// Everything an unevaluated value holds.
struct Pending {
    template: Template,
    scope: ScopeSnapshot,
}

/// Text computed on first observation.
///
/// Read-only text operations (`Display`, comparison, ordering, hashing,
/// [`TextLike`]) force materialization and then behave like the cached
/// `str`.  Boundaries that need a real `String` must convert explicitly with
/// [`LazyString::into_string`] or `String::try_from`; serializing a
/// `LazyString` directly is refused.
pub struct LazyString {
    text: OnceLock<String>,
    pending: Mutex<Option<Pending>>,
}

impl LazyString {
    /// Capture `template` at the innermost frame of `chain`.
    ///
    /// The call-site locals, the locals of every lexically enclosing frame
    /// and the globals are snapshotted now; nothing is evaluated.
    pub fn new(template: impl Into<Template>, chain: &CallChain) -> Self {
        let collected = collect(chain);
        let enclosing: Vec<Bindings> = resolve_enclosing(chain);

        let scope = ScopeSnapshot::new(collected.locals, enclosing, collected.globals);

        Self::from_snapshot(template, scope)
    }

    /// Capture an explicit list of bindings as the only (local) tier.
    pub fn from_locals(template: impl Into<Template>, locals: Bindings) -> Self {
        Self::from_snapshot(
            template,
            ScopeSnapshot::new(locals, Vec::new(), Bindings::new()),
        )
    }

    /// Wrap a snapshot that was assembled elsewhere.
    pub fn from_snapshot(template: impl Into<Template>, scope: ScopeSnapshot) -> Self {
        let template: Template = template.into();

        info!(
            "LazyString created: template={:?}, tiers={}",
            template.as_str(),
            scope.depth()
        );

        LazyString {
            text: OnceLock::new(),
            pending: Mutex::new(Some(Pending { template, scope })),
        }
    }

    /// Observe the value, materializing it on first use.
    ///
    /// Errors (unknown names, failing user conversions, malformed templates)
    /// are returned to this observer and nothing is cached, so the next call
    /// evaluates again.
    ///
    /// Calling `force` on the same value from inside one of its own captured
    /// objects' `render` deadlocks.
    pub fn force(&self) -> Result<&str> {
        if let Some(text) = self.text.get() {
            return Ok(text);
        }

        let mut pending = self.pending.lock();

        // Another observer may have finished while we waited for the lock.
        if let Some(text) = self.text.get() {
            return Ok(text);
        }

        let Some(state) = pending.as_ref() else {
            return Err(LazyError::runtime(
                "LazyString lost its pending state without caching a result",
            ));
        };

        debug!("Materializing {:?}", state.template.as_str());

        let rendered: String = if state.template.has_braces() {
            Interpreter::new(&state.scope).render(&state.template)?
        } else {
            state.template.as_str().to_string()
        };

        let text: &str = self.text.get_or_init(|| rendered);

        // Release the template and every captured binding.
        *pending = None;

        info!("LazyString materialized ({} bytes)", text.len());

        Ok(text)
    }

    /// `true` once the text is cached.
    pub fn is_evaluated(&self) -> bool {
        self.text.get().is_some()
    }

    /// Force and take the text as an owned `String`.
    pub fn into_string(self) -> Result<String> {
        self.force()?;

        Ok(self.text.into_inner().unwrap_or_default())
    }

    /// Force and iterate over the characters of the text.
    pub fn chars(&self) -> Result<Chars<'_>> {
        Ok(self.force()?.chars())
    }

    /// Force and test for a substring.
    pub fn contains(&self, needle: &str) -> Result<bool> {
        Ok(self.force()?.contains(needle))
    }

    /// Text for infallible trait impls.
    ///
    /// # Panics
    ///
    /// Panics with the materialization error if the value cannot be
    /// evaluated.
    fn forced(&self) -> &str {
        match self.force() {
            Ok(text) => text,
            Err(e) => panic!("LazyString could not be materialized: {}", e),
        }
    }
}

// ───────────────────────── text-like capability ─────────────────────────

/// The narrow set of read-only text operations a deferred value supports.
///
/// Implemented for `str`, `String` and [`LazyString`] so code can accept any
/// of them without knowing whether the text exists yet.
pub trait TextLike {
    /// Borrow the text, computing it first if needed.
    fn try_as_str(&self) -> Result<&str>;

    /// Length in bytes.
    fn text_len(&self) -> Result<usize> {
        Ok(self.try_as_str()?.len())
    }

    /// Number of characters.
    fn char_count(&self) -> Result<usize> {
        Ok(self.try_as_str()?.chars().count())
    }

    fn text_chars(&self) -> Result<Chars<'_>> {
        Ok(self.try_as_str()?.chars())
    }

    fn text_cmp(&self, other: &dyn TextLike) -> Result<Ordering> {
        Ok(self.try_as_str()?.cmp(other.try_as_str()?))
    }

    fn text_eq(&self, other: &dyn TextLike) -> Result<bool> {
        Ok(self.try_as_str()? == other.try_as_str()?)
    }

    /// Explicit conversion to a primitive text value.
    fn to_text(&self) -> Result<Cow<'_, str>> {
        Ok(Cow::Borrowed(self.try_as_str()?))
    }
}

impl TextLike for str {
    fn try_as_str(&self) -> Result<&str> {
        Ok(self)
    }
}

impl TextLike for String {
    fn try_as_str(&self) -> Result<&str> {
        Ok(self)
    }
}

impl<T: TextLike + ?Sized> TextLike for &T {
    fn try_as_str(&self) -> Result<&str> {
        (**self).try_as_str()
    }
}

impl TextLike for LazyString {
    fn try_as_str(&self) -> Result<&str> {
        self.force()
    }
}

// ───────────────────────── std trait surface ─────────────────────────

impl fmt::Display for LazyString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.force() {
            Ok(text) => f.write_str(text),
            Err(e) => {
                error!("LazyString could not be displayed: {}", e);
                Err(fmt::Error)
            }
        }
    }
}

impl fmt::Debug for LazyString {
    /// Never forces.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(text) = self.text.get() {
            return f.debug_tuple("LazyString::Evaluated").field(text).finish();
        }

        match self.pending.try_lock() {
            Some(guard) => match guard.as_ref() {
                Some(state) => f
                    .debug_struct("LazyString::Unevaluated")
                    .field("template", &state.template)
                    .field("tiers", &state.scope.depth())
                    .finish(),
                None => f.write_str("LazyString::Evaluated"),
            },
            None => f.write_str("LazyString::Materializing"),
        }
    }
}

/// # Panics
///
/// Comparison, ordering and hashing panic if either side cannot be
/// materialized; use [`TextLike`] for the fallible forms.
impl PartialEq for LazyString {
    fn eq(&self, other: &Self) -> bool {
        self.forced() == other.forced()
    }
}

impl Eq for LazyString {}

impl PartialEq<str> for LazyString {
    fn eq(&self, other: &str) -> bool {
        self.forced() == other
    }
}

impl PartialEq<&str> for LazyString {
    fn eq(&self, other: &&str) -> bool {
        self.forced() == *other
    }
}

impl PartialEq<String> for LazyString {
    fn eq(&self, other: &String) -> bool {
        self.forced() == other.as_str()
    }
}

impl PartialOrd for LazyString {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for LazyString {
    fn cmp(&self, other: &Self) -> Ordering {
        self.forced().cmp(other.forced())
    }
}

impl Hash for LazyString {
    /// Same hash as the text itself.
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.forced().hash(state);
    }
}

impl TryFrom<LazyString> for String {
    type Error = LazyError;

    fn try_from(value: LazyString) -> Result<Self> {
        value.into_string()
    }
}

impl Serialize for LazyString {
    /// Always refused: convert to a `String` first.
    fn serialize<S: Serializer>(&self, _serializer: S) -> std::result::Result<S::Ok, S::Error> {
        Err(S::Error::custom(LazyError::not_primitive("serialization")))
    }
}

impl Object for LazyString {
    /// A deferred value captured by another one renders as its own text.
    fn render(&self) -> std::result::Result<String, BoxError> {
        Ok(self.force()?.to_string())
    }

    fn type_name(&self) -> &str {
        "lazy string"
    }
}

impl From<LazyString> for Value {
    fn from(value: LazyString) -> Self {
        Value::object(value)
    }
}
