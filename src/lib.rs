//! Deferred string interpolation.
//!
//! A [`LazyString`] captures a `{expression}` template together with the
//! bindings visible where it was built, and renders itself only when first
//! observed.  Bindings come from an explicit [`CallChain`]: the call-site
//! locals, the locals of every lexically enclosing function still on the
//! chain, and the globals.

pub mod ast_printer;
pub mod builtins;
pub mod collector;
pub mod error;
pub mod frame;
pub mod interpreter;
pub mod lazy;
pub mod parser;
pub mod resolver;
pub mod scanner;
pub mod scope;
pub mod template;
pub mod token;
pub mod value;

pub use error::{LazyError, Result};
pub use frame::{Activation, CallChain, LexicalPath};
pub use lazy::{LazyString, TextLike};
pub use scope::{Bindings, ScopeSnapshot};
pub use value::{Object, Value};

/// Build a [`LazyString`] from an explicit capture list.
///
/// Each capture is either a name in scope (`x`, cloned and converted with
/// `Value::from`) or `name = expression`.  The captures form the only tier.
///
/// ```rust
/// use lazy_fstring::lazy;
///
/// let name = "world";
/// let s = lazy!("hello {name}, {n * 2}", name, n = 21);
/// assert_eq!(s.to_string(), "hello world, 42");
/// ```
#[macro_export]
macro_rules! lazy {
    ($template:expr $(, $name:ident $(= $value:expr)?)* $(,)?) => {{
        #[allow(unused_mut)]
        let mut locals = $crate::scope::Bindings::new();
        $(
            locals.define(stringify!($name), $crate::__lazy_capture!($name $(, $value)?));
        )*
        $crate::lazy::LazyString::from_locals($template, locals)
    }};
}

#[doc(hidden)]
#[macro_export]
macro_rules! __lazy_capture {
    ($name:ident) => {
        $crate::value::Value::from(::std::clone::Clone::clone(&$name))
    };
    ($name:ident, $value:expr) => {
        $crate::value::Value::from($value)
    };
}
