//! Scope collector: the bindings directly visible at the construction site.

use log::debug;

use crate::frame::CallChain;
use crate::scope::Bindings;

/// Locals of the call-site frame and the globals of its chain.
#[derive(Debug, Clone, Default)]
pub struct Collected {
    pub locals: Bindings,
    pub globals: Bindings,
}

/// Capture every name bound in the innermost frame and in the globals.
///
/// Nothing is filtered against the template: unused names are captured too
/// and stay alive until the deferred value materializes.  An empty chain
/// (no frame executing) yields empty locals.
pub fn collect(chain: &CallChain) -> Collected {
    let locals: Bindings = chain
        .innermost()
        .map(|frame| frame.locals().clone())
        .unwrap_or_default();

    debug!(
        "Collected {} local and {} global bindings",
        locals.len(),
        chain.globals().len()
    );

    Collected {
        locals,
        globals: chain.globals().clone(),
    }
}
