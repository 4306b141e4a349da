//! Enclosing-scope resolver.
//!
//! Reconstructs lexical nesting from the call chain alone: starting at the
//! call-site frame, each caller is accepted as an enclosing scope while its
//! function lexically contains the frame below it.  The test is name-path
//! containment, not identity:
//!
//! 1. the subordinate's path minus its final segment must be a segment-wise
//!    prefix of (or equal to) the candidate's path;
//! 2. a module-level frame, or a module-level subordinate, ends the walk;
//! 3. the first caller that fails the test breaks the chain and ends the walk.
//!
//! Two distinct functions that share a path are indistinguishable here.  When
//! that shows up in a chain the first match wins and a warning is logged.

use log::{debug, info, warn};

use crate::frame::{Activation, CallChain, LexicalPath};
use crate::scope::Bindings;

/// `true` when `candidate` may lexically enclose `subordinate`.
pub fn is_lexical_parent(subordinate: &LexicalPath, candidate: &LexicalPath) -> bool {
    match subordinate.parent() {
        Some(parent) => parent.is_prefix_of(candidate),
        None => false,
    }
}

/// The frames accepted as enclosing scopes, innermost first.  The call-site
/// frame itself is not included.
pub fn enclosing_frames(chain: &CallChain) -> Vec<&Activation> {
    let mut frames = chain.walk();

    let Some(call_site) = frames.next() else {
        debug!("Empty call chain, no enclosing scopes");
        return Vec::new();
    };

    let Some(mut subordinate) = call_site.path() else {
        debug!("Call site is module level, no enclosing scopes");
        return Vec::new();
    };

    info!("Resolving enclosing scopes of {}", subordinate);

    let mut seen: Vec<&LexicalPath> = vec![subordinate];
    let mut enclosing: Vec<&Activation> = Vec::new();

    for candidate in frames {
        let Some(path) = candidate.path() else {
            debug!("Reached module-level frame, stopping");
            break;
        };

        if !is_lexical_parent(subordinate, path) {
            debug!("{} does not enclose {}, chain broken", path, subordinate);
            break;
        }

        if seen.contains(&path) {
            warn!(
                "Several frames share the lexical path {}; using the innermost",
                path
            );
        } else if subordinate.parent().as_ref() != Some(path) {
            warn!(
                "{} accepted as parent of {} by path prefix only",
                path, subordinate
            );
        }

        debug!("{} encloses {}", path, subordinate);

        enclosing.push(candidate);
        seen.push(path);
        subordinate = path;
    }

    info!("Found {} enclosing scope(s)", enclosing.len());

    enclosing
}

/// Locals of every enclosing frame, innermost first, ready to be placed
/// between the call-site locals and the globals of a snapshot.
pub fn resolve_enclosing(chain: &CallChain) -> Vec<Bindings> {
    enclosing_frames(chain)
        .into_iter()
        .map(|frame| frame.locals().clone())
        .collect()
}
