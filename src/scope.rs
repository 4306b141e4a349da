//! Name bindings and the tiered scope snapshot that a deferred value owns.

use std::collections::HashMap;

use log::debug;

use crate::value::Value;

/// One tier of name → value bindings (the locals of one activation, or the
/// globals).
#[derive(Debug, Clone, Default)]
pub struct Bindings {
    values: HashMap<String, Value>,
}

impl Bindings {
    pub fn new() -> Self {
        Bindings {
            values: HashMap::new(),
        }
    }

    /// Bind `name`, replacing any previous value in this tier.
    pub fn define(&mut self, name: &str, value: impl Into<Value>) {
        self.values.insert(name.to_string(), value.into());
    }

    /// Builder form of [`Bindings::define`].
    pub fn with(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.define(name, value);
        self
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Bindings {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Bindings {
            values: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

/// Ordered tiers, innermost first: `[locals, enclosing…, globals]`.
///
/// Lookup returns the first tier that binds the name, so inner tiers shadow
/// outer ones.  A snapshot is immutable once built.
#[derive(Debug, Clone, Default)]
pub struct ScopeSnapshot {
    tiers: Vec<Bindings>,
}

impl ScopeSnapshot {
    /// Assemble a snapshot from its three parts.
    pub fn new(locals: Bindings, enclosing: Vec<Bindings>, globals: Bindings) -> Self {
        let mut tiers: Vec<Bindings> = Vec::with_capacity(enclosing.len() + 2);
        tiers.push(locals);
        tiers.extend(enclosing);
        tiers.push(globals);

        debug!("Scope snapshot built with {} tiers", tiers.len());

        ScopeSnapshot { tiers }
    }

    /// Innermost-first lookup.
    pub fn lookup(&self, name: &str) -> Option<&Value> {
        self.tiers.iter().find_map(|tier| tier.get(name))
    }

    /// Index of the tier that binds `name` (0 = locals).
    pub fn tier_of(&self, name: &str) -> Option<usize> {
        self.tiers.iter().position(|tier| tier.contains(name))
    }

    pub fn tiers(&self) -> &[Bindings] {
        &self.tiers
    }

    /// Number of tiers, always at least two (locals and globals) once built
    /// through [`ScopeSnapshot::new`].
    pub fn depth(&self) -> usize {
        self.tiers.len()
    }
}
