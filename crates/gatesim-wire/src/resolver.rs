//! Ordered registry of conflict resolvers.
//!
//! A resolver merges two equal-strength [`DrivenValue`]s into one, or
//! declines by returning `None`. The chain tries resolvers in
//! registration order and the first that accepts wins. When every
//! resolver declines the wire is short-circuited.

use std::fmt;
use std::sync::Arc;

use gatesim_core::DrivenValue;
use indexmap::IndexMap;

use crate::builtin;

/// Signature of a conflict resolver.
pub type ResolverFn = dyn Fn(&DrivenValue, &DrivenValue) -> Option<DrivenValue> + Send + Sync;

/// Error returned when a built-in resolver name is not recognised.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UnknownResolver {
    /// The name that was requested.
    pub name: String,
}

impl fmt::Display for UnknownResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "unknown resolver '{}' (built-ins: {})",
            self.name,
            builtin::NAMES.join(", ")
        )
    }
}

impl std::error::Error for UnknownResolver {}

/// Ordered, name-keyed list of resolvers.
///
/// Cloning is cheap: resolver functions are shared.
#[derive(Clone, Default)]
pub struct ResolverChain {
    entries: IndexMap<String, Arc<ResolverFn>>,
}

impl ResolverChain {
    /// An empty chain: every equal-strength conflict is a short circuit.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a chain from built-in resolver names, in the given order.
    pub fn with_builtins<S: AsRef<str>>(names: &[S]) -> Result<Self, UnknownResolver> {
        let mut chain = Self::new();
        for name in names {
            chain.register_builtin(name.as_ref())?;
        }
        Ok(chain)
    }

    /// Append `resolver` under `name`.
    ///
    /// Re-registering an existing name swaps the function but keeps the
    /// original position in the chain.
    pub fn register<F>(&mut self, name: impl Into<String>, resolver: F)
    where
        F: Fn(&DrivenValue, &DrivenValue) -> Option<DrivenValue> + Send + Sync + 'static,
    {
        self.entries.insert(name.into(), Arc::new(resolver));
    }

    /// Append the built-in resolver called `name`.
    pub fn register_builtin(&mut self, name: &str) -> Result<(), UnknownResolver> {
        let resolver = builtin::by_name(name).ok_or_else(|| UnknownResolver {
            name: name.to_string(),
        })?;
        self.entries.insert(name.to_string(), resolver);
        Ok(())
    }

    /// Remove the resolver called `name`, keeping the order of the rest.
    pub fn unregister(&mut self, name: &str) -> bool {
        self.entries.shift_remove(name).is_some()
    }

    /// Try each resolver in order; the first `Some` wins.
    pub fn merge(&self, first: &DrivenValue, second: &DrivenValue) -> Option<DrivenValue> {
        self.entries
            .values()
            .find_map(|resolver| resolver(first, second))
    }

    /// Whether a resolver called `name` is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Registered names in chain order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Number of registered resolvers.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the chain is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Debug for ResolverChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.entries.keys()).finish()
    }
}
