//! Wire value resolution for the gatesim logic simulator.
//!
//! A wire may be driven by many pins at once. [`WireState`] tracks their
//! contributions and decides what the wire presents: the strongest
//! contribution wins outright, and equal-strength contributions are merged
//! through the [`ResolverChain`] or reported as a short circuit.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod builtin;
pub mod resolver;
pub mod state;

pub use resolver::{ResolverChain, ResolverFn, UnknownResolver};
pub use state::{resolve, Outcome, ResolveMode, WinnerChange, WireState};
