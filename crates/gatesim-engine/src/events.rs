//! Event payloads published by a simulation.

use std::fmt;

use gatesim_core::{DrivenValue, WireId};

/// A wire's winning value changed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WireChange {
    /// The wire.
    pub wire: WireId,
    /// Winner before the change.
    pub previous: DrivenValue,
    /// Winner after the change.
    pub current: DrivenValue,
}

impl fmt::Display for WireChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {} -> {}", self.wire, self.previous, self.current)
    }
}

/// Outcome of one pass, published when the pass ends.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PassSummary {
    /// 1-based pass counter.
    pub pass: u64,
    /// Waves executed.
    pub iterations: usize,
    /// Gate updates invoked.
    pub updates: usize,
    /// Gate updates that failed.
    pub failures: usize,
    /// Whether the queue drained.
    pub converged: bool,
}
