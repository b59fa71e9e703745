//! Error types for graph edits and scheduling passes.

use std::error::Error;
use std::fmt;

use gatesim_core::{
    GateError, GateId, PinId, PropertyError, ShortCircuit, WireId, MAX_PINS,
};

// ── CircuitError ─────────────────────────────────────────────────

/// Errors from graph edits, pin access and property access.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CircuitError {
    /// The gate id is stale or was never issued.
    UnknownGate {
        /// The offending id.
        gate: GateId,
    },
    /// The wire id is stale or was never issued.
    UnknownWire {
        /// The offending id.
        wire: WireId,
    },
    /// The pin ordinal is outside the gate's layout.
    UnknownPin {
        /// The offending pin.
        pin: PinId,
    },
    /// The gate declares more pins than a [`PinId`] can address.
    TooManyPins {
        /// Pins declared by the gate.
        count: usize,
    },
    /// The gate does not accept property changes.
    NotConfigurable {
        /// The gate.
        gate: GateId,
    },
    /// A write conflicted with another driver.
    ShortCircuit(ShortCircuit),
    /// A property lookup failed.
    Property(PropertyError),
}

impl fmt::Display for CircuitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownGate { gate } => write!(f, "unknown gate {gate}"),
            Self::UnknownWire { wire } => write!(f, "unknown wire {wire}"),
            Self::UnknownPin { pin } => write!(f, "unknown pin {pin}"),
            Self::TooManyPins { count } => {
                write!(f, "gate declares {count} pins (at most {MAX_PINS})")
            }
            Self::NotConfigurable { gate } => write!(f, "gate {gate} is not configurable"),
            Self::ShortCircuit(e) => write!(f, "{e}"),
            Self::Property(e) => write!(f, "property: {e}"),
        }
    }
}

impl Error for CircuitError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::ShortCircuit(e) => Some(e),
            Self::Property(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ShortCircuit> for CircuitError {
    fn from(e: ShortCircuit) -> Self {
        Self::ShortCircuit(e)
    }
}

impl From<PropertyError> for CircuitError {
    fn from(e: PropertyError) -> Self {
        Self::Property(e)
    }
}

// ── GateFailure ──────────────────────────────────────────────────

/// A gate update that returned an error.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GateFailure {
    /// The failing gate.
    pub gate: GateId,
    /// The gate's kind name.
    pub name: String,
    /// What went wrong.
    pub error: GateError,
}

impl fmt::Display for GateFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "gate {} ({}) failed: {}", self.gate, self.name, self.error)
    }
}

impl Error for GateFailure {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        Some(&self.error)
    }
}

// ── PassError ────────────────────────────────────────────────────

/// Errors returned from [`Simulation::step`](crate::Simulation::step).
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PassError {
    /// The pass hit its wave bound with gates still queued. They stay
    /// dirty and run on the next pass.
    NonConvergence {
        /// Waves executed.
        iterations: usize,
        /// Live gates still dirty and queued.
        pending: usize,
    },
    /// The pass stopped on the first failure under
    /// [`FailurePolicy::AbortPass`](crate::FailurePolicy::AbortPass).
    Aborted {
        /// The failure that stopped the pass.
        failure: GateFailure,
    },
    /// The simulation has been shut down.
    ShuttingDown,
}

impl fmt::Display for PassError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NonConvergence {
                iterations,
                pending,
            } => write!(
                f,
                "no fixed point after {iterations} waves ({pending} gates pending)"
            ),
            Self::Aborted { failure } => write!(f, "pass aborted: {failure}"),
            Self::ShuttingDown => write!(f, "simulation is shutting down"),
        }
    }
}

impl Error for PassError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Aborted { failure } => Some(failure),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gatesim_core::DrivenValue;

    #[test]
    fn circuit_error_display_and_source() {
        let gate = GateId::new(2, 1);
        assert_eq!(
            CircuitError::UnknownGate { gate }.to_string(),
            "unknown gate gate#2.1"
        );
        assert_eq!(
            CircuitError::UnknownPin { pin: gate.pin(4) }.to_string(),
            "unknown pin gate#2.1/pin4"
        );
        let sc = ShortCircuit {
            wire: WireId::new(0, 0),
            first: DrivenValue::none(),
            second: DrivenValue::none(),
        };
        assert!(CircuitError::from(sc).source().is_some());
        assert!(CircuitError::NotConfigurable { gate }.source().is_none());
        assert_eq!(
            CircuitError::TooManyPins { count: 70_000 }.to_string(),
            "gate declares 70000 pins (at most 65536)"
        );
    }

    #[test]
    fn aborted_chains_to_gate_error() {
        let failure = GateFailure {
            gate: GateId::new(0, 0),
            name: "flaky".into(),
            error: GateError::ExecutionFailed {
                reason: "boom".into(),
            },
        };
        let err = PassError::Aborted { failure };
        assert_eq!(
            err.to_string(),
            "pass aborted: gate gate#0.0 (flaky) failed: execution failed: boom"
        );
        let source = err.source().unwrap();
        assert!(source.source().is_some());
    }

    #[test]
    fn non_convergence_display() {
        let err = PassError::NonConvergence {
            iterations: 8,
            pending: 1,
        };
        assert_eq!(err.to_string(), "no fixed point after 8 waves (1 gates pending)");
    }
}
