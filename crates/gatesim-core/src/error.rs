//! Error types for the gatesim simulation core.
//!
//! Organized by where the fault is detected: value construction and
//! extraction, the property store, wire resolution, and gate updates.
//! [`GateError`] is the umbrella an update returns; the others convert
//! into it with `?`.

use std::error::Error;
use std::fmt;

use crate::id::WireId;
use crate::property::PropertyKind;
use crate::value::{DrivenValue, Strength, ValueKind};

/// Errors from constructing or unpacking a [`DrivenValue`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ValueError {
    /// The payload kind differs from the one the caller expected.
    UnexpectedKind {
        /// Kind the caller asked for.
        expected: ValueKind,
        /// Kind actually present.
        found: ValueKind,
    },
    /// A real payload was paired with the undriven strength.
    UndrivenStrength {
        /// Kind of the rejected payload.
        kind: ValueKind,
    },
    /// The "no value" payload was paired with a real strength.
    MissingPayload {
        /// The rejected strength.
        strength: Strength,
    },
}

impl fmt::Display for ValueError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnexpectedKind { expected, found } => {
                write!(f, "unexpected value kind: expected {expected}, found {found}")
            }
            Self::UndrivenStrength { kind } => {
                write!(f, "{kind} value cannot be driven at the undriven strength")
            }
            Self::MissingPayload { strength } => {
                write!(f, "no-value payload cannot carry strength {strength}")
            }
        }
    }
}

impl Error for ValueError {}

/// Errors from the per-gate property store.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PropertyError {
    /// No entry under this key.
    InvalidKey {
        /// The missing key.
        key: String,
    },
    /// The entry exists but holds a different kind.
    UnexpectedKind {
        /// The key looked up.
        key: String,
        /// Kind the caller asked for.
        expected: PropertyKind,
        /// Kind actually stored.
        found: PropertyKind,
    },
}

impl fmt::Display for PropertyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidKey { key } => write!(f, "invalid property key '{key}'"),
            Self::UnexpectedKind {
                key,
                expected,
                found,
            } => write!(
                f,
                "property '{key}' has kind {found}, expected {expected}"
            ),
        }
    }
}

impl Error for PropertyError {}

/// Two equal-strength drivers on one wire with no applicable resolver.
///
/// This is a modeling fault in the circuit, not a transient condition.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ShortCircuit {
    /// The wire carrying the conflict.
    pub wire: WireId,
    /// Accumulated value of the fold at the point of conflict.
    pub first: DrivenValue,
    /// The value that could not be merged into it.
    pub second: DrivenValue,
}

impl fmt::Display for ShortCircuit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "short circuit on {}: {} conflicts with {}",
            self.wire, self.first, self.second
        )
    }
}

impl Error for ShortCircuit {}

/// Errors returned from [`Gate::update`](crate::Gate::update).
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GateError {
    /// A configuration lookup named a key that does not exist.
    InvalidKey {
        /// The missing key.
        key: String,
    },
    /// A value (pin payload or property) had an unexpected kind.
    UnexpectedValueKind {
        /// Name of the kind the gate expected.
        expected: &'static str,
        /// Name of the kind found.
        found: &'static str,
    },
    /// A write from this gate conflicted with another driver.
    ShortCircuit(ShortCircuit),
    /// A pin ordinal outside the gate's layout.
    PinOutOfRange {
        /// The requested ordinal.
        index: usize,
        /// Number of pins the gate has.
        count: usize,
    },
    /// A write through a pin whose role does not allow driving.
    PinRoleViolation {
        /// The pin ordinal written.
        index: usize,
    },
    /// Any other gate-specific failure.
    ExecutionFailed {
        /// Human-readable description.
        reason: String,
    },
}

impl fmt::Display for GateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidKey { key } => write!(f, "invalid property key '{key}'"),
            Self::UnexpectedValueKind { expected, found } => {
                write!(f, "unexpected value kind: expected {expected}, found {found}")
            }
            Self::ShortCircuit(sc) => write!(f, "{sc}"),
            Self::PinOutOfRange { index, count } => {
                write!(f, "pin {index} out of range (gate has {count} pins)")
            }
            Self::PinRoleViolation { index } => {
                write!(f, "pin {index} is an input and cannot be driven")
            }
            Self::ExecutionFailed { reason } => write!(f, "execution failed: {reason}"),
        }
    }
}

impl Error for GateError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::ShortCircuit(sc) => Some(sc),
            _ => None,
        }
    }
}

impl From<ShortCircuit> for GateError {
    fn from(e: ShortCircuit) -> Self {
        Self::ShortCircuit(e)
    }
}

impl From<ValueError> for GateError {
    fn from(e: ValueError) -> Self {
        match e {
            ValueError::UnexpectedKind { expected, found } => Self::UnexpectedValueKind {
                expected: expected.name(),
                found: found.name(),
            },
            other => Self::ExecutionFailed {
                reason: other.to_string(),
            },
        }
    }
}

impl From<PropertyError> for GateError {
    fn from(e: PropertyError) -> Self {
        match e {
            PropertyError::InvalidKey { key } => Self::InvalidKey { key },
            PropertyError::UnexpectedKind {
                expected, found, ..
            } => Self::UnexpectedValueKind {
                expected: expected.name(),
                found: found.name(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn value_kind_mismatch_maps_to_unexpected_value_kind() {
        let err: GateError = ValueError::UnexpectedKind {
            expected: ValueKind::Bit,
            found: ValueKind::Byte,
        }
        .into();
        assert_eq!(
            err,
            GateError::UnexpectedValueKind {
                expected: "bit",
                found: "byte",
            }
        );
    }

    #[test]
    fn property_errors_map_to_taxonomy() {
        let err: GateError = PropertyError::InvalidKey { key: "k".into() }.into();
        assert_eq!(err, GateError::InvalidKey { key: "k".into() });

        let err: GateError = PropertyError::UnexpectedKind {
            key: "k".into(),
            expected: PropertyKind::U8,
            found: PropertyKind::Str,
        }
        .into();
        assert_eq!(
            err,
            GateError::UnexpectedValueKind {
                expected: "u8",
                found: "string",
            }
        );
    }

    #[test]
    fn short_circuit_display_names_wire_and_values() {
        let sc = ShortCircuit {
            wire: WireId::new(4, 0),
            first: DrivenValue::byte(Strength(0), 1),
            second: DrivenValue::bit(Strength(0), true),
        };
        let msg = GateError::from(sc).to_string();
        assert!(msg.contains("wire#4.0"));
        assert!(msg.contains("byte:0x01@s0"));
        assert!(msg.contains("bit:1@s0"));
    }
}
