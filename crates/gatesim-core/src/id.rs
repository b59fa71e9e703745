//! Strongly-typed identifiers for circuit entities.
//!
//! Wires and gates live in generational slot arenas. Their ids carry the
//! slot index plus the slot generation at insertion time, so an id that
//! outlives its entity never aliases whatever reuses the slot.

use std::fmt;

/// Identifies a wire within a circuit.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WireId {
    index: u32,
    generation: u32,
}

impl WireId {
    /// Build an id from its slot index and generation.
    pub fn new(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }

    /// Slot index in the wire arena.
    pub fn index(&self) -> u32 {
        self.index
    }

    /// Slot generation at insertion time.
    pub fn generation(&self) -> u32 {
        self.generation
    }
}

impl fmt::Display for WireId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "wire#{}.{}", self.index, self.generation)
    }
}

/// Identifies a gate within a circuit.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GateId {
    index: u32,
    generation: u32,
}

impl GateId {
    /// Build an id from its slot index and generation.
    pub fn new(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }

    /// Slot index in the gate arena.
    pub fn index(&self) -> u32 {
        self.index
    }

    /// Slot generation at insertion time.
    pub fn generation(&self) -> u32 {
        self.generation
    }

    /// The id of this gate's pin at ordinal `index`.
    pub fn pin(&self, index: u16) -> PinId {
        PinId { gate: *self, index }
    }
}

impl fmt::Display for GateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "gate#{}.{}", self.index, self.generation)
    }
}

/// Identifies a pin: the owning gate plus the pin's ordinal position.
///
/// Pin ordinals are fixed when the gate is inserted and never change.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PinId {
    /// Owning gate.
    pub gate: GateId,
    /// Ordinal position in the gate's pin layout.
    pub index: u16,
}

impl fmt::Display for PinId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/pin{}", self.gate, self.index)
    }
}
