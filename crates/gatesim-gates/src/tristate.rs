//! Tri-state buffer.

use gatesim_core::{layout, DrivenValue, Gate, GateError, PinAccess, PinLayout, Strength};

use crate::logic::level;

/// Data input.
pub const DATA: usize = 0;
/// Enable input.
pub const ENABLE: usize = 1;
/// Output.
pub const OUTPUT: usize = 2;

/// Passes its data input through while enable is 1, and releases the
/// output otherwise (enable 0 or undriven).
///
/// The data payload may be of any kind; it is re-driven at the buffer's
/// own strength. Several tri-state buffers sharing one output wire form
/// a bus.
#[derive(Clone, Debug)]
pub struct TriStateBuffer {
    strength: Strength,
}

impl TriStateBuffer {
    /// A buffer driving at [`Strength::STRONGEST`].
    pub fn new() -> Self {
        Self {
            strength: Strength::STRONGEST,
        }
    }

    /// Drive the output at `strength` instead of [`Strength::STRONGEST`].
    pub fn with_strength(mut self, strength: Strength) -> Self {
        self.strength = strength;
        self
    }
}

impl Default for TriStateBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl Gate for TriStateBuffer {
    fn name(&self) -> &str {
        "tristate"
    }

    fn pins(&self) -> PinLayout {
        layout(2, 1)
    }

    fn update(&self, pins: &mut dyn PinAccess) -> Result<(), GateError> {
        let out = match level(&pins.read(ENABLE)?)? {
            Some(true) => pins.read(DATA)?.with_strength(self.strength),
            _ => DrivenValue::none(),
        };
        pins.write(OUTPUT, out)
    }
}
