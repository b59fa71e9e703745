//! Pin roles and gate pin layouts.

use std::fmt;

use smallvec::SmallVec;

/// The fixed role of a gate pin.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PinRole {
    /// Read-only contact. Wire changes dirty the owning gate.
    Input,
    /// Driving contact. Wire changes never dirty the owning gate.
    Output,
    /// Reads and drives. Wire changes dirty the owning gate.
    Bidirectional,
}

impl PinRole {
    /// Whether a gate may drive a wire through this pin.
    pub fn can_drive(self) -> bool {
        !matches!(self, Self::Input)
    }

    /// Whether a change on the bound wire dirties the owning gate.
    pub fn is_sensitive(self) -> bool {
        !matches!(self, Self::Output)
    }
}

impl fmt::Display for PinRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Input => write!(f, "in"),
            Self::Output => write!(f, "out"),
            Self::Bidirectional => write!(f, "inout"),
        }
    }
}

/// Ordered pin roles declared by a gate at construction.
///
/// Inline up to 8 pins, which covers every reference gate.
pub type PinLayout = SmallVec<[PinRole; 8]>;

/// Most pins a gate may declare. Pin ordinals are `u16`.
pub const MAX_PINS: usize = u16::MAX as usize + 1;

/// Layout with `inputs` input pins followed by `outputs` output pins.
pub fn layout(inputs: usize, outputs: usize) -> PinLayout {
    let mut pins = PinLayout::with_capacity(inputs + outputs);
    pins.extend(std::iter::repeat(PinRole::Input).take(inputs));
    pins.extend(std::iter::repeat(PinRole::Output).take(outputs));
    pins
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_orders_inputs_first() {
        let pins = layout(2, 1);
        assert_eq!(
            pins.as_slice(),
            &[PinRole::Input, PinRole::Input, PinRole::Output]
        );
    }

    #[test]
    fn role_capabilities() {
        assert!(!PinRole::Input.can_drive());
        assert!(PinRole::Input.is_sensitive());
        assert!(PinRole::Output.can_drive());
        assert!(!PinRole::Output.is_sensitive());
        assert!(PinRole::Bidirectional.can_drive());
        assert!(PinRole::Bidirectional.is_sensitive());
    }
}
