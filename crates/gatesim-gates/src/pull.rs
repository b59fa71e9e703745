//! Pull-up / pull-down resistor.

use gatesim_core::{layout, DrivenValue, Gate, GateError, PinAccess, PinLayout, PropertyStore, Strength};

/// Property: the pulled level as `u8` (0 or 1).
pub const LEVEL: &str = "level";

/// Weakly drives a wire to a fixed level.
///
/// The level is driven at [`Strength::PULL`], so any ordinary driver on
/// the same wire overrides it, and the wire falls back to the pulled level
/// once every stronger driver releases.
#[derive(Clone, Debug)]
pub struct PullResistor {
    level: bool,
}

impl PullResistor {
    /// Pull to 1.
    pub fn up() -> Self {
        Self { level: true }
    }

    /// Pull to 0.
    pub fn down() -> Self {
        Self { level: false }
    }
}

impl Gate for PullResistor {
    fn name(&self) -> &str {
        "pull"
    }

    fn pins(&self) -> PinLayout {
        layout(0, 1)
    }

    fn is_configurable(&self) -> bool {
        true
    }

    fn default_properties(&self) -> PropertyStore {
        PropertyStore::new().with(LEVEL, u8::from(self.level))
    }

    fn update(&self, pins: &mut dyn PinAccess) -> Result<(), GateError> {
        let level = match pins.properties().get_as::<u8>(LEVEL)? {
            0 => false,
            1 => true,
            other => {
                return Err(GateError::ExecutionFailed {
                    reason: format!("pull level must be 0 or 1, got {other}"),
                })
            }
        };
        pins.write(0, DrivenValue::bit(Strength::PULL, level))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gatesim_test_utils::MockPins;

    #[test]
    fn drives_weak_level() {
        let gate = PullResistor::up();
        let mut pins = MockPins::for_gate(&gate);
        gate.update(&mut pins).unwrap();
        assert_eq!(pins.written(0), Some(&DrivenValue::bit(Strength::PULL, true)));
    }

    #[test]
    fn level_follows_property() {
        let gate = PullResistor::up();
        let mut pins = MockPins::for_gate(&gate);
        pins.set_properties(PropertyStore::new().with(LEVEL, 0u8));
        gate.update(&mut pins).unwrap();
        assert_eq!(pins.written(0), Some(&DrivenValue::bit(Strength::PULL, false)));

        pins.set_properties(PropertyStore::new().with(LEVEL, 7u8));
        assert!(gate.update(&mut pins).is_err());
    }
}
