//! Configurable constant driver.

use gatesim_core::{
    layout, DrivenValue, Gate, GateError, PinAccess, PinLayout, Payload, PropertyStore, Strength,
    ValueKind,
};

/// Property: payload kind name (`"bit"`, `"byte"`, `"word"`, `"dword"`,
/// `"qword"`, `"float"` or `"none"`).
pub const KIND: &str = "kind";
/// Property: the value. `u64` for integer kinds and bits, `f64` for floats.
pub const VALUE: &str = "value";
/// Property: drive strength as `u8`.
pub const STRENGTH: &str = "strength";

/// One output pin driving the value described by its properties.
///
/// Changing a property through the simulation marks the gate dirty, so the
/// new value is driven on the next pass.
#[derive(Clone, Debug)]
pub struct Constant {
    defaults: PropertyStore,
}

impl Constant {
    /// An integer-kind constant. `value` must fit `kind`.
    pub fn new(kind: ValueKind, value: u64) -> Self {
        Self {
            defaults: PropertyStore::new()
                .with(KIND, kind.name())
                .with(VALUE, value)
                .with(STRENGTH, Strength::STRONGEST.0),
        }
    }

    /// A logic level.
    pub fn bit(level: bool) -> Self {
        Self::new(ValueKind::Bit, u64::from(level))
    }

    /// A float.
    pub fn float(value: f64) -> Self {
        Self {
            defaults: PropertyStore::new()
                .with(KIND, ValueKind::Float.name())
                .with(VALUE, value)
                .with(STRENGTH, Strength::STRONGEST.0),
        }
    }

    /// Drive at `strength` instead of [`Strength::STRONGEST`].
    pub fn with_strength(mut self, strength: Strength) -> Self {
        self.defaults.set(STRENGTH, strength.0);
        self
    }
}

fn misfit(value: u64, kind: &str) -> GateError {
    GateError::ExecutionFailed {
        reason: format!("value {value} does not fit kind {kind}"),
    }
}

fn fit<T: TryFrom<u64>>(value: u64, kind: &str) -> Result<T, GateError> {
    T::try_from(value).map_err(|_| misfit(value, kind))
}

/// Build the configured value.
fn configured(properties: &PropertyStore) -> Result<DrivenValue, GateError> {
    let strength = Strength(properties.get_or(STRENGTH, Strength::STRONGEST.0)?);
    let kind: String = properties.get_or(KIND, ValueKind::Bit.name().to_string())?;
    let payload = match kind.as_str() {
        "none" => Payload::None,
        "float" => Payload::Float(properties.get_as(VALUE)?),
        kind => {
            let raw: u64 = properties.get_as(VALUE)?;
            match kind {
                "bit" => match raw {
                    0 | 1 => Payload::Bit(raw == 1),
                    _ => return Err(misfit(raw, kind)),
                },
                "byte" => Payload::Byte(fit(raw, kind)?),
                "word" => Payload::Word(fit(raw, kind)?),
                "dword" => Payload::DWord(fit(raw, kind)?),
                "qword" => Payload::QWord(raw),
                other => {
                    return Err(GateError::ExecutionFailed {
                        reason: format!("unsupported constant kind '{other}'"),
                    })
                }
            }
        }
    };
    Ok(DrivenValue::driven(strength, payload))
}

impl Gate for Constant {
    fn name(&self) -> &str {
        "constant"
    }

    fn pins(&self) -> PinLayout {
        layout(0, 1)
    }

    fn is_configurable(&self) -> bool {
        true
    }

    fn default_properties(&self) -> PropertyStore {
        self.defaults.clone()
    }

    fn update(&self, pins: &mut dyn PinAccess) -> Result<(), GateError> {
        let value = configured(pins.properties())?;
        pins.write(0, value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gatesim_test_utils::MockPins;

    fn run(gate: &Constant, properties: Option<PropertyStore>) -> Result<DrivenValue, GateError> {
        let mut pins = MockPins::for_gate(gate);
        if let Some(properties) = properties {
            pins.set_properties(properties);
        }
        gate.update(&mut pins)?;
        Ok(pins.written(0).cloned().unwrap())
    }

    #[test]
    fn drives_default_configuration() {
        assert_eq!(
            run(&Constant::bit(true), None).unwrap(),
            DrivenValue::bit(Strength::STRONGEST, true)
        );
        assert_eq!(
            run(&Constant::new(ValueKind::Word, 0x1234).with_strength(Strength(9)), None).unwrap(),
            DrivenValue::word(Strength(9), 0x1234)
        );
        assert_eq!(
            run(&Constant::float(2.5), None).unwrap(),
            DrivenValue::float(Strength::STRONGEST, 2.5)
        );
    }

    #[test]
    fn undriven_strength_or_none_kind_releases() {
        let gate = Constant::bit(true).with_strength(Strength::UNDRIVEN);
        assert!(run(&gate, None).unwrap().is_none());
        let props = PropertyStore::new().with(KIND, "none");
        assert!(run(&Constant::bit(true), Some(props)).unwrap().is_none());
    }

    #[test]
    fn out_of_range_value_fails() {
        let gate = Constant::new(ValueKind::Byte, 300);
        let err = run(&gate, None).unwrap_err();
        assert_eq!(
            err,
            GateError::ExecutionFailed {
                reason: "value 300 does not fit kind byte".into()
            }
        );
    }

    #[test]
    fn wrong_property_kind_fails() {
        let props = PropertyStore::new().with(VALUE, "high");
        let err = run(&Constant::bit(true), Some(props)).unwrap_err();
        assert_eq!(
            err,
            GateError::UnexpectedValueKind {
                expected: "u64",
                found: "string"
            }
        );
    }

    #[test]
    fn unsupported_kind_fails() {
        let props = PropertyStore::new().with(KIND, "handle").with(VALUE, 1u64);
        assert!(matches!(
            run(&Constant::bit(true), Some(props)),
            Err(GateError::ExecutionFailed { .. })
        ));
    }

    #[test]
    fn is_configurable() {
        let gate = Constant::bit(false);
        assert!(gate.is_configurable());
        assert_eq!(gate.default_properties().len(), 3);
    }
}
