//! A [`PinAccess`] stand-in for unit-testing gates without an engine.

use gatesim_core::{DrivenValue, Gate, GateError, PinAccess, PinLayout, PinRole, PropertyStore};

/// Mock implementation of [`PinAccess`].
///
/// Pin values are set up front with [`set`](MockPins::set); writes are
/// recorded separately and inspected with [`written`](MockPins::written).
/// Reads never observe writes.
pub struct MockPins {
    roles: PinLayout,
    values: Vec<DrivenValue>,
    written: Vec<Option<DrivenValue>>,
    properties: PropertyStore,
}

impl MockPins {
    /// Pins shaped like `gate`'s layout, all undriven, with its default
    /// properties.
    pub fn for_gate(gate: &dyn Gate) -> Self {
        let roles = gate.pins();
        let count = roles.len();
        Self {
            roles,
            values: vec![DrivenValue::none(); count],
            written: vec![None; count],
            properties: gate.default_properties(),
        }
    }

    /// Set the value pin `index` reads.
    pub fn set(&mut self, index: usize, value: DrivenValue) -> &mut Self {
        self.values[index] = value;
        self
    }

    /// Replace the property store.
    pub fn set_properties(&mut self, properties: PropertyStore) -> &mut Self {
        self.properties = properties;
        self
    }

    /// Last value written to pin `index`, if any.
    pub fn written(&self, index: usize) -> Option<&DrivenValue> {
        self.written[index].as_ref()
    }

    /// Forget recorded writes.
    pub fn clear_writes(&mut self) {
        self.written.iter_mut().for_each(|w| *w = None);
    }

    fn check(&self, index: usize) -> Result<PinRole, GateError> {
        self.roles
            .get(index)
            .copied()
            .ok_or(GateError::PinOutOfRange {
                index,
                count: self.roles.len(),
            })
    }
}

impl PinAccess for MockPins {
    fn pin_count(&self) -> usize {
        self.roles.len()
    }

    fn role(&self, index: usize) -> Result<PinRole, GateError> {
        self.check(index)
    }

    fn read(&self, index: usize) -> Result<DrivenValue, GateError> {
        self.check(index)?;
        Ok(self.values[index].clone())
    }

    fn write(&mut self, index: usize, value: DrivenValue) -> Result<(), GateError> {
        if !self.check(index)?.can_drive() {
            return Err(GateError::PinRoleViolation { index });
        }
        self.written[index] = Some(value);
        Ok(())
    }

    fn properties(&self) -> &PropertyStore {
        &self.properties
    }
}
