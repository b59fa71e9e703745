//! Reusable gate fixtures.
//!
//! - [`CountingGate`]: records every update and the inputs it saw.
//! - [`SourceGate`]: drives a fixed value, reads nothing.
//! - [`DriverGate`]: output pins the test writes through directly.
//! - [`FailingGate`]: fails (or panics) a set number of times, then succeeds.
//! - [`RedirtyingGate`]: feeds its own output back until a limit, forcing
//!   re-dirty during update.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use gatesim_core::{layout, DrivenValue, Gate, GateError, PinAccess, PinLayout, Strength};

// ── Probe ────────────────────────────────────────────────────────

/// Shared view of a fixture's activity, kept by the test after the gate
/// itself moves into a simulation.
#[derive(Clone, Debug, Default)]
pub struct Probe {
    calls: Arc<AtomicUsize>,
    last_inputs: Arc<Mutex<Vec<DrivenValue>>>,
}

impl Probe {
    /// Updates run so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Input values read by the most recent update.
    pub fn last_inputs(&self) -> Vec<DrivenValue> {
        self.last_inputs
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn record(&self, inputs: Vec<DrivenValue>) -> usize {
        *self
            .last_inputs
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = inputs;
        self.calls.fetch_add(1, Ordering::SeqCst)
    }
}

fn read_all(pins: &dyn PinAccess, count: usize) -> Result<Vec<DrivenValue>, GateError> {
    (0..count).map(|i| pins.read(i)).collect()
}

// ── CountingGate ─────────────────────────────────────────────────

/// `inputs` input pins and no outputs. Each update reads every input and
/// records it on the [`Probe`].
pub struct CountingGate {
    inputs: usize,
    probe: Probe,
}

impl CountingGate {
    pub fn new(inputs: usize) -> Self {
        Self {
            inputs,
            probe: Probe::default(),
        }
    }

    pub fn probe(&self) -> Probe {
        self.probe.clone()
    }
}

impl Gate for CountingGate {
    fn name(&self) -> &str {
        "counting"
    }

    fn pins(&self) -> PinLayout {
        layout(self.inputs, 0)
    }

    fn update(&self, pins: &mut dyn PinAccess) -> Result<(), GateError> {
        let inputs = read_all(pins, self.inputs)?;
        self.probe.record(inputs);
        Ok(())
    }
}

// ── SourceGate ───────────────────────────────────────────────────

/// One output pin driving a fixed value on every update.
pub struct SourceGate {
    value: DrivenValue,
    probe: Probe,
}

impl SourceGate {
    pub fn new(value: DrivenValue) -> Self {
        Self {
            value,
            probe: Probe::default(),
        }
    }

    /// Strongest logic level.
    pub fn bit(level: bool) -> Self {
        Self::new(DrivenValue::bit(Strength::STRONGEST, level))
    }

    pub fn probe(&self) -> Probe {
        self.probe.clone()
    }
}

impl Gate for SourceGate {
    fn name(&self) -> &str {
        "source"
    }

    fn pins(&self) -> PinLayout {
        layout(0, 1)
    }

    fn update(&self, pins: &mut dyn PinAccess) -> Result<(), GateError> {
        self.probe.record(Vec::new());
        pins.write(0, self.value.clone())
    }
}

// ── DriverGate ───────────────────────────────────────────────────

/// `outputs` output pins and an update that does nothing, so values written
/// with `Simulation::write_pin` stay put across passes.
pub struct DriverGate {
    outputs: usize,
}

impl DriverGate {
    pub fn new(outputs: usize) -> Self {
        Self { outputs }
    }
}

impl Gate for DriverGate {
    fn name(&self) -> &str {
        "driver"
    }

    fn pins(&self) -> PinLayout {
        layout(0, self.outputs)
    }

    fn update(&self, _pins: &mut dyn PinAccess) -> Result<(), GateError> {
        Ok(())
    }
}

// ── FailingGate ──────────────────────────────────────────────────

/// How a [`FailingGate`] fails.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FailureMode {
    /// Return [`GateError::ExecutionFailed`].
    Error,
    /// Panic inside `update`.
    Panic,
}

/// One input, one output. Fails the first `failures` updates, then copies
/// its input to its output.
pub struct FailingGate {
    failures: usize,
    mode: FailureMode,
    probe: Probe,
}

impl FailingGate {
    /// Fail `failures` times with an error, then succeed.
    pub fn new(failures: usize) -> Self {
        Self {
            failures,
            mode: FailureMode::Error,
            probe: Probe::default(),
        }
    }

    /// Never succeed.
    pub fn always() -> Self {
        Self::new(usize::MAX)
    }

    /// Fail by panicking instead of returning an error.
    pub fn panicking(mut self) -> Self {
        self.mode = FailureMode::Panic;
        self
    }

    pub fn probe(&self) -> Probe {
        self.probe.clone()
    }
}

impl Gate for FailingGate {
    fn name(&self) -> &str {
        "failing"
    }

    fn pins(&self) -> PinLayout {
        layout(1, 1)
    }

    fn update(&self, pins: &mut dyn PinAccess) -> Result<(), GateError> {
        let input = pins.read(0)?;
        let n = self.probe.record(vec![input.clone()]);
        if n < self.failures {
            match self.mode {
                FailureMode::Error => {
                    return Err(GateError::ExecutionFailed {
                        reason: format!("deliberate failure {} of {}", n + 1, self.failures),
                    })
                }
                FailureMode::Panic => panic!("deliberate panic on call {}", n + 1),
            }
        }
        pins.write(1, input)
    }
}

// ── RedirtyingGate ───────────────────────────────────────────────

/// Input pin 0 and output pin 1, meant to share one wire. Each update
/// reads a byte (absent counts as 0) and, below `limit`, drives it plus
/// one. The write changes the wire its own input sits on, so the gate is
/// re-dirtied while updating. Settles after `limit + 1` updates.
pub struct RedirtyingGate {
    limit: u8,
    probe: Probe,
}

impl RedirtyingGate {
    pub fn new(limit: u8) -> Self {
        Self {
            limit,
            probe: Probe::default(),
        }
    }

    pub fn probe(&self) -> Probe {
        self.probe.clone()
    }
}

impl Gate for RedirtyingGate {
    fn name(&self) -> &str {
        "redirtying"
    }

    fn pins(&self) -> PinLayout {
        layout(1, 1)
    }

    fn update(&self, pins: &mut dyn PinAccess) -> Result<(), GateError> {
        let input = pins.read(0)?;
        self.probe.record(vec![input.clone()]);
        let current = if input.is_none() { 0 } else { input.as_byte()? };
        if current < self.limit {
            pins.write(1, DrivenValue::byte(Strength::STRONGEST, current + 1))?;
        }
        Ok(())
    }
}
