//! Combinational logic gates over single-bit wires.
//!
//! Inputs are read as three-valued levels: a driven [`Bit`](gatesim_core::Payload::Bit)
//! is `0` or `1`, an undriven wire is unknown. A dominant input decides the
//! output regardless of unknowns (`0` for AND, `1` for OR); otherwise any
//! unknown input makes the output unknown, and an unknown output is driven
//! as the no-value sentinel, releasing the wire.

use std::fmt;

use gatesim_core::{layout, DrivenValue, Gate, GateError, PinAccess, PinLayout, Strength};

/// Read a pin as a three-valued level.
pub(crate) fn level(value: &DrivenValue) -> Result<Option<bool>, GateError> {
    if value.is_none() {
        return Ok(None);
    }
    Ok(Some(value.as_bit()?))
}

/// Drive a three-valued level; unknown releases the wire.
pub(crate) fn drive(strength: Strength, level: Option<bool>) -> DrivenValue {
    match level {
        Some(bit) => DrivenValue::bit(strength, bit),
        None => DrivenValue::none(),
    }
}

// ── LogicOp ──────────────────────────────────────────────────────

/// The boolean function a [`LogicGate`] computes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LogicOp {
    /// Copy the input.
    Buffer,
    /// Invert the input.
    Not,
    /// 1 iff every input is 1.
    And,
    /// 1 iff any input is 1.
    Or,
    /// 1 iff an odd number of inputs are 1.
    Xor,
    /// Inverted AND.
    Nand,
    /// Inverted OR.
    Nor,
}

impl LogicOp {
    /// Lower-case name used as the gate's kind name.
    pub fn name(self) -> &'static str {
        match self {
            Self::Buffer => "buffer",
            Self::Not => "not",
            Self::And => "and",
            Self::Or => "or",
            Self::Xor => "xor",
            Self::Nand => "nand",
            Self::Nor => "nor",
        }
    }

    /// Whether the op takes exactly one input.
    pub fn is_unary(self) -> bool {
        matches!(self, Self::Buffer | Self::Not)
    }

    /// Evaluate over three-valued inputs.
    pub fn eval(self, inputs: &[Option<bool>]) -> Option<bool> {
        match self {
            Self::Buffer => inputs.first().copied().flatten(),
            Self::Not => inputs.first().copied().flatten().map(|b| !b),
            Self::And => dominated(inputs, false),
            Self::Or => dominated(inputs, true),
            Self::Xor => inputs
                .iter()
                .try_fold(false, |acc, level| level.map(|b| acc ^ b)),
            Self::Nand => dominated(inputs, false).map(|b| !b),
            Self::Nor => dominated(inputs, true).map(|b| !b),
        }
    }
}

/// AND (`dominant = false`) or OR (`dominant = true`).
fn dominated(inputs: &[Option<bool>], dominant: bool) -> Option<bool> {
    if inputs.contains(&Some(dominant)) {
        Some(dominant)
    } else if inputs.contains(&None) {
        None
    } else {
        Some(!dominant)
    }
}

impl fmt::Display for LogicOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ── LogicGate ────────────────────────────────────────────────────

/// A combinational gate: `inputs` input pins followed by one output pin.
///
/// # Examples
///
/// ```
/// use gatesim_core::Gate;
/// use gatesim_gates::LogicGate;
///
/// let and = LogicGate::and(3);
/// assert_eq!(and.name(), "and");
/// assert_eq!(and.pins().len(), 4);
/// assert_eq!(and.output_pin(), 3);
/// ```
#[derive(Clone, Debug)]
pub struct LogicGate {
    op: LogicOp,
    inputs: usize,
    strength: Strength,
}

impl LogicGate {
    /// Create a gate. Unary ops always get one input; the others get at
    /// least one.
    pub fn new(op: LogicOp, inputs: usize) -> Self {
        let inputs = if op.is_unary() { 1 } else { inputs.max(1) };
        Self {
            op,
            inputs,
            strength: Strength::STRONGEST,
        }
    }

    /// Single-input buffer.
    pub fn buffer() -> Self {
        Self::new(LogicOp::Buffer, 1)
    }

    /// Inverter.
    pub fn not() -> Self {
        Self::new(LogicOp::Not, 1)
    }

    /// `inputs`-way AND.
    pub fn and(inputs: usize) -> Self {
        Self::new(LogicOp::And, inputs)
    }

    /// `inputs`-way OR.
    pub fn or(inputs: usize) -> Self {
        Self::new(LogicOp::Or, inputs)
    }

    /// `inputs`-way XOR.
    pub fn xor(inputs: usize) -> Self {
        Self::new(LogicOp::Xor, inputs)
    }

    /// `inputs`-way NAND.
    pub fn nand(inputs: usize) -> Self {
        Self::new(LogicOp::Nand, inputs)
    }

    /// `inputs`-way NOR.
    pub fn nor(inputs: usize) -> Self {
        Self::new(LogicOp::Nor, inputs)
    }

    /// Drive the output at `strength` instead of [`Strength::STRONGEST`].
    pub fn with_strength(mut self, strength: Strength) -> Self {
        self.strength = strength;
        self
    }

    /// The boolean function.
    pub fn op(&self) -> LogicOp {
        self.op
    }

    /// Number of input pins.
    pub fn input_count(&self) -> usize {
        self.inputs
    }

    /// Ordinal of the output pin.
    pub fn output_pin(&self) -> usize {
        self.inputs
    }
}

impl Gate for LogicGate {
    fn name(&self) -> &str {
        self.op.name()
    }

    fn pins(&self) -> PinLayout {
        layout(self.inputs, 1)
    }

    fn update(&self, pins: &mut dyn PinAccess) -> Result<(), GateError> {
        let mut levels = Vec::with_capacity(self.inputs);
        for i in 0..self.inputs {
            levels.push(level(&pins.read(i)?)?);
        }
        pins.write(self.output_pin(), drive(self.strength, self.op.eval(&levels)))
    }
}
