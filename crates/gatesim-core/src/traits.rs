//! Core abstraction traits: the gate capability and its pin context.

use crate::error::GateError;
use crate::pin::{PinLayout, PinRole};
use crate::property::PropertyStore;
use crate::value::DrivenValue;

/// Pin-level access handed to [`Gate::update`].
///
/// Implemented by the engine. Indices are pin ordinals in the gate's
/// declared layout.
pub trait PinAccess {
    /// Number of pins the gate owns.
    fn pin_count(&self) -> usize;

    /// Role of pin `index`.
    fn role(&self, index: usize) -> Result<PinRole, GateError>;

    /// Current winning value of the wire bound to pin `index`, or the
    /// no-value sentinel if the pin is unbound.
    fn read(&self, index: usize) -> Result<DrivenValue, GateError>;

    /// Replace this pin's contribution to its wire.
    ///
    /// Fails with [`GateError::PinRoleViolation`] on input pins and with
    /// [`GateError::ShortCircuit`] if the new contribution conflicts with
    /// another equal-strength driver. Writing an unbound pin is a no-op.
    fn write(&mut self, index: usize, value: DrivenValue) -> Result<(), GateError>;

    /// The gate's configuration.
    fn properties(&self) -> &PropertyStore;
}

/// A gate's behavior: a fixed pin layout plus an update function.
///
/// # Contract
///
/// - `pins()` is called once when the gate is inserted; the layout never
///   changes afterwards.
/// - `update()` must be a pure function of the current input values and
///   the gate's properties: it reads pins, computes, and writes pins.
/// - Updates of different gates run concurrently on scheduler workers,
///   hence `Send + Sync`. One gate is never updated concurrently with
///   itself.
///
/// # Examples
///
/// ```
/// use gatesim_core::{layout, DrivenValue, Gate, GateError, PinAccess, PinLayout, Strength};
///
/// struct Inverter;
///
/// impl Gate for Inverter {
///     fn name(&self) -> &str { "inverter" }
///
///     fn pins(&self) -> PinLayout { layout(1, 1) }
///
///     fn update(&self, pins: &mut dyn PinAccess) -> Result<(), GateError> {
///         let input = pins.read(0)?;
///         let out = if input.is_none() {
///             DrivenValue::none()
///         } else {
///             DrivenValue::bit(Strength::STRONGEST, !input.as_bit()?)
///         };
///         pins.write(1, out)
///     }
/// }
///
/// assert_eq!(Inverter.pins().len(), 2);
/// ```
pub trait Gate: Send + Sync + 'static {
    /// Human-readable kind name for diagnostics.
    fn name(&self) -> &str;

    /// Ordered pin roles.
    fn pins(&self) -> PinLayout;

    /// Whether the gate accepts property changes after insertion.
    fn is_configurable(&self) -> bool {
        false
    }

    /// Properties attached to the gate at insertion.
    fn default_properties(&self) -> PropertyStore {
        PropertyStore::new()
    }

    /// Recompute outputs from the current inputs.
    fn update(&self, pins: &mut dyn PinAccess) -> Result<(), GateError>;
}
