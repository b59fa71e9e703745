//! Driven values: one driver's contribution to a wire.
//!
//! A [`DrivenValue`] pairs a [`Strength`] with a typed [`Payload`]. The
//! sentinel "no value" is the only value with kind [`ValueKind::None`] and
//! it always carries [`Strength::UNDRIVEN`]; every other value carries a
//! real strength. Constructors enforce this, so a `DrivenValue` in hand is
//! always well-formed.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use crate::error::ValueError;

/// Ordinal drive priority. Lower numeric value wins.
///
/// `Strength(255)` denotes an undriven (high-impedance) contact and never
/// appears on a real contribution.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Strength(pub u8);

impl Strength {
    /// The strongest possible drive.
    pub const STRONGEST: Strength = Strength(0);
    /// Resistive pull drive, overridden by any ordinary driver.
    pub const PULL: Strength = Strength(128);
    /// High impedance: no contribution at all.
    pub const UNDRIVEN: Strength = Strength(u8::MAX);

    /// Whether this is the undriven sentinel strength.
    pub fn is_undriven(self) -> bool {
        self == Self::UNDRIVEN
    }

    /// Whether `self` strictly beats `other`.
    pub fn beats(self, other: Strength) -> bool {
        self.0 < other.0
    }
}

impl Default for Strength {
    fn default() -> Self {
        Self::STRONGEST
    }
}

impl fmt::Display for Strength {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_undriven() {
            write!(f, "z")
        } else {
            write!(f, "s{}", self.0)
        }
    }
}

/// The payload kinds a wire can carry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ValueKind {
    /// No value (undriven).
    None,
    /// A single logic level.
    Bit,
    /// 8-bit word.
    Byte,
    /// 16-bit word.
    Word,
    /// 32-bit word.
    DWord,
    /// 64-bit word.
    QWord,
    /// 64-bit float.
    Float,
    /// Opaque externally allocated resource.
    Handle,
}

impl ValueKind {
    /// Lower-case name used in diagnostics.
    pub fn name(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Bit => "bit",
            Self::Byte => "byte",
            Self::Word => "word",
            Self::DWord => "dword",
            Self::QWord => "qword",
            Self::Float => "float",
            Self::Handle => "handle",
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Shared ownership of an externally allocated resource.
///
/// The resource is handed over when the handle is created and released
/// when the last [`DrivenValue`] (or other clone) holding it is dropped.
/// Equality is resource identity, never content.
#[derive(Clone)]
pub struct OpaqueHandle(Arc<dyn Any + Send + Sync>);

impl OpaqueHandle {
    /// Take ownership of `resource`.
    pub fn new<T: Any + Send + Sync>(resource: T) -> Self {
        Self(Arc::new(resource))
    }

    /// Borrow the resource as `T`, if that is its type.
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.0.downcast_ref::<T>()
    }

    /// Whether both handles refer to the same resource.
    pub fn same_resource(&self, other: &OpaqueHandle) -> bool {
        self.addr() == other.addr()
    }

    /// Number of live holders of the resource.
    pub fn holders(&self) -> usize {
        Arc::strong_count(&self.0)
    }

    fn addr(&self) -> *const () {
        Arc::as_ptr(&self.0) as *const ()
    }
}

impl PartialEq for OpaqueHandle {
    fn eq(&self, other: &Self) -> bool {
        self.same_resource(other)
    }
}

impl Eq for OpaqueHandle {}

impl fmt::Debug for OpaqueHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "OpaqueHandle({:p})", self.addr())
    }
}

/// Typed payload of a driven value.
#[derive(Clone, Debug)]
pub enum Payload {
    /// No value.
    None,
    /// Logic level.
    Bit(bool),
    /// 8-bit word.
    Byte(u8),
    /// 16-bit word.
    Word(u16),
    /// 32-bit word.
    DWord(u32),
    /// 64-bit word.
    QWord(u64),
    /// 64-bit float, compared by raw bits.
    Float(f64),
    /// Opaque resource, compared by identity.
    Handle(OpaqueHandle),
}

impl Payload {
    /// The kind tag of this payload.
    pub fn kind(&self) -> ValueKind {
        match self {
            Self::None => ValueKind::None,
            Self::Bit(_) => ValueKind::Bit,
            Self::Byte(_) => ValueKind::Byte,
            Self::Word(_) => ValueKind::Word,
            Self::DWord(_) => ValueKind::DWord,
            Self::QWord(_) => ValueKind::QWord,
            Self::Float(_) => ValueKind::Float,
            Self::Handle(_) => ValueKind::Handle,
        }
    }
}

impl PartialEq for Payload {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::None, Self::None) => true,
            (Self::Bit(a), Self::Bit(b)) => a == b,
            (Self::Byte(a), Self::Byte(b)) => a == b,
            (Self::Word(a), Self::Word(b)) => a == b,
            (Self::DWord(a), Self::DWord(b)) => a == b,
            (Self::QWord(a), Self::QWord(b)) => a == b,
            (Self::Float(a), Self::Float(b)) => a.to_bits() == b.to_bits(),
            (Self::Handle(a), Self::Handle(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for Payload {}

impl fmt::Display for Payload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => write!(f, "none"),
            Self::Bit(v) => write!(f, "{}", u8::from(*v)),
            Self::Byte(v) => write!(f, "{v:#04x}"),
            Self::Word(v) => write!(f, "{v:#06x}"),
            Self::DWord(v) => write!(f, "{v:#010x}"),
            Self::QWord(v) => write!(f, "{v:#018x}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::Handle(h) => write!(f, "{h:?}"),
        }
    }
}

/// One driver's contribution to a wire.
///
/// Equality is structural: kind, strength and raw payload bits. This is
/// what lets a wire locate a specific earlier contribution for removal.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DrivenValue {
    strength: Strength,
    payload: Payload,
}

impl DrivenValue {
    /// Checked constructor.
    ///
    /// Rejects a real payload at [`Strength::UNDRIVEN`] and a
    /// [`Payload::None`] at any other strength.
    pub fn new(strength: Strength, payload: Payload) -> Result<Self, ValueError> {
        let undriven = strength.is_undriven();
        match payload {
            Payload::None if undriven => Ok(Self::none()),
            Payload::None => Err(ValueError::MissingPayload { strength }),
            payload if undriven => Err(ValueError::UndrivenStrength {
                kind: payload.kind(),
            }),
            payload => Ok(Self { strength, payload }),
        }
    }

    /// The "no value" sentinel.
    pub fn none() -> Self {
        Self {
            strength: Strength::UNDRIVEN,
            payload: Payload::None,
        }
    }

    /// Drive `payload` at `strength`; driving at [`Strength::UNDRIVEN`] is
    /// the same as not driving and yields the sentinel.
    pub fn driven(strength: Strength, payload: Payload) -> Self {
        Self::new(strength, payload).unwrap_or_else(|_| Self::none())
    }

    /// A logic level.
    pub fn bit(strength: Strength, value: bool) -> Self {
        Self::driven(strength, Payload::Bit(value))
    }

    /// An 8-bit word.
    pub fn byte(strength: Strength, value: u8) -> Self {
        Self::driven(strength, Payload::Byte(value))
    }

    /// A 16-bit word.
    pub fn word(strength: Strength, value: u16) -> Self {
        Self::driven(strength, Payload::Word(value))
    }

    /// A 32-bit word.
    pub fn dword(strength: Strength, value: u32) -> Self {
        Self::driven(strength, Payload::DWord(value))
    }

    /// A 64-bit word.
    pub fn qword(strength: Strength, value: u64) -> Self {
        Self::driven(strength, Payload::QWord(value))
    }

    /// A float.
    pub fn float(strength: Strength, value: f64) -> Self {
        Self::driven(strength, Payload::Float(value))
    }

    /// An opaque resource. Ownership of the resource moves into the value.
    pub fn handle(strength: Strength, handle: OpaqueHandle) -> Self {
        Self::driven(strength, Payload::Handle(handle))
    }

    /// The same payload re-driven at `strength`.
    pub fn with_strength(&self, strength: Strength) -> Self {
        Self::driven(strength, self.payload.clone())
    }

    /// Drive strength.
    pub fn strength(&self) -> Strength {
        self.strength
    }

    /// Payload kind.
    pub fn kind(&self) -> ValueKind {
        self.payload.kind()
    }

    /// Borrow the payload.
    pub fn payload(&self) -> &Payload {
        &self.payload
    }

    /// Whether this is the "no value" sentinel.
    pub fn is_none(&self) -> bool {
        matches!(self.payload, Payload::None)
    }

    /// Structural equality.
    pub fn is(&self, other: &DrivenValue) -> bool {
        self == other
    }

    /// The logic level, or [`ValueError::UnexpectedKind`].
    pub fn as_bit(&self) -> Result<bool, ValueError> {
        match self.payload {
            Payload::Bit(v) => Ok(v),
            _ => Err(self.mismatch(ValueKind::Bit)),
        }
    }

    /// The 8-bit word, or [`ValueError::UnexpectedKind`].
    pub fn as_byte(&self) -> Result<u8, ValueError> {
        match self.payload {
            Payload::Byte(v) => Ok(v),
            _ => Err(self.mismatch(ValueKind::Byte)),
        }
    }

    /// The 16-bit word, or [`ValueError::UnexpectedKind`].
    pub fn as_word(&self) -> Result<u16, ValueError> {
        match self.payload {
            Payload::Word(v) => Ok(v),
            _ => Err(self.mismatch(ValueKind::Word)),
        }
    }

    /// The 32-bit word, or [`ValueError::UnexpectedKind`].
    pub fn as_dword(&self) -> Result<u32, ValueError> {
        match self.payload {
            Payload::DWord(v) => Ok(v),
            _ => Err(self.mismatch(ValueKind::DWord)),
        }
    }

    /// The 64-bit word, or [`ValueError::UnexpectedKind`].
    pub fn as_qword(&self) -> Result<u64, ValueError> {
        match self.payload {
            Payload::QWord(v) => Ok(v),
            _ => Err(self.mismatch(ValueKind::QWord)),
        }
    }

    /// The float, or [`ValueError::UnexpectedKind`].
    pub fn as_float(&self) -> Result<f64, ValueError> {
        match self.payload {
            Payload::Float(v) => Ok(v),
            _ => Err(self.mismatch(ValueKind::Float)),
        }
    }

    /// The opaque resource, or [`ValueError::UnexpectedKind`].
    pub fn as_handle(&self) -> Result<&OpaqueHandle, ValueError> {
        match &self.payload {
            Payload::Handle(h) => Ok(h),
            _ => Err(self.mismatch(ValueKind::Handle)),
        }
    }

    fn mismatch(&self, expected: ValueKind) -> ValueError {
        ValueError::UnexpectedKind {
            expected,
            found: self.kind(),
        }
    }
}

impl Default for DrivenValue {
    fn default() -> Self {
        Self::none()
    }
}

impl fmt::Display for DrivenValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_none() {
            return write!(f, "none");
        }
        write!(f, "{}:{}@{}", self.kind(), self.payload, self.strength)
    }
}
