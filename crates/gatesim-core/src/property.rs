//! Per-gate configuration store.
//!
//! A [`PropertyStore`] maps string keys to [`PropertyValue`]s drawn from a
//! fixed catalogue of kinds. Typed reads are strict: asking for a `u16`
//! where a `u8` is stored is an authoring error, not a silent conversion.

use std::fmt;

use indexmap::IndexMap;

use crate::error::PropertyError;

/// Kind tag of a [`PropertyValue`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PropertyKind {
    /// Unsigned 8-bit.
    U8,
    /// Unsigned 16-bit.
    U16,
    /// Unsigned 32-bit.
    U32,
    /// Unsigned 64-bit.
    U64,
    /// Signed 8-bit.
    I8,
    /// Signed 16-bit.
    I16,
    /// Signed 32-bit.
    I32,
    /// Signed 64-bit.
    I64,
    /// 64-bit float.
    F64,
    /// UTF-8 string.
    Str,
    /// Nested table.
    Table,
}

impl PropertyKind {
    /// Lower-case name used in diagnostics.
    pub fn name(self) -> &'static str {
        match self {
            Self::U8 => "u8",
            Self::U16 => "u16",
            Self::U32 => "u32",
            Self::U64 => "u64",
            Self::I8 => "i8",
            Self::I16 => "i16",
            Self::I32 => "i32",
            Self::I64 => "i64",
            Self::F64 => "f64",
            Self::Str => "string",
            Self::Table => "table",
        }
    }
}

impl fmt::Display for PropertyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A typed configuration value.
#[derive(Clone, Debug, PartialEq)]
pub enum PropertyValue {
    /// Unsigned 8-bit.
    U8(u8),
    /// Unsigned 16-bit.
    U16(u16),
    /// Unsigned 32-bit.
    U32(u32),
    /// Unsigned 64-bit.
    U64(u64),
    /// Signed 8-bit.
    I8(i8),
    /// Signed 16-bit.
    I16(i16),
    /// Signed 32-bit.
    I32(i32),
    /// Signed 64-bit.
    I64(i64),
    /// 64-bit float.
    F64(f64),
    /// UTF-8 string.
    Str(String),
    /// Nested table.
    Table(PropertyStore),
}

impl PropertyValue {
    /// The kind tag of this value.
    pub fn kind(&self) -> PropertyKind {
        match self {
            Self::U8(_) => PropertyKind::U8,
            Self::U16(_) => PropertyKind::U16,
            Self::U32(_) => PropertyKind::U32,
            Self::U64(_) => PropertyKind::U64,
            Self::I8(_) => PropertyKind::I8,
            Self::I16(_) => PropertyKind::I16,
            Self::I32(_) => PropertyKind::I32,
            Self::I64(_) => PropertyKind::I64,
            Self::F64(_) => PropertyKind::F64,
            Self::Str(_) => PropertyKind::Str,
            Self::Table(_) => PropertyKind::Table,
        }
    }
}

impl fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::U8(v) => write!(f, "{v}"),
            Self::U16(v) => write!(f, "{v}"),
            Self::U32(v) => write!(f, "{v}"),
            Self::U64(v) => write!(f, "{v}"),
            Self::I8(v) => write!(f, "{v}"),
            Self::I16(v) => write!(f, "{v}"),
            Self::I32(v) => write!(f, "{v}"),
            Self::I64(v) => write!(f, "{v}"),
            Self::F64(v) => write!(f, "{v}"),
            Self::Str(v) => f.write_str(v),
            Self::Table(t) => write!(f, "{t}"),
        }
    }
}

/// Conversion from a stored [`PropertyValue`] into a Rust type.
pub trait FromProperty: Sized {
    /// The kind this type is stored as.
    const KIND: PropertyKind;

    /// Extract `Self` if `value` has kind [`Self::KIND`](FromProperty::KIND).
    fn from_property(value: &PropertyValue) -> Option<Self>;
}

macro_rules! scalar_property {
    ($ty:ty, $variant:ident) => {
        impl From<$ty> for PropertyValue {
            fn from(v: $ty) -> Self {
                Self::$variant(v)
            }
        }

        impl FromProperty for $ty {
            const KIND: PropertyKind = PropertyKind::$variant;

            fn from_property(value: &PropertyValue) -> Option<Self> {
                match value {
                    PropertyValue::$variant(v) => Some(*v),
                    _ => None,
                }
            }
        }
    };
}

scalar_property!(u8, U8);
scalar_property!(u16, U16);
scalar_property!(u32, U32);
scalar_property!(u64, U64);
scalar_property!(i8, I8);
scalar_property!(i16, I16);
scalar_property!(i32, I32);
scalar_property!(i64, I64);
scalar_property!(f64, F64);

impl From<String> for PropertyValue {
    fn from(v: String) -> Self {
        Self::Str(v)
    }
}

impl From<&str> for PropertyValue {
    fn from(v: &str) -> Self {
        Self::Str(v.to_string())
    }
}

impl From<PropertyStore> for PropertyValue {
    fn from(v: PropertyStore) -> Self {
        Self::Table(v)
    }
}

impl FromProperty for String {
    const KIND: PropertyKind = PropertyKind::Str;

    fn from_property(value: &PropertyValue) -> Option<Self> {
        match value {
            PropertyValue::Str(v) => Some(v.clone()),
            _ => None,
        }
    }
}

impl FromProperty for PropertyStore {
    const KIND: PropertyKind = PropertyKind::Table;

    fn from_property(value: &PropertyValue) -> Option<Self> {
        match value {
            PropertyValue::Table(t) => Some(t.clone()),
            _ => None,
        }
    }
}

/// Ordered key → value configuration table.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PropertyStore {
    entries: IndexMap<String, PropertyValue>,
}

impl PropertyStore {
    /// An empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<PropertyValue>) -> Self {
        self.set(key, value);
        self
    }

    /// Look up a raw value.
    pub fn get(&self, key: &str) -> Result<&PropertyValue, PropertyError> {
        self.entries.get(key).ok_or_else(|| PropertyError::InvalidKey {
            key: key.to_string(),
        })
    }

    /// Look up a value and convert it to `T`.
    pub fn get_as<T: FromProperty>(&self, key: &str) -> Result<T, PropertyError> {
        let value = self.get(key)?;
        T::from_property(value).ok_or_else(|| PropertyError::UnexpectedKind {
            key: key.to_string(),
            expected: T::KIND,
            found: value.kind(),
        })
    }

    /// Like [`get_as`](Self::get_as), but a missing key yields `default`.
    /// A present key of the wrong kind is still an error.
    pub fn get_or<T: FromProperty>(&self, key: &str, default: T) -> Result<T, PropertyError> {
        if self.exists(key) {
            self.get_as(key)
        } else {
            Ok(default)
        }
    }

    /// Insert or overwrite, returning the previous value.
    pub fn set(
        &mut self,
        key: impl Into<String>,
        value: impl Into<PropertyValue>,
    ) -> Option<PropertyValue> {
        self.entries.insert(key.into(), value.into())
    }

    /// Whether `key` is present.
    pub fn exists(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Remove `key`, preserving the order of the remaining entries.
    pub fn remove(&mut self, key: &str) -> Option<PropertyValue> {
        self.entries.shift_remove(key)
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the store is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &PropertyValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl fmt::Display for PropertyStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, (k, v)) in self.entries.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{k}={v}")?;
        }
        write!(f, "}}")
    }
}
