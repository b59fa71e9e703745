//! Core types and traits for the gatesim logic simulator.
//!
//! This is the leaf crate with no internal dependencies. It defines the
//! vocabulary shared by the rest of the workspace: entity ids, driven
//! values and strengths, the per-gate property store, error types, and
//! the [`Gate`] / [`PinAccess`] traits.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod error;
pub mod id;
pub mod pin;
pub mod property;
pub mod traits;
pub mod value;

pub use error::{GateError, PropertyError, ShortCircuit, ValueError};
pub use id::{GateId, PinId, WireId};
pub use pin::{layout, PinLayout, PinRole, MAX_PINS};
pub use property::{FromProperty, PropertyKind, PropertyStore, PropertyValue};
pub use traits::{Gate, PinAccess};
pub use value::{DrivenValue, OpaqueHandle, Payload, Strength, ValueKind};
