//! gatesim: a tri-state digital-logic simulation core.
//!
//! This is the top-level facade crate that re-exports the public API from
//! all gatesim sub-crates. For most users, adding `gatesim` as a single
//! dependency is sufficient.
//!
//! # Quick start
//!
//! ```rust
//! use gatesim::prelude::*;
//!
//! // A gate with two inputs and one output that drives their AND.
//! struct And2;
//! impl Gate for And2 {
//!     fn name(&self) -> &str { "and2" }
//!     fn pins(&self) -> PinLayout { layout(2, 1) }
//!     fn update(&self, pins: &mut dyn PinAccess) -> Result<(), GateError> {
//!         let (a, b) = (pins.read(0)?, pins.read(1)?);
//!         if a.is_none() || b.is_none() {
//!             return pins.write(2, DrivenValue::none());
//!         }
//!         let out = a.as_bit()? && b.as_bit()?;
//!         pins.write(2, DrivenValue::bit(Strength::STRONGEST, out))
//!     }
//! }
//!
//! let sim = Simulation::new(SimulationConfig::default()).unwrap();
//! let (a, b, out) = (sim.add_wire(), sim.add_wire(), sim.add_wire());
//! let and = sim.add_gate(Box::new(And2)).unwrap();
//! for (i, wire) in [a, b, out].into_iter().enumerate() {
//!     sim.bind(and.pin(i as u16), wire).unwrap();
//! }
//!
//! // One constant driver per input.
//! for wire in [a, b] {
//!     let high = sim.add_gate(Box::new(Constant::bit(true))).unwrap();
//!     sim.bind(high.pin(0), wire).unwrap();
//! }
//!
//! let report = sim.step().unwrap();
//! assert!(report.is_clean());
//! assert_eq!(sim.read_wire(out).unwrap(), DrivenValue::bit(Strength::STRONGEST, true));
//! ```
//!
//! # Modules
//!
//! Each module corresponds to a sub-crate. Use them for types not in the prelude:
//!
//! | Module | Sub-crate | Contents |
//! |--------|-----------|----------|
//! | [`types`] | `gatesim-core` | ids, driven values, properties, errors, `Gate` trait |
//! | [`sync`] | `gatesim-sync` | wait/notify, dispatch pool, broadcast events |
//! | [`wire`] | `gatesim-wire` | resolver chain, built-in resolvers, wire state |
//! | [`engine`] | `gatesim-engine` | `Simulation`, configuration, scheduling, metrics |
//! | [`gates`] | `gatesim-gates` | reference gates |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

/// Core types, traits, and ids (`gatesim-core`).
///
/// Contains [`types::DrivenValue`] and [`types::Strength`], the
/// [`types::PropertyStore`], the error types, and the [`types::Gate`] /
/// [`types::PinAccess`] traits.
pub use gatesim_core as types;

/// Synchronization primitives (`gatesim-sync`).
///
/// [`sync::Awaitable`], [`sync::DispatchPool`] and
/// [`sync::BroadcastEvent`].
pub use gatesim_sync as sync;

/// Wire value resolution (`gatesim-wire`).
///
/// [`wire::WireState`] and the [`wire::ResolverChain`] with the built-in
/// resolvers in [`wire::builtin`].
pub use gatesim_wire as wire;

/// The simulation engine (`gatesim-engine`).
///
/// [`engine::Simulation`] owns the circuit and runs propagation passes.
pub use gatesim_engine as engine;

/// Reference gates (`gatesim-gates`).
///
/// Logic gates, a tri-state buffer, a configurable constant and a pull
/// resistor.
pub use gatesim_gates as gates;

/// Common imports for typical gatesim usage.
///
/// ```rust
/// use gatesim::prelude::*;
/// ```
///
/// This imports the most frequently used types: the simulation and its
/// configuration, ids, values, the gate-authoring traits, the reference
/// gates, and the error types.
pub mod prelude {
    // Core types and traits
    pub use gatesim_core::{
        layout, DrivenValue, Gate, GateId, PinAccess, PinId, PinLayout, PinRole, PropertyStore,
        PropertyValue, Strength, WireId,
    };

    // Errors
    pub use gatesim_core::{GateError, ShortCircuit};
    pub use gatesim_engine::{CircuitError, ConfigError, PassError};

    // Engine
    pub use gatesim_engine::{
        FailurePolicy, PassMetrics, PassReport, PassSummary, Simulation, SimulationConfig,
        WireChange,
    };

    // Wire
    pub use gatesim_wire::ResolveMode;

    // Gates
    pub use gatesim_gates::{Constant, LogicGate, PullResistor, TriStateBuffer};
}
