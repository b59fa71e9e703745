//! Simulation engine for the gatesim logic simulator.
//!
//! Provides [`Simulation`], which owns the circuit graph (gates, pins and
//! wires), propagates wire changes by marking sensitive gates dirty, and
//! runs dirty gates in concurrent waves until the circuit reaches a fixed
//! point. Wire changes and pass summaries are published as broadcast
//! events.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

mod arena;
mod circuit;
pub mod config;
pub mod dirty;
pub mod error;
pub mod events;
pub mod metrics;
pub mod scheduler;
pub mod simulation;

pub use config::{ConfigError, FailurePolicy, SimulationConfig, DEFAULT_MAX_ITERATIONS};
pub use dirty::DirtyState;
pub use error::{CircuitError, GateFailure, PassError};
pub use events::{PassSummary, WireChange};
pub use metrics::PassMetrics;
pub use scheduler::PassReport;
pub use simulation::{ShutdownReport, Simulation};
