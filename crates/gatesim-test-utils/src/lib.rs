//! Test utilities and fixture gates for gatesim development.
//!
//! Provides [`init_logging`], a [`MockPins`] context for driving a gate's
//! `update` directly, and a handful of [`Gate`](gatesim_core::Gate)
//! implementations whose activity is observable through a shared
//! [`Probe`].

#![forbid(unsafe_code)]
#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod fixtures;
mod logging;
pub mod mock;

pub use fixtures::{
    CountingGate, DriverGate, FailingGate, FailureMode, Probe, RedirtyingGate, SourceGate,
};
pub use logging::init_logging;
pub use mock::MockPins;
