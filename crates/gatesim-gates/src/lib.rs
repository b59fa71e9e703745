//! Reference gates for the gatesim logic simulator.
//!
//! - [`LogicGate`]: buffer, NOT, AND, OR, XOR, NAND and NOR over
//!   three-valued bit inputs.
//! - [`TriStateBuffer`]: passes data while enabled, releases otherwise.
//! - [`Constant`]: configurable driver of any integer or float kind.
//! - [`PullResistor`]: weak fixed level that any real driver overrides.

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod constant;
pub mod logic;
pub mod pull;
pub mod tristate;

pub use constant::Constant;
pub use logic::{LogicGate, LogicOp};
pub use pull::PullResistor;
pub use tristate::TriStateBuffer;
