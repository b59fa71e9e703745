//! Synchronization primitives for the gatesim logic simulator.
//!
//! - [`Awaitable`]: blocking wait/notify that hands a payload to woken
//!   waiters.
//! - [`DispatchPool`] / [`Dispatcher`]: a named worker pool for
//!   fire-and-forget jobs.
//! - [`BroadcastEvent`]: multi-subscriber events whose callbacks run on a
//!   dispatcher and whose firings also wake blocked waiters.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod awaitable;
pub mod error;
pub mod event;
pub mod pool;

pub use awaitable::Awaitable;
pub use error::{DispatchError, EventError};
pub use event::{BroadcastEvent, EventCaller, Subscription};
pub use pool::{DispatchPool, DispatchReport, Dispatcher, Job};
