//! Error types for the dispatch pool and broadcast events.

use std::error::Error;
use std::fmt;

/// Errors from [`DispatchPool`](crate::DispatchPool) and its handles.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DispatchError {
    /// The pool has been shut down; the job was not queued.
    ShutDown,
    /// A worker thread could not be spawned.
    SpawnFailed {
        /// The OS error message.
        reason: String,
    },
}

impl fmt::Display for DispatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ShutDown => write!(f, "dispatch pool has shut down"),
            Self::SpawnFailed { reason } => write!(f, "failed to spawn dispatch worker: {reason}"),
        }
    }
}

impl Error for DispatchError {}

/// Errors from [`BroadcastEvent`](crate::BroadcastEvent).
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EventError {
    /// The event's caller capability was already handed out.
    CallerAlreadyMinted,
    /// Firing is restricted to the holder of the caller capability.
    Restricted,
    /// Subscriber dispatch failed because the pool has shut down.
    ShutDown,
}

impl fmt::Display for EventError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CallerAlreadyMinted => write!(f, "event caller was already minted"),
            Self::Restricted => write!(f, "event can only be fired through its caller"),
            Self::ShutDown => write!(f, "event dispatch pool has shut down"),
        }
    }
}

impl Error for EventError {}

impl From<DispatchError> for EventError {
    fn from(e: DispatchError) -> Self {
        match e {
            DispatchError::ShutDown | DispatchError::SpawnFailed { .. } => Self::ShutDown,
        }
    }
}
